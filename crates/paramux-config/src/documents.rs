//! Parameter tables (TOML) and controller graphs (JSON) on disk.
//!
//! ```toml
//! budget_bits = 256
//!
//! [[parameters]]
//! name = "Hat"
//! kind = "bool"
//!
//! [[parameters]]
//! name = "Hue"
//! kind = "float"
//! default = 0.5
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use paramux_core::{ControllerGraph, ParamTable};

use crate::ConfigError;

fn ensure_parent(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))
}

fn write(path: &Path, content: &str) -> Result<(), ConfigError> {
    ensure_parent(path)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

/// Parse a parameter table from TOML.
pub fn table_from_toml(toml_str: &str) -> Result<ParamTable, ConfigError> {
    Ok(toml::from_str(toml_str)?)
}

/// Serialize a parameter table to TOML.
pub fn table_to_toml(table: &ParamTable) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(table)?)
}

/// Load a parameter table from a TOML file.
pub fn load_table(path: impl AsRef<Path>) -> Result<ParamTable, ConfigError> {
    let path = path.as_ref();
    let table = table_from_toml(&read(path)?)?;
    tracing::debug!("loaded table {} ({} entries)", path.display(), table.len());
    Ok(table)
}

/// Save a parameter table to a TOML file.
pub fn save_table(table: &ParamTable, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    write(path.as_ref(), &table_to_toml(table)?)
}

/// Parse a controller graph from JSON.
pub fn graph_from_json(json: &str) -> Result<ControllerGraph, ConfigError> {
    Ok(serde_json::from_str(json)?)
}

/// Serialize a controller graph to pretty-printed JSON.
pub fn graph_to_json(graph: &ControllerGraph) -> Result<String, ConfigError> {
    Ok(serde_json::to_string_pretty(graph)?)
}

/// Load a controller graph from a JSON file.
pub fn load_graph(path: impl AsRef<Path>) -> Result<ControllerGraph, ConfigError> {
    let path = path.as_ref();
    let graph = graph_from_json(&read(path)?)?;
    tracing::debug!(
        "loaded graph {} ({} channels, {} layers)",
        path.display(),
        graph.channels().count(),
        graph.layers().count()
    );
    Ok(graph)
}

/// Save a controller graph to a JSON file.
pub fn save_graph(graph: &ControllerGraph, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    write(path.as_ref(), &graph_to_json(graph)?)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Save a parameter table and its graph as one unit.
///
/// Both documents are serialized and written to temporary siblings before
/// either target is replaced. A failure before the renames leaves both
/// files untouched.
pub fn save_documents(
    table: &ParamTable,
    table_path: impl AsRef<Path>,
    graph: &ControllerGraph,
    graph_path: impl AsRef<Path>,
) -> Result<(), ConfigError> {
    let (table_path, graph_path) = (table_path.as_ref(), graph_path.as_ref());
    let table_doc = table_to_toml(table)?;
    let graph_doc = graph_to_json(graph)?;

    let table_tmp = staging_path(table_path);
    let graph_tmp = staging_path(graph_path);
    write(&table_tmp, &table_doc)?;
    if let Err(e) = write(&graph_tmp, &graph_doc) {
        std::fs::remove_file(&table_tmp).ok();
        return Err(e);
    }

    std::fs::rename(&graph_tmp, graph_path)
        .map_err(|e| ConfigError::write_file(graph_path, e))?;
    std::fs::rename(&table_tmp, table_path)
        .map_err(|e| ConfigError::write_file(table_path, e))?;
    tracing::debug!("saved {} and {}", table_path.display(), graph_path.display());
    Ok(())
}

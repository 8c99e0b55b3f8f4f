//! Platform-specific paths for request files and configuration.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/paramux/` (Linux), `~/Library/Application Support/paramux/` (macOS), `%APPDATA%\paramux\` (Windows)
//! - **Saved requests**: `<user config>/requests/`
//!
//! The user config directory is also the default storage location for
//! generated motion assets.

use std::path::{Path, PathBuf};

/// Application name used for directory paths.
const APP_NAME: &str = "paramux";

/// Subdirectory name for saved install requests.
const REQUESTS_SUBDIR: &str = "requests";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the directory holding saved install requests.
pub fn user_requests_dir() -> PathBuf {
    user_config_dir().join(REQUESTS_SUBDIR)
}

/// Default storage path for generated assets, as a string for the request.
pub fn default_storage_dir() -> String {
    user_config_dir().to_string_lossy().into_owned()
}

/// Find a request file by name.
///
/// Accepts a path to an existing file, or a request name (with or without
/// `.toml`) looked up in [`user_requests_dir`].
pub fn find_request(name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if name.ends_with(".toml") {
        name.to_string()
    } else {
        format!("{name}.toml")
    };
    let user_path = user_requests_dir().join(filename);
    user_path.is_file().then_some(user_path)
}

/// Ensure the user config directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_config_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}

/// List saved request files.
///
/// Returns an empty vector if the directory doesn't exist or can't be read.
pub fn list_requests() -> Vec<PathBuf> {
    list_toml_in_dir(&user_requests_dir())
}

fn list_toml_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    files.sort();
    files
}

/// Get the request name from a file path (the file stem).
///
/// ```rust
/// use paramux_config::paths::request_name_from_path;
/// use std::path::Path;
///
/// let name = request_name_from_path(Path::new("/path/to/outfit.toml"));
/// assert_eq!(name, Some("outfit".to_string()));
/// ```
pub fn request_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_user_config_dir() {
        let dir = user_config_dir();
        assert!(dir.to_string_lossy().contains("paramux"));
    }

    #[test]
    fn test_requests_dir_is_under_config() {
        assert!(user_requests_dir().starts_with(user_config_dir()));
    }

    #[test]
    fn test_default_storage_dir() {
        assert!(default_storage_dir().contains("paramux"));
    }

    #[test]
    fn test_find_request_by_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("outfit.toml");
        fs::write(&path, "parameters = []").unwrap();

        assert_eq!(find_request(path.to_str().unwrap()), Some(path));
    }

    #[test]
    fn test_find_request_not_found() {
        assert!(find_request("nonexistent_request_12345").is_none());
    }

    #[test]
    fn test_list_toml_in_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.toml"), "").unwrap();
        fs::write(temp_dir.path().join("a.toml"), "").unwrap();
        fs::write(temp_dir.path().join("graph.json"), "").unwrap();

        let files = list_toml_in_dir(temp_dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.toml"));
    }

    #[test]
    fn test_list_nonexistent_dir() {
        assert!(list_toml_in_dir(Path::new("/nonexistent/path/12345")).is_empty());
    }

    #[test]
    fn test_request_name_from_path() {
        assert_eq!(
            request_name_from_path(Path::new("simple.toml")),
            Some("simple".to_string())
        );
    }
}

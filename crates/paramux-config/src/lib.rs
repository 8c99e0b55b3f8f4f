//! File-backed configuration for paramux.
//!
//! This crate puts the in-memory types of `paramux-core` on disk: install
//! requests and parameter tables as TOML, controller graphs as JSON.
//!
//! # Features
//!
//! - **Requests**: [`InstallRequestFile`] loads and saves install requests
//! - **Documents**: parameter-table and graph load/save helpers
//! - **Validation**: [`validate_request`] reports every problem at once
//! - **Paths**: platform config directory and saved requests
//!
//! # Example
//!
//! ```rust,no_run
//! use paramux_config::{InstallRequestFile, load_graph, load_table, save_graph, save_table};
//!
//! let request = InstallRequestFile::load("outfit.toml").unwrap().to_request();
//! let mut table = load_table("params.toml").unwrap();
//! let mut graph = load_graph("graph.json").unwrap();
//!
//! paramux_config::validate_request(&request, &table).unwrap();
//! paramux_core::install(&request, &mut table, &mut graph).unwrap();
//!
//! save_table(&table, "params.toml").unwrap();
//! save_graph(&graph, "graph.json").unwrap();
//! ```

mod documents;
mod error;
mod request;

/// Platform-specific paths for requests and configuration.
pub mod paths;

/// Request validation.
pub mod validation;

pub use documents::{
    graph_from_json, graph_to_json, load_graph, load_table, save_documents, save_graph,
    save_table, table_from_toml, table_to_toml,
};
pub use error::ConfigError;
pub use paths::{
    default_storage_dir, ensure_user_config_dir, find_request, list_requests,
    request_name_from_path, user_config_dir, user_requests_dir,
};
pub use request::InstallRequestFile;
pub use validation::{ValidationError, ValidationResult, validate_request};

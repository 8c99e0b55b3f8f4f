//! Request validation against a parameter table.
//!
//! [`paramux_core::install`] stops at the first bad input. Validation here
//! walks the whole request and reports every problem at once, which is what a
//! user editing a request file wants to see.
//!
//! # Example
//!
//! ```rust
//! use paramux_config::validate_request;
//! use paramux_core::{InstallRequest, ParamKind, ParamTable, TableEntry};
//!
//! let table = ParamTable::default().with_entry(TableEntry::new("Hat", ParamKind::Bool));
//! assert!(validate_request(&InstallRequest::new(["Hat"], 1), &table).is_ok());
//! assert!(validate_request(&InstallRequest::new(["Hat", "Coat"], 0), &table).is_err());
//! ```

use std::collections::BTreeSet;

use paramux_core::{InstallRequest, ParamKind, ParamTable};
use thiserror::Error;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Step count below 1.
    #[error("step count must be at least 1, got {0}")]
    InvalidStepCount(usize),

    /// Step delay not positive and finite.
    #[error("step delay must be positive and finite, got {0}")]
    InvalidStepDelay(f32),

    /// Empty parameter list.
    #[error("no parameters selected for multiplexing")]
    NoParameters,

    /// Parameter missing from the table.
    #[error("parameter '{0}' is not in the parameter table")]
    UnknownParameter(String),

    /// Parameter present but not network-synchronized.
    #[error("parameter '{0}' is not network-synchronized")]
    ParameterNotSynced(String),

    /// Parameter listed twice.
    #[error("parameter '{0}' is listed more than once")]
    DuplicateParameter(String),

    /// Bipolar name that is not a float parameter of the request.
    #[error("parameter '{0}' is marked bipolar but is not a requested float")]
    BipolarNotFloat(String),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Checks `request` against `table`, collecting every problem.
///
/// A single problem is returned as itself; several are wrapped in
/// [`ValidationError::Multiple`] in the order they were found.
pub fn validate_request(request: &InstallRequest, table: &ParamTable) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if request.step_count < 1 {
        errors.push(ValidationError::InvalidStepCount(request.step_count));
    }
    if !(request.step_delay.is_finite() && request.step_delay > 0.0) {
        errors.push(ValidationError::InvalidStepDelay(request.step_delay));
    }
    if request.parameters.is_empty() {
        errors.push(ValidationError::NoParameters);
    }

    let mut seen = BTreeSet::new();
    for name in &request.parameters {
        if !seen.insert(name.as_str()) {
            errors.push(ValidationError::DuplicateParameter(name.clone()));
            continue;
        }
        match table.get(name) {
            None => errors.push(ValidationError::UnknownParameter(name.clone())),
            Some(entry) if !entry.synced => {
                errors.push(ValidationError::ParameterNotSynced(name.clone()));
            }
            Some(_) => {}
        }
    }

    for name in &request.bipolar {
        let is_float = table.get(name).is_some_and(|e| e.kind == ParamKind::Float);
        if !(is_float && seen.contains(name.as_str())) {
            errors.push(ValidationError::BipolarNotFloat(name.clone()));
        }
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

use std::fmt;

use thiserror::Error;

/// Errors produced during compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    /// E2001: A function event or service setting is malformed.
    #[error("E2001: {0}")]
    Configuration(String),

    /// E2002: The path resource graph or a usage plan reference cannot be resolved.
    #[error("E2002: {0}")]
    ResourceGraph(String),

    /// E2003: Two distinct declarations map to the same logical id.
    #[error("E2003: logical id '{logical_id}' is generated by both {first} and {second}")]
    NamingCollision {
        logical_id: String,
        first: String,
        second: String,
    },

    /// Service definition could not be parsed.
    #[error("failed to parse service definition: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse grouping of [`CompileError`] variants, used by callers to pick exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    ResourceGraph,
    NamingCollision,
    Input,
}

impl CompileError {
    /// Configuration error attributed to a function.
    pub(crate) fn in_function(function: &str, message: impl fmt::Display) -> Self {
        CompileError::Configuration(format!("{} in function \"{}\"", message, function))
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CompileError::Configuration(_) | CompileError::Parse(_) => ErrorCategory::Configuration,
            CompileError::ResourceGraph(_) => ErrorCategory::ResourceGraph,
            CompileError::NamingCollision { .. } => ErrorCategory::NamingCollision,
            CompileError::Io(_) | CompileError::Json(_) => ErrorCategory::Input,
        }
    }
}

/// A non-fatal compilation diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileWarning {
    pub code: String,
    pub message: String,
    pub location: Option<String>,
}

/// W2001: request config ignored under a proxy integration.
pub const IGNORED_REQUEST_CONFIG: &str = "W2001";

/// W2002: response config ignored under a proxy integration.
pub const IGNORED_RESPONSE_CONFIG: &str = "W2002";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_names_function() {
        let err = CompileError::in_function("first", "Invalid APIG method \"trace\"");
        assert_eq!(
            err.to_string(),
            "E2001: Invalid APIG method \"trace\" in function \"first\""
        );
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn naming_collision_lists_both_sources() {
        let err = CompileError::NamingCollision {
            logical_id: "ApiGatewayResourceFoobar".into(),
            first: "path 'foo_bar'".into(),
            second: "path 'foobar'".into(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("E2003"));
        assert!(msg.contains("path 'foo_bar'"));
        assert!(msg.contains("path 'foobar'"));
        assert_eq!(err.category(), ErrorCategory::NamingCollision);
    }
}

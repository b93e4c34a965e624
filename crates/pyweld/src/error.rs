//! Error types for pyweld
//!
//! Only failures that stop a whole run surface as `Err`. Per-file problems
//! are converted into [`SkippedFile`](crate::build::SkippedFile) entries by
//! the builder, and per-declaration problems never leave the extractor.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for pyweld operations
pub type WeldResult<T> = Result<T, WeldError>;

/// Main error type for pyweld
#[derive(Debug, Error)]
pub enum WeldError {
    /// The configured source root does not exist or is not a directory
    #[error("Source root not found: {0}")]
    SourceRootNotFound(PathBuf),

    /// IO error tied to a path
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source file could not be parsed
    #[error("Parse error in {file}: {message}")]
    Parse {
        file: PathBuf,
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generated output could not be written or cleaned
    #[error("Output error: {0}")]
    Output(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WeldError {
    /// Create an IO error for a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WeldError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error from a syn error, keeping its start location
    pub fn parse(file: impl Into<PathBuf>, err: &syn::Error) -> Self {
        let start = err.span().start();
        // proc-macro2 reports line 0 when no location is known
        let (line, column) = if start.line == 0 {
            (None, None)
        } else {
            (Some(start.line), Some(start.column + 1))
        };

        WeldError::Parse {
            file: file.into(),
            message: err.to_string(),
            line,
            column,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        WeldError::Config(message.into())
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        WeldError::Output(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_location() {
        let err = syn::parse_file("pub struct {").unwrap_err();
        let weld = WeldError::parse("venues/src/alpha/bad.rs", &err);

        match weld {
            WeldError::Parse { line, column, .. } => {
                assert_eq!(line, Some(1));
                assert!(column.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

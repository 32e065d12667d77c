//! Error handling and error types for foldwise.
//!
//! Every fallible operation in the crate returns [`Result`], and every
//! validation failure is raised at the call that introduced it. Nothing is
//! retried: loading, joining, pivoting and scoring are deterministic batch
//! steps, so a failure is reported once with the offending column, file or
//! fold named in the message.

use std::io;
use thiserror::Error;

/// Main error type for the foldwise library.
#[derive(Error, Debug)]
pub enum FoldwiseError {
    /// A source could not be parsed as a table
    #[error("Format error: {message}")]
    Format {
        /// What could not be parsed and where
        message: String,
    },

    /// Missing column, column collision, or malformed long-format table
    #[error("Schema error: {message}")]
    Schema {
        /// Offending columns and the file they came from
        message: String,
    },

    /// The combined labels table repeats a key tuple
    #[error("Duplicate key {key:?} in {source_name} (first at row {first_row}, again at row {row})")]
    DuplicateKey {
        /// The repeated key tuple
        key: Vec<String>,
        /// Table in which it repeats
        source_name: String,
        /// Row of the first occurrence
        first_row: usize,
        /// Row of the repeat
        row: usize,
    },

    /// Conflicting or unrecognized validation settings
    #[error("Configuration error: {message}")]
    Configuration {
        /// Which setting is wrong
        message: String,
    },

    /// Input shapes that disagree with each other
    #[error("Shape error: expected {expected}, got {actual}")]
    Shape {
        /// Shape the operation needed
        expected: String,
        /// Shape it was given
        actual: String,
    },

    /// A model collaborator failed to fit or predict
    #[error("Model error during {stage}: {message}")]
    Model {
        /// `fit` or `predict`
        stage: String,
        /// Message from the model
        message: String,
    },

    /// A metric could not be evaluated
    #[error("Metric error: {message}")]
    Metric {
        /// Why the score is undefined
        message: String,
    },

    /// Prediction export failed
    #[error("Export error: {message}")]
    Export {
        /// File that could not be written and the cause
        message: String,
    },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        /// Underlying I/O error
        #[from]
        source: io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        /// Underlying serde_json error
        #[from]
        source: serde_json::Error,
    },

    /// TOML deserialization errors
    #[error("TOML error: {source}")]
    Toml {
        /// Underlying TOML parse error
        #[from]
        source: toml::de::Error,
    },

    /// Internal library errors (should not occur in normal usage)
    #[error("Internal error: {message}")]
    Internal {
        /// What went wrong
        message: String,
    },
}

/// Type alias for Results using FoldwiseError
pub type Result<T> = std::result::Result<T, FoldwiseError>;

impl FoldwiseError {
    /// Create a format error
    pub fn format<S: Into<String>>(message: S) -> Self {
        FoldwiseError::Format {
            message: message.into(),
        }
    }

    /// Create a schema error
    pub fn schema<S: Into<String>>(message: S) -> Self {
        FoldwiseError::Schema {
            message: message.into(),
        }
    }

    /// Create a duplicate key error
    pub fn duplicate_key<S: Into<String>>(
        key: Vec<String>,
        source_name: S,
        first_row: usize,
        row: usize,
    ) -> Self {
        FoldwiseError::DuplicateKey {
            key,
            source_name: source_name.into(),
            first_row,
            row,
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        FoldwiseError::Configuration {
            message: message.into(),
        }
    }

    /// Create a shape mismatch error
    pub fn shape<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        FoldwiseError::Shape {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a model error for the given stage (`fit` or `predict`)
    pub fn model<S: Into<String>, M: Into<String>>(stage: S, message: M) -> Self {
        FoldwiseError::Model {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a metric error
    pub fn metric<S: Into<String>>(message: S) -> Self {
        FoldwiseError::Metric {
            message: message.into(),
        }
    }

    /// Create an export error
    pub fn export<S: Into<String>>(message: S) -> Self {
        FoldwiseError::Export {
            message: message.into(),
        }
    }

    /// Create an internal error (should be used sparingly)
    pub fn internal<S: Into<String>>(message: S) -> Self {
        FoldwiseError::Internal {
            message: message.into(),
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            FoldwiseError::Format { .. } => "format",
            FoldwiseError::Schema { .. } => "schema",
            FoldwiseError::DuplicateKey { .. } => "key",
            FoldwiseError::Configuration { .. } => "config",
            FoldwiseError::Shape { .. } => "shape",
            FoldwiseError::Model { .. } => "model",
            FoldwiseError::Metric { .. } => "metric",
            FoldwiseError::Export { .. } => "export",
            FoldwiseError::IO { .. } => "io",
            FoldwiseError::Json { .. } => "json",
            FoldwiseError::Toml { .. } => "toml",
            FoldwiseError::Internal { .. } => "internal",
        }
    }

    /// True for errors caused by the shape or naming of input tables.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            FoldwiseError::Format { .. }
                | FoldwiseError::Schema { .. }
                | FoldwiseError::DuplicateKey { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = FoldwiseError::schema("missing column device_id");
        assert_eq!(err.category(), "schema");
        assert!(err.is_input_error());
        assert!(err.to_string().contains("device_id"));

        let err = FoldwiseError::config("both indices supplied");
        assert_eq!(err.category(), "config");
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_duplicate_key_message() {
        let err = FoldwiseError::duplicate_key(vec!["d1".to_string()], "train.csv", 0, 3);
        let msg = err.to_string();
        assert!(msg.contains("d1"));
        assert!(msg.contains("train.csv"));
        assert!(msg.contains("row 3"));
        assert_eq!(err.category(), "key");
    }

    #[test]
    fn test_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err: FoldwiseError = io_error.into();
        assert_eq!(err.category(), "io");
    }

    #[test]
    fn test_shape_and_model_errors() {
        let err = FoldwiseError::shape("2 columns", "3 columns");
        assert_eq!(err.to_string(), "Shape error: expected 2 columns, got 3 columns");

        let err = FoldwiseError::model("fit", "singular matrix");
        assert!(err.to_string().contains("fit"));
        assert_eq!(err.category(), "model");
    }
}

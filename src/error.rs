//! Error types for datamorph.

use std::path::PathBuf;

/// Result type alias for datamorph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in datamorph operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Arrow error during data processing.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Excel error while reading a workbook.
    #[error("Excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Excel error while writing a workbook.
    #[error("Excel write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// JSON error during parsing.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unsupported file format.
    #[error("Unsupported format: {format}")]
    UnsupportedFormat {
        /// The unsupported format name or extension.
        format: String,
    },

    /// Empty dataset error.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Schema mismatch between batches.
    #[error("Schema mismatch: {message}")]
    SchemaMismatch {
        /// Description of the schema mismatch.
        message: String,
    },

    /// Output file already exists and overwrite was not requested.
    #[error("Output {path:?} exists. Use --force to overwrite")]
    OutputExists {
        /// The existing output path.
        path: PathBuf,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },
}

impl Error {
    /// Create an I/O error with a path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Create a schema mismatch error.
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io(io_err, "/path/to/file");
        assert!(err.to_string().contains("/path/to/file"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_unsupported_format() {
        let err = Error::unsupported_format("parquet");
        assert!(err.to_string().contains("parquet"));
    }

    #[test]
    fn test_schema_mismatch() {
        let err = Error::schema_mismatch("expected Int64, got Utf8");
        assert!(err.to_string().contains("expected Int64, got Utf8"));
    }

    #[test]
    fn test_empty_dataset() {
        let err = Error::EmptyDataset;
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_output_exists() {
        let err = Error::OutputExists {
            path: PathBuf::from("out.csv"),
        };
        assert!(err.to_string().contains("out.csv"));
        assert!(err.to_string().contains("--force"));
    }

    #[test]
    fn test_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json")
            .err()
            .unwrap_or_else(|| panic!("invalid JSON should fail to parse"));
        let err = Error::from(json_err);
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn test_invalid_config() {
        let err = Error::invalid_config("report path must not be a directory");
        assert!(err.to_string().contains("report path"));
    }
}

//! Error types for loading and analysing BER sweeps.

use thiserror::Error;

/// Errors surfaced by the ingestion and analysis layers.
///
/// Unparseable cells are not errors: they become missing values and are
/// only counted. A target BER that is never reached is not an error either,
/// see [`crate::analysis::threshold::Crossing`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// I/O error reading the file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tokenizer error from the CSV reader.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A mandatory logical column could not be resolved.
    #[error("Column not found: {column} (available columns: {})", available.join(", "))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    /// The text does not form a usable table with any accepted delimiter.
    #[error("Invalid table: {message}")]
    InvalidTable { message: String },

    /// A caller-supplied parameter is outside its domain.
    #[error("Invalid value for {name}: {message}")]
    InvalidParameter { name: String, message: String },
}

impl AnalysisError {
    /// Create a column-not-found error listing the columns that were available.
    pub fn column_not_found(column: impl Into<String>, available: &[String]) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
            available: available.to_vec(),
        }
    }

    /// Create an invalid table error.
    pub fn invalid_table(message: impl Into<String>) -> Self {
        Self::InvalidTable {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_not_found_lists_available_columns() {
        let err = AnalysisError::column_not_found(
            "SNR",
            &["rz".to_string(), "nrz".to_string()],
        );
        let msg = err.to_string();
        assert!(msg.contains("SNR"));
        assert!(msg.contains("rz, nrz"));
    }
}

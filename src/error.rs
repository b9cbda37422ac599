//! Error types for the data layer.
//!
//! Every failure of loading, table construction or projection is a
//! [`DataError`]. A failing chart pipeline reports its error in place of the
//! chart; the other charts are unaffected.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for data-layer operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading or shaping the dataset.
#[derive(Debug, Error)]
pub enum DataError {
    /// The dataset file is missing, unreadable or not valid JSON.
    #[error("dataset unavailable at {}", .path.display())]
    DataUnavailable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An expected section is absent from the document.
    #[error("missing section '{section}'")]
    MissingSection { section: String },

    /// The requested year is not a row of the table.
    #[error("year {year} not found in '{table}'")]
    YearNotFound { table: String, year: i32 },

    /// A row carries no integer year key.
    #[error("row {row} of '{table}' has no integer 'Année' key")]
    MissingYearKey { table: String, row: usize },

    /// The same year appears twice in one section.
    #[error("year {year} appears more than once in '{table}'")]
    DuplicateYear { table: String, year: i32 },

    /// A row lacks a column declared by the first row.
    #[error("'{table}' has no value for column '{column}' in {year}")]
    MissingCell {
        table: String,
        year: i32,
        column: String,
    },

    /// Arithmetic was requested on a text column.
    #[error("column '{column}' of '{table}' is not numeric")]
    NonNumericColumn { table: String, column: String },

    /// A column name does not exist in the table.
    #[error("column '{column}' not found in '{table}'")]
    UnknownColumn { table: String, column: String },

    /// No table provides a year range for the selector.
    #[error("no year range available for the year selector")]
    NoYearRange,

    /// Two tables cannot be combined cell by cell.
    #[error("'{left}' and '{right}' do not share the same columns: {detail}")]
    ShapeMismatch {
        left: String,
        right: String,
        detail: String,
    },
}

impl DataError {
    /// Create a DataUnavailable error.
    pub fn unavailable(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::DataUnavailable {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Create a MissingSection error.
    pub fn missing_section(section: impl Into<String>) -> Self {
        Self::MissingSection {
            section: section.into(),
        }
    }

    /// Create a YearNotFound error.
    pub fn year_not_found(table: impl Into<String>, year: i32) -> Self {
        Self::YearNotFound {
            table: table.into(),
            year,
        }
    }

    /// Create a NonNumericColumn error.
    pub fn non_numeric(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::NonNumericColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create an UnknownColumn error.
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

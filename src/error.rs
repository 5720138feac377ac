use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid synonym group '{target}': {details}")]
    InvalidSynonymGroup { target: String, details: String },

    #[error("Synonym target '{0}' is configured more than once")]
    DuplicateSynonymTarget(String),

    #[error("Column '{column}' belongs to synonym groups '{first}' and '{second}'")]
    OverlappingSynonymSource {
        column: String,
        first: String,
        second: String,
    },

    #[error("Invalid category rule '{rule}': {details}")]
    InvalidCategoryRule { rule: String, details: String },

    #[error("Invalid reference year {0}: must be between 1900 and 9999")]
    InvalidReferenceYear(i32),

    #[error("Internal field marker must not be empty")]
    EmptyFieldMarker,

    #[error("Invalid input record #{index}: {details}")]
    InvalidRecord { index: usize, details: String },

    #[error("Reconciliation failed for {check}: expected {expected}, got {actual}")]
    ReconciliationMismatch {
        check: String,
        expected: f64,
        actual: f64,
    },

    #[error("Fund allocation mismatch: union ({union_fund}) + pension ({pension_fund}) != base ({base}) + other ({other}) + pension ({pension})")]
    FundAllocationMismatch {
        union_fund: f64,
        pension_fund: f64,
        base: f64,
        other: f64,
        pension: f64,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

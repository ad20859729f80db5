use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChurnError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid value(s) in field '{field}': {values:?}")]
    InvalidCategoryValue { field: String, values: Vec<String> },

    #[error("Field '{field}' expects a finite number, got {value}")]
    NonNumericValue { field: String, value: String },

    #[error("Feature schema mismatch: {reason}")]
    SchemaMismatch { reason: String },

    #[error("Scenario '{scenario}' is invalid: {reason}")]
    InvalidScenario { scenario: String, reason: String },

    #[error("Scoring unavailable: {reason}")]
    ScoringUnavailable { reason: String },

    #[error("Invalid thresholds: {reason}")]
    InvalidThresholds { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ChurnResult<T> = Result<T, ChurnError>;

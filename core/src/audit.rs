//! Audit records and the append-only sink the pipeline writes them to.

use crate::{
    error::ChurnResult,
    risk::RiskBucket,
    types::{Probability, UserId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub prediction_id: String,
    pub user_id:       UserId,
    pub probability:   Probability,
    pub risk:          RiskBucket,
    pub created_at:    DateTime<Utc>,
    pub total_charges: Option<f64>,
    pub notes:         Option<String>,
}

/// Where predictions are logged. The core only appends; reading history
/// back is the surrounding application's business.
pub trait PredictionSink {
    fn record(&self, record: &PredictionRecord) -> ChurnResult<()>;
}

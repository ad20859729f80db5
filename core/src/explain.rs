//! Feature attribution: which features pushed this prediction up or down.

use crate::{
    error::{ChurnError, ChurnResult},
    schema::FeatureVector,
};
use serde::{Deserialize, Serialize};

/// Produces one impact score per schema feature for a single vector.
pub trait FeatureAttributor {
    fn attribute(&self, vector: &FeatureVector) -> ChurnResult<Vec<f64>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImpact {
    pub feature: String,
    pub impact:  f64,
    pub value:   f64,
}

/// Pair impacts with feature names and values, largest |impact| first.
/// Ties keep schema order.
pub fn rank_attributions(vector: &FeatureVector, impacts: &[f64]) -> ChurnResult<Vec<FeatureImpact>> {
    if impacts.len() != vector.len() {
        return Err(ChurnError::SchemaMismatch {
            reason: format!(
                "attribution has {} scores but the vector has {} features",
                impacts.len(),
                vector.len()
            ),
        });
    }

    let mut ranked: Vec<FeatureImpact> = vector
        .iter()
        .zip(impacts)
        .map(|((feature, value), impact)| FeatureImpact {
            feature: feature.to_string(),
            impact:  *impact,
            value,
        })
        .collect();
    ranked.sort_by(|a, b| b.impact.abs().total_cmp(&a.impact.abs()));
    Ok(ranked)
}

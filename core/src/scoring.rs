//! The scoring seam: anything that maps a feature vector to a churn
//! probability. The pipeline and simulator only ever see this trait.

use crate::{
    error::{ChurnError, ChurnResult},
    schema::{FeatureSchema, FeatureVector},
    types::Probability,
};

/// A deterministic, side-effect-free probability model.
pub trait Scorer {
    fn score(&self, vector: &FeatureVector) -> ChurnResult<Probability>;

    /// Called once at start-up. Models that were trained on a fixed
    /// feature layout reject any other layout here.
    fn check_schema(&self, _schema: &FeatureSchema) -> ChurnResult<()> {
        Ok(())
    }
}

impl<F> Scorer for F
where
    F: Fn(&FeatureVector) -> ChurnResult<Probability>,
{
    fn score(&self, vector: &FeatureVector) -> ChurnResult<Probability> {
        self(vector)
    }
}

/// Score `vector`, normalising every failure to `ScoringUnavailable` and
/// rejecting outputs outside [0, 1].
pub fn checked_score(scorer: &dyn Scorer, vector: &FeatureVector) -> ChurnResult<Probability> {
    let p = match scorer.score(vector) {
        Ok(p) => p,
        Err(e @ ChurnError::ScoringUnavailable { .. }) => return Err(e),
        Err(e) => {
            return Err(ChurnError::ScoringUnavailable {
                reason: e.to_string(),
            })
        }
    };

    if !(0.0..=1.0).contains(&p) {
        return Err(ChurnError::ScoringUnavailable {
            reason: format!("model returned {p}, expected a probability in [0, 1]"),
        });
    }
    Ok(p)
}

//! The prediction pipeline, built once at start-up and shared by requests.
//!
//! encode → score baseline → bucket + decide → simulate scenarios → rank
//!
//! Persisting the result is optional and happens at the caller's request
//! via predict_and_record(); the simulator itself never writes anywhere.

use crate::{
    attributes::CustomerAttributes,
    audit::{PredictionRecord, PredictionSink},
    config::ChurnConfig,
    encoder::FeatureEncoder,
    error::ChurnResult,
    explain::{rank_attributions, FeatureAttributor, FeatureImpact},
    risk::{DecisionThreshold, RiskBucket, RiskThresholds},
    scenario::{validate_catalog, Scenario},
    schema::{FeatureSchema, FeatureVector},
    scoring::{checked_score, Scorer},
    simulator::{recommendation, ScenarioOutcome, ScenarioSimulator},
    types::Probability,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub probability:    Probability,
    pub will_churn:     bool,
    pub risk:           RiskBucket,
    pub total_charges:  Option<f64>,
    /// Ranked scenario outcomes.
    pub scenarios:      Vec<ScenarioOutcome>,
    pub recommendation: Option<String>,
}

impl PredictionResult {
    pub fn to_record(&self, user_id: &str, notes: Option<&str>) -> PredictionRecord {
        PredictionRecord {
            prediction_id: uuid::Uuid::new_v4().to_string(),
            user_id:       user_id.to_string(),
            probability:   self.probability,
            risk:          self.risk,
            created_at:    Utc::now(),
            total_charges: self.total_charges,
            notes:         notes.map(str::to_string),
        }
    }
}

pub struct ChurnPredictor<S: Scorer> {
    encoder:   FeatureEncoder,
    simulator: ScenarioSimulator,
    scorer:    S,
    scenarios: Vec<Scenario>,
    risk:      RiskThresholds,
    decision:  DecisionThreshold,
}

impl<S: Scorer> ChurnPredictor<S> {
    /// Validate the whole configuration against the schema and wire the
    /// pipeline. Every start-up error surfaces here, not per request.
    pub fn new(config: ChurnConfig, scorer: S) -> ChurnResult<Self> {
        let schema = Arc::new(FeatureSchema::new(config.features)?);
        config.risk.validate()?;
        scorer.check_schema(&schema)?;

        let encoder = FeatureEncoder::new(
            Arc::clone(&schema),
            config.vocabulary.clone(),
            config.derived.clone(),
        )?;
        validate_catalog(&config.scenarios, &schema, &config.vocabulary)?;
        let simulator = ScenarioSimulator::new(config.simulator, config.vocabulary, config.derived);

        log::info!(
            "predictor: ready with {} features and {} scenarios",
            schema.len(),
            config.scenarios.len()
        );

        Ok(Self {
            encoder,
            simulator,
            scorer,
            scenarios: config.scenarios,
            risk: config.risk,
            decision: config.decision,
        })
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        self.encoder.schema()
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn encode(&self, attrs: &CustomerAttributes) -> ChurnResult<FeatureVector> {
        self.encoder.encode(attrs)
    }

    pub fn predict(&self, attrs: &CustomerAttributes) -> ChurnResult<PredictionResult> {
        let baseline = self.encoder.encode(attrs)?;
        let probability = checked_score(&self.scorer, &baseline)?;

        let scenarios =
            self.simulator
                .simulate_from(&baseline, probability, &self.scorer, &self.scenarios);
        let recommended = recommendation(&scenarios).map(|o| o.scenario().to_string());

        let derived = self.encoder.derived();
        let total_charges = baseline
            .get(&derived.total_charges)
            .or_else(|| attrs.number(&derived.total_charges))
            .or_else(|| derived.derive_for(attrs));

        let result = PredictionResult {
            probability,
            will_churn: self.decision.will_churn(probability),
            risk: self.risk.bucket(probability),
            total_charges,
            scenarios,
            recommendation: recommended,
        };
        log::info!(
            "predict: p={:.4} risk={} churn={} recommendation={:?}",
            result.probability,
            result.risk,
            result.will_churn,
            result.recommendation
        );
        Ok(result)
    }

    /// Predict, then append an audit record for `user_id` to `sink`.
    pub fn predict_and_record(
        &self,
        user_id: &str,
        attrs: &CustomerAttributes,
        sink: &dyn PredictionSink,
    ) -> ChurnResult<PredictionResult> {
        let result = self.predict(attrs)?;
        sink.record(&result.to_record(user_id, Some("Predicted churn")))?;
        Ok(result)
    }

    /// Per-feature impacts for this customer, largest first.
    pub fn explain(
        &self,
        attrs: &CustomerAttributes,
        attributor: &dyn FeatureAttributor,
    ) -> ChurnResult<Vec<FeatureImpact>> {
        let vector = self.encoder.encode(attrs)?;
        let impacts = attributor.attribute(&vector)?;
        rank_attributions(&vector, &impacts)
    }
}

//! Feature encoder: customer attributes to a schema-aligned vector.
//!
//! Steps, in order:
//!   1. Validate every categorical and numeric field against the vocabulary
//!   2. Expand categoricals into "<field>_<value>" indicators (one per value)
//!   3. Pass numerics through; derive total charges when not supplied
//!   4. Project onto the schema: missing names become 0, extra names drop

use crate::{
    attributes::{AttributeValue, CustomerAttributes},
    error::{ChurnError, ChurnResult},
    schema::{FeatureSchema, FeatureVector},
    vocabulary::{indicator_name, CategoryVocabulary},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Names of the three charge features and the rule tying them together:
/// total = tenure × monthly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedCharges {
    pub tenure:          String,
    pub monthly_charges: String,
    pub total_charges:   String,
}

impl Default for DerivedCharges {
    fn default() -> Self {
        Self {
            tenure:          "tenure".into(),
            monthly_charges: "MonthlyCharges".into(),
            total_charges:   "TotalCharges".into(),
        }
    }
}

impl DerivedCharges {
    pub fn compute(tenure: f64, monthly: f64) -> f64 {
        tenure * monthly
    }

    /// True if changing `feature` invalidates the total.
    pub fn is_input(&self, feature: &str) -> bool {
        feature == self.tenure || feature == self.monthly_charges
    }

    /// Total charges for a raw record, if the record does not carry its own
    /// and both inputs are present.
    pub fn derive_for(&self, attrs: &CustomerAttributes) -> Option<f64> {
        if attrs.contains(&self.total_charges) {
            return None;
        }
        let tenure = attrs.number(&self.tenure)?;
        let monthly = attrs.number(&self.monthly_charges)?;
        Some(Self::compute(tenure, monthly))
    }

    /// A schema that carries the total must also carry both of its inputs,
    /// otherwise scenario recomputation has nothing to work from.
    pub fn check_schema(&self, schema: &FeatureSchema) -> ChurnResult<()> {
        if !schema.contains(&self.total_charges) {
            return Ok(());
        }
        for input in [&self.tenure, &self.monthly_charges] {
            if !schema.contains(input) {
                return Err(ChurnError::SchemaMismatch {
                    reason: format!(
                        "{} is in the schema but its input '{input}' is not",
                        self.total_charges
                    ),
                });
            }
        }
        Ok(())
    }

    /// Recompute the total inside `vector` from its current tenure and
    /// monthly values. Returns false when the schema lacks any of the three.
    pub fn recompute(&self, vector: &mut FeatureVector) -> bool {
        match (vector.get(&self.tenure), vector.get(&self.monthly_charges)) {
            (Some(tenure), Some(monthly)) => {
                vector.set(&self.total_charges, Self::compute(tenure, monthly))
            }
            _ => false,
        }
    }
}

pub struct FeatureEncoder {
    schema:     Arc<FeatureSchema>,
    vocabulary: CategoryVocabulary,
    derived:    DerivedCharges,
}

impl FeatureEncoder {
    /// Build an encoder, failing fast if the vocabulary or the charge
    /// names disagree with the schema.
    pub fn new(
        schema: Arc<FeatureSchema>,
        vocabulary: CategoryVocabulary,
        derived: DerivedCharges,
    ) -> ChurnResult<Self> {
        vocabulary.check_schema(&schema)?;
        derived.check_schema(&schema)?;
        Ok(Self { schema, vocabulary, derived })
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn vocabulary(&self) -> &CategoryVocabulary {
        &self.vocabulary
    }

    pub fn derived(&self) -> &DerivedCharges {
        &self.derived
    }

    pub fn encode(&self, attrs: &CustomerAttributes) -> ChurnResult<FeatureVector> {
        self.vocabulary.validate(attrs)?;
        Ok(self.project(&self.raw_features(attrs)))
    }

    /// Encode several records. The whole batch is validated before any
    /// record is encoded.
    pub fn encode_batch(&self, records: &[CustomerAttributes]) -> ChurnResult<Vec<FeatureVector>> {
        self.vocabulary.validate_batch(records)?;
        Ok(records
            .iter()
            .map(|r| self.project(&self.raw_features(r)))
            .collect())
    }

    fn raw_features(&self, attrs: &CustomerAttributes) -> HashMap<String, f64> {
        let mut raw = HashMap::new();

        for (field, value) in attrs.iter() {
            match value {
                AttributeValue::Numeric(n) => {
                    raw.insert(field.to_string(), *n);
                }
                AttributeValue::Categorical(observed) => match self.vocabulary.field(field) {
                    Some(group) => {
                        for v in &group.values {
                            let hot = if v == observed { 1.0 } else { 0.0 };
                            raw.insert(indicator_name(field, v), hot);
                        }
                    }
                    None => {
                        raw.insert(indicator_name(field, observed), 1.0);
                    }
                },
            }
        }

        if let Some(total) = self.derived.derive_for(attrs) {
            raw.insert(self.derived.total_charges.clone(), total);
        }
        raw
    }

    fn project(&self, raw: &HashMap<String, f64>) -> FeatureVector {
        let mut vector = FeatureVector::zeros(Arc::clone(&self.schema));
        let mut dropped = 0usize;
        for (name, value) in raw {
            if !vector.set(name, *value) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            log::debug!("encoder: dropped {dropped} encoded features absent from the schema");
        }
        vector
    }
}

//! Category vocabulary: the allowed values for every categorical field.
//!
//! The vocabulary drives three things:
//!   1. Input validation (unknown values are rejected, never coerced)
//!   2. One-hot indicator naming: "<field>_<value>"
//!   3. Mutually exclusive indicator groups for scenario simulation

use crate::{
    attributes::{AttributeValue, CustomerAttributes},
    error::{ChurnError, ChurnResult},
    schema::FeatureSchema,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The indicator column name for `value` of `field`.
pub fn indicator_name(field: &str, value: &str) -> String {
    format!("{field}_{value}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryField {
    pub field:  String,
    pub values: Vec<String>,
}

impl CategoryField {
    pub fn new(field: &str, values: &[&str]) -> Self {
        Self {
            field:  field.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn allows(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// Every indicator name of this group, in vocabulary order.
    pub fn indicators(&self) -> impl Iterator<Item = String> + '_ {
        self.values.iter().map(|v| indicator_name(&self.field, v))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    /// Categorical fields, in validation order.
    pub fields: Vec<CategoryField>,
    /// Fields that pass through the encoder as plain numbers.
    #[serde(default)]
    pub numeric_fields: Vec<String>,
}

impl CategoryVocabulary {
    /// The telecom customer vocabulary the bundled model was trained on.
    pub fn telco() -> Self {
        let internet_addon = ["Yes", "No", "No internet service"];
        Self {
            fields: vec![
                CategoryField::new("gender", &["Male", "Female"]),
                CategoryField::new("Partner", &["Yes", "No"]),
                CategoryField::new("Dependents", &["Yes", "No"]),
                CategoryField::new("PhoneService", &["Yes", "No"]),
                CategoryField::new("MultipleLines", &["Yes", "No", "No phone service"]),
                CategoryField::new("InternetService", &["DSL", "Fiber optic", "No"]),
                CategoryField::new("OnlineSecurity", &internet_addon),
                CategoryField::new("OnlineBackup", &internet_addon),
                CategoryField::new("DeviceProtection", &internet_addon),
                CategoryField::new("TechSupport", &internet_addon),
                CategoryField::new("StreamingTV", &internet_addon),
                CategoryField::new("StreamingMovies", &internet_addon),
                CategoryField::new("Contract", &["Month-to-month", "One year", "Two year"]),
                CategoryField::new("PaperlessBilling", &["Yes", "No"]),
                CategoryField::new(
                    "PaymentMethod",
                    &[
                        "Electronic check",
                        "Mailed check",
                        "Bank transfer (automatic)",
                        "Credit card (automatic)",
                    ],
                ),
            ],
            numeric_fields: vec![
                "SeniorCitizen".into(),
                "tenure".into(),
                "MonthlyCharges".into(),
                "TotalCharges".into(),
            ],
        }
    }

    pub fn field(&self, name: &str) -> Option<&CategoryField> {
        self.fields.iter().find(|f| f.field == name)
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric_fields.iter().any(|f| f == name)
    }

    /// The categorical group that `feature` is an indicator of, if any.
    pub fn group_of(&self, feature: &str) -> Option<&CategoryField> {
        self.fields
            .iter()
            .find(|f| f.indicators().any(|name| name == feature))
    }

    /// Reject any categorical value outside its vocabulary and any
    /// non-numeric value in a numeric field.
    pub fn validate(&self, attrs: &CustomerAttributes) -> ChurnResult<()> {
        self.validate_batch(std::slice::from_ref(attrs))
    }

    /// Validate a batch of records. For the first offending field, the
    /// error lists every invalid value seen across the whole batch.
    pub fn validate_batch(&self, records: &[CustomerAttributes]) -> ChurnResult<()> {
        for field in &self.fields {
            let invalid: Vec<String> = records
                .iter()
                .filter_map(|r| r.get(&field.field))
                .filter(|v| match v {
                    AttributeValue::Categorical(s) => !field.allows(s),
                    AttributeValue::Numeric(_) => true,
                })
                .map(ToString::to_string)
                .collect();

            if !invalid.is_empty() {
                return Err(ChurnError::InvalidCategoryValue {
                    field:  field.field.clone(),
                    values: invalid,
                });
            }
        }

        for name in &self.numeric_fields {
            for record in records {
                match record.get(name) {
                    Some(AttributeValue::Numeric(n)) if n.is_finite() => {}
                    Some(other) => {
                        return Err(ChurnError::NonNumericValue {
                            field: name.clone(),
                            value: other.to_string(),
                        });
                    }
                    None => {}
                }
            }
        }
        Ok(())
    }

    /// Cross-check the vocabulary against a trained schema at start-up.
    ///
    /// A schema column "<field>_<value>" for a declared field must name a
    /// declared value; otherwise the encoder would silently produce an
    /// all-zero group for that field.
    pub fn check_schema(&self, schema: &FeatureSchema) -> ChurnResult<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.field.as_str()) {
                return Err(ChurnError::SchemaMismatch {
                    reason: format!("category field '{}' declared twice", field.field),
                });
            }
        }

        for name in schema.names() {
            let owner = self
                .fields
                .iter()
                .filter(|f| name.starts_with(&format!("{}_", f.field)))
                .max_by_key(|f| f.field.len());

            if let Some(field) = owner {
                let value = &name[field.field.len() + 1..];
                if !field.allows(value) {
                    return Err(ChurnError::SchemaMismatch {
                        reason: format!(
                            "schema feature '{name}' has no matching value in vocabulary for '{}' (allowed: {:?})",
                            field.field, field.values
                        ),
                    });
                }
            }
        }

        for field in &self.fields {
            if !field.indicators().any(|n| schema.contains(&n)) {
                log::warn!(
                    "vocabulary: field '{}' has no indicator column in the feature schema",
                    field.field
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_names_follow_field_value_convention() {
        assert_eq!(indicator_name("Contract", "Two year"), "Contract_Two year");
        let vocab = CategoryVocabulary::telco();
        let pm: Vec<String> = vocab.field("PaymentMethod").unwrap().indicators().collect();
        assert!(pm.contains(&"PaymentMethod_Credit card (automatic)".to_string()));
    }

    #[test]
    fn group_lookup_finds_owner_field() {
        let vocab = CategoryVocabulary::telco();
        assert_eq!(vocab.group_of("Contract_One year").unwrap().field, "Contract");
        assert_eq!(
            vocab.group_of("OnlineSecurity_No internet service").unwrap().field,
            "OnlineSecurity"
        );
        assert!(vocab.group_of("tenure").is_none());
    }

    #[test]
    fn numeric_value_in_categorical_field_is_rejected() {
        let vocab = CategoryVocabulary::telco();
        let attrs = CustomerAttributes::new().with_number("Contract", 2.0);
        let err = vocab.validate(&attrs).unwrap_err();
        assert!(matches!(err, ChurnError::InvalidCategoryValue { ref field, .. } if field == "Contract"));
    }

    #[test]
    fn text_in_numeric_field_is_rejected() {
        let vocab = CategoryVocabulary::telco();
        let attrs = CustomerAttributes::new().with_category("tenure", "ten");
        let err = vocab.validate(&attrs).unwrap_err();
        assert!(matches!(err, ChurnError::NonNumericValue { ref field, .. } if field == "tenure"));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let vocab = CategoryVocabulary::telco();
        let attrs = CustomerAttributes::new().with_number("MonthlyCharges", f64::NAN);
        assert!(vocab.validate(&attrs).is_err());
    }
}

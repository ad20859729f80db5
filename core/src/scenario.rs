//! Retention scenarios: named "what-if" edits to a customer's features.

use crate::{
    error::{ChurnError, ChurnResult},
    schema::FeatureSchema,
    vocabulary::CategoryVocabulary,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One edit applied to a copy of the baseline vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Override {
    /// Overwrite a feature with an absolute value.
    Set { feature: String, value: f64 },
    /// Multiply a numeric feature's current value, e.g. 0.9 for a 10% discount.
    Scale { feature: String, factor: f64 },
    /// Switch a categorical field to another value of its vocabulary.
    Select { field: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name:      String,
    pub overrides: Vec<Override>,
}

impl Scenario {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), overrides: Vec::new() }
    }

    pub fn set(mut self, feature: &str, value: f64) -> Self {
        self.overrides.push(Override::Set { feature: feature.to_string(), value });
        self
    }

    pub fn scale(mut self, feature: &str, factor: f64) -> Self {
        self.overrides.push(Override::Scale { feature: feature.to_string(), factor });
        self
    }

    pub fn select(mut self, field: &str, value: &str) -> Self {
        self.overrides.push(Override::Select {
            field: field.to_string(),
            value: value.to_string(),
        });
        self
    }
}

/// The retention actions offered when no catalog file is supplied.
pub fn default_catalog() -> Vec<Scenario> {
    vec![
        Scenario::new("10% Discount").scale("MonthlyCharges", 0.90),
        Scenario::new("25% Discount").scale("MonthlyCharges", 0.75),
        Scenario::new("Upgrade Contract to 1 Year").select("Contract", "One year"),
        Scenario::new("Add Online Security").select("OnlineSecurity", "Yes"),
        Scenario::new("Add Tech Support").select("TechSupport", "Yes"),
        Scenario::new("Discount + Security")
            .scale("MonthlyCharges", 0.85)
            .select("OnlineSecurity", "Yes"),
    ]
}

fn invalid(scenario: &Scenario, reason: String) -> ChurnError {
    ChurnError::InvalidScenario { scenario: scenario.name.clone(), reason }
}

/// Check every scenario against the schema and vocabulary at start-up, so
/// a typo in the catalog fails loudly instead of being skipped per request.
pub fn validate_catalog(
    scenarios: &[Scenario],
    schema: &FeatureSchema,
    vocabulary: &CategoryVocabulary,
) -> ChurnResult<()> {
    let mut names = HashSet::new();

    for scenario in scenarios {
        if scenario.name.trim().is_empty() {
            return Err(invalid(scenario, "scenario name is blank".into()));
        }
        if !names.insert(scenario.name.as_str()) {
            return Err(invalid(scenario, "duplicate scenario name".into()));
        }
        if scenario.overrides.is_empty() {
            return Err(invalid(scenario, "scenario has no overrides".into()));
        }

        for o in &scenario.overrides {
            match o {
                Override::Set { feature, value } => {
                    if !schema.contains(feature) {
                        return Err(invalid(scenario, format!("unknown feature '{feature}'")));
                    }
                    if !value.is_finite() {
                        return Err(invalid(scenario, format!("non-finite value for '{feature}'")));
                    }
                }
                Override::Scale { feature, factor } => {
                    if !schema.contains(feature) {
                        return Err(invalid(scenario, format!("unknown feature '{feature}'")));
                    }
                    if vocabulary.group_of(feature).is_some() {
                        return Err(invalid(
                            scenario,
                            format!("cannot scale indicator feature '{feature}'"),
                        ));
                    }
                    if !factor.is_finite() {
                        return Err(invalid(scenario, format!("non-finite factor for '{feature}'")));
                    }
                }
                Override::Select { field, value } => {
                    let group = vocabulary.field(field).ok_or_else(|| {
                        invalid(scenario, format!("unknown categorical field '{field}'"))
                    })?;
                    if !group.allows(value) {
                        return Err(invalid(
                            scenario,
                            format!("'{value}' is not an allowed value of '{field}'"),
                        ));
                    }
                    if !group.indicators().any(|n| schema.contains(&n)) {
                        return Err(invalid(
                            scenario,
                            format!("schema has no indicators for '{field}'"),
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telco_schema() -> FeatureSchema {
        FeatureSchema::new(
            [
                "tenure",
                "MonthlyCharges",
                "TotalCharges",
                "Contract_One year",
                "Contract_Two year",
                "OnlineSecurity_No internet service",
                "OnlineSecurity_Yes",
                "TechSupport_No internet service",
                "TechSupport_Yes",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
        .unwrap()
    }

    #[test]
    fn default_catalog_is_valid_for_telco_schema() {
        let vocab = CategoryVocabulary::telco();
        validate_catalog(&default_catalog(), &telco_schema(), &vocab).unwrap();
    }

    #[test]
    fn unknown_feature_is_rejected() {
        let vocab = CategoryVocabulary::telco();
        let catalog = vec![Scenario::new("Typo").set("MonthlyCharge", 10.0)];
        let err = validate_catalog(&catalog, &telco_schema(), &vocab).unwrap_err();
        assert!(matches!(err, ChurnError::InvalidScenario { ref scenario, .. } if scenario == "Typo"));
    }

    #[test]
    fn disallowed_selection_is_rejected() {
        let vocab = CategoryVocabulary::telco();
        let catalog = vec![Scenario::new("Lifetime").select("Contract", "Lifetime")];
        assert!(validate_catalog(&catalog, &telco_schema(), &vocab).is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let vocab = CategoryVocabulary::telco();
        let catalog = vec![
            Scenario::new("A").scale("MonthlyCharges", 0.9),
            Scenario::new("A").scale("MonthlyCharges", 0.8),
        ];
        assert!(validate_catalog(&catalog, &telco_schema(), &vocab).is_err());
    }

    #[test]
    fn scaling_an_indicator_is_rejected() {
        let vocab = CategoryVocabulary::telco();
        let catalog = vec![Scenario::new("Half contract").scale("Contract_One year", 0.5)];
        assert!(validate_catalog(&catalog, &telco_schema(), &vocab).is_err());
    }

    #[test]
    fn catalog_parses_from_json() {
        let json = r#"[
            {"name": "10% Discount", "overrides": [{"op": "scale", "feature": "MonthlyCharges", "factor": 0.9}]},
            {"name": "Two year", "overrides": [{"op": "select", "field": "Contract", "value": "Two year"}]}
        ]"#;
        let catalog: Vec<Scenario> = serde_json::from_str(json).unwrap();
        assert_eq!(catalog[0], Scenario::new("10% Discount").scale("MonthlyCharges", 0.9));
        assert_eq!(catalog[1], Scenario::new("Two year").select("Contract", "Two year"));
    }
}

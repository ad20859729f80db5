//! Configuration loaded from JSON files in a data directory.
//!
//! Only `features.json` is required. The other settings files fall back to
//! the built-in telco defaults when absent. `model.json` is only located
//! here; the runner parses it.

use crate::{
    encoder::DerivedCharges,
    risk::{DecisionThreshold, RiskThresholds},
    scenario::{default_catalog, Scenario},
    simulator::SimulatorConfig,
    vocabulary::CategoryVocabulary,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
struct ThresholdFile {
    #[serde(default)]
    threshold: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct CategoriesFile {
    #[serde(flatten)]
    vocabulary:      CategoryVocabulary,
    #[serde(default)]
    derived_charges: DerivedCharges,
}

#[derive(Debug, Clone, Deserialize)]
struct ScenarioCatalogFile {
    scenarios: Vec<Scenario>,
}

/// Everything loaded once at process start. Immutable afterwards.
#[derive(Debug, Clone)]
pub struct ChurnConfig {
    /// Feature columns in the order the model was trained on.
    pub features:   Vec<String>,
    pub decision:   DecisionThreshold,
    pub vocabulary: CategoryVocabulary,
    pub derived:    DerivedCharges,
    pub risk:       RiskThresholds,
    pub simulator:  SimulatorConfig,
    pub scenarios:  Vec<Scenario>,
    /// Path of the tree model, when the data directory ships one.
    pub model_path: Option<String>,
}

fn read_required<T: DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    serde_json::from_str(&content).map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))
}

fn read_optional<T: DeserializeOwned>(path: &str) -> anyhow::Result<Option<T>> {
    if !Path::new(path).exists() {
        log::info!("config: {path} not found, using defaults");
        return Ok(None);
    }
    read_required(path).map(Some)
}

impl ChurnConfig {
    /// Load from a data directory. Only features.json is required.
    /// In tests, use ChurnConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let features: Vec<String> = read_required(&format!("{data_dir}/features.json"))?;

        let threshold = read_optional::<ThresholdFile>(&format!("{data_dir}/threshold.json"))?
            .and_then(|t| t.threshold)
            .unwrap_or(0.5);
        let decision = DecisionThreshold::new(threshold)?;

        let (vocabulary, derived) =
            match read_optional::<CategoriesFile>(&format!("{data_dir}/categories.json"))? {
                Some(file) => (file.vocabulary, file.derived_charges),
                None => (CategoryVocabulary::telco(), DerivedCharges::default()),
            };

        let risk = read_optional::<RiskThresholds>(&format!("{data_dir}/risk.json"))?
            .unwrap_or_default();
        risk.validate()?;

        let simulator = read_optional::<SimulatorConfig>(&format!("{data_dir}/simulator.json"))?
            .unwrap_or_default();

        let scenarios = read_optional::<ScenarioCatalogFile>(&format!("{data_dir}/scenarios.json"))?
            .map(|f| f.scenarios)
            .unwrap_or_else(default_catalog);

        let model_file = format!("{data_dir}/model.json");
        let model_path = Path::new(&model_file).exists().then_some(model_file);

        log::info!(
            "config: {} features, threshold={threshold}, risk={}/{}, {} scenarios",
            features.len(),
            risk.medium,
            risk.high,
            scenarios.len()
        );

        Ok(Self {
            features,
            decision,
            vocabulary,
            derived,
            risk,
            simulator,
            scenarios,
            model_path,
        })
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            features:   telco_features(),
            decision:   DecisionThreshold::default(),
            vocabulary: CategoryVocabulary::telco(),
            derived:    DerivedCharges::default(),
            risk:       RiskThresholds::standard(),
            simulator:  SimulatorConfig::default(),
            scenarios:  default_catalog(),
            model_path: None,
        }
    }
}

/// The telecom feature schema: numerics followed by drop-first one-hot
/// indicators, in training order.
pub fn telco_features() -> Vec<String> {
    [
        "SeniorCitizen",
        "tenure",
        "MonthlyCharges",
        "TotalCharges",
        "gender_Male",
        "Partner_Yes",
        "Dependents_Yes",
        "PhoneService_Yes",
        "MultipleLines_No phone service",
        "MultipleLines_Yes",
        "InternetService_Fiber optic",
        "InternetService_No",
        "OnlineSecurity_No internet service",
        "OnlineSecurity_Yes",
        "OnlineBackup_No internet service",
        "OnlineBackup_Yes",
        "DeviceProtection_No internet service",
        "DeviceProtection_Yes",
        "TechSupport_No internet service",
        "TechSupport_Yes",
        "StreamingTV_No internet service",
        "StreamingTV_Yes",
        "StreamingMovies_No internet service",
        "StreamingMovies_Yes",
        "Contract_One year",
        "Contract_Two year",
        "PaperlessBilling_Yes",
        "PaymentMethod_Credit card (automatic)",
        "PaymentMethod_Electronic check",
        "PaymentMethod_Mailed check",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

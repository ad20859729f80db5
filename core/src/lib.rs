//! churn-core: telecom churn scoring with feature encoding and
//! counterfactual retention-scenario simulation.

pub mod attributes;
pub mod audit;
pub mod config;
pub mod encoder;
pub mod error;
pub mod explain;
pub mod model;
pub mod predictor;
pub mod risk;
pub mod scenario;
pub mod schema;
pub mod scoring;
pub mod simulator;
pub mod store;
pub mod types;
pub mod vocabulary;

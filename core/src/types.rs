//! Shared primitive types used across the crate.

/// A model output in [0, 1]: the probability that the customer churns.
pub type Probability = f64;

/// A column name in the feature schema, e.g. `"Contract_Two year"`.
pub type FeatureName = String;

/// The user a prediction is recorded against.
pub type UserId = String;

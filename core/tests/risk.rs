//! Risk buckets and the binary churn decision.

use churn_core::{
    error::ChurnError,
    risk::{DecisionThreshold, RiskBucket, RiskThresholds},
};

#[test]
fn standard_cutoffs_bucket_probabilities() {
    let t = RiskThresholds::standard();
    assert_eq!(t.bucket(0.0), RiskBucket::Low);
    assert_eq!(t.bucket(0.39), RiskBucket::Low);
    assert_eq!(t.bucket(0.4), RiskBucket::Medium);
    assert_eq!(t.bucket(0.69), RiskBucket::Medium);
    assert_eq!(t.bucket(0.7), RiskBucket::High);
    assert_eq!(t.bucket(1.0), RiskBucket::High);
}

#[test]
fn conservative_cutoffs_shift_buckets() {
    let t = RiskThresholds::conservative();
    assert_eq!(t.bucket(0.45), RiskBucket::Low);
    assert_eq!(t.bucket(0.75), RiskBucket::Medium);
    assert_eq!(t.bucket(0.8), RiskBucket::High);
}

#[test]
fn inverted_cutoffs_are_rejected() {
    let err = RiskThresholds::new(0.8, 0.5).unwrap_err();
    assert!(matches!(err, ChurnError::InvalidThresholds { .. }));
    assert!(RiskThresholds::new(-0.1, 0.5).is_err());
    assert!(RiskThresholds::new(0.4, 1.2).is_err());
}

#[test]
fn decision_threshold_is_independent_of_buckets() {
    let decision = DecisionThreshold::new(0.35).unwrap();
    let buckets = RiskThresholds::standard();

    // Churn is predicted while the bucket is still Low.
    assert!(decision.will_churn(0.36));
    assert_eq!(buckets.bucket(0.36), RiskBucket::Low);
    assert!(!decision.will_churn(0.34));
}

#[test]
fn default_decision_threshold_is_half() {
    let decision = DecisionThreshold::default();
    assert!(decision.will_churn(0.5));
    assert!(!decision.will_churn(0.4999));
    assert!(DecisionThreshold::new(1.5).is_err());
}

#[test]
fn labels_render_for_display() {
    assert_eq!(RiskBucket::High.to_string(), "High Risk");
    assert_eq!(RiskBucket::Medium.label(), "Medium Risk");
    assert_eq!(RiskBucket::Low.label(), "Low Risk");
}

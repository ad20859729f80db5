//! Feature encoder: validation, one-hot expansion, schema projection.

use churn_core::{
    attributes::CustomerAttributes,
    config::{telco_features, ChurnConfig},
    encoder::{DerivedCharges, FeatureEncoder},
    error::ChurnError,
    schema::FeatureSchema,
    vocabulary::CategoryVocabulary,
};
use std::sync::Arc;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn encoder_for(names: &[&str]) -> FeatureEncoder {
    let schema = FeatureSchema::new(names.iter().map(|s| s.to_string()).collect()).unwrap();
    FeatureEncoder::new(
        Arc::new(schema),
        CategoryVocabulary::telco(),
        DerivedCharges::default(),
    )
    .unwrap()
}

fn telco_encoder() -> FeatureEncoder {
    let config = ChurnConfig::default_test();
    let schema = FeatureSchema::new(config.features).unwrap();
    FeatureEncoder::new(Arc::new(schema), config.vocabulary, config.derived).unwrap()
}

fn sample_customer() -> CustomerAttributes {
    CustomerAttributes::new()
        .with_category("gender", "Male")
        .with_number("SeniorCitizen", 0.0)
        .with_category("Partner", "Yes")
        .with_number("tenure", 10.0)
        .with_number("MonthlyCharges", 55.0)
        .with_category("Contract", "Two year")
        .with_category("InternetService", "DSL")
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn output_matches_schema_length_and_order() {
    let encoder = telco_encoder();
    let v = encoder.encode(&sample_customer()).unwrap();

    assert_eq!(v.len(), telco_features().len());
    let names: Vec<&str> = v.iter().map(|(n, _)| n).collect();
    let expected = telco_features();
    assert_eq!(names, expected.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn end_to_end_example_encodes_expected_indicators() {
    let encoder = encoder_for(&[
        "SeniorCitizen",
        "tenure",
        "MonthlyCharges",
        "TotalCharges",
        "gender_Male",
        "Partner_Yes",
        "Dependents_Yes",
        "Contract_One year",
        "Contract_Two year",
        "InternetService_DSL",
        "InternetService_Fiber optic",
        "PaymentMethod_Electronic check",
    ]);
    let v = encoder.encode(&sample_customer()).unwrap();

    assert_eq!(v.get("gender_Male"), Some(1.0));
    assert_eq!(v.get("Partner_Yes"), Some(1.0));
    assert_eq!(v.get("Contract_Two year"), Some(1.0));
    assert_eq!(v.get("Contract_One year"), Some(0.0));
    assert_eq!(v.get("InternetService_DSL"), Some(1.0));
    assert_eq!(v.get("InternetService_Fiber optic"), Some(0.0));
    assert_eq!(v.get("tenure"), Some(10.0));
    assert_eq!(v.get("MonthlyCharges"), Some(55.0));
    assert_eq!(v.get("TotalCharges"), Some(550.0));

    // Fields the record never mentioned are zero.
    assert_eq!(v.get("Dependents_Yes"), Some(0.0));
    assert_eq!(v.get("PaymentMethod_Electronic check"), Some(0.0));
}

#[test]
fn unknown_contract_value_is_rejected() {
    let encoder = telco_encoder();
    let attrs = CustomerAttributes::new().with_category("Contract", "Lifetime");

    match encoder.encode(&attrs).unwrap_err() {
        ChurnError::InvalidCategoryValue { field, values } => {
            assert_eq!(field, "Contract");
            assert_eq!(values, vec!["Lifetime".to_string()]);
        }
        other => panic!("expected InvalidCategoryValue, got {other}"),
    }
}

#[test]
fn supplied_total_charges_pass_through() {
    let encoder = telco_encoder();
    let attrs = sample_customer().with_number("TotalCharges", 3300.0);
    let v = encoder.encode(&attrs).unwrap();
    assert_eq!(v.get("TotalCharges"), Some(3300.0));
}

#[test]
fn total_charges_stay_zero_without_both_inputs() {
    let encoder = telco_encoder();
    let attrs = CustomerAttributes::new().with_number("tenure", 12.0);
    let v = encoder.encode(&attrs).unwrap();
    assert_eq!(v.get("TotalCharges"), Some(0.0));
}

#[test]
fn reference_category_encodes_to_all_zero_group() {
    let encoder = telco_encoder();
    let attrs = CustomerAttributes::new()
        .with_category("gender", "Female")
        .with_category("Contract", "Month-to-month");
    let v = encoder.encode(&attrs).unwrap();

    assert_eq!(v.len(), telco_features().len(), "dropped indicators must not grow the vector");
    assert_eq!(v.get("gender_Male"), Some(0.0));
    assert_eq!(v.get("Contract_One year"), Some(0.0));
    assert_eq!(v.get("Contract_Two year"), Some(0.0));
}

#[test]
fn undeclared_fields_are_dropped_by_projection() {
    let encoder = telco_encoder();
    let attrs = CustomerAttributes::new()
        .with_category("Region", "North")
        .with_number("LoyaltyPoints", 42.0);
    let v = encoder.encode(&attrs).unwrap();
    assert!(v.values().iter().all(|x| *x == 0.0));
}

#[test]
fn empty_record_encodes_to_zero_vector() {
    let encoder = telco_encoder();
    let v = encoder.encode(&CustomerAttributes::new()).unwrap();
    assert_eq!(v.len(), telco_features().len());
    assert!(v.values().iter().all(|x| *x == 0.0));
}

#[test]
fn batch_validation_lists_every_bad_value() {
    let encoder = telco_encoder();
    let records = vec![
        sample_customer(),
        CustomerAttributes::new().with_category("Contract", "Lifetime"),
        CustomerAttributes::new().with_category("Contract", "Weekly"),
    ];

    match encoder.encode_batch(&records).unwrap_err() {
        ChurnError::InvalidCategoryValue { field, values } => {
            assert_eq!(field, "Contract");
            assert_eq!(values, vec!["Lifetime".to_string(), "Weekly".to_string()]);
        }
        other => panic!("expected InvalidCategoryValue, got {other}"),
    }
}

#[test]
fn batch_encodes_each_record() {
    let encoder = telco_encoder();
    let records = vec![
        sample_customer(),
        CustomerAttributes::new().with_category("Contract", "One year"),
    ];
    let vectors = encoder.encode_batch(&records).unwrap();
    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0].get("Contract_Two year"), Some(1.0));
    assert_eq!(vectors[1].get("Contract_One year"), Some(1.0));
}

#[test]
fn schema_with_unknown_indicator_fails_at_construction() {
    // "Credit card" without the "(automatic)" suffix would silently
    // zero the group if it were accepted.
    let schema = FeatureSchema::new(vec![
        "tenure".into(),
        "PaymentMethod_Credit card".into(),
    ])
    .unwrap();
    let result = FeatureEncoder::new(
        Arc::new(schema),
        CategoryVocabulary::telco(),
        DerivedCharges::default(),
    );
    match result {
        Err(ChurnError::SchemaMismatch { reason }) => {
            assert!(reason.contains("PaymentMethod_Credit card"), "reason: {reason}")
        }
        Err(other) => panic!("expected SchemaMismatch, got {other}"),
        Ok(_) => panic!("expected SchemaMismatch, encoder was built"),
    }
}

#[test]
fn misnamed_charge_input_fails_at_construction() {
    let config = ChurnConfig::default_test();
    let schema = FeatureSchema::new(config.features).unwrap();
    let derived = DerivedCharges { tenure: "Tenure".into(), ..DerivedCharges::default() };

    match FeatureEncoder::new(Arc::new(schema), config.vocabulary, derived) {
        Err(ChurnError::SchemaMismatch { reason }) => {
            assert!(reason.contains("Tenure"), "reason: {reason}")
        }
        Err(other) => panic!("expected SchemaMismatch, got {other}"),
        Ok(_) => panic!("expected SchemaMismatch, encoder was built"),
    }
}

#[test]
fn schema_without_total_needs_no_charge_inputs() {
    let encoder = encoder_for(&["SeniorCitizen", "Contract_One year"]);
    assert_eq!(encoder.schema().len(), 2);
}

#[test]
fn attributes_parse_from_json_form() {
    let json = r#"{"gender": "Male", "tenure": 10, "MonthlyCharges": 55.0, "Contract": "Two year"}"#;
    let attrs: CustomerAttributes = serde_json::from_str(json).unwrap();
    let v = telco_encoder().encode(&attrs).unwrap();
    assert_eq!(v.get("TotalCharges"), Some(550.0));
    assert_eq!(v.get("Contract_Two year"), Some(1.0));
}

//! Customer attribute records: the raw form fields before encoding.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single raw field value. JSON strings become categorical values and
/// JSON numbers become numeric values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Numeric(f64),
    Categorical(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Numeric(n)     => write!(f, "{n}"),
            AttributeValue::Categorical(s) => write!(f, "{s}"),
        }
    }
}

/// A customer record keyed by field name.
///
/// Fields may be partial: anything the caller leaves out encodes to zero
/// once the vector is projected onto the feature schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerAttributes {
    fields: BTreeMap<String, AttributeValue>,
}

impl CustomerAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, field: &str, value: &str) -> Self {
        self.insert(field, AttributeValue::Categorical(value.to_string()));
        self
    }

    pub fn with_number(mut self, field: &str, value: f64) -> Self {
        self.insert(field, AttributeValue::Numeric(value));
        self
    }

    pub fn insert(&mut self, field: &str, value: AttributeValue) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&AttributeValue> {
        self.fields.get(field)
    }

    /// The numeric value of `field`, if present and numeric.
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.fields.get(field) {
            Some(AttributeValue::Numeric(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

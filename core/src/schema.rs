//! Feature schema and the vectors aligned to it.
//!
//! RULE: a FeatureVector always has exactly schema.len() values, in
//! schema order. Nothing outside this module touches the raw Vec.

use crate::{
    error::{ChurnError, ChurnResult},
    types::FeatureName,
};
use std::collections::HashMap;
use std::sync::Arc;

/// The ordered list of column names the trained model expects.
/// Built once at start-up and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    names: Vec<FeatureName>,
    index: HashMap<FeatureName, usize>,
}

impl FeatureSchema {
    /// Build a schema, rejecting empty, blank or duplicate names.
    pub fn new(names: Vec<FeatureName>) -> ChurnResult<Self> {
        if names.is_empty() {
            return Err(ChurnError::SchemaMismatch {
                reason: "feature schema is empty".into(),
            });
        }

        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ChurnError::SchemaMismatch {
                    reason: format!("feature at position {i} has a blank name"),
                });
            }
            if index.insert(name.clone(), i).is_some() {
                return Err(ChurnError::SchemaMismatch {
                    reason: format!("feature '{name}' appears more than once"),
                });
            }
        }

        Ok(Self { names, index })
    }

    pub fn names(&self) -> &[FeatureName] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

/// Numeric values aligned 1:1 with a [`FeatureSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema: Arc<FeatureSchema>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// An all-zero vector for `schema`.
    pub fn zeros(schema: Arc<FeatureSchema>) -> Self {
        let values = vec![0.0; schema.len()];
        Self { schema, values }
    }

    pub fn from_values(schema: Arc<FeatureSchema>, values: Vec<f64>) -> ChurnResult<Self> {
        if values.len() != schema.len() {
            return Err(ChurnError::SchemaMismatch {
                reason: format!(
                    "vector has {} values but schema has {} features",
                    values.len(),
                    schema.len()
                ),
            });
        }
        Ok(Self { schema, values })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn shared_schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema.index_of(name).map(|i| self.values[i])
    }

    /// Overwrite `name`. Returns false (and changes nothing) when the
    /// schema has no such feature.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match self.schema.index_of(name) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    /// `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.schema
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::trace;

use crate::schema::FormSchema;

/// A single form value. Edits always arrive as text; defaults may be numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric reading of the value, parsing text leniently (surrounding whitespace
    /// is ignored). Non-finite numbers are rejected.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        n.is_finite().then_some(n)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

/// Flat mapping of field name to value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormState {
    values: BTreeMap<String, FieldValue>,
}

impl FormState {
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn insert(&mut self, key: String, value: FieldValue) {
        self.values.insert(key, value);
    }
}

impl FromIterator<(String, FieldValue)> for FormState {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Owns the applicant form for one schema.
#[derive(Debug, Clone)]
pub struct FormController {
    schema: FormSchema,
    state: FormState,
}

impl FormController {
    pub fn new(schema: FormSchema) -> Self {
        let state = schema.defaults();
        Self { schema, state }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.state.get(key)
    }

    /// Write `value` into `key`. No validation; every other field is left untouched.
    pub fn update_field(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        trace!(field = %key, value = %value, "Field updated");
        self.state.insert(key, value);
    }

    /// Restore every field to its schema default.
    pub fn reset(&mut self) {
        self.state = self.schema.defaults();
    }
}

//! Employee record submitted for churn analysis
//!
//! A record always carries all thirty attributes. It starts from the schema
//! defaults and is edited one field at a time; record files may be partial
//! and are overlaid on the defaults.

mod schema;

use std::collections::BTreeMap;
use std::path::Path;

use eyre::Context;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

pub use schema::{
    DEPARTMENTS, DefaultValue, EDUCATION_FIELDS, FIELD_COUNT, FieldGroup, FieldKind, FieldSpec, FieldValue, GENDERS,
    JOB_ROLES, MARITAL_STATUSES, SCHEMA, YES_NO, display_order, field, index_of,
};

/// Errors from building or editing a record
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("{field}: '{value}' is not an integer")]
    InvalidInteger { field: String, value: String },

    #[error("{field}: '{value}' is not allowed (expected one of: {allowed})")]
    NotInDomain {
        field: String,
        value: String,
        allowed: String,
    },

    #[error("{field}: expected {expected}")]
    WrongType { field: String, expected: String },

    #[error("Invalid assignment '{0}', expected FIELD=VALUE")]
    InvalidAssignment(String),
}

/// One employee, as sent to `/predict` and `/generate-retention-plan`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, serde_json::Value>")]
pub struct EmployeeRecord {
    /// Values aligned with `SCHEMA`
    values: Vec<FieldValue>,
}

impl Default for EmployeeRecord {
    fn default() -> Self {
        Self {
            values: SCHEMA.iter().map(FieldSpec::default_value).collect(),
        }
    }
}

impl EmployeeRecord {
    /// Value of a field by wire name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        index_of(name).map(|i| &self.values[i])
    }

    /// Value at a schema position
    pub fn get_at(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(index)
    }

    /// Replace a field, validating it against the schema
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<(), RecordError> {
        let idx = index_of(name).ok_or_else(|| RecordError::UnknownField(name.to_string()))?;
        SCHEMA[idx].validate(&value)?;
        debug!(field = name, %value, "set: field updated");
        self.values[idx] = value;
        Ok(())
    }

    /// Parse and replace a field from user input
    pub fn set_raw(&mut self, name: &str, raw: &str) -> Result<(), RecordError> {
        let spec = field(name).ok_or_else(|| RecordError::UnknownField(name.to_string()))?;
        let value = spec.parse(raw)?;
        self.set(name, value)
    }

    /// Apply a `FIELD=VALUE` assignment
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), RecordError> {
        let (name, raw) = assignment
            .split_once('=')
            .ok_or_else(|| RecordError::InvalidAssignment(assignment.to_string()))?;
        self.set_raw(name.trim(), raw)
    }

    /// Overlay a partial mapping onto this record
    ///
    /// Unknown keys are rejected; absent keys keep their current value.
    pub fn overlay(&mut self, map: &BTreeMap<String, serde_json::Value>) -> Result<(), RecordError> {
        debug!(keys = map.len(), "overlay: called");
        for (name, json) in map {
            let idx = index_of(name).ok_or_else(|| RecordError::UnknownField(name.clone()))?;
            self.values[idx] = SCHEMA[idx].from_json(json)?;
        }
        Ok(())
    }

    /// Build a record from a complete mapping; every field must be present
    pub fn from_map(map: BTreeMap<String, serde_json::Value>) -> Result<Self, RecordError> {
        if let Some(missing) = SCHEMA.iter().find(|f| !map.contains_key(f.name)) {
            return Err(RecordError::MissingField(missing.name.to_string()));
        }
        let mut record = Self::default();
        record.overlay(&map)?;
        Ok(record)
    }

    /// Load a partial YAML or JSON record file and overlay it on the defaults
    pub fn load_overlay(path: &Path) -> eyre::Result<Self> {
        debug!(path = %path.display(), "load_overlay: called");
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read record file {}", path.display()))?;
        // YAML is a superset of JSON, one parser covers both
        let map: BTreeMap<String, serde_json::Value> =
            serde_yaml::from_str(&content).context("Failed to parse record file")?;
        let mut record = Self::default();
        record.overlay(&map)?;
        Ok(record)
    }

    /// Iterate fields in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&'static FieldSpec, &FieldValue)> {
        SCHEMA.iter().zip(self.values.iter())
    }
}

impl TryFrom<BTreeMap<String, serde_json::Value>> for EmployeeRecord {
    type Error = RecordError;

    fn try_from(map: BTreeMap<String, serde_json::Value>) -> Result<Self, Self::Error> {
        Self::from_map(map)
    }
}

impl Serialize for EmployeeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FIELD_COUNT))?;
        for (spec, value) in self.iter() {
            match value {
                FieldValue::Integer(n) => map.serialize_entry(spec.name, n)?,
                FieldValue::Text(s) => map.serialize_entry(spec.name, s)?,
            }
        }
        map.end()
    }
}

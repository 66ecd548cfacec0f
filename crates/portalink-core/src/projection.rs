//! Projection engine.
//!
//! Resolves canonical fields from an arbitrary vendor JSON document via a
//! configured canonical-name → dotted-vendor-path mapping. The walk is
//! total: a missing segment or a non-object intermediate yields an explicit
//! [`ProjectedValue::Unresolved`] sentinel, never an error. Projection is
//! deterministic and side-effect free, which is what lets the mapping
//! configuration screen preview a mapping against a live vendor response.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::EntityMappingDefinition;
use crate::error::{PortalError, Result};

/// Canonical-field-name → dotted vendor path. An empty path means the field
/// is unmapped. Insertion order is preserved for diagnostic display.
pub type FieldMap = IndexMap<String, String>;

/// Outcome of resolving one canonical field against a vendor document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum ProjectedValue {
    /// The mapped path resolved to a value.
    Resolved(Value),
    /// A path is configured but did not resolve against the document.
    Unresolved,
    /// No vendor path is configured for this field.
    Unmapped,
}

impl ProjectedValue {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// The resolved JSON value, if any.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Resolved(value) => Some(value),
            _ => None,
        }
    }
}

/// A vendor document projected onto the canonical schema.
///
/// Ephemeral; consumed by identity verification or returned to the
/// configuration-test surface, never persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectedRecord {
    fields: IndexMap<String, ProjectedValue>,
}

impl ProjectedRecord {
    pub fn get(&self, field: &str) -> Option<&ProjectedValue> {
        self.fields.get(field)
    }

    /// The resolved value for a field, if the field resolved.
    pub fn resolved(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).and_then(ProjectedValue::as_value)
    }

    /// The resolved value rendered as a string, for scalar comparison.
    ///
    /// Vendor APIs are loose about types (ids as numbers, booleans as
    /// strings), so comparisons happen on the string rendering.
    pub fn resolved_str(&self, field: &str) -> Option<String> {
        match self.resolved(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProjectedValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Count of fields that resolved to a value.
    pub fn resolved_count(&self) -> usize {
        self.fields.values().filter(|v| v.is_resolved()).count()
    }
}

/// Resolve a dot-delimited path against a JSON document.
///
/// Total over all inputs: returns `None` when any segment is absent or the
/// current value is not an object while segments remain.
pub fn resolve_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Unwrap the single record out of a vendor response document.
///
/// Vendor endpoints return either a single JSON object or an array whose
/// first element is the record. An empty array or empty object means no
/// record matched the query; anything else is a malformed response.
fn unwrap_record(document: &Value) -> Result<&Value> {
    let record = match document {
        Value::Array(items) => items.first().ok_or(PortalError::RecordNotFound)?,
        other => other,
    };

    match record.as_object() {
        Some(object) if object.is_empty() => Err(PortalError::RecordNotFound),
        Some(_) => Ok(record),
        None => Err(PortalError::MalformedDocument),
    }
}

/// Project a vendor response document onto the canonical schema.
///
/// Every entry of `field_map` appears in the result: as
/// [`ProjectedValue::Resolved`] when the path resolved,
/// [`ProjectedValue::Unresolved`] when it did not, and
/// [`ProjectedValue::Unmapped`] when the configured path is empty.
pub fn project(document: &Value, field_map: &FieldMap) -> Result<ProjectedRecord> {
    let record = unwrap_record(document)?;

    let mut fields = IndexMap::with_capacity(field_map.len());
    for (canonical, path) in field_map {
        fields.insert(canonical.clone(), project_field(record, path));
    }
    Ok(ProjectedRecord { fields })
}

/// Project a vendor document against a full entity definition.
///
/// Like [`project`], but iterates the definition's canonical field list, so
/// fields absent from `field_map` still appear as
/// [`ProjectedValue::Unmapped`] in the result.
pub fn project_entity(
    document: &Value,
    definition: &EntityMappingDefinition,
    field_map: &FieldMap,
) -> Result<ProjectedRecord> {
    let record = unwrap_record(document)?;

    let mut fields = IndexMap::with_capacity(definition.fields.len());
    for spec in &definition.fields {
        let path = field_map.get(&spec.name).map(String::as_str).unwrap_or("");
        fields.insert(spec.name.clone(), project_field(record, path));
    }
    Ok(ProjectedRecord { fields })
}

fn project_field(record: &Value, path: &str) -> ProjectedValue {
    let path = path.trim();
    if path.is_empty() {
        return ProjectedValue::Unmapped;
    }
    match resolve_path(record, path) {
        Some(value) => ProjectedValue::Resolved(value.clone()),
        None => ProjectedValue::Unresolved,
    }
}

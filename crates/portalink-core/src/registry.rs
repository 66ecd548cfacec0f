//! Tenant field mappings and their write-time validation.
//!
//! One [`TenantFieldMapping`] row exists per (tenant, entity kind), created
//! and updated by the administrative mapping form with upsert semantics.
//! Validation happens at write time only; whether the mapped vendor paths
//! actually resolve against real data is a runtime concern surfaced by the
//! projection engine through the configuration-test flow, because the
//! vendor schema is not known statically.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::entity::{EntityKind, EntityMappingDefinition};
use crate::projection::FieldMap;

/// Per-tenant, per-entity-kind mapping configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantFieldMapping {
    pub id: String,
    pub org_code: String,
    pub kind: EntityKind,
    /// Endpoint template; overrides the definition's default.
    pub endpoint: String,
    /// Canonical field name → vendor path. Empty path = unmapped.
    pub field_map: FieldMap,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TenantFieldMapping {
    /// Creates a new mapping row with a generated id and current timestamps.
    pub fn new(
        org_code: impl Into<String>,
        kind: EntityKind,
        endpoint: impl Into<String>,
        field_map: FieldMap,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            org_code: org_code.into(),
            kind,
            endpoint: endpoint.into(),
            field_map,
            created_at: now,
            updated_at: now,
        }
    }

    /// The configured vendor path for a canonical field, if non-empty.
    pub fn vendor_path(&self, canonical: &str) -> Option<&str> {
        self.field_map
            .get(canonical)
            .map(String::as_str)
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Rejections produced by [`validate_mapping`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingValidationError {
    #[error("Missing vendor paths for required fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),

    #[error("Endpoint must not be empty")]
    EmptyEndpoint,

    #[error("Endpoint must contain a {{placeholder}} token: {0}")]
    NoPlaceholder(String),

    #[error("Unknown canonical field: {0}")]
    UnknownField(String),
}

impl From<MappingValidationError> for crate::error::PortalError {
    fn from(err: MappingValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Validate a proposed tenant mapping against its entity definition.
///
/// Rejects when a required field has no (or an empty) vendor path, when the
/// endpoint is empty or carries no placeholder, or when the mapping names a
/// canonical field the definition does not declare.
pub fn validate_mapping(
    definition: &EntityMappingDefinition,
    proposed: &TenantFieldMapping,
) -> Result<(), MappingValidationError> {
    let endpoint = proposed.endpoint.trim();
    if endpoint.is_empty() {
        return Err(MappingValidationError::EmptyEndpoint);
    }
    if !(endpoint.contains('{') && endpoint.contains('}')) {
        return Err(MappingValidationError::NoPlaceholder(endpoint.to_string()));
    }

    for canonical in proposed.field_map.keys() {
        if definition.field(canonical).is_none() {
            return Err(MappingValidationError::UnknownField(canonical.clone()));
        }
    }

    let missing: Vec<String> = definition
        .required_fields()
        .filter(|name| proposed.vendor_path(name).is_none())
        .map(String::from)
        .collect();
    if !missing.is_empty() {
        return Err(MappingValidationError::MissingRequiredFields(missing));
    }

    Ok(())
}

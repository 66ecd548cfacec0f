//! Identity verification over projected records.
//!
//! After a vendor document has been projected onto the canonical schema,
//! the identity field the caller queried by must match the value that was
//! used to query: a vendor that ignores the lookup parameter and returns
//! some other record must not be trusted. The distinct failure modes here
//! exist for internal logging and the administrative preview only; the
//! patient-facing flow collapses all of them into one uniform outcome.

use portalink_core::{ProjectedRecord, ProjectedValue};

/// Canonical field carrying the patient's EHR identifier.
pub const PATIENT_ID_FIELD: &str = "ehrPatientId";

/// Canonical field the patient login flow verifies against.
pub const PATIENT_EMAIL_FIELD: &str = "email";

/// The minimal authenticated identity derived from a verified lookup.
///
/// Never persisted in this layer; handed to the session/token issuance
/// mechanism outside it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PatientIdentity {
    pub id: String,
    pub email: String,
}

/// Why verification failed. Internal detail; callers facing patients must
/// collapse every variant into the same external signal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Identity field '{0}' has no vendor path configured")]
    FieldUnmapped(String),

    #[error("Identity field '{0}' did not resolve against the vendor document")]
    FieldUnresolved(String),

    #[error("Identity field '{0}' does not match the queried value")]
    ValueMismatch(String),
}

impl From<IdentityError> for portalink_core::PortalError {
    fn from(_: IdentityError) -> Self {
        // Collapsed: the crate-level error does not say which way
        // verification failed.
        Self::IdentityMismatch
    }
}

/// Verify that a projected record belongs to the identity it was queried
/// by, returning the patient identity on success.
///
/// The comparison is case-insensitive: vendors disagree about email
/// casing, and the patient typed theirs free-form. The record's id comes
/// from the mapped [`PATIENT_ID_FIELD`]; when that field did not resolve,
/// a synthetic id is issued so the caller still gets a usable identity.
pub fn verify_identity(
    projected: &ProjectedRecord,
    expected_field: &str,
    expected_value: &str,
) -> Result<PatientIdentity, IdentityError> {
    let actual = match projected.get(expected_field) {
        None | Some(ProjectedValue::Unmapped) => {
            tracing::warn!(field = expected_field, "Identity field not mapped");
            return Err(IdentityError::FieldUnmapped(expected_field.to_string()));
        }
        Some(ProjectedValue::Unresolved) => {
            tracing::warn!(
                field = expected_field,
                "Identity field missing from vendor response"
            );
            return Err(IdentityError::FieldUnresolved(expected_field.to_string()));
        }
        Some(ProjectedValue::Resolved(_)) => projected
            .resolved_str(expected_field)
            .ok_or_else(|| IdentityError::FieldUnresolved(expected_field.to_string()))?,
    };

    if actual.to_lowercase() != expected_value.to_lowercase() {
        // Log the field, never the values: the expected value is what the
        // caller typed and the actual value belongs to someone's record.
        tracing::warn!(field = expected_field, "Identity value mismatch");
        return Err(IdentityError::ValueMismatch(expected_field.to_string()));
    }

    Ok(PatientIdentity {
        id: projected
            .resolved_str(PATIENT_ID_FIELD)
            .unwrap_or_else(synthetic_patient_id),
        email: actual,
    })
}

/// Placeholder id for identities without a resolved EHR id, and for the
/// look-alike identities the anti-enumeration path hands out.
pub fn synthetic_patient_id() -> String {
    format!("temp-{}", uuid::Uuid::new_v4())
}

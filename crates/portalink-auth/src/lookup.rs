//! Patient lookup against a tenant's configured EHR vendor.
//!
//! Thin composition over the record pipeline: fetch-and-project the
//! patient record for an email, then verify the record actually belongs
//! to that email before trusting it. Every failure is a structured
//! [`PortalError`](portalink_core::PortalError) so the login flow can
//! inspect the cause internally while presenting a uniform face
//! externally.

use std::sync::Arc;

use portalink_config::{ConnectionStorage, CredentialCipher, MappingStorage, OrgCode};
use portalink_core::{EntityKind, Result};
use portalink_ehr::{RecordService, VendorClient};

use crate::identity::{PATIENT_EMAIL_FIELD, PatientIdentity, verify_identity};

/// Looks up patients by their identifying email through the tenant's
/// vendor API.
pub struct PatientDirectory {
    records: RecordService,
}

impl PatientDirectory {
    pub fn new(
        connections: Arc<dyn ConnectionStorage>,
        mappings: Arc<dyn MappingStorage>,
        cipher: CredentialCipher,
        client: VendorClient,
    ) -> Self {
        Self {
            records: RecordService::new(connections, mappings, cipher, client),
        }
    }

    /// Find the patient a given email belongs to.
    ///
    /// The email is used both to query the vendor (substituted into the
    /// endpoint template) and as the expected value the projected record
    /// must match. A record whose mapped email differs from the queried
    /// one is rejected, not returned.
    pub async fn lookup_by_email(&self, org: &OrgCode, email: &str) -> Result<PatientIdentity> {
        let projected = self
            .records
            .fetch_projected(org, EntityKind::Patient, email)
            .await?;

        let identity = verify_identity(&projected, PATIENT_EMAIL_FIELD, email)?;
        tracing::debug!(org = %org, patient_id = %identity.id, "Patient record verified");
        Ok(identity)
    }
}

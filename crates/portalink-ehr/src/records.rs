//! Tenant-scoped record fetching.
//!
//! The proxy pipeline shared by every entity kind: load the tenant's
//! mapping and connection, decrypt the credential, build the request,
//! call the vendor, and project the response onto the canonical schema.
//! Patient login layers identity verification on top of this; the
//! appointment and invoice surfaces consume the projection directly.

use std::collections::HashMap;
use std::sync::Arc;

use portalink_config::{ConnectionStorage, CredentialCipher, MappingStorage, OrgCode};
use portalink_core::{EntityKind, PortalError, ProjectedRecord, Result};

use crate::client::VendorClient;
use crate::request::{build_request, single_placeholder};

/// Fetches and projects vendor records for a tenant.
pub struct RecordService {
    connections: Arc<dyn ConnectionStorage>,
    mappings: Arc<dyn MappingStorage>,
    cipher: CredentialCipher,
    client: VendorClient,
}

impl RecordService {
    pub fn new(
        connections: Arc<dyn ConnectionStorage>,
        mappings: Arc<dyn MappingStorage>,
        cipher: CredentialCipher,
        client: VendorClient,
    ) -> Self {
        Self {
            connections,
            mappings,
            cipher,
            client,
        }
    }

    /// Fetch one record of the given kind and project it.
    ///
    /// `key` is the lookup value bound to the endpoint template's
    /// placeholder: an email for the patient endpoint, an id for
    /// appointments and invoices. Configuration is read once per call and
    /// treated as immutable for the request's duration.
    pub async fn fetch_projected(
        &self,
        org: &OrgCode,
        kind: EntityKind,
        key: &str,
    ) -> Result<ProjectedRecord> {
        let mapping = self
            .mappings
            .find_by_org_and_kind(org, kind)
            .await?
            .ok_or_else(|| {
                tracing::error!(org = %org, kind = %kind, "Field mapping not configured");
                PortalError::missing_mapping(org.as_str(), kind.as_str())
            })?;

        let connection = self.connections.find_by_org(org).await?.ok_or_else(|| {
            tracing::error!(org = %org, "Vendor API connection not configured");
            PortalError::missing_connection(org.as_str())
        })?;

        let endpoint = mapping.endpoint.trim();
        if endpoint.is_empty() {
            tracing::error!(org = %org, kind = %kind, "Endpoint not configured in mapping");
            return Err(PortalError::configuration(format!(
                "Endpoint not configured in {kind} mapping"
            )));
        }

        // Decrypted only for the lifetime of this request; tamper or
        // format failure aborts the fetch outright.
        let credential = self.cipher.decrypt(&connection.credential)?;

        let mut substitutions = HashMap::new();
        if let Some(placeholder) = single_placeholder(endpoint) {
            substitutions.insert(placeholder, key.to_string());
        }
        let request = build_request(&connection, &credential, endpoint, &substitutions)?;

        tracing::debug!(org = %org, kind = %kind, url = %request.url, "Fetching vendor record");
        let document = self.client.fetch(&request).await?;

        let definition = portalink_core::definition(kind);
        portalink_core::project_entity(&document, definition, &mapping.field_map)
    }
}

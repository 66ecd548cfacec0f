//! Administrative configuration-test surface.
//!
//! Backs the "test API" and mapping-preview screens: administrators point
//! a configured endpoint at a known record and see what comes back, with
//! per-field resolution states. Unlike the patient-facing login flow,
//! this surface reports causes distinctly; enumeration risk does not
//! apply to a tenant administrator probing their own vendor account.

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use portalink_config::TenantApiConnection;
use portalink_core::{PortalError, ProjectedRecord, TenantFieldMapping, is_valid_email};

use crate::client::VendorClient;
use crate::request::{build_request, single_placeholder};

/// Result of probing a configured endpoint with a test value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointTestReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EndpointTestReport {
    fn failure(error: impl Into<String>, status: Option<u16>, duration_ms: u64) -> Self {
        Self {
            success: false,
            status,
            duration_ms,
            record_count: None,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Probe a configured endpoint with a test email and report what happened.
///
/// The test email is required and validated before any call is made; the
/// report carries the response body, status, record count, and elapsed
/// time for display on the configuration screen.
pub async fn test_endpoint(
    client: &VendorClient,
    connection: &TenantApiConnection,
    credential: &str,
    endpoint_template: &str,
    test_email: &str,
) -> EndpointTestReport {
    if test_email.trim().is_empty() {
        return EndpointTestReport::failure(
            "Email is required. Please provide a valid email address.",
            None,
            0,
        );
    }
    if !is_valid_email(test_email) {
        return EndpointTestReport::failure(
            "Invalid email format. Please provide a valid email address.",
            None,
            0,
        );
    }

    let substitutions = substitutions_for(endpoint_template, test_email);
    let request = match build_request(connection, credential, endpoint_template, &substitutions) {
        Ok(request) => request,
        Err(err) => return EndpointTestReport::failure(err.to_string(), None, 0),
    };

    let started = Instant::now();
    let result = client.fetch_with_status(&request).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok((status, data)) => {
            let record_count = match &data {
                Value::Array(items) => items.len(),
                _ => 1,
            };
            tracing::debug!(record_count, duration_ms, "Endpoint test succeeded");
            EndpointTestReport {
                success: true,
                status: Some(status),
                duration_ms,
                record_count: Some(record_count),
                data: Some(data),
                error: None,
            }
        }
        Err(err) => {
            let status = match &err {
                crate::client::VendorError::Status(code) => Some(*code),
                _ => None,
            };
            EndpointTestReport::failure(err.to_string(), status, duration_ms)
        }
    }
}

/// Fetch a record through a tenant mapping and project it, returning the
/// per-field resolution states for the mapping-preview screen.
///
/// Errors stay distinct here: a `RecordNotFound` tells the administrator
/// the test value matched nothing, which is exactly the diagnostic the
/// screen exists to show.
pub async fn preview_mapping(
    client: &VendorClient,
    connection: &TenantApiConnection,
    credential: &str,
    mapping: &TenantFieldMapping,
    test_value: &str,
) -> Result<ProjectedRecord, PortalError> {
    let definition = portalink_core::definition(mapping.kind);
    let substitutions = substitutions_for(&mapping.endpoint, test_value);
    let request = build_request(connection, credential, &mapping.endpoint, &substitutions)?;

    let document = client.fetch(&request).await?;
    portalink_core::project_entity(&document, definition, &mapping.field_map)
}

/// Bind the test value to whatever single placeholder the template uses.
fn substitutions_for(template: &str, value: &str) -> HashMap<String, String> {
    let mut substitutions = HashMap::new();
    if let Some(placeholder) = single_placeholder(template) {
        substitutions.insert(placeholder, value.to_string());
    }
    substitutions
}

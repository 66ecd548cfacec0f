//! Vendor EHR HTTP client.
//!
//! Performs the single GET against a tenant's configured vendor API and
//! classifies failures: a timeout or connection failure is retryable
//! vendor unavailability, a non-2xx status is a vendor request error with
//! the status code logged internally, and an undecodable body is a
//! malformed document. No retries happen here; a single failure is
//! surfaced as-is to the interactive request path.

use std::time::Duration;

use serde_json::Value;

use portalink_core::PortalError;

use crate::request::BuiltRequest;

/// Configuration for the vendor HTTP client.
#[derive(Debug, Clone)]
pub struct VendorClientConfig {
    /// HTTP request timeout (default: 10 seconds).
    pub request_timeout: Duration,

    /// Maximum response size in bytes (default: 1 MB).
    pub max_response_size: usize,

    /// Whether to allow HTTP (non-HTTPS) vendor URLs.
    /// This should only be enabled for testing.
    pub allow_http: bool,
}

impl Default for VendorClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_response_size: 1024 * 1024, // 1 MB
            allow_http: false,
        }
    }
}

impl VendorClientConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the maximum response size.
    #[must_use]
    pub fn with_max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }

    /// Allows HTTP (non-HTTPS) vendor URLs.
    ///
    /// # Warning
    ///
    /// This should only be used for testing. Production vendor calls
    /// carry credentials and must use HTTPS.
    #[must_use]
    pub fn with_allow_http(mut self, allow: bool) -> Self {
        self.allow_http = allow;
        self
    }
}

/// Errors from a single vendor API call.
#[derive(Debug, thiserror::Error)]
pub enum VendorError {
    /// The request exceeded the configured timeout.
    #[error("Vendor request timed out")]
    Timeout,

    /// The request failed before a response arrived.
    #[error("Network error: {0}")]
    Network(String),

    /// The vendor returned a non-success status code.
    #[error("Vendor returned status {0}")]
    Status(u16),

    /// The response body could not be decoded as JSON.
    #[error("Failed to decode vendor response: {0}")]
    Decode(String),

    /// The response exceeded the maximum allowed size.
    #[error("Response exceeds maximum size of {max_size} bytes")]
    ResponseTooLarge { max_size: usize },

    /// The vendor URL scheme is not allowed (must be HTTPS in production).
    #[error("Invalid URL scheme for vendor call: {0}")]
    InvalidScheme(String),
}

impl From<VendorError> for PortalError {
    fn from(err: VendorError) -> Self {
        match err {
            VendorError::Timeout | VendorError::Network(_) => {
                PortalError::vendor_unavailable(err.to_string())
            }
            VendorError::Status(code) => PortalError::VendorStatus(code),
            VendorError::Decode(_) | VendorError::ResponseTooLarge { .. } => {
                PortalError::MalformedDocument
            }
            VendorError::InvalidScheme(scheme) => {
                PortalError::configuration(format!("Vendor base URL must be HTTPS, got {scheme}"))
            }
        }
    }
}

/// HTTP client for tenant-configured vendor EHR APIs.
pub struct VendorClient {
    http_client: reqwest::Client,
    config: VendorClientConfig,
}

impl VendorClient {
    /// Creates a new vendor client with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// practice).
    #[must_use]
    pub fn new(config: VendorClientConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            config,
        }
    }

    /// Creates a new vendor client with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(VendorClientConfig::default())
    }

    /// Fetch a record from the vendor API.
    ///
    /// Returns the decoded JSON body, which may be a single object or an
    /// array; interpretation is the projection engine's concern.
    pub async fn fetch(&self, request: &BuiltRequest) -> Result<Value, VendorError> {
        self.fetch_with_status(request).await.map(|(_, body)| body)
    }

    /// Fetch a record, also returning the response status code.
    ///
    /// Used by the configuration-test surface, which reports the status
    /// to administrators.
    pub async fn fetch_with_status(
        &self,
        request: &BuiltRequest,
    ) -> Result<(u16, Value), VendorError> {
        self.validate_scheme(&request.url)?;

        let mut builder = self.http_client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::warn!(url = %request.url, "Vendor request timed out");
                VendorError::Timeout
            } else {
                tracing::warn!(url = %request.url, error = %e, "Vendor request failed");
                VendorError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %request.url, status = status.as_u16(), "Vendor returned error status");
            return Err(VendorError::Status(status.as_u16()));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_response_size
        {
            return Err(VendorError::ResponseTooLarge {
                max_size: self.config.max_response_size,
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                VendorError::Timeout
            } else {
                tracing::warn!(url = %request.url, error = %e, "Vendor response was not valid JSON");
                VendorError::Decode(e.to_string())
            }
        })?;

        tracing::debug!(url = %request.url, "Vendor record fetched");
        Ok((status.as_u16(), body))
    }

    fn validate_scheme(&self, url: &str) -> Result<(), VendorError> {
        if url.starts_with("https://") {
            return Ok(());
        }
        if url.starts_with("http://") && self.config.allow_http {
            return Ok(());
        }
        let scheme = url.split("://").next().unwrap_or("").to_string();
        Err(VendorError::InvalidScheme(scheme))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(url: String) -> BuiltRequest {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Authorization".to_string(), "Bearer secret123".to_string());
        BuiltRequest { url, headers }
    }

    fn test_client() -> VendorClient {
        VendorClient::new(VendorClientConfig::default().with_allow_http(true))
    }

    #[test]
    fn test_config_defaults() {
        let config = VendorClientConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_response_size, 1024 * 1024);
        assert!(!config.allow_http);
    }

    #[test]
    fn test_config_builder() {
        let config = VendorClientConfig::new()
            .with_request_timeout(Duration::from_secs(5))
            .with_max_response_size(512 * 1024)
            .with_allow_http(true);

        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_response_size, 512 * 1024);
        assert!(config.allow_http);
    }

    #[test]
    fn test_https_required_by_default() {
        let client = VendorClient::with_defaults();
        let err = client
            .validate_scheme("http://ehr.example.com/patients/1")
            .unwrap_err();
        assert!(matches!(err, VendorError::InvalidScheme(s) if s == "http"));

        assert!(
            client
                .validate_scheme("https://ehr.example.com/patients/1")
                .is_ok()
        );
    }

    #[test]
    fn test_vendor_error_maps_to_portal_error() {
        assert!(matches!(
            PortalError::from(VendorError::Timeout),
            PortalError::VendorUnavailable(_)
        ));
        assert!(matches!(
            PortalError::from(VendorError::Status(502)),
            PortalError::VendorStatus(502)
        ));
        assert!(matches!(
            PortalError::from(VendorError::Decode("bad".to_string())),
            PortalError::MalformedDocument
        ));
        assert!(PortalError::from(VendorError::Timeout).is_retryable());
        assert!(!PortalError::from(VendorError::Status(500)).is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_decodes_object_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients/P1"))
            .and(header("Authorization", "Bearer secret123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"patient_id": "P1"})),
            )
            .mount(&server)
            .await;

        let body = test_client()
            .fetch(&request(format!("{}/patients/P1", server.uri())))
            .await
            .unwrap();
        assert_eq!(body["patient_id"], "P1");
    }

    #[tokio::test]
    async fn test_fetch_passes_array_body_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"patient_id": "P1"}])),
            )
            .mount(&server)
            .await;

        let body = test_client()
            .fetch(&request(format!("{}/patients/P1", server.uri())))
            .await
            .unwrap();
        assert!(body.is_array());
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = test_client()
            .fetch(&request(format!("{}/patients/P1", server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, VendorError::Status(404)));
    }

    #[tokio::test]
    async fn test_fetch_undecodable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = test_client()
            .fetch(&request(format!("{}/patients/P1", server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, VendorError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_network_error() {
        // Port 1 is never listening.
        let err = test_client()
            .fetch(&request("http://127.0.0.1:1/patients/P1".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VendorError::Network(_) | VendorError::Timeout
        ));
    }
}

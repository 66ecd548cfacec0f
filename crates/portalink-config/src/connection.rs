//! Tenant API connection configuration.
//!
//! One row per tenant describing how to reach that tenant's EHR vendor:
//! base URL, encrypted credential, and the auth scheme used for outbound
//! calls. The credential stays encrypted until request time; the auth
//! scheme is stored as the raw configured string so an unsupported value
//! surfaces as a configuration error where the request is built, not as a
//! deserialization failure on read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;

use portalink_core::PortalError;

/// Authentication scheme for outbound vendor API calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthScheme {
    /// `Authorization: Bearer <credential>`
    Bearer,
    /// `X-Auth-Key: <credential>`
    XAuthKey,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bearer => "bearer",
            Self::XAuthKey => "x-auth-key",
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthScheme {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bearer" => Ok(Self::Bearer),
            "x-auth-key" => Ok(Self::XAuthKey),
            other => Err(PortalError::unsupported_auth_scheme(other)),
        }
    }
}

/// Per-tenant vendor API connection. At most one per tenant (upsert by
/// `org_code`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantApiConnection {
    pub id: String,
    pub org_code: String,
    pub base_url: Url,
    /// Credential encrypted at rest (`iv:tag:payload` hex segments).
    /// Never logged or returned to the browser in plaintext.
    pub credential: String,
    /// Raw configured auth scheme string; parsed at request-build time.
    pub auth_scheme: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TenantApiConnection {
    /// Creates a new connection row with a generated id and current
    /// timestamps. `credential` must already be encrypted.
    pub fn new(
        org_code: impl Into<String>,
        base_url: Url,
        credential: impl Into<String>,
        auth_scheme: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            org_code: org_code.into(),
            base_url,
            credential: credential.into(),
            auth_scheme: auth_scheme.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Parse the stored auth scheme, rejecting unsupported values.
    pub fn parsed_auth_scheme(&self) -> Result<AuthScheme, PortalError> {
        self.auth_scheme.parse()
    }
}

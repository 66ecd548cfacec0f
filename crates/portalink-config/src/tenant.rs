//! Tenant resolution.
//!
//! All configuration and data is partitioned by tenant. The core never
//! infers a default tenant: when the calling context carries no
//! organization, resolution fails closed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use portalink_core::{PortalError, Result};

/// Opaque tenant identifier (the identity provider's organization code).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgCode(String);

impl OrgCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrgCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrgCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Resolves the caller's tenant from session context.
///
/// Implemented outside this crate against the identity/organization
/// provider; tests use fixed resolvers.
#[async_trait]
pub trait TenantResolver: Send + Sync {
    /// The organization for the current caller, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity provider cannot be reached.
    async fn current_org(&self) -> Result<Option<OrgCode>>;
}

/// Resolve the caller's tenant, failing closed when absent.
pub async fn resolve_required(resolver: &dyn TenantResolver) -> Result<OrgCode> {
    resolver
        .current_org()
        .await?
        .ok_or(PortalError::TenantNotResolved)
}

/// A resolver pinned to one organization, for tests and embedded use.
#[derive(Debug, Clone)]
pub struct FixedTenantResolver(pub Option<OrgCode>);

#[async_trait]
impl TenantResolver for FixedTenantResolver {
    async fn current_org(&self) -> Result<Option<OrgCode>> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_required_with_org() {
        let resolver = FixedTenantResolver(Some(OrgCode::new("org_123")));
        let org = resolve_required(&resolver).await.unwrap();
        assert_eq!(org.as_str(), "org_123");
    }

    #[tokio::test]
    async fn test_resolve_required_fails_closed() {
        let resolver = FixedTenantResolver(None);
        let err = resolve_required(&resolver).await.unwrap_err();
        assert!(matches!(err, PortalError::TenantNotResolved));
    }

    #[test]
    fn test_org_code_serde_transparent() {
        let org = OrgCode::new("org_123");
        assert_eq!(serde_json::to_string(&org).unwrap(), "\"org_123\"");
    }
}

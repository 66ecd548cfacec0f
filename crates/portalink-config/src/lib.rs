//! Tenant configuration for the Portalink EHR integration layer.
//!
//! This crate provides:
//! - Per-tenant vendor API connections with credentials encrypted at rest
//! - Credential encryption via an injected [`CredentialCipher`]
//! - Tenant resolution that fails closed when no organization is present
//! - Storage traits for configuration rows, plus an in-memory backend
//!
//! Configuration is read-only at request time from the integration
//! engine's perspective; it is written by the administrative configuration
//! screens through the upsert operations defined here.

pub mod connection;
pub mod credentials;
pub mod storage;
pub mod tenant;

pub use connection::{AuthScheme, TenantApiConnection};
pub use credentials::{CREDENTIAL_KEY_ENV, CredentialCipher};
pub use storage::{ConnectionStorage, MappingStorage, MemoryPortalStore};
pub use tenant::{FixedTenantResolver, OrgCode, TenantResolver, resolve_required};

//! Storage traits for tenant configuration.
//!
//! Defines the persistence interface for [`TenantApiConnection`] and
//! [`TenantFieldMapping`] rows. No core logic depends on the storage
//! engine beyond these keyed find/upsert operations; backends implement
//! them against their database. [`MemoryPortalStore`] is the in-memory
//! backend used by tests and embedded deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use portalink_core::{EntityKind, Result, TenantFieldMapping, validate_mapping};

use crate::connection::TenantApiConnection;
use crate::tenant::OrgCode;

/// Storage operations for per-tenant vendor API connections.
#[async_trait]
pub trait ConnectionStorage: Send + Sync {
    /// Find the connection for a tenant.
    ///
    /// Returns `None` if the tenant has not configured one.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_org(&self, org: &OrgCode) -> Result<Option<TenantApiConnection>>;

    /// Create or replace the tenant's connection.
    ///
    /// At most one connection exists per tenant; an existing row keeps its
    /// id and creation timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn upsert(&self, connection: &TenantApiConnection) -> Result<()>;
}

/// Storage operations for per-tenant field mappings.
#[async_trait]
pub trait MappingStorage: Send + Sync {
    /// Find the mapping for a tenant and entity kind.
    ///
    /// Returns `None` if none has been configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_org_and_kind(
        &self,
        org: &OrgCode,
        kind: EntityKind,
    ) -> Result<Option<TenantFieldMapping>>;

    /// Create or replace the mapping row for (tenant, entity kind).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn upsert(&self, mapping: &TenantFieldMapping) -> Result<()>;

    /// Validate a proposed mapping against its shipped entity definition,
    /// then upsert it.
    ///
    /// This is the write path the administrative mapping form goes
    /// through; required-field coverage is enforced here, at write time,
    /// never at read time.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the offending fields, or a
    /// storage error.
    async fn validate_and_upsert(&self, mapping: &TenantFieldMapping) -> Result<()> {
        let definition = portalink_core::definition(mapping.kind);
        validate_mapping(definition, mapping)?;
        self.upsert(mapping).await
    }
}

/// In-memory implementation of both storage traits.
#[derive(Debug, Default)]
pub struct MemoryPortalStore {
    connections: RwLock<HashMap<String, TenantApiConnection>>,
    mappings: RwLock<HashMap<(String, EntityKind), TenantFieldMapping>>,
}

impl MemoryPortalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionStorage for MemoryPortalStore {
    async fn find_by_org(&self, org: &OrgCode) -> Result<Option<TenantApiConnection>> {
        let connections = self.connections.read().await;
        Ok(connections.get(org.as_str()).cloned())
    }

    async fn upsert(&self, connection: &TenantApiConnection) -> Result<()> {
        let mut connections = self.connections.write().await;
        let mut row = connection.clone();
        if let Some(existing) = connections.get(&connection.org_code) {
            row.id = existing.id.clone();
            row.created_at = existing.created_at;
        }
        row.updated_at = time::OffsetDateTime::now_utc();
        connections.insert(row.org_code.clone(), row);
        Ok(())
    }
}

#[async_trait]
impl MappingStorage for MemoryPortalStore {
    async fn find_by_org_and_kind(
        &self,
        org: &OrgCode,
        kind: EntityKind,
    ) -> Result<Option<TenantFieldMapping>> {
        let mappings = self.mappings.read().await;
        Ok(mappings.get(&(org.as_str().to_string(), kind)).cloned())
    }

    async fn upsert(&self, mapping: &TenantFieldMapping) -> Result<()> {
        let mut mappings = self.mappings.write().await;
        let key = (mapping.org_code.clone(), mapping.kind);
        let mut row = mapping.clone();
        if let Some(existing) = mappings.get(&key) {
            row.id = existing.id.clone();
            row.created_at = existing.created_at;
        }
        row.updated_at = time::OffsetDateTime::now_utc();
        mappings.insert(key, row);
        Ok(())
    }
}

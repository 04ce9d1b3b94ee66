use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::database::manager::ConnectionDescriptor;
use crate::database::models::{Assignment, Principal, Tenant, TenantId, TenantStatus};

/// Errors from the shared registry database
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt registry row: {0}")]
    CorruptRow(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Read/write access to tenant, principal and assignment records.
///
/// Only single-row reads and writes; no multi-row transactions.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn find_tenant(&self, id: &TenantId) -> Result<Option<Tenant>, RegistryError>;

    /// Lookup against the unique subdomain index
    async fn find_tenant_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, RegistryError>;

    /// Tenants owned by `owner_id`, oldest first
    async fn tenants_owned_by(&self, owner_id: Uuid) -> Result<Vec<Tenant>, RegistryError>;

    /// Every tenant regardless of status, ordered by name
    async fn list_tenants(&self) -> Result<Vec<Tenant>, RegistryError>;

    /// Active assignments of a member, oldest first
    async fn active_assignments(&self, principal_id: Uuid) -> Result<Vec<Assignment>, RegistryError>;

    /// The active assignment for a (principal, tenant) pair, if any
    async fn find_active_assignment(
        &self,
        principal_id: Uuid,
        tenant_id: &TenantId,
    ) -> Result<Option<Assignment>, RegistryError>;

    async fn find_principal(&self, id: Uuid) -> Result<Option<Principal>, RegistryError>;

    /// Persist the descriptor and flip the initialization flag
    async fn mark_initialized(
        &self,
        id: &TenantId,
        descriptor: &ConnectionDescriptor,
    ) -> Result<(), RegistryError>;

    async fn set_tenant_status(&self, id: &TenantId, status: TenantStatus) -> Result<(), RegistryError>;

    /// Flip a member's assignment inactive. Principal rows are left alone.
    async fn deactivate_assignment(
        &self,
        principal_id: Uuid,
        tenant_id: &TenantId,
    ) -> Result<(), RegistryError>;

    /// Cheap liveness probe for `/health`
    async fn ping(&self) -> Result<(), RegistryError>;
}

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::ConnectionDescriptor;
use crate::database::models::{Assignment, Principal, Tenant, TenantId, TenantStatus};
use crate::database::registry::{RegistryError, RegistryStore};

#[derive(Default)]
struct Records {
    tenants: Vec<Tenant>,
    principals: Vec<Principal>,
    assignments: Vec<Assignment>,
}

/// In-process registry for tests and local development.
///
/// Enforces the same uniqueness rules as `sql/registry.sql`: unique tenant
/// ids and subdomains, at most one active assignment per (principal, tenant).
#[derive(Default)]
pub struct MemoryRegistry {
    records: RwLock<Records>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_tenant(&self, mut tenant: Tenant) -> Result<(), RegistryError> {
        let mut records = self.records.write().await;
        if records.tenants.iter().any(|t| t.id == tenant.id) {
            return Err(RegistryError::Conflict(format!("tenant '{}' already exists", tenant.id)));
        }
        tenant.subdomain = tenant.subdomain.map(|s| s.to_ascii_lowercase());
        if let Some(subdomain) = &tenant.subdomain {
            if records.tenants.iter().any(|t| t.subdomain.as_ref() == Some(subdomain)) {
                return Err(RegistryError::Conflict(format!("subdomain '{}' already taken", subdomain)));
            }
        }
        records.tenants.push(tenant);
        Ok(())
    }

    pub async fn insert_principal(&self, principal: Principal) -> Result<(), RegistryError> {
        let mut records = self.records.write().await;
        if records.principals.iter().any(|p| p.id == principal.id) {
            return Err(RegistryError::Conflict(format!("principal '{}' already exists", principal.id)));
        }
        records.principals.push(principal);
        Ok(())
    }

    pub async fn insert_assignment(&self, assignment: Assignment) -> Result<(), RegistryError> {
        let mut records = self.records.write().await;
        if assignment.active
            && records.assignments.iter().any(|a| {
                a.active && a.principal_id == assignment.principal_id && a.tenant_id == assignment.tenant_id
            })
        {
            return Err(RegistryError::Conflict(format!(
                "principal '{}' already has an active assignment to '{}'",
                assignment.principal_id, assignment.tenant_id
            )));
        }
        records.assignments.push(assignment);
        Ok(())
    }
}

#[async_trait]
impl RegistryStore for MemoryRegistry {
    async fn find_tenant(&self, id: &TenantId) -> Result<Option<Tenant>, RegistryError> {
        let records = self.records.read().await;
        Ok(records.tenants.iter().find(|t| &t.id == id).cloned())
    }

    async fn find_tenant_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, RegistryError> {
        let records = self.records.read().await;
        Ok(records
            .tenants
            .iter()
            .find(|t| t.subdomain.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(subdomain)))
            .cloned())
    }

    async fn tenants_owned_by(&self, owner_id: Uuid) -> Result<Vec<Tenant>, RegistryError> {
        let records = self.records.read().await;
        let mut owned: Vec<Tenant> = records
            .tenants
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        // Stable: insertion order breaks created_at ties
        owned.sort_by_key(|t| t.created_at);
        Ok(owned)
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>, RegistryError> {
        let records = self.records.read().await;
        let mut tenants = records.tenants.clone();
        tenants.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(tenants)
    }

    async fn active_assignments(&self, principal_id: Uuid) -> Result<Vec<Assignment>, RegistryError> {
        let records = self.records.read().await;
        let mut assignments: Vec<Assignment> = records
            .assignments
            .iter()
            .filter(|a| a.active && a.principal_id == principal_id)
            .cloned()
            .collect();
        assignments.sort_by_key(|a| a.created_at);
        Ok(assignments)
    }

    async fn find_active_assignment(
        &self,
        principal_id: Uuid,
        tenant_id: &TenantId,
    ) -> Result<Option<Assignment>, RegistryError> {
        let records = self.records.read().await;
        Ok(records
            .assignments
            .iter()
            .find(|a| a.active && a.principal_id == principal_id && &a.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_principal(&self, id: Uuid) -> Result<Option<Principal>, RegistryError> {
        let records = self.records.read().await;
        Ok(records.principals.iter().find(|p| p.id == id).cloned())
    }

    async fn mark_initialized(
        &self,
        id: &TenantId,
        descriptor: &ConnectionDescriptor,
    ) -> Result<(), RegistryError> {
        let mut records = self.records.write().await;
        let tenant = records
            .tenants
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| RegistryError::NotFound(format!("tenant '{}'", id)))?;
        tenant.connection = Some(descriptor.clone());
        tenant.is_initialized = true;
        tenant.updated_at = Utc::now();
        Ok(())
    }

    async fn set_tenant_status(&self, id: &TenantId, status: TenantStatus) -> Result<(), RegistryError> {
        let mut records = self.records.write().await;
        let tenant = records
            .tenants
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| RegistryError::NotFound(format!("tenant '{}'", id)))?;
        tenant.status = status;
        tenant.updated_at = Utc::now();
        Ok(())
    }

    async fn deactivate_assignment(
        &self,
        principal_id: Uuid,
        tenant_id: &TenantId,
    ) -> Result<(), RegistryError> {
        let mut records = self.records.write().await;
        for assignment in records
            .assignments
            .iter_mut()
            .filter(|a| a.principal_id == principal_id && &a.tenant_id == tenant_id)
        {
            assignment.active = false;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), RegistryError> {
        Ok(())
    }
}

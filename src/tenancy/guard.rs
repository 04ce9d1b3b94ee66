use std::sync::Arc;
use tracing::debug;

use crate::database::models::{Principal, Role, TenantId};
use crate::database::registry::RegistryStore;
use crate::tenancy::TenancyError;

/// The single authority on whether a principal may use a tenant.
///
/// | role          | authorized when                                      |
/// |---------------|------------------------------------------------------|
/// | GLOBAL_ADMIN  | always                                               |
/// | TENANT_OWNER  | tenant exists, is owned by the principal, is ACTIVE  |
/// | TENANT_MEMBER | active assignment exists and the tenant is ACTIVE    |
///
/// Anonymous callers and principals that are themselves not ACTIVE are denied.
pub struct AccessGuard {
    registry: Arc<dyn RegistryStore>,
}

impl AccessGuard {
    pub fn new(registry: Arc<dyn RegistryStore>) -> Self {
        Self { registry }
    }

    pub async fn authorize(&self, principal: Option<&Principal>, tenant_id: &TenantId) -> Result<bool, TenancyError> {
        let Some(principal) = principal else {
            return Ok(false);
        };
        if !principal.is_active() {
            debug!("Principal {} is not active", principal.id);
            return Ok(false);
        }

        let allowed = match principal.role {
            Role::GlobalAdmin => true,
            Role::TenantOwner => self
                .registry
                .find_tenant(tenant_id)
                .await?
                .is_some_and(|t| t.owner_id == principal.id && t.is_active()),
            Role::TenantMember => {
                let assignment = self.registry.find_active_assignment(principal.id, tenant_id).await?;
                match assignment {
                    Some(_) => self
                        .registry
                        .find_tenant(tenant_id)
                        .await?
                        .is_some_and(|t| t.is_active()),
                    None => false,
                }
            }
        };

        debug!(
            "Principal {} ({}) {} for tenant '{}'",
            principal.id,
            principal.role,
            if allowed { "authorized" } else { "denied" },
            tenant_id
        );
        Ok(allowed)
    }
}

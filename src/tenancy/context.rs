use axum::http::request::Parts;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::TenancyConfig;
use crate::database::manager::{ClientFactory, ConnectionManager};
use crate::database::models::{Principal, TenantId, TenantMetadata};
use crate::database::registry::RegistryStore;
use crate::tenancy::guard::AccessGuard;
use crate::tenancy::resolver::TenantResolver;
use crate::tenancy::session::SessionProvider;
use crate::tenancy::TenancyError;

/// Everything a tenant-scoped handler needs. The only approved way to get a
/// tenant connection.
#[derive(Debug, Clone)]
pub struct TenantContext<H> {
    pub tenant_id: TenantId,
    pub connection: H,
    pub principal: Principal,
    pub tenant: TenantMetadata,
}

/// Cross-tenant view for global admins. Connections are opened only for the
/// tenants a caller actually asks for.
pub struct MultiTenantContext<F: ClientFactory> {
    pub principal: Principal,
    pub tenants: Vec<TenantMetadata>,
    connections: Arc<ConnectionManager<F>>,
}

impl<F: ClientFactory> MultiTenantContext<F> {
    pub async fn connection_for(&self, tenant_id: &TenantId) -> Result<F::Handle, TenancyError> {
        self.connections.get_connection(tenant_id).await
    }
}

impl<F: ClientFactory> Clone for MultiTenantContext<F> {
    fn clone(&self) -> Self {
        Self {
            principal: self.principal.clone(),
            tenants: self.tenants.clone(),
            connections: self.connections.clone(),
        }
    }
}

/// Composes session, resolution, authorization and connection lookup.
/// Holds no per-request state.
pub struct ContextBuilder<F: ClientFactory> {
    registry: Arc<dyn RegistryStore>,
    session: Arc<dyn SessionProvider>,
    resolver: TenantResolver,
    guard: AccessGuard,
    connections: Arc<ConnectionManager<F>>,
}

impl<F: ClientFactory> ContextBuilder<F> {
    pub fn new(
        registry: Arc<dyn RegistryStore>,
        session: Arc<dyn SessionProvider>,
        connections: Arc<ConnectionManager<F>>,
        config: TenancyConfig,
    ) -> Self {
        Self {
            resolver: TenantResolver::new(registry.clone(), config),
            guard: AccessGuard::new(registry.clone()),
            registry,
            session,
            connections,
        }
    }

    pub fn connections(&self) -> &Arc<ConnectionManager<F>> {
        &self.connections
    }

    pub async fn build_context(&self, parts: &Parts) -> Result<TenantContext<F::Handle>, TenancyError> {
        let principal = self.session.principal(parts).await?.ok_or(TenancyError::Unauthorized)?;

        let tenant_id = self.resolver.resolve(parts, &principal).await?;

        if !self.guard.authorize(Some(&principal), &tenant_id).await? {
            warn!("Principal {} denied access to tenant '{}'", principal.id, tenant_id);
            return Err(TenancyError::Forbidden);
        }

        let connection = self.connections.get_connection(&tenant_id).await?;

        let tenant = self
            .registry
            .find_tenant(&tenant_id)
            .await?
            .ok_or_else(|| TenancyError::NotFound(tenant_id.clone()))?;

        debug!("Built context for tenant '{}' and principal {}", tenant_id, principal.id);
        Ok(TenantContext {
            tenant_id,
            connection,
            principal,
            tenant: tenant.metadata(),
        })
    }

    pub async fn build_multi_tenant_context(&self, parts: &Parts) -> Result<MultiTenantContext<F>, TenancyError> {
        let principal = self.session.principal(parts).await?.ok_or(TenancyError::Unauthorized)?;

        if !principal.is_global_admin() || !principal.is_active() {
            warn!("Principal {} ({}) requested a multi-tenant context", principal.id, principal.role);
            return Err(TenancyError::Forbidden);
        }

        let tenants = self
            .registry
            .list_tenants()
            .await?
            .iter()
            .map(|t| t.metadata())
            .collect();

        Ok(MultiTenantContext {
            principal,
            tenants,
            connections: self.connections.clone(),
        })
    }
}

use thiserror::Error;

use crate::database::manager::ConnectionError;
use crate::database::models::{TenantId, TenantStatus};
use crate::database::registry::RegistryError;

/// Everything that can stop a request from getting a tenant context.
///
/// Never recovered locally; the HTTP layer owns the status code.
#[derive(Debug, Error)]
pub enum TenancyError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("No tenant could be resolved for this request")]
    NoTenantResolvable,

    #[error("Access to tenant denied")]
    Forbidden,

    #[error("Tenant '{0}' not found")]
    NotFound(TenantId),

    #[error("Tenant '{tenant_id}' is {status}")]
    NotActive { tenant_id: TenantId, status: TenantStatus },

    #[error("Tenant '{0}' has not been initialized")]
    NotInitialized(TenantId),

    #[error("Tenant database unreachable: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

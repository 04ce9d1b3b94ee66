pub mod assignment;
pub mod principal;
pub mod tenant;

pub use assignment::Assignment;
pub use principal::{Principal, PrincipalStatus, Role};
pub use tenant::{Tenant, TenantId, TenantMetadata, TenantStatus};

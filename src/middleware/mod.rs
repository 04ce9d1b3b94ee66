pub mod response;
pub mod tenant_context;

pub use response::{ApiResponse, ApiResult};
pub use tenant_context::{multi_tenant_context_middleware, tenant_context_middleware};

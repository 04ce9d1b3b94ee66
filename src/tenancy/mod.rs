//! Request-to-tenant plumbing: who is calling, which shop they mean, whether
//! they may use it, and the connection to hand them.

pub mod context;
pub mod error;
pub mod guard;
pub mod resolver;
pub mod session;

pub use context::{ContextBuilder, MultiTenantContext, TenantContext};
pub use error::TenancyError;
pub use guard::AccessGuard;
pub use resolver::{Strategy, TenantResolver};
pub use session::{JwtSessionProvider, SessionProvider};

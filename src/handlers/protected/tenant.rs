// handlers/protected/tenant.rs - GET /api/tenant[/health]

use axum::extract::{Extension, State};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::manager::ClientFactory;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::tenancy::{TenancyError, TenantContext};

/// Current tenant metadata and the calling principal
pub async fn tenant_show<F>(Extension(ctx): Extension<TenantContext<F::Handle>>) -> ApiResult<Value>
where
    F: ClientFactory + 'static,
{
    Ok(ApiResponse::success(json!({
        "tenant": ctx.tenant,
        "principal": {
            "id": ctx.principal.id,
            "name": ctx.principal.name,
            "role": ctx.principal.role,
        }
    })))
}

/// Liveness of the tenant's own database
pub async fn tenant_health<F>(
    State(state): State<AppState<F>>,
    Extension(ctx): Extension<TenantContext<F::Handle>>,
) -> ApiResult<Value>
where
    F: ClientFactory + 'static,
{
    state
        .connections()
        .factory()
        .ping(&ctx.connection)
        .await
        .map_err(|e| ApiError::from(TenancyError::Connection(e)))?;

    Ok(ApiResponse::success(json!({
        "tenant": ctx.tenant_id,
        "database": "ok"
    })))
}

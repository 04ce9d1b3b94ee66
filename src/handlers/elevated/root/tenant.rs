// handlers/elevated/root/tenant.rs - /api/root/tenants handlers

use axum::extract::{Extension, Json, Path, State};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::database::manager::ClientFactory;
use crate::database::models::{TenantId, TenantStatus};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::tenancy::{MultiTenantContext, TenancyError};

/// GET /api/root/tenants - every tenant plus which ones hold a live connection
pub async fn tenant_list<F>(
    State(state): State<AppState<F>>,
    Extension(ctx): Extension<MultiTenantContext<F>>,
) -> ApiResult<Value>
where
    F: ClientFactory + 'static,
{
    let cached = state.connections().cached_tenants().await;

    Ok(ApiResponse::success(json!({
        "tenants": ctx.tenants,
        "connected": cached,
    })))
}

/// GET /api/root/tenants/:id/health - opens (or reuses) only this tenant's connection
pub async fn tenant_health<F>(
    State(state): State<AppState<F>>,
    Extension(ctx): Extension<MultiTenantContext<F>>,
    Path(id): Path<String>,
) -> ApiResult<Value>
where
    F: ClientFactory + 'static,
{
    let tenant_id = TenantId::from(id);
    let connection = ctx.connection_for(&tenant_id).await?;

    state
        .connections()
        .factory()
        .ping(&connection)
        .await
        .map_err(|e| ApiError::from(TenancyError::Connection(e)))?;

    Ok(ApiResponse::success(json!({
        "tenant": tenant_id,
        "database": "ok"
    })))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: TenantStatus,
}

/// PUT /api/root/tenants/:id/status - lifecycle transition; leaving ACTIVE
/// evicts the cached connection
pub async fn tenant_status<F>(
    State(state): State<AppState<F>>,
    Extension(ctx): Extension<MultiTenantContext<F>>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Value>
where
    F: ClientFactory + 'static,
{
    let tenant_id = TenantId::from(id);
    state.connections().update_status(&tenant_id, update.status).await?;

    info!("Principal {} set tenant '{}' to {}", ctx.principal.id, tenant_id, update.status);
    Ok(ApiResponse::success(json!({
        "tenant": tenant_id,
        "status": update.status
    })))
}

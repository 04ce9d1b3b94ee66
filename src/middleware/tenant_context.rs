use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::database::manager::ClientFactory;
use crate::error::ApiError;

/// Builds a `TenantContext` for the request and injects it as an extension.
/// Any tenancy failure short-circuits with the mapped status code.
pub async fn tenant_context_middleware<F>(
    State(state): State<AppState<F>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    F: ClientFactory + 'static,
{
    let (mut parts, body) = request.into_parts();

    let context = state.contexts.build_context(&parts).await.map_err(|e| {
        tracing::debug!("Tenant context rejected for {}: {}", parts.uri.path(), e);
        ApiError::from(e)
    })?;

    tracing::debug!(
        "Tenant context ready: tenant '{}' for principal {}",
        context.tenant_id,
        context.principal.id
    );
    parts.extensions.insert(context);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Global-admin routes get a `MultiTenantContext` instead
pub async fn multi_tenant_context_middleware<F>(
    State(state): State<AppState<F>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    F: ClientFactory + 'static,
{
    let (mut parts, body) = request.into_parts();

    let context = state.contexts.build_multi_tenant_context(&parts).await?;
    parts.extensions.insert(context);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

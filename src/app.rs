use anyhow::Context;
use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::database::manager::{ClientFactory, ConnectionManager, PgClientFactory};
use crate::database::postgres::PgRegistryStore;
use crate::database::registry::{RegistryError, RegistryStore};
use crate::handlers::{elevated, protected};
use crate::middleware::{multi_tenant_context_middleware, tenant_context_middleware};
use crate::tenancy::{ContextBuilder, JwtSessionProvider};

/// Shared per-process state handed to every handler
pub struct AppState<F: ClientFactory> {
    pub registry: Arc<dyn RegistryStore>,
    pub contexts: Arc<ContextBuilder<F>>,
}

impl<F: ClientFactory> AppState<F> {
    pub fn new(registry: Arc<dyn RegistryStore>, contexts: ContextBuilder<F>) -> Self {
        Self {
            registry,
            contexts: Arc::new(contexts),
        }
    }

    pub fn connections(&self) -> &Arc<ConnectionManager<F>> {
        self.contexts.connections()
    }
}

impl<F: ClientFactory> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            contexts: self.contexts.clone(),
        }
    }
}

/// Wire the Postgres registry, per-tenant pool factory and JWT sessions together
pub async fn connect(config: &AppConfig) -> Result<AppState<PgClientFactory>, RegistryError> {
    let registry: Arc<dyn RegistryStore> = Arc::new(PgRegistryStore::connect(&config.database).await?);
    let connections = Arc::new(ConnectionManager::new(
        registry.clone(),
        PgClientFactory::from_config(&config.database),
    ));
    let session = Arc::new(JwtSessionProvider::new(registry.clone(), config.security.jwt_secret.clone()));
    let contexts = ContextBuilder::new(registry.clone(), session, connections, config.tenancy.clone());

    Ok(AppState::new(registry, contexts))
}

/// `*` allows any origin; otherwise only the listed ones
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// Run the HTTP server until ctrl-c or SIGTERM, then close every tenant connection
pub async fn serve(config: &AppConfig, port: u16) -> anyhow::Result<()> {
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECURITY_JWT_SECRET must be set outside development");
    }

    let state = connect(config).await.context("failed to connect to tenant registry")?;
    let app = router(state.clone(), cors_layer(&config.security.cors_origins));
    let app = if config.api.enable_request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    };

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("ShopDesk API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    state.connections().close_all().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

pub fn router<F>(state: AppState<F>, cors: CorsLayer) -> Router
where
    F: ClientFactory + 'static,
{
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health::<F>))
        // Tenant-scoped API
        .merge(tenant_routes(state.clone()))
        // Global-admin API
        .merge(root_routes(state.clone()))
        .with_state(state)
        .layer(cors)
}

fn tenant_routes<F>(state: AppState<F>) -> Router<AppState<F>>
where
    F: ClientFactory + 'static,
{
    Router::new()
        .route("/api/tenant", get(protected::tenant::tenant_show::<F>))
        .route("/api/tenant/health", get(protected::tenant::tenant_health::<F>))
        .route("/api/tenants/:tenant/info", get(protected::tenant::tenant_show::<F>))
        .route_layer(from_fn_with_state(state, tenant_context_middleware::<F>))
}

fn root_routes<F>(state: AppState<F>) -> Router<AppState<F>>
where
    F: ClientFactory + 'static,
{
    use elevated::root::tenant;

    Router::new()
        .route("/api/root/tenants", get(tenant::tenant_list::<F>))
        .route("/api/root/tenants/:id/health", get(tenant::tenant_health::<F>))
        .route("/api/root/tenants/:id/status", put(tenant::tenant_status::<F>))
        .route_layer(from_fn_with_state(state, multi_tenant_context_middleware::<F>))
}

async fn root() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "ShopDesk API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/health (public)",
                "tenant": "/api/tenant, /api/tenant/health (tenant context)",
                "root": "/api/root/tenants[/:id/health|/:id/status] (global admin)",
            }
        }
    }))
}

async fn health<F>(axum::extract::State(state): axum::extract::State<AppState<F>>) -> impl axum::response::IntoResponse
where
    F: ClientFactory + 'static,
{
    let now = chrono::Utc::now();
    let cached = state.connections().cached_tenants().await.len();

    match state.registry.ping().await {
        Ok(()) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "registry": "ok",
                    "cached_connections": cached
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "registry unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "registry_error": e.to_string()
                }
            })),
        ),
    }
}

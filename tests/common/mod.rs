// Shared harness: the real router over an in-memory registry and a fake
// client factory, driven in-process with tower's oneshot.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use shopdesk_api::app::{router, AppState};
use shopdesk_api::auth::{generate_jwt, Claims};
use shopdesk_api::config::TenancyConfig;
use shopdesk_api::database::models::{Assignment, Principal, Role, Tenant};
use shopdesk_api::database::{ClientFactory, ConnectionDescriptor, ConnectionError, ConnectionManager, MemoryRegistry};
use shopdesk_api::tenancy::{ContextBuilder, JwtSessionProvider};

pub const SECRET: &str = "integration-test-secret";

#[derive(Clone, Default)]
pub struct CountingFactory {
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl CountingFactory {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientFactory for CountingFactory {
    type Handle = String;

    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<String, ConnectionError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(descriptor.url().to_string())
    }

    async fn ping(&self, _handle: &String) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn close(&self, _handle: String) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct TestApp {
    pub router: Router,
    pub registry: Arc<MemoryRegistry>,
    pub factory: CountingFactory,
    pub connections: Arc<ConnectionManager<CountingFactory>>,
    pub admin: Principal,
    pub owner: Principal,
    pub member: Principal,
}

/// Shops A (owned, member assigned, subdomain "alpha") and B (owned, suspended)
pub async fn spawn_app() -> TestApp {
    let registry = Arc::new(MemoryRegistry::new());
    let factory = CountingFactory::default();

    let admin = Principal::new(Uuid::new_v4(), "Root", Role::GlobalAdmin);
    let owner = Principal::new(Uuid::new_v4(), "Owner", Role::TenantOwner);
    let member = Principal::new(Uuid::new_v4(), "Cashier", Role::TenantMember);
    for p in [&admin, &owner, &member] {
        registry.insert_principal(p.clone()).await.unwrap();
    }

    for tenant in [
        Tenant::new("A", "Shop A", owner.id).with_subdomain("alpha"),
        Tenant::new("B", "Shop B", owner.id).with_status(shopdesk_api::database::models::TenantStatus::Suspended),
    ] {
        let descriptor = ConnectionDescriptor::new(format!(
            "postgres://localhost/{}",
            ConnectionDescriptor::database_name_for(&tenant.id)
        ));
        registry.insert_tenant(tenant.initialized(descriptor)).await.unwrap();
    }
    registry.insert_assignment(Assignment::new(member.id, "A")).await.unwrap();

    let connections = Arc::new(ConnectionManager::new(registry.clone(), factory.clone()));
    let session = Arc::new(JwtSessionProvider::new(registry.clone(), SECRET));
    let contexts = ContextBuilder::new(registry.clone(), session, connections.clone(), TenancyConfig::default());
    let state = AppState::new(registry.clone(), contexts);

    TestApp {
        router: router(state, CorsLayer::permissive()),
        registry,
        factory,
        connections,
        admin,
        owner,
        member,
    }
}

pub fn token_for(principal: &Principal) -> String {
    generate_jwt(&Claims::new(principal.id, principal.role, 1), SECRET).unwrap()
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        principal: Option<&Principal>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(p) = principal {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(p)));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, principal: Option<&Principal>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, principal, None).await
    }
}

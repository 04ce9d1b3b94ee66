//! Fixtures for unit tests: an in-memory registry, a fake client factory that
//! counts opens and closes, and a header-based session provider.

use async_trait::async_trait;
use axum::http::{header::HOST, request::Parts, Request};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::TenancyConfig;
use crate::database::manager::{ClientFactory, ConnectionDescriptor, ConnectionError, ConnectionManager};
use crate::database::memory::MemoryRegistry;
use crate::database::models::{Principal, Role, Tenant};
use crate::database::registry::RegistryStore;
use crate::tenancy::{AccessGuard, ContextBuilder, SessionProvider, TenancyError, TenantResolver};

pub const PRINCIPAL_HEADER: &str = "x-test-principal";

/// Handle handed out by [`FakeClientFactory`]; equal only to itself
#[derive(Debug, Clone)]
pub struct FakeHandle {
    serial: usize,
    closed: Arc<AtomicBool>,
}

impl FakeHandle {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl PartialEq for FakeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.serial == other.serial
    }
}

#[derive(Default)]
struct FactoryState {
    opened: AtomicUsize,
    closed: AtomicUsize,
    fail_opens: AtomicBool,
    fail_pings: AtomicBool,
    open_delay_ms: AtomicU64,
}

#[derive(Clone, Default)]
pub struct FakeClientFactory {
    state: Arc<FactoryState>,
}

impl FakeClientFactory {
    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    pub fn fail_opens(&self, fail: bool) {
        self.state.fail_opens.store(fail, Ordering::SeqCst);
    }

    pub fn fail_pings(&self, fail: bool) {
        self.state.fail_pings.store(fail, Ordering::SeqCst);
    }

    pub fn set_open_delay(&self, delay: Duration) {
        self.state.open_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClientFactory for FakeClientFactory {
    type Handle = FakeHandle;

    async fn open(&self, _descriptor: &ConnectionDescriptor) -> Result<FakeHandle, ConnectionError> {
        let delay = self.state.open_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.state.fail_opens.load(Ordering::SeqCst) {
            return Err(ConnectionError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        let serial = self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeHandle {
            serial,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    async fn ping(&self, handle: &FakeHandle) -> Result<(), ConnectionError> {
        if handle.is_closed() || self.state.fail_pings.load(Ordering::SeqCst) {
            return Err(ConnectionError::Unhealthy("no response".to_string()));
        }
        Ok(())
    }

    async fn close(&self, handle: FakeHandle) {
        handle.closed.store(true, Ordering::SeqCst);
        self.state.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Reads the principal id from [`PRINCIPAL_HEADER`] and loads it from the registry
pub struct HeaderSession {
    registry: Arc<dyn RegistryStore>,
}

#[async_trait]
impl SessionProvider for HeaderSession {
    async fn principal(&self, parts: &Parts) -> Result<Option<Principal>, TenancyError> {
        let id = parts
            .headers
            .get(PRINCIPAL_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<Uuid>().ok());
        match id {
            Some(id) => Ok(self.registry.find_principal(id).await?),
            None => Ok(None),
        }
    }
}

pub fn parts(uri: &str, host: Option<&str>) -> Parts {
    let mut builder = Request::builder().uri(uri);
    if let Some(host) = host {
        builder = builder.header(HOST, host);
    }
    builder.body(()).unwrap().into_parts().0
}

pub fn authed_parts(uri: &str, host: Option<&str>, principal: &Principal) -> Parts {
    let mut p = parts(uri, host);
    p.headers.insert(PRINCIPAL_HEADER, principal.id.to_string().parse().unwrap());
    p
}

pub struct Fixture {
    pub registry: Arc<MemoryRegistry>,
    pub factory: FakeClientFactory,
    pub manager: Arc<ConnectionManager<FakeClientFactory>>,
    pub admin: Principal,
    pub owner: Principal,
}

impl Fixture {
    pub async fn new() -> Self {
        let registry = Arc::new(MemoryRegistry::new());
        let factory = FakeClientFactory::default();
        let manager = Arc::new(ConnectionManager::new(registry.clone(), factory.clone()));

        let admin = Principal::new(Uuid::new_v4(), "Root", Role::GlobalAdmin);
        let owner = Principal::new(Uuid::new_v4(), "Owner", Role::TenantOwner);
        registry.insert_principal(admin.clone()).await.unwrap();
        registry.insert_principal(owner.clone()).await.unwrap();

        Self {
            registry,
            factory,
            manager,
            admin,
            owner,
        }
    }

    pub async fn owner_principal(&self, name: &str) -> Principal {
        let principal = Principal::new(Uuid::new_v4(), name, Role::TenantOwner);
        self.registry.insert_principal(principal.clone()).await.unwrap();
        principal
    }

    pub async fn member(&self) -> Principal {
        let principal = Principal::new(Uuid::new_v4(), "Cashier", Role::TenantMember);
        self.registry.insert_principal(principal.clone()).await.unwrap();
        principal
    }

    /// Register a tenant, initializing it if it has no descriptor yet
    pub async fn add_tenant(&self, tenant: Tenant) {
        let tenant = if tenant.is_initialized {
            tenant
        } else {
            let descriptor = ConnectionDescriptor::new(format!(
                "postgres://localhost/{}",
                ConnectionDescriptor::database_name_for(&tenant.id)
            ));
            tenant.initialized(descriptor)
        };
        self.registry.insert_tenant(tenant).await.unwrap();
    }

    /// An ACTIVE, initialized tenant
    pub async fn add_ready_tenant(&self, id: &str, owner_id: Uuid) {
        self.add_tenant(Tenant::new(id, format!("Shop {}", id), owner_id)).await;
    }

    pub fn resolver(&self) -> TenantResolver {
        TenantResolver::new(self.registry.clone(), TenancyConfig::default())
    }

    pub fn guard(&self) -> AccessGuard {
        AccessGuard::new(self.registry.clone())
    }

    pub fn builder(&self) -> ContextBuilder<FakeClientFactory> {
        let session = Arc::new(HeaderSession {
            registry: self.registry.clone(),
        });
        ContextBuilder::new(self.registry.clone(), session, self.manager.clone(), TenancyConfig::default())
    }
}

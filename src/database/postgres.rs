use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::database::manager::ConnectionDescriptor;
use crate::database::models::assignment::AssignmentRow;
use crate::database::models::principal::PrincipalRow;
use crate::database::models::tenant::TenantRow;
use crate::database::models::{Assignment, Principal, Tenant, TenantId, TenantStatus};
use crate::database::registry::{RegistryError, RegistryStore};

const TENANT_COLUMNS: &str = r#"
    id, name, code, connection_url, subdomain, is_initialized,
    status, owner_id, created_at, updated_at
"#;

const ASSIGNMENT_COLUMNS: &str = "id, principal_id, tenant_id, active, permissions, created_at";

/// Registry backed by the shared PostgreSQL database
#[derive(Clone)]
pub struct PgRegistryStore {
    pool: PgPool,
}

impl PgRegistryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the registry database named by `DATABASE_URL`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, RegistryError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.url)
            .await?;
        info!("Connected to tenant registry");
        Ok(Self::new(pool))
    }

    fn into_tenant(row: TenantRow) -> Result<Tenant, RegistryError> {
        let id = row.id.clone();
        Tenant::try_from(row).map_err(|e| RegistryError::CorruptRow(format!("tenant '{}': {}", id, e)))
    }

    fn into_tenants(rows: Vec<TenantRow>) -> Result<Vec<Tenant>, RegistryError> {
        rows.into_iter().map(Self::into_tenant).collect()
    }
}

#[async_trait]
impl RegistryStore for PgRegistryStore {
    async fn find_tenant(&self, id: &TenantId) -> Result<Option<Tenant>, RegistryError> {
        let query = format!("SELECT {} FROM tenants WHERE id = $1", TENANT_COLUMNS);
        let row = sqlx::query_as::<_, TenantRow>(&query)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::into_tenant).transpose()
    }

    async fn find_tenant_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, RegistryError> {
        let query = format!("SELECT {} FROM tenants WHERE lower(subdomain) = lower($1)", TENANT_COLUMNS);
        let row = sqlx::query_as::<_, TenantRow>(&query)
            .bind(subdomain)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::into_tenant).transpose()
    }

    async fn tenants_owned_by(&self, owner_id: Uuid) -> Result<Vec<Tenant>, RegistryError> {
        let query = format!(
            "SELECT {} FROM tenants WHERE owner_id = $1 ORDER BY created_at ASC, id ASC",
            TENANT_COLUMNS
        );
        let rows = sqlx::query_as::<_, TenantRow>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Self::into_tenants(rows)
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>, RegistryError> {
        let query = format!("SELECT {} FROM tenants ORDER BY name ASC, id ASC", TENANT_COLUMNS);
        let rows = sqlx::query_as::<_, TenantRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        Self::into_tenants(rows)
    }

    async fn active_assignments(&self, principal_id: Uuid) -> Result<Vec<Assignment>, RegistryError> {
        let query = format!(
            "SELECT {} FROM tenant_assignments WHERE principal_id = $1 AND active = true ORDER BY created_at ASC, id ASC",
            ASSIGNMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(principal_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Assignment::from).collect())
    }

    async fn find_active_assignment(
        &self,
        principal_id: Uuid,
        tenant_id: &TenantId,
    ) -> Result<Option<Assignment>, RegistryError> {
        let query = format!(
            "SELECT {} FROM tenant_assignments WHERE principal_id = $1 AND tenant_id = $2 AND active = true",
            ASSIGNMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(principal_id)
            .bind(tenant_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Assignment::from))
    }

    async fn find_principal(&self, id: Uuid) -> Result<Option<Principal>, RegistryError> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            "SELECT id, name, role, status FROM principals WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Principal::try_from(r).map_err(|e| RegistryError::CorruptRow(format!("principal '{}': {}", id, e)))
        })
        .transpose()
    }

    async fn mark_initialized(
        &self,
        id: &TenantId,
        descriptor: &ConnectionDescriptor,
    ) -> Result<(), RegistryError> {
        let result = sqlx::query(
            "UPDATE tenants SET connection_url = $2, is_initialized = true, updated_at = now() WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(descriptor.url())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound(format!("tenant '{}'", id)));
        }
        Ok(())
    }

    async fn set_tenant_status(&self, id: &TenantId, status: TenantStatus) -> Result<(), RegistryError> {
        let result = sqlx::query("UPDATE tenants SET status = $2, updated_at = now() WHERE id = $1")
            .bind(id.as_str())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound(format!("tenant '{}'", id)));
        }
        Ok(())
    }

    async fn deactivate_assignment(
        &self,
        principal_id: Uuid,
        tenant_id: &TenantId,
    ) -> Result<(), RegistryError> {
        sqlx::query(
            "UPDATE tenant_assignments SET active = false WHERE principal_id = $1 AND tenant_id = $2 AND active = true",
        )
        .bind(principal_id)
        .bind(tenant_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), RegistryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

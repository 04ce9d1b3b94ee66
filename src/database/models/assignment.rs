use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use super::tenant::TenantId;

/// Binds a tenant member to one tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub principal_id: Uuid,
    pub tenant_id: TenantId,
    pub active: bool,
    /// Free-form permission bag, opaque to the tenancy layer
    pub permissions: Value,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    /// An active assignment with an empty permission bag
    pub fn new(principal_id: Uuid, tenant_id: impl Into<TenantId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            principal_id,
            tenant_id: tenant_id.into(),
            active: true,
            permissions: Value::Object(Default::default()),
            created_at: Utc::now(),
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRow {
    pub id: Uuid,
    pub principal_id: Uuid,
    pub tenant_id: String,
    pub active: bool,
    pub permissions: sqlx::types::Json<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<AssignmentRow> for Assignment {
    fn from(row: AssignmentRow) -> Self {
        Assignment {
            id: row.id,
            principal_id: row.principal_id,
            tenant_id: TenantId::new(row.tenant_id),
            active: row.active,
            permissions: row.permissions.0,
            created_at: row.created_at,
        }
    }
}

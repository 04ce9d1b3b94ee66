use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::database::manager::ConnectionDescriptor;

/// Opaque tenant (shop) identifier as stored in the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TenantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Tenant lifecycle. Deletion is a soft transition to `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantStatus {
    Active,
    Inactive,
    Suspended,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Active => "ACTIVE",
            TenantStatus::Inactive => "INACTIVE",
            TenantStatus::Suspended => "SUSPENDED",
        }
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(TenantStatus::Active),
            "INACTIVE" => Ok(TenantStatus::Inactive),
            "SUSPENDED" => Ok(TenantStatus::Suspended),
            other => Err(format!("unknown tenant status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub code: String,
    #[serde(skip_serializing)]
    pub connection: Option<ConnectionDescriptor>,
    pub subdomain: Option<String>,
    pub is_initialized: bool,
    pub status: TenantStatus,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// A freshly onboarded tenant: active, not yet initialized
    pub fn new(id: impl Into<TenantId>, name: impl Into<String>, owner_id: Uuid) -> Self {
        let id = id.into();
        let now = Utc::now();
        Self {
            code: id.as_str().to_ascii_uppercase(),
            id,
            name: name.into(),
            connection: None,
            subdomain: None,
            is_initialized: false,
            status: TenantStatus::Active,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Subdomains are matched case-insensitively, so they are stored lowercased
    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = Some(subdomain.into().to_ascii_lowercase());
        self
    }

    pub fn with_status(mut self, status: TenantStatus) -> Self {
        self.status = status;
        self
    }

    pub fn initialized(mut self, descriptor: ConnectionDescriptor) -> Self {
        self.connection = Some(descriptor);
        self.is_initialized = true;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }

    /// Display metadata handed to downstream handlers
    pub fn metadata(&self) -> TenantMetadata {
        TenantMetadata {
            id: self.id.clone(),
            name: self.name.clone(),
            code: self.code.clone(),
            subdomain: self.subdomain.clone(),
            status: self.status,
        }
    }
}

/// The subset of a tenant that is safe to show to any authorized principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMetadata {
    pub id: TenantId,
    pub name: String,
    pub code: String,
    pub subdomain: Option<String>,
    pub status: TenantStatus,
}

/// Raw `tenants` row; status is stored as text
#[derive(Debug, Clone, FromRow)]
pub struct TenantRow {
    pub id: String,
    pub name: String,
    pub code: String,
    pub connection_url: Option<String>,
    pub subdomain: Option<String>,
    pub is_initialized: bool,
    pub status: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TenantRow> for Tenant {
    type Error = String;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        Ok(Tenant {
            id: TenantId(row.id),
            name: row.name,
            code: row.code,
            connection: row.connection_url.map(ConnectionDescriptor::new),
            subdomain: row.subdomain,
            is_initialized: row.is_initialized,
            status: row.status.parse()?,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

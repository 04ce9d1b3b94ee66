use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Closed set of principal roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    GlobalAdmin,
    TenantOwner,
    TenantMember,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::GlobalAdmin => "GLOBAL_ADMIN",
            Role::TenantOwner => "TENANT_OWNER",
            Role::TenantMember => "TENANT_MEMBER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GLOBAL_ADMIN" => Ok(Role::GlobalAdmin),
            "TENANT_OWNER" => Ok(Role::TenantOwner),
            "TENANT_MEMBER" => Ok(Role::TenantMember),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrincipalStatus {
    Active,
    Inactive,
}

impl FromStr for PrincipalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(PrincipalStatus::Active),
            "INACTIVE" => Ok(PrincipalStatus::Inactive),
            other => Err(format!("unknown principal status '{}'", other)),
        }
    }
}

/// An authenticated actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub status: PrincipalStatus,
}

impl Principal {
    pub fn new(id: Uuid, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            status: PrincipalStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PrincipalStatus::Active
    }

    pub fn is_global_admin(&self) -> bool {
        self.role == Role::GlobalAdmin
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PrincipalRow {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub status: String,
}

impl TryFrom<PrincipalRow> for Principal {
    type Error = String;

    fn try_from(row: PrincipalRow) -> Result<Self, Self::Error> {
        Ok(Principal {
            id: row.id,
            name: row.name,
            role: row.role.parse()?,
            status: row.status.parse()?,
        })
    }
}

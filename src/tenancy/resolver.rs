//! Tenant resolution.
//!
//! A request is mapped to a tenant id by trying each [`Strategy`] in
//! [`Strategy::PRECEDENCE`] order; the first one that yields an id wins.
//! Explicit identifiers outrank inferred ones, and network-derived signals
//! outrank the principal's stored default.

use axum::http::{header::HOST, request::Parts};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

use crate::config::TenancyConfig;
use crate::database::models::{Principal, Role, TenantId};
use crate::database::registry::RegistryStore;
use crate::tenancy::TenancyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `?tenantId=...`
    QueryParameter,
    /// `{subdomain}.example.com`, looked up in the subdomain index
    Subdomain,
    /// `/tenants/{id}/...`
    PathSegment,
    /// Owner's first tenant or member's first active assignment
    PrincipalDefault,
}

impl Strategy {
    pub const PRECEDENCE: [Strategy; 4] = [
        Strategy::QueryParameter,
        Strategy::Subdomain,
        Strategy::PathSegment,
        Strategy::PrincipalDefault,
    ];
}

pub struct TenantResolver {
    registry: Arc<dyn RegistryStore>,
    config: TenancyConfig,
}

impl TenantResolver {
    pub fn new(registry: Arc<dyn RegistryStore>, config: TenancyConfig) -> Self {
        Self { registry, config }
    }

    pub async fn resolve(&self, parts: &Parts, principal: &Principal) -> Result<TenantId, TenancyError> {
        for strategy in Strategy::PRECEDENCE {
            if let Some(tenant_id) = self.attempt(strategy, parts, principal).await? {
                debug!("Resolved tenant '{}' via {:?}", tenant_id, strategy);
                return Ok(tenant_id);
            }
        }
        Err(TenancyError::NoTenantResolvable)
    }

    /// Run a single strategy
    pub async fn attempt(
        &self,
        strategy: Strategy,
        parts: &Parts,
        principal: &Principal,
    ) -> Result<Option<TenantId>, TenancyError> {
        match strategy {
            Strategy::QueryParameter => Ok(query_tenant_id(parts, &self.config.query_param)),
            Strategy::Subdomain => {
                let Some(label) = subdomain_label(parts, &self.config.reserved_subdomains) else {
                    return Ok(None);
                };
                // An unknown subdomain falls through to the next strategy
                let tenant = self.registry.find_tenant_by_subdomain(&label).await?;
                Ok(tenant.map(|t| t.id))
            }
            Strategy::PathSegment => Ok(path_tenant_id(parts, &self.config.path_prefix)),
            Strategy::PrincipalDefault => self.default_tenant(principal).await,
        }
    }

    async fn default_tenant(&self, principal: &Principal) -> Result<Option<TenantId>, TenancyError> {
        match principal.role {
            Role::GlobalAdmin => Ok(None),
            Role::TenantOwner => {
                let owned = self.registry.tenants_owned_by(principal.id).await?;
                Ok(owned.into_iter().next().map(|t| t.id))
            }
            Role::TenantMember => {
                let assignments = self.registry.active_assignments(principal.id).await?;
                Ok(assignments.into_iter().next().map(|a| a.tenant_id))
            }
        }
    }
}

/// Tenant id from the query string, ignoring blank values
pub fn query_tenant_id(parts: &Parts, param: &str) -> Option<TenantId> {
    let query = parts.uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == param)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(TenantId::from)
}

/// Leftmost host label when the host has one in front of a registrable
/// domain (`shop.example.com`, `shop.localhost`). Ports and IP literals are
/// ignored, as are reserved labels like `www`.
pub fn subdomain_label(parts: &Parts, reserved: &[String]) -> Option<String> {
    let host = parts
        .headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| parts.uri.host())?;

    // Remove port if present
    let host = host.split(':').next().unwrap_or(host).trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() || host.parse::<IpAddr>().is_ok() {
        return None;
    }

    let labels: Vec<&str> = host.split('.').collect();
    let has_subdomain = labels.len() >= 3 || (labels.len() == 2 && labels[1] == "localhost");
    if !has_subdomain {
        return None;
    }

    let label = labels[0];
    if label.is_empty() || reserved.iter().any(|r| r.eq_ignore_ascii_case(label)) {
        return None;
    }
    Some(label.to_string())
}

/// `{id}` from the first `/{prefix}/{id}` pair in the path
pub fn path_tenant_id(parts: &Parts, prefix: &str) -> Option<TenantId> {
    let segments: Vec<&str> = parts.uri.path().split('/').filter(|s| !s.is_empty()).collect();
    segments
        .windows(2)
        .find(|pair| pair[0] == prefix)
        .map(|pair| TenantId::from(pair[1]))
}

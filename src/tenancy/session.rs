use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, request::Parts};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::decode_jwt;
use crate::database::models::Principal;
use crate::database::registry::RegistryStore;
use crate::tenancy::TenancyError;

/// Supplies the authenticated principal for a request, if any
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn principal(&self, parts: &Parts) -> Result<Option<Principal>, TenancyError>;
}

/// Bearer JWT whose subject is looked up in the registry.
///
/// The registry row is authoritative for role and status; the token only
/// proves identity.
pub struct JwtSessionProvider {
    registry: Arc<dyn RegistryStore>,
    secret: String,
}

impl JwtSessionProvider {
    pub fn new(registry: Arc<dyn RegistryStore>, secret: impl Into<String>) -> Self {
        Self {
            registry,
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn principal(&self, parts: &Parts) -> Result<Option<Principal>, TenancyError> {
        let Some(token) = bearer_token(parts) else {
            debug!("No bearer token on request");
            return Ok(None);
        };

        let claims = match decode_jwt(token, &self.secret) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Rejected session token: {}", e);
                return Ok(None);
            }
        };

        let principal = self.registry.find_principal(claims.sub).await?;
        match &principal {
            Some(p) if p.role != claims.role => {
                warn!("Token role {} for principal {} is stale; registry says {}", claims.role, p.id, p.role);
            }
            None => warn!("Token subject {} is not a registered principal", claims.sub),
            _ => {}
        }
        Ok(principal)
    }
}

/// Token from `Authorization: Bearer <token>`
fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

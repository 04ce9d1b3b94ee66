use anyhow::Context;
use serde_json::json;
use uuid::Uuid;

use crate::app;
use crate::auth::{generate_jwt, Claims};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

/// Mint a bearer token for an existing principal, for local testing
pub async fn mint(
    config: &AppConfig,
    principal_id: &str,
    hours: Option<u64>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let principal_id: Uuid = principal_id
        .parse()
        .with_context(|| format!("'{}' is not a valid principal UUID", principal_id))?;

    let state = app::connect(config).await.context("failed to connect to tenant registry")?;
    let principal = state
        .registry
        .find_principal(principal_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Principal '{}' not found", principal_id))?;

    let hours = hours.unwrap_or(config.security.jwt_expiry_hours);
    let claims = Claims::new(principal.id, principal.role, hours);
    let token = generate_jwt(&claims, &config.security.jwt_secret)?;

    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "token": token,
                    "principal": principal.id,
                    "role": principal.role,
                    "expires_at": claims.exp,
                }))?
            );
        }
        OutputFormat::Text => println!("{}", token),
    }
    Ok(())
}

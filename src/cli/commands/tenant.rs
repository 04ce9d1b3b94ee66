use anyhow::Context;
use serde_json::json;

use crate::app;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::models::{TenantId, TenantStatus};
use crate::database::ConnectionDescriptor;

pub async fn init(
    config: &AppConfig,
    tenant_id: &str,
    database: Option<String>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let tenant_id = TenantId::from(tenant_id);
    let database = database.unwrap_or_else(|| ConnectionDescriptor::database_name_for(&tenant_id));
    let descriptor = ConnectionDescriptor::for_database(&config.database.url, &database)
        .with_context(|| format!("cannot build connection for database '{}'", database))?;

    let state = app::connect(config).await.context("failed to connect to tenant registry")?;
    state.connections().initialize(&tenant_id, descriptor).await?;
    state.connections().close_all().await;

    output_success(
        &output_format,
        &format!("Tenant '{}' initialized on database '{}'", tenant_id, database),
        Some(json!({ "tenant": tenant_id, "database": database })),
    )
}

pub async fn set_status(
    config: &AppConfig,
    tenant_id: &str,
    status: &str,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let tenant_id = TenantId::from(tenant_id);
    let status: TenantStatus = status.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let state = app::connect(config).await.context("failed to connect to tenant registry")?;
    state.connections().update_status(&tenant_id, status).await?;

    output_success(
        &output_format,
        &format!("Tenant '{}' is now {}", tenant_id, status),
        Some(json!({ "tenant": tenant_id, "status": status })),
    )
}

pub async fn list(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = app::connect(config).await.context("failed to connect to tenant registry")?;
    let tenants = state.registry.list_tenants().await?;

    if tenants.is_empty() {
        return output_empty_collection(&output_format, "tenants", "No tenants registered");
    }

    match output_format {
        OutputFormat::Json => {
            let tenants: Vec<_> = tenants
                .iter()
                .map(|t| {
                    json!({
                        "id": t.id,
                        "name": t.name,
                        "code": t.code,
                        "subdomain": t.subdomain,
                        "status": t.status,
                        "is_initialized": t.is_initialized,
                        "owner_id": t.owner_id,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "tenants": tenants }))?);
        }
        OutputFormat::Text => {
            println!("{:<20} {:<25} {:<15} {:<10} {}", "ID", "NAME", "SUBDOMAIN", "STATUS", "INITIALIZED");
            println!("{}", "-".repeat(85));

            for t in &tenants {
                println!(
                    "{:<20} {:<25} {:<15} {:<10} {}",
                    t.id,
                    t.name,
                    t.subdomain.as_deref().unwrap_or("-"),
                    t.status,
                    if t.is_initialized { "yes" } else { "no" }
                );
            }
        }
    }

    Ok(())
}

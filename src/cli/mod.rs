pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "shopdesk")]
#[command(about = "ShopDesk CLI - serve the API and manage tenant databases")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API")]
    Serve {
        #[arg(long, help = "Port to listen on (defaults to PORT / config)")]
        port: Option<u16>,
    },

    #[command(about = "Create the connection for a registered tenant and mark it initialized")]
    InitTenant {
        #[arg(help = "Tenant ID")]
        tenant_id: String,

        #[arg(long, help = "Database name (defaults to the derived tenant_<hash> name)")]
        database: Option<String>,
    },

    #[command(about = "Change a tenant's lifecycle status (ACTIVE, INACTIVE, SUSPENDED)")]
    SetStatus {
        #[arg(help = "Tenant ID")]
        tenant_id: String,

        #[arg(help = "New status")]
        status: String,
    },

    #[command(about = "List registered tenants")]
    Tenants,

    #[command(about = "Mint a JWT for a registered principal")]
    Token {
        #[arg(help = "Principal ID (UUID)")]
        principal_id: String,

        #[arg(long, help = "Token lifetime in hours (defaults to config)")]
        hours: Option<u64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::config();

    match cli.command {
        Commands::Serve { port } => crate::app::serve(config, port.unwrap_or(config.api.port)).await,
        Commands::InitTenant { tenant_id, database } => {
            commands::tenant::init(config, &tenant_id, database, output_format).await
        }
        Commands::SetStatus { tenant_id, status } => {
            commands::tenant::set_status(config, &tenant_id, &status, output_format).await
        }
        Commands::Tenants => commands::tenant::list(config, output_format).await,
        Commands::Token { principal_id, hours } => {
            commands::token::mint(config, &principal_id, hours, output_format).await
        }
    }
}

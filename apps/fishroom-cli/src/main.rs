use std::sync::Arc;

use clap::{Parser, Subcommand};
use fishroom_broker::{Broker, RedisBroker};
use fishroom_core::FishroomConfig;
use fishroom_stores::{ApiClientRegistry, BrokerApiClientRegistry};

/// Administers the fishroom API client registry. The `dumpload` metadata
/// backup utility from the original CLI surface is not implemented here —
/// it operates on keys outside the routing core's scope.
#[derive(Parser)]
#[command(name = "fishroom-cli")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register, list, revoke, or test long-poll API clients.
    ApiClient {
        #[command(subcommand)]
        action: ApiClientAction,
    },
}

#[derive(Subcommand)]
enum ApiClientAction {
    /// Register a new client.
    Add { token_id: String, token_key: String, name: String },
    /// List every registered client.
    List,
    /// Revoke a client's access and drop its queue.
    Revoke { token_id: String },
    /// Check that a token id/key pair authenticates.
    Test { token_id: String, token_key: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let config = FishroomConfig::from_env()?;
    let broker: Arc<dyn Broker> = Arc::new(RedisBroker::connect(&config.redis_url).await?);
    let registry = BrokerApiClientRegistry::new(broker, config.key_prefix);

    match cli.command {
        Command::ApiClient { action } => run_api_client(&registry, action).await,
    }
}

async fn run_api_client(registry: &BrokerApiClientRegistry, action: ApiClientAction) -> anyhow::Result<()> {
    match action {
        ApiClientAction::Add { token_id, token_key, name } => {
            registry.add(&token_id, &token_key, &name).await?;
            println!("registered {token_id} ({name})");
        }
        ApiClientAction::List => {
            for (id, name) in registry.list().await? {
                println!("{id}\t{name}");
            }
        }
        ApiClientAction::Revoke { token_id } => {
            registry.revoke(&token_id).await?;
            println!("revoked {token_id}");
        }
        ApiClientAction::Test { token_id, token_key } => {
            if registry.auth(&token_id, &token_key).await? {
                println!("ok");
            } else {
                println!("auth failed");
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

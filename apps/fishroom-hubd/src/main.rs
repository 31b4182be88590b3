mod notify;

use std::sync::Arc;

use fishroom_broker::{Broker, RedisBroker};
use fishroom_bus::Direction;
use fishroom_command::CommandRegistry;
use fishroom_core::FishroomConfig;
use fishroom_hub::Hub;
use fishroom_stores::{BrokerApiClientRegistry, BrokerChatLog, ChatLogRedirectPaste};

use notify::{AdminNotifier, LoggingAdminNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = FishroomConfig::from_env()?;
    tracing::info!(prefix = %config.key_prefix, bindings = config.bindings.len(), "starting fishroom hub");

    let broker: Arc<dyn Broker> = Arc::new(RedisBroker::connect(&config.redis_url).await?);
    let notifier: Arc<dyn AdminNotifier> = Arc::new(LoggingAdminNotifier);

    let hub = build_hub(broker, &config);

    // Supervisor: the hub is the sole worker this binary owns. If it exits
    // for any reason, notify and terminate so an external process manager
    // restarts the whole thing and every adapter reconnects cleanly.
    let result = tokio::spawn(async move {
        let span = tracing::info_span!("hub");
        let _enter = span.enter();
        hub.run().await
    })
    .await;

    match result {
        Ok(Ok(())) => {
            notifier.notify("hub worker exited cleanly (unexpected)").await;
            std::process::exit(1);
        }
        Ok(Err(err)) => {
            notifier.notify(&format!("hub worker failed: {err}")).await;
            std::process::exit(1);
        }
        Err(join_err) => {
            notifier.notify(&format!("hub worker panicked: {join_err}")).await;
            std::process::exit(1);
        }
    }
}

fn build_hub(broker: Arc<dyn Broker>, config: &FishroomConfig) -> Hub {
    Hub {
        ingress: fishroom_bus::Bus::new(broker.clone(), &config.key_prefix, Direction::Ingress),
        egress: fishroom_bus::Bus::new(broker.clone(), &config.key_prefix, Direction::Egress),
        bindings: config.bindings.clone(),
        api_clients: Arc::new(BrokerApiClientRegistry::new(broker.clone(), &config.key_prefix)),
        chat_log: Arc::new(BrokerChatLog::new(broker.clone(), &config.key_prefix)),
        // Command plugins are an external collaborator (see scope notes);
        // this registry carries only the built-in `help` command.
        commands: Arc::new(CommandRegistry::builder().build()),
        paste: Arc::new(ChatLogRedirectPaste::new(&config.baseurl)),
        bot_name: config.bot_name.clone(),
        cmd_me: config.cmd_me.clone(),
    }
}

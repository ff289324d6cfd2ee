use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use broadcast_bridge::{Bridge, BridgeConfig, Subscription, ZulipNotifier};
use pusher_client::PusherClient;
use zulip_client::ZulipClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("broadcast_bridge=info".parse()?)
                .add_directive("pusher_client=info".parse()?),
        )
        .init();

    let config = BridgeConfig::from_env()?;
    config.log_summary();

    let zulip = ZulipClient::new(config.zulip_options())?;
    let bridge = Bridge::new(ZulipNotifier::new(zulip, &config.stream, &config.topic));

    let subscription = Subscription {
        channel: config.channel.clone(),
        event: config.event.clone(),
    };
    bridge
        .run(
            PusherClient::new(config.pusher_options()),
            &subscription,
            shutdown_signal(),
        )
        .await?;

    info!("Broadcast bridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

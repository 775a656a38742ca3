//! Voteflow: vote ingestion bridge.
//!
//! Long-running consumer process: subscribes to the configured vote
//! channel, persists each cast vote to Postgres, and exits when the
//! subscription drops (restart is the supervisor's job) or on Ctrl-C.
//!
//! Configuration comes from the environment (a `.env` file is loaded
//! if present):
//!
//! - `VOTEFLOW_CHANNEL` — pub/sub channel name
//! - `VOTEFLOW_REDIS_URL` — broker URL
//! - `VOTEFLOW_POSTGRES` — Postgres connection string
//! - `VOTEFLOW_PG_POOL_SIZE` — optional pool size override
//! - `RUST_LOG` — log filter (default `info`)

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use voteflow_ingest::{
    ChannelSubscriber, IngestConfig, PostgresVoteStore, StopReason, VoteIngestionPipeline,
    VoteStore,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    match run().await {
        Ok(StopReason::ShutdownRequested) => {
            info!("voteflow stopped cleanly");
            ExitCode::SUCCESS
        }
        Ok(StopReason::SubscriptionDropped) => {
            // Exit non-zero so process supervision restarts us; there
            // is deliberately no in-process reconnect.
            error!("subscription dropped, exiting for supervised restart");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "voteflow startup failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<StopReason> {
    let config = IngestConfig::from_env().context("loading configuration")?;
    info!(channel = %config.channel, "starting voteflow");

    let store: Arc<dyn VoteStore> =
        Arc::new(PostgresVoteStore::connect(&config).context("connecting vote store")?);

    let mut subscriber = ChannelSubscriber::new(&config.redis_url, config.subscriber_buffer)
        .context("creating channel subscriber")?;
    let mut subscription = subscriber
        .subscribe(&config.channel)
        .await
        .context("subscribing to vote channel")?;

    let pipeline = VoteIngestionPipeline::new(store);
    let shutdown = pipeline.shutdown_handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            shutdown.notify_one();
        }
    });

    // Runs until the broker drops the subscription or Ctrl-C arrives;
    // either way the in-flight persist finishes before we return.
    let reason = pipeline.run(&mut subscription.messages).await;
    subscription.close().await;
    Ok(reason)
}

//! # asicd, the consumer daemon
//!
//! Replays transported ASIC operations against the driver and reconciles
//! desired views against the programmed state.
//!
//! ## Startup sequence
//!
//! 1. Initialise the driver and discover the default object set.
//! 2. Cold boot (empty store): mint VIDs for the discovered objects and
//!    seed the persisted state. Warm start: hard-reinit the persisted view
//!    against the fresh driver.
//! 3. Connect to NATS, start the counter poller, drain the operation
//!    subject.

mod apply;
mod config;
mod counters;
mod discovery;
mod event;
mod reinit;
mod store;
mod switch;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use asic_driver::{Driver, VirtualSwitch};
use asic_net::NatsConnection;

use config::DaemonConfig;
use counters::CounterPoller;
use event::Daemon;
use store::MemStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("asicd=info".parse()?))
        .init();

    let config = DaemonConfig::from_env();
    info!(switch_index = config.switch_index, "asicd starting");

    let driver: Arc<dyn Driver> = Arc::new(VirtualSwitch::new());
    let store = Arc::new(MemStore::new());

    let mut daemon = Daemon::start(driver.clone(), store, config.clone())?;

    let conn = match &config.nats_url {
        Some(url) => NatsConnection::connect_to(url).await?,
        None => NatsConnection::connect().await?,
    };

    // Counter polling runs beside the event loop and stops with it.
    let (stop_tx, stop_rx) = watch::channel(false);
    let port_rids: Vec<_> = daemon
        .id_map()
        .iter()
        .filter(|(vid, _)| {
            vid.object_type()
                .map(|ot| ot == asic_model::ObjectType::Port)
                .unwrap_or(false)
        })
        .map(|(_, rid)| rid)
        .collect();
    let poller = CounterPoller::new(driver, port_rids, config.poll_interval);
    let poller_task = tokio::spawn(poller.run(conn.clone(), stop_rx));

    let result = daemon.run(&conn).await;

    let _ = stop_tx.send(true);
    let _ = poller_task.await;

    result?;
    info!("asicd shut down");
    Ok(())
}

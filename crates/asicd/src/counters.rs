//! Periodic counter collection.
//!
//! An independent task polling port statistics on a fixed interval and
//! publishing snapshots. Counters observe the driver only; they never
//! touch the views. The loop stops through a watch signal, reacting within
//! one polling interval.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use asic_driver::Driver;
use asic_model::Rid;
use asic_net::{subjects, NatsConnection};

/// Port statistics collected by the default polling group.
pub const PORT_COUNTERS: &[&str] = &[
    "SAI_PORT_STAT_IF_IN_OCTETS",
    "SAI_PORT_STAT_IF_IN_UCAST_PKTS",
    "SAI_PORT_STAT_IF_IN_ERRORS",
    "SAI_PORT_STAT_IF_OUT_OCTETS",
    "SAI_PORT_STAT_IF_OUT_UCAST_PKTS",
    "SAI_PORT_STAT_IF_OUT_ERRORS",
];

/// One published counter snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// Serialized RID of the polled object.
    pub rid: String,
    /// Counter name / value pairs.
    pub values: Vec<(String, u64)>,
}

/// Polls a fixed set of objects on an interval.
pub struct CounterPoller {
    driver: Arc<dyn Driver>,
    rids: Vec<Rid>,
    interval: Duration,
}

impl CounterPoller {
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>, rids: Vec<Rid>, interval: Duration) -> Self {
        Self {
            driver,
            rids,
            interval,
        }
    }

    /// Collect one snapshot for every polled object. Objects that
    /// disappeared since the list was built are skipped.
    #[must_use]
    pub fn poll_once(&self) -> Vec<CounterSnapshot> {
        let mut snapshots = Vec::with_capacity(self.rids.len());
        for &rid in &self.rids {
            match self.driver.stats(rid, PORT_COUNTERS) {
                Ok(values) => snapshots.push(CounterSnapshot {
                    rid: rid.to_string(),
                    values: PORT_COUNTERS
                        .iter()
                        .map(|n| (*n).to_string())
                        .zip(values)
                        .collect(),
                }),
                Err(err) => {
                    debug!(%rid, %err, "stats unavailable, skipping object");
                }
            }
        }
        snapshots
    }

    /// Run the polling loop until the stop signal flips.
    pub async fn run(self, conn: NatsConnection, mut stop: watch::Receiver<bool>) {
        let subject = subjects::counters("port");
        let mut ticker = tokio::time::interval(self.interval);
        info!(
            objects = self.rids.len(),
            interval_secs = self.interval.as_secs(),
            "counter poller started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for snapshot in self.poll_once() {
                        if let Err(err) = conn.publish(&subject, &snapshot).await {
                            warn!(%err, "failed to publish counter snapshot");
                        }
                    }
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
        info!("counter poller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asic_driver::vs::VirtualSwitch;
    use asic_model::ObjectId;

    #[test]
    fn test_poll_once_snapshots_all_objects() {
        let driver = Arc::new(VirtualSwitch::new());
        let switch_rid = driver.initialize().unwrap();
        driver.bump_counter(switch_rid, PORT_COUNTERS[0], 7);

        let poller = CounterPoller::new(
            driver.clone(),
            vec![switch_rid],
            Duration::from_secs(1),
        );
        let snapshots = poller.poll_once();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].values.len(), PORT_COUNTERS.len());
        assert_eq!(snapshots[0].values[0], (PORT_COUNTERS[0].to_string(), 7));
    }

    #[test]
    fn test_poll_once_skips_vanished_objects() {
        let driver = Arc::new(VirtualSwitch::new());
        driver.initialize().unwrap();
        let poller = CounterPoller::new(
            driver,
            vec![ObjectId(0xdead_0000)],
            Duration::from_secs(1),
        );
        assert!(poller.poll_once().is_empty());
    }
}

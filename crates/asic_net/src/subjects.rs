//! NATS subject hierarchy.
//!
//! All subjects are prefixed with `sai.` to namespace within a shared NATS
//! cluster. Requests flow from the redirection library to the consumer
//! daemon; responses and notifications flow back.

/// Root prefix for all subjects.
pub const PREFIX: &str = "sai";

// ── Request / response ──────────────────────────────────────────────────────

/// ASIC operation records (create/remove/set/get/bulk and the view
/// commands). Library → Daemon.
pub const ASIC_OP: &str = "sai.asic.op";

/// GET responses keyed by correlation id. Daemon → Library.
pub const ASIC_RESPONSE: &str = "sai.asic.response";

// ── Notifications ───────────────────────────────────────────────────────────

/// Port operational state changes. Daemon → *.
pub const NTF_PORT_STATE: &str = "sai.ntf.port_state";

/// Learned/aged fdb events. Daemon → *.
pub const NTF_FDB_EVENT: &str = "sai.ntf.fdb_event";

/// Switch state change. Daemon → *.
pub const NTF_SWITCH_STATE: &str = "sai.ntf.switch_state";

// ── Dynamic subject builders ────────────────────────────────────────────────

/// Subject carrying counter snapshots for one polling group.
///
/// `sai.counters.<group>`
#[must_use]
pub fn counters(group: &str) -> String {
    format!("sai.counters.{group}")
}

/// Per-switch operation subject, for deployments driving several switches
/// over one cluster.
///
/// `sai.asic.op.<switch_index>`
#[must_use]
pub fn asic_op_for(switch_index: u8) -> String {
    format!("{ASIC_OP}.{switch_index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_subject() {
        assert_eq!(counters("port"), "sai.counters.port");
    }

    #[test]
    fn test_per_switch_subject() {
        assert_eq!(asic_op_for(3), "sai.asic.op.3");
    }
}

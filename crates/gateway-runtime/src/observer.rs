//! Prometheus-backed notifier and name index observer.

use tq_01_name_index::NameIndexObserver;
use tq_02_queue_notifier::NotifierObserver;
use tq_telemetry::{
    CONNECTIONS_ACTIVE, NAME_INDEX_ENTRIES, NOTIFIER_BROADCASTS, NOTIFIER_CONNECTIONS_PRUNED,
    NOTIFIER_DELIVERIES_DROPPED, NOTIFIER_FRAMES_DELIVERED,
};

fn gauge_value(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Records notifier, connection and name index events as metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl NotifierObserver for MetricsObserver {
    fn broadcast_completed(&self, delivered: usize, pruned: usize) {
        NOTIFIER_BROADCASTS.inc();
        NOTIFIER_FRAMES_DELIVERED.inc_by(delivered as u64);
        NOTIFIER_CONNECTIONS_PRUNED.inc_by(pruned as u64);
    }

    fn delivery_dropped(&self) {
        NOTIFIER_DELIVERIES_DROPPED.inc();
    }

    fn connections_changed(&self, active: usize) {
        CONNECTIONS_ACTIVE.set(gauge_value(active));
    }
}

impl NameIndexObserver for MetricsObserver {
    fn entries_changed(&self, entries: usize) {
        NAME_INDEX_ENTRIES.set(gauge_value(entries));
    }
}

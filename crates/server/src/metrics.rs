//! Lock-free transfer counters.
//!
//! Connection tasks update these via atomic operations; nothing on the send
//! path takes a lock. Snapshots are taken on demand and serialize to JSON.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Monotonic counters
    connections_total: AtomicU64,
    levels_sent: AtomicU64,
    chunk_packets_sent: AtomicU64,
    level_bytes_sent: AtomicU64,
    transfers_failed: AtomicU64,
    clients_rejected: AtomicU64,

    // Level transfer duration histogram
    hist_under_10ms: AtomicU64,
    hist_10_100ms: AtomicU64,
    hist_100ms_1s: AtomicU64,
    hist_over_1s: AtomicU64,

    // Gauges
    clients_connected: AtomicU64,

    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            levels_sent: AtomicU64::new(0),
            chunk_packets_sent: AtomicU64::new(0),
            level_bytes_sent: AtomicU64::new(0),
            transfers_failed: AtomicU64::new(0),
            clients_rejected: AtomicU64::new(0),
            hist_under_10ms: AtomicU64::new(0),
            hist_10_100ms: AtomicU64::new(0),
            hist_100ms_1s: AtomicU64::new(0),
            hist_over_1s: AtomicU64::new(0),
            clients_connected: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Called after a level finished streaming to one client.
    pub fn record_level_sent(&self, packets: u64, bytes: u64, duration: Duration) {
        self.levels_sent.fetch_add(1, Relaxed);
        self.chunk_packets_sent.fetch_add(packets, Relaxed);
        self.level_bytes_sent.fetch_add(bytes, Relaxed);

        match duration.as_millis() {
            0..=9 => self.hist_under_10ms.fetch_add(1, Relaxed),
            10..=99 => self.hist_10_100ms.fetch_add(1, Relaxed),
            100..=999 => self.hist_100ms_1s.fetch_add(1, Relaxed),
            _ => self.hist_over_1s.fetch_add(1, Relaxed),
        };
    }

    pub fn record_transfer_failed(&self) {
        self.transfers_failed.fetch_add(1, Relaxed);
    }

    pub fn record_rejected(&self) {
        self.clients_rejected.fetch_add(1, Relaxed);
    }

    pub fn client_connected(&self) {
        self.connections_total.fetch_add(1, Relaxed);
        self.clients_connected.fetch_add(1, Relaxed);
    }

    pub fn client_disconnected(&self) {
        self.clients_connected.fetch_sub(1, Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs_f64(),
            connections_total: self.connections_total.load(Relaxed),
            clients: self.clients_connected.load(Relaxed),
            levels_sent: self.levels_sent.load(Relaxed),
            chunk_packets_sent: self.chunk_packets_sent.load(Relaxed),
            level_bytes_sent: self.level_bytes_sent.load(Relaxed),
            transfers_failed: self.transfers_failed.load(Relaxed),
            clients_rejected: self.clients_rejected.load(Relaxed),
            hist: [
                self.hist_under_10ms.load(Relaxed),
                self.hist_10_100ms.load(Relaxed),
                self.hist_100ms_1s.load(Relaxed),
                self.hist_over_1s.load(Relaxed),
            ],
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable snapshot of all counters at a point in time.
#[derive(Clone, Debug, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: f64,
    pub connections_total: u64,
    pub clients: u64,
    pub levels_sent: u64,
    pub chunk_packets_sent: u64,
    pub level_bytes_sent: u64,
    pub transfers_failed: u64,
    pub clients_rejected: u64,
    /// `[<10ms, 10-100ms, 100ms-1s, >1s]`
    pub hist: [u64; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_transfers_land_in_buckets() {
        let m = Metrics::new();
        m.record_level_sent(4, 4096, Duration::from_millis(3));
        m.record_level_sent(10, 10_240, Duration::from_millis(250));
        m.record_level_sent(1, 7, Duration::from_secs(2));

        let snap = m.snapshot();
        assert_eq!(snap.levels_sent, 3);
        assert_eq!(snap.chunk_packets_sent, 15);
        assert_eq!(snap.level_bytes_sent, 14_343);
        assert_eq!(snap.hist, [1, 0, 1, 1]);
    }

    #[test]
    fn connection_gauge() {
        let m = Metrics::new();
        m.client_connected();
        m.client_connected();
        m.client_disconnected();
        let snap = m.snapshot();
        assert_eq!(snap.clients, 1);
        assert_eq!(snap.connections_total, 2);
    }

    #[test]
    fn snapshot_serializes() {
        let json = serde_json::to_value(Metrics::new().snapshot()).unwrap();
        assert_eq!(json["levels_sent"], 0);
        assert_eq!(json["hist"].as_array().unwrap().len(), 4);
    }
}

//! Process-wide sync statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use super::Direction;
use crate::catalog::CatalogId;

/// Counters accumulated across cycles, reset only at process start.
///
/// Written from the single running cycle, read concurrently by the control
/// surface; plain atomics are all the synchronization this needs.
#[derive(Debug, Default)]
pub struct CycleStats {
    added_to_spotify: AtomicU64,
    added_to_yandex: AtomicU64,
    error_count: AtomicU64,
    /// Unix timestamp of the last accepted cycle start, 0 when never run.
    last_run_started_at: AtomicI64,
}

impl CycleStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_add(&self, direction: Direction) {
        match direction {
            Direction::YandexToSpotify => &self.added_to_spotify,
            Direction::SpotifyToYandex => &self.added_to_yandex,
        }
        .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_run_started(&self) {
        self.last_run_started_at
            .store(Utc::now().timestamp(), Ordering::Relaxed);
    }

    pub fn added_to(&self, catalog: CatalogId) -> u64 {
        match catalog {
            CatalogId::Spotify => self.added_to_spotify.load(Ordering::Relaxed),
            CatalogId::Yandex => self.added_to_yandex.load(Ordering::Relaxed),
        }
    }

    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn last_run_started_at(&self) -> Option<DateTime<Utc>> {
        match self.last_run_started_at.load(Ordering::Relaxed) {
            0 => None,
            ts => DateTime::from_timestamp(ts, 0),
        }
    }
}

/// Coordinator state as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Idle,
    Running,
}

/// Read-only view served by `GET /status`, safe to take while a cycle runs.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub state: SyncState,
    pub last_run_started_at: Option<DateTime<Utc>>,
    pub added_to_spotify: u64,
    pub added_to_yandex: u64,
    pub error_count: u64,
}

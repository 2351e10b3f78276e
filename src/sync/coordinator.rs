//! Cycle coordinator: at most one reconciliation cycle at a time.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

use super::{CycleStats, Direction, StatusSnapshot, SyncEngine, SyncState};
use crate::catalog::CatalogId;

/// Outcome of asking for a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleRequest {
    Accepted,
    /// A cycle was already running; the request is dropped, not queued.
    RejectedBusy,
}

/// Runs full sync cycles (both directions, fixed order, sequential) and
/// guarantees mutual exclusion between the periodic timer and manual
/// triggers. Status reads never block a running cycle.
pub struct CycleCoordinator {
    engine: SyncEngine,
    stats: Arc<CycleStats>,
    running: AtomicBool,
}

/// Resets RUNNING→IDLE on drop, so the flag is released even when a pass
/// panics mid-cycle.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CycleCoordinator {
    pub fn new(engine: SyncEngine, stats: Arc<CycleStats>) -> Self {
        Self {
            engine,
            stats,
            running: AtomicBool::new(false),
        }
    }

    /// Run a full cycle inline, unless one is already running.
    ///
    /// Each direction's pass failure is contained: it is logged, counted,
    /// and the other direction still runs.
    pub async fn run_cycle(&self) -> CycleRequest {
        if !self.try_begin() {
            return CycleRequest::RejectedBusy;
        }
        self.run_passes().await;
        CycleRequest::Accepted
    }

    /// Accept or reject a cycle request and, when accepted, run the cycle on
    /// a background task. This is what the control surface calls so the
    /// caller gets an immediate answer.
    pub fn request_cycle(self: &Arc<Self>) -> CycleRequest {
        if !self.try_begin() {
            return CycleRequest::RejectedBusy;
        }

        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            coordinator.run_passes().await;
        });
        CycleRequest::Accepted
    }

    /// Atomically claim the RUNNING flag.
    fn try_begin(&self) -> bool {
        let claimed = self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !claimed {
            info!("Sync cycle already running, dropping request");
        }
        claimed
    }

    /// Both directional passes. Callers must have claimed the RUNNING flag.
    async fn run_passes(&self) {
        let _guard = RunningGuard(&self.running);
        self.stats.mark_run_started();
        info!(">>> Sync cycle started");

        for direction in Direction::ALL {
            if let Err(err) = self.engine.run_pass(direction).await {
                self.stats.record_error();
                error!("{} pass failed: {:#}", direction, err);
            }
        }

        info!("<<< Sync cycle finished");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Point-in-time view for the control surface; never blocks.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: if self.is_running() {
                SyncState::Running
            } else {
                SyncState::Idle
            },
            last_run_started_at: self.stats.last_run_started_at(),
            added_to_spotify: self.stats.added_to(CatalogId::Spotify),
            added_to_yandex: self.stats.added_to(CatalogId::Yandex),
            error_count: self.stats.error_count(),
        }
    }
}

//! One directional reconciliation pass.
//!
//! For each of the most recent source likes: resolve metadata, consult the
//! suppression list, search the target catalog, validate the top candidate by
//! text and duration similarity, then add it to the target library unless it
//! is already there. One broken track never aborts the batch.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogAdapter, TrackRef};
use crate::notifier::Notifier;
use crate::similarity::{durations_agree, text_similarity};
use crate::suppression::{register_failure_best_effort, SuppressionStore};

use super::{CycleStats, Direction, MatchKey};

/// Tunables for a directional pass.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// How many of the most recent source likes to consider per pass.
    pub scan_limit: usize,
    /// Minimum "Artist - Title" similarity ratio, compared inclusively.
    pub text_threshold: f64,
    /// Maximum tolerated duration difference between source and candidate.
    pub duration_tolerance_secs: u64,
    /// Politeness delay after each processed item.
    pub item_delay: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            scan_limit: 15,
            text_threshold: 0.8,
            duration_tolerance_secs: 10,
            item_delay: Duration::from_millis(500),
        }
    }
}

/// How a single source item ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    /// Candidate added to the target library.
    Added,
    /// Candidate already present, nothing to do.
    AlreadyLiked,
    /// Suppressed key, skipped before any API call.
    Suppressed,
    /// Target search returned nothing; failure registered.
    NoResult,
    /// Candidate failed the similarity checks; failure registered.
    Rejected,
}

pub struct SyncEngine {
    yandex: Arc<dyn CatalogAdapter>,
    spotify: Arc<dyn CatalogAdapter>,
    suppression: Mutex<SuppressionStore>,
    notifier: Arc<dyn Notifier>,
    stats: Arc<CycleStats>,
    settings: SyncSettings,
}

impl SyncEngine {
    pub fn new(
        yandex: Arc<dyn CatalogAdapter>,
        spotify: Arc<dyn CatalogAdapter>,
        suppression: SuppressionStore,
        notifier: Arc<dyn Notifier>,
        stats: Arc<CycleStats>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            yandex,
            spotify,
            suppression: Mutex::new(suppression),
            notifier,
            stats,
            settings,
        }
    }

    fn endpoints(&self, direction: Direction) -> (&Arc<dyn CatalogAdapter>, &Arc<dyn CatalogAdapter>) {
        match direction {
            Direction::YandexToSpotify => (&self.yandex, &self.spotify),
            Direction::SpotifyToYandex => (&self.spotify, &self.yandex),
        }
    }

    /// Run one source→target sweep.
    ///
    /// Returns `Err` only for pass-level failures (enumerating the source
    /// likes or snapshotting the target ids); per-item problems are logged
    /// and skipped inside the loop.
    pub async fn run_pass(&self, direction: Direction) -> Result<()> {
        let (source, target) = self.endpoints(direction);
        info!("Starting {} pass", direction);

        let recent = source
            .fetch_liked_refs(Some(self.settings.scan_limit))
            .await
            .with_context(|| format!("Failed to enumerate {} likes", source.id()))?;

        // Snapshot of everything already liked on the target, mutated locally
        // after each add so the same resolved track is never added twice
        // within one pass
        let mut target_ids: HashSet<String> = target
            .fetch_liked_refs(None)
            .await
            .with_context(|| format!("Failed to snapshot {} liked ids", target.id()))?
            .into_iter()
            .map(|r| r.native_id)
            .collect();

        debug!(
            "{}: scanning {} recent likes against {} target ids",
            direction,
            recent.len(),
            target_ids.len()
        );

        for track_ref in &recent {
            let outcome = self
                .process_item(direction, source, target, track_ref, &mut target_ids)
                .await;

            match outcome {
                // Suppressed items cost no API calls, so no delay either
                Ok(ItemOutcome::Suppressed) => continue,
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        "Skipping {} track {}: {:#}",
                        source.id(),
                        track_ref.native_id,
                        err
                    );
                }
            }

            tokio::time::sleep(self.settings.item_delay).await;
        }

        info!("Finished {} pass", direction);
        Ok(())
    }

    async fn process_item(
        &self,
        direction: Direction,
        source: &Arc<dyn CatalogAdapter>,
        target: &Arc<dyn CatalogAdapter>,
        track_ref: &TrackRef,
        target_ids: &mut HashSet<String>,
    ) -> Result<ItemOutcome> {
        let track = source.resolve_track(track_ref).await?;
        let key = MatchKey::new(direction, &track.artist, &track.title);

        if self.should_skip(&key) {
            debug!("'{}' is suppressed, skipping", key);
            return Ok(ItemOutcome::Suppressed);
        }

        let Some(candidate) = target.search_top_match(&track.artist, &track.title).await? else {
            debug!("No {} result for '{}'", target.id(), track.display_name());
            self.register_failure(&key);
            return Ok(ItemOutcome::NoResult);
        };

        let ratio = text_similarity(&track.display_name(), &candidate.display_name());
        if ratio < self.settings.text_threshold {
            debug!(
                "Rejected '{}' vs '{}': ratio {:.2} below {:.2}",
                track.display_name(),
                candidate.display_name(),
                ratio,
                self.settings.text_threshold
            );
            self.register_failure(&key);
            return Ok(ItemOutcome::Rejected);
        }

        if !durations_agree(
            track.duration_ms,
            candidate.duration_ms,
            self.settings.duration_tolerance_secs,
        ) {
            debug!(
                "Rejected '{}': duration {:?} vs {:?} exceeds {}s",
                track.display_name(),
                track.duration_ms,
                candidate.duration_ms,
                self.settings.duration_tolerance_secs
            );
            self.register_failure(&key);
            return Ok(ItemOutcome::Rejected);
        }

        if target_ids.contains(&candidate.native_id) {
            return Ok(ItemOutcome::AlreadyLiked);
        }

        // The snapshot was taken at pass start; ask the target directly
        // before mutating in case the library moved underneath us
        if target.is_liked(&candidate.native_id).await? {
            target_ids.insert(candidate.native_id.clone());
            return Ok(ItemOutcome::AlreadyLiked);
        }

        target.add_like(&candidate.native_id).await?;
        target_ids.insert(candidate.native_id.clone());
        self.stats.record_add(direction);

        info!(
            "[+] {} add: {} (id {})",
            target.id(),
            track.display_name(),
            candidate.native_id
        );
        self.notifier
            .notify(&format!(
                "Added to {}: {} - {}",
                target.id(),
                track.artist,
                track.title
            ))
            .await;

        Ok(ItemOutcome::Added)
    }

    fn should_skip(&self, key: &MatchKey) -> bool {
        self.suppression
            .lock()
            .expect("suppression store lock poisoned")
            .should_skip(key.as_str())
    }

    fn register_failure(&self, key: &MatchKey) {
        let mut store = self
            .suppression
            .lock()
            .expect("suppression store lock poisoned");
        register_failure_best_effort(&mut store, key.as_str());
    }

    /// Failure count for a key, for tests and diagnostics.
    pub fn suppression_count(&self, key: &str) -> u32 {
        self.suppression
            .lock()
            .expect("suppression store lock poisoned")
            .failure_count(key)
    }
}

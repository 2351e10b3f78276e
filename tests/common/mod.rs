//! Test doubles shared by the sync cycle tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use likesync::{CatalogAdapter, CatalogId, Notifier, TrackDescriptor, TrackRef};

pub fn track(
    catalog: CatalogId,
    id: &str,
    artist: &str,
    title: &str,
    duration_ms: Option<u64>,
) -> TrackDescriptor {
    TrackDescriptor {
        artist: artist.to_string(),
        title: title.to_string(),
        duration_ms,
        native_id: id.to_string(),
        catalog,
    }
}

#[derive(Default)]
struct MockState {
    /// Liked refs, most-recent first.
    liked: Vec<TrackRef>,
    /// Resolvable metadata by native id.
    tracks: HashMap<String, TrackDescriptor>,
    /// Canned top search result per `artist|title` query.
    search_results: HashMap<String, TrackDescriptor>,
    /// Ids whose resolution blows up.
    failing_resolutions: HashSet<String>,
}

/// In-memory stand-in for one catalog service.
pub struct MockCatalog {
    id: CatalogId,
    state: Mutex<MockState>,
    fail_like_list: AtomicBool,
    /// Simulated latency of the like-list fetch, to hold a pass open.
    like_list_delay: Mutex<Duration>,
    pub search_calls: AtomicUsize,
    pub add_calls: AtomicUsize,
}

impl MockCatalog {
    pub fn new(id: CatalogId) -> Self {
        Self {
            id,
            state: Mutex::new(MockState::default()),
            fail_like_list: AtomicBool::new(false),
            like_list_delay: Mutex::new(Duration::ZERO),
            search_calls: AtomicUsize::new(0),
            add_calls: AtomicUsize::new(0),
        }
    }

    /// Register a liked track with resolvable metadata. Most recently added
    /// ends up first in the like list, like the real services.
    pub fn add_liked_track(&self, descriptor: TrackDescriptor) {
        let mut state = self.state.lock().unwrap();
        state.liked.insert(0, TrackRef::new(descriptor.native_id.clone()));
        state.tracks.insert(descriptor.native_id.clone(), descriptor);
    }

    pub fn set_search_result(&self, artist: &str, title: &str, result: TrackDescriptor) {
        let mut state = self.state.lock().unwrap();
        state
            .search_results
            .insert(format!("{}|{}", artist, title), result);
    }

    pub fn fail_resolution_of(&self, native_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.failing_resolutions.insert(native_id.to_string());
    }

    pub fn fail_like_list(&self) {
        self.fail_like_list.store(true, Ordering::SeqCst);
    }

    pub fn set_like_list_delay(&self, delay: Duration) {
        *self.like_list_delay.lock().unwrap() = delay;
    }

    pub fn liked_ids(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.liked.iter().map(|r| r.native_id.clone()).collect()
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogAdapter for MockCatalog {
    fn id(&self) -> CatalogId {
        self.id
    }

    async fn fetch_liked_refs(&self, limit: Option<usize>) -> Result<Vec<TrackRef>> {
        let delay = *self.like_list_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_like_list.load(Ordering::SeqCst) {
            return Err(anyhow!("{} like list unavailable", self.id));
        }

        let state = self.state.lock().unwrap();
        let mut refs = state.liked.clone();
        if let Some(limit) = limit {
            refs.truncate(limit);
        }
        Ok(refs)
    }

    async fn resolve_track(&self, track: &TrackRef) -> Result<TrackDescriptor> {
        let state = self.state.lock().unwrap();
        if state.failing_resolutions.contains(&track.native_id) {
            return Err(anyhow!("broken track {}", track.native_id));
        }
        state
            .tracks
            .get(&track.native_id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown track {}", track.native_id))
    }

    async fn search_top_match(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<TrackDescriptor>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state
            .search_results
            .get(&format!("{}|{}", artist, title))
            .cloned())
    }

    async fn is_liked(&self, native_id: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.liked.iter().any(|r| r.native_id == native_id))
    }

    async fn add_like(&self, native_id: &str) -> Result<()> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        state.liked.insert(0, TrackRef::new(native_id));
        Ok(())
    }
}

/// Records every message instead of delivering it.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

//! Catalog adapters for the two external music services.
//!
//! The sync engine only ever talks to catalogs through the [`CatalogAdapter`]
//! trait; the concrete Spotify and Yandex Music clients live in their own
//! submodules. Adapter errors are deliberately untyped: any failure is a
//! generic transient error and the engine treats them all the same way.

mod spotify;
mod yandex;

pub use spotify::SpotifyCatalog;
pub use yandex::YandexCatalog;

use anyhow::Result;
use async_trait::async_trait;

/// Which of the two external services a track or adapter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogId {
    Yandex,
    Spotify,
}

impl std::fmt::Display for CatalogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogId::Yandex => write!(f, "yandex"),
            CatalogId::Spotify => write!(f, "spotify"),
        }
    }
}

/// Lightweight reference to a liked track, as returned by the like-list
/// endpoints. Only carries what is needed to resolve the full metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRef {
    pub native_id: String,
}

impl TrackRef {
    pub fn new(native_id: impl Into<String>) -> Self {
        Self {
            native_id: native_id.into(),
        }
    }
}

/// Full metadata snapshot for one track, pulled from a catalog at query time.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDescriptor {
    pub artist: String,
    pub title: String,
    /// Track length; `None` when the catalog did not report one.
    pub duration_ms: Option<u64>,
    pub native_id: String,
    pub catalog: CatalogId,
}

impl TrackDescriptor {
    /// The `"Artist - Title"` form used for match keys and similarity checks.
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }
}

/// One external music service holding a user's liked-tracks collection.
///
/// All liked-track operations may fail transiently; callers treat any error
/// as a per-item failure and move on.
#[async_trait]
pub trait CatalogAdapter: Send + Sync {
    fn id(&self) -> CatalogId;

    /// References to liked tracks, most-recent first.
    ///
    /// `limit` of `None` fetches the complete list, which is how the engine
    /// snapshots the target catalog's id set.
    async fn fetch_liked_refs(&self, limit: Option<usize>) -> Result<Vec<TrackRef>>;

    /// Full metadata for a single liked track.
    ///
    /// Resolved one track at a time so a single broken entry never poisons
    /// the whole like list.
    async fn resolve_track(&self, track: &TrackRef) -> Result<TrackDescriptor>;

    /// Best search result for an artist/title pair, or `None` when the
    /// catalog has no hit at all. Only the top-ranked result is considered.
    async fn search_top_match(&self, artist: &str, title: &str)
        -> Result<Option<TrackDescriptor>>;

    /// Whether the given track is already in the liked collection.
    async fn is_liked(&self, native_id: &str) -> Result<bool>;

    /// Add the given track to the liked collection.
    async fn add_like(&self, native_id: &str) -> Result<()>;
}

//! Liked-tracks reconciliation: the directional sync engine and the cycle
//! coordinator that runs it.

mod coordinator;
mod engine;
mod stats;

pub use coordinator::{CycleCoordinator, CycleRequest};
pub use engine::{SyncEngine, SyncSettings};
pub use stats::{CycleStats, StatusSnapshot, SyncState};

/// One source→target sweep; a full cycle runs both, Yandex→Spotify first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    YandexToSpotify,
    SpotifyToYandex,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::YandexToSpotify, Direction::SpotifyToYandex];
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::YandexToSpotify => write!(f, "yandex->spotify"),
            Direction::SpotifyToYandex => write!(f, "spotify->yandex"),
        }
    }
}

/// Stable per-direction identity of a source track, used as the suppression
/// key.
///
/// Built from the source-side artist/title exactly as resolved, with no case
/// or whitespace normalization: if upstream metadata is reformatted between
/// runs the track comes back under a fresh key and gets retried. Known
/// limitation, kept on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey(String);

impl MatchKey {
    pub fn new(direction: Direction, artist: &str, title: &str) -> Self {
        Self(format!("{}:{} - {}", direction, artist, title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

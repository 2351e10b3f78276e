//! Spotify Web API adapter.
//!
//! Talks to the user's library ("Your Music") endpoints plus track search.
//! Token acquisition is out of scope: the adapter is handed a ready OAuth
//! access token with `user-library-read` and `user-library-modify` scopes.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::{CatalogAdapter, CatalogId, TrackDescriptor, TrackRef};

const API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Saved-tracks pages are capped by the API at 50 items.
const PAGE_SIZE: usize = 50;

pub struct SpotifyCatalog {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl SpotifyCatalog {
    pub fn new(access_token: String, timeout_sec: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            access_token,
            base_url: API_BASE_URL.to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .with_context(|| format!("Failed to reach Spotify at {}", url))?;

        if !response.status().is_success() {
            bail!("Spotify request {} failed: status {}", url, response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse Spotify response")
    }
}

#[async_trait]
impl CatalogAdapter for SpotifyCatalog {
    fn id(&self) -> CatalogId {
        CatalogId::Spotify
    }

    async fn fetch_liked_refs(&self, limit: Option<usize>) -> Result<Vec<TrackRef>> {
        let mut refs = Vec::new();
        let mut offset = 0usize;

        loop {
            let page_limit = match limit {
                Some(wanted) => (wanted - refs.len()).min(PAGE_SIZE),
                None => PAGE_SIZE,
            };
            if page_limit == 0 {
                break;
            }

            let url = format!(
                "{}/me/tracks?limit={}&offset={}",
                self.base_url, page_limit, offset
            );
            let page: SavedTracksPage = self.get_json(&url).await?;

            let fetched = page.items.len();
            refs.extend(
                page.items
                    .into_iter()
                    .map(|item| TrackRef::new(item.track.id)),
            );
            offset += fetched;

            if fetched < page_limit || page.next.is_none() {
                break;
            }
        }

        Ok(refs)
    }

    async fn resolve_track(&self, track: &TrackRef) -> Result<TrackDescriptor> {
        let url = format!("{}/tracks/{}", self.base_url, track.native_id);
        let track: SpotifyTrack = self.get_json(&url).await?;
        Ok(track.into_descriptor())
    }

    async fn search_top_match(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<TrackDescriptor>> {
        let query = format!("artist:{} track:{}", artist, title);
        let url = format!(
            "{}/search?q={}&type=track&limit=1",
            self.base_url,
            urlencoding::encode(&query)
        );
        let response: SearchResponse = self.get_json(&url).await?;

        Ok(response
            .tracks
            .items
            .into_iter()
            .next()
            .map(SpotifyTrack::into_descriptor))
    }

    async fn is_liked(&self, native_id: &str) -> Result<bool> {
        let url = format!("{}/me/tracks/contains?ids={}", self.base_url, native_id);
        let contained: Vec<bool> = self.get_json(&url).await?;
        Ok(contained.first().copied().unwrap_or(false))
    }

    async fn add_like(&self, native_id: &str) -> Result<()> {
        let url = format!("{}/me/tracks?ids={}", self.base_url, native_id);
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await
            .context("Failed to reach Spotify to add a liked track")?;

        if !response.status().is_success() {
            bail!(
                "Spotify refused to like track {}: status {}",
                native_id,
                response.status()
            );
        }
        Ok(())
    }
}

// =============================================================================
// Spotify API response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct SavedTracksPage {
    items: Vec<SavedTrackItem>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SavedTrackItem {
    track: SpotifyTrack,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: SearchTracks,
}

#[derive(Debug, Deserialize)]
struct SearchTracks {
    items: Vec<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    id: String,
    name: String,
    duration_ms: Option<u64>,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: String,
}

impl SpotifyTrack {
    fn into_descriptor(self) -> TrackDescriptor {
        let artist = self
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_else(|| "Unknown".to_string());

        TrackDescriptor {
            artist,
            title: self.name,
            duration_ms: self.duration_ms.filter(|&d| d > 0),
            native_id: self.id,
            catalog: CatalogId::Spotify,
        }
    }
}

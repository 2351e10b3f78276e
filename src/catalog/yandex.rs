//! Yandex Music API adapter.
//!
//! Uses the unofficial but stable `api.music.yandex.net` endpoints. The
//! adapter is handed a ready OAuth token; the account uid behind the token is
//! resolved lazily on first use and cached for the process lifetime.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::{CatalogAdapter, CatalogId, TrackDescriptor, TrackRef};

const API_BASE_URL: &str = "https://api.music.yandex.net";

pub struct YandexCatalog {
    client: reqwest::Client,
    token: String,
    base_url: String,
    uid: OnceCell<u64>,
}

impl YandexCatalog {
    pub fn new(token: String, timeout_sec: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            token,
            base_url: API_BASE_URL.to_string(),
            uid: OnceCell::new(),
        }
    }

    /// Account uid for the configured token, fetched once from
    /// `/account/status`.
    async fn uid(&self) -> Result<u64> {
        self.uid
            .get_or_try_init(|| async {
                let url = format!("{}/account/status", self.base_url);
                let status: ApiResult<AccountStatus> = self.get_json(&url).await?;
                status
                    .result
                    .account
                    .uid
                    .context("Yandex account status carried no uid")
            })
            .await
            .copied()
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("OAuth {}", self.token))
            .send()
            .await
            .with_context(|| format!("Failed to reach Yandex Music at {}", url))?;

        if !response.status().is_success() {
            bail!(
                "Yandex Music request {} failed: status {}",
                url,
                response.status()
            );
        }

        response
            .json()
            .await
            .context("Failed to parse Yandex Music response")
    }
}

#[async_trait]
impl CatalogAdapter for YandexCatalog {
    fn id(&self) -> CatalogId {
        CatalogId::Yandex
    }

    async fn fetch_liked_refs(&self, limit: Option<usize>) -> Result<Vec<TrackRef>> {
        let uid = self.uid().await?;
        let url = format!("{}/users/{}/likes/tracks", self.base_url, uid);
        let likes: ApiResult<LikesResult> = self.get_json(&url).await?;

        // The API returns the full library in one response, newest first
        let mut refs: Vec<TrackRef> = likes
            .result
            .library
            .tracks
            .into_iter()
            .map(|entry| TrackRef::new(entry.id.into_string()))
            .collect();

        if let Some(limit) = limit {
            refs.truncate(limit);
        }
        Ok(refs)
    }

    async fn resolve_track(&self, track: &TrackRef) -> Result<TrackDescriptor> {
        let url = format!("{}/tracks/{}", self.base_url, track.native_id);
        let tracks: ApiResult<Vec<YandexTrack>> = self.get_json(&url).await?;
        tracks
            .result
            .into_iter()
            .next()
            .with_context(|| format!("Yandex track {} resolved to nothing", track.native_id))
            .map(YandexTrack::into_descriptor)
    }

    async fn search_top_match(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<TrackDescriptor>> {
        let query = format!("{} - {}", artist, title);
        let url = format!(
            "{}/search?text={}&type=track&page=0",
            self.base_url,
            urlencoding::encode(&query)
        );
        let response: ApiResult<SearchResult> = self.get_json(&url).await?;

        Ok(response
            .result
            .tracks
            .and_then(|tracks| tracks.results.into_iter().next())
            .map(YandexTrack::into_descriptor))
    }

    async fn is_liked(&self, native_id: &str) -> Result<bool> {
        // No dedicated membership endpoint; the like list is one cheap call
        let refs = self.fetch_liked_refs(None).await?;
        Ok(refs.iter().any(|r| r.native_id == native_id))
    }

    async fn add_like(&self, native_id: &str) -> Result<()> {
        let uid = self.uid().await?;
        let url = format!("{}/users/{}/likes/tracks/add", self.base_url, uid);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("OAuth {}", self.token))
            .form(&[("track-id", native_id)])
            .send()
            .await
            .context("Failed to reach Yandex Music to add a liked track")?;

        if !response.status().is_success() {
            bail!(
                "Yandex Music refused to like track {}: status {}",
                native_id,
                response.status()
            );
        }
        Ok(())
    }
}

// =============================================================================
// Yandex Music API response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct ApiResult<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct AccountStatus {
    account: Account,
}

#[derive(Debug, Deserialize)]
struct Account {
    uid: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct LikesResult {
    library: Library,
}

#[derive(Debug, Deserialize)]
struct Library {
    tracks: Vec<LikeEntry>,
}

#[derive(Debug, Deserialize)]
struct LikeEntry {
    id: YandexId,
}

/// Track ids come back as numbers or strings depending on the endpoint;
/// everything is coerced to a string so `"123"` and `123` never diverge.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YandexId {
    Num(u64),
    Str(String),
}

impl YandexId {
    fn into_string(self) -> String {
        match self {
            YandexId::Num(n) => n.to_string(),
            YandexId::Str(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    tracks: Option<SearchTracks>,
}

#[derive(Debug, Deserialize)]
struct SearchTracks {
    results: Vec<YandexTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YandexTrack {
    id: YandexId,
    title: String,
    duration_ms: Option<u64>,
    #[serde(default)]
    artists: Vec<YandexArtist>,
}

#[derive(Debug, Deserialize)]
struct YandexArtist {
    name: String,
}

impl YandexTrack {
    fn into_descriptor(self) -> TrackDescriptor {
        let artist = self
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_else(|| "Unknown".to_string());

        TrackDescriptor {
            artist,
            title: self.title,
            duration_ms: self.duration_ms.filter(|&d| d > 0),
            native_id: self.id.into_string(),
            catalog: CatalogId::Yandex,
        }
    }
}

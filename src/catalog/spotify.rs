//! Spotify Web API catalog client.
//!
//! Authenticates with the client-credentials flow and caches the access
//! token until shortly before it expires.

use super::{CatalogClient, CatalogError, CatalogTrack};
use crate::config::CatalogSettings;
use crate::credentials::require;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
pub const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/api/token";

/// Tokens are refreshed this long before Spotify considers them expired.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Spotify rejects search limits outside this range.
const MAX_SEARCH_LIMIT: usize = 50;

struct AccessToken {
    value: String,
    expires_at: Instant,
}

pub struct SpotifyClient {
    client: Client,
    client_id: String,
    client_secret: String,
    api_base_url: String,
    auth_url: String,
    token: Mutex<Option<AccessToken>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<SpotifyTrack>,
}

#[derive(Deserialize)]
struct SpotifyTrack {
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
    album: Option<SpotifyAlbum>,
    #[serde(default)]
    external_urls: ExternalUrls,
    #[serde(default)]
    popularity: u32,
    preview_url: Option<String>,
    duration_ms: Option<u64>,
}

#[derive(Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Deserialize)]
struct SpotifyAlbum {
    name: Option<String>,
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

#[derive(Deserialize)]
struct SpotifyImage {
    url: String,
}

#[derive(Deserialize, Default)]
struct ExternalUrls {
    spotify: Option<String>,
}

impl From<SpotifyTrack> for CatalogTrack {
    fn from(track: SpotifyTrack) -> Self {
        let id = track.id.unwrap_or_default();
        let external_url = track
            .external_urls
            .spotify
            .unwrap_or_else(|| format!("https://open.spotify.com/track/{}", id));
        let (album, album_cover) = match track.album {
            Some(album) => (album.name, album.images.into_iter().next().map(|i| i.url)),
            None => (None, None),
        };
        CatalogTrack {
            id,
            name: track.name,
            artist: track
                .artists
                .into_iter()
                .next()
                .map(|a| a.name)
                .unwrap_or_default(),
            album,
            album_cover,
            external_url,
            popularity: track.popularity.min(100),
            preview_url: track.preview_url,
            duration_ms: track.duration_ms,
        }
    }
}

impl SpotifyClient {
    /// Create a new Spotify client.
    ///
    /// Fails immediately if either credential is missing or blank; no
    /// network call is made until the first search.
    pub fn new(
        client_id: Option<&str>,
        client_secret: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let client_id = require(client_id, "spotify", "client_id")?;
        let client_secret = require(client_secret, "spotify", "client_secret")?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Connection(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            client_id,
            client_secret,
            api_base_url: SPOTIFY_API_BASE.to_string(),
            auth_url: SPOTIFY_AUTH_URL.to_string(),
            token: Mutex::new(None),
        })
    }

    pub fn from_settings(settings: &CatalogSettings) -> Result<Self, CatalogError> {
        Ok(Self::new(
            settings.client_id.as_deref(),
            settings.client_secret.as_deref(),
            Duration::from_secs(settings.timeout_sec),
        )?
        .with_endpoints(&settings.api_base_url, &settings.auth_url))
    }

    /// Point the client at different API and token endpoints.
    pub fn with_endpoints(mut self, api_base_url: &str, auth_url: &str) -> Self {
        self.api_base_url = api_base_url.trim_end_matches('/').to_string();
        self.auth_url = auth_url.to_string();
        self
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Return a valid access token, exchanging credentials if needed.
    async fn access_token(&self) -> Result<String, CatalogError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_REFRESH_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting Spotify access token");
        let response = self
            .client
            .post(&self.auth_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Auth(format!(
                "Spotify rejected client credentials (status {}): {}",
                status.as_u16(),
                body
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            CatalogError::InvalidResponse(format!("Failed to parse token response: {}", e))
        })?;

        let value = body.access_token;
        *cached = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        });
        Ok(value)
    }
}

#[async_trait]
impl CatalogClient for SpotifyClient {
    fn name(&self) -> &str {
        "spotify"
    }

    async fn search(
        &self,
        query: &str,
        market: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, CatalogError> {
        let token = self.access_token().await?;
        let url = format!("{}/search", self.api_base_url);
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT).to_string();

        let mut params = vec![("q", query), ("type", "track"), ("limit", limit.as_str())];
        if let Some(market) = market {
            params.push(("market", market));
        }

        debug!(query = %query, market = ?market, "Searching Spotify");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // Token revoked or expired early; drop it so the next call re-authenticates.
            self.token.lock().await.take();
            warn!("Spotify rejected the cached access token");
            return Err(CatalogError::Auth("Access token rejected".to_string()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CatalogError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: SearchResponse = response.json().await.map_err(|e| {
            CatalogError::InvalidResponse(format!("Failed to parse search response: {}", e))
        })?;

        let tracks: Vec<CatalogTrack> = body
            .tracks
            .map(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .map(CatalogTrack::from)
            .collect();

        debug!(query = %query, count = tracks.len(), "Spotify search returned");
        Ok(tracks)
    }

    async fn health_check(&self) -> Result<(), CatalogError> {
        self.access_token().await.map(|_| ())
    }
}

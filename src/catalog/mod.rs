//! Music catalog abstraction.
//!
//! The recommendation core talks to the catalog only through
//! [`CatalogClient`]: keyword searches to find trending tracks, and
//! field-qualified searches to enrich model suggestions with metadata.

mod spotify;

pub use spotify::{SpotifyClient, SPOTIFY_API_BASE, SPOTIFY_AUTH_URL};

use crate::credentials::MissingCredentialError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A track as returned by a catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub id: String,
    pub name: String,
    /// Primary (first listed) artist.
    pub artist: String,
    pub album: Option<String>,
    pub album_cover: Option<String>,
    pub external_url: String,
    /// Trending score in `0..=100`.
    pub popularity: u32,
    pub preview_url: Option<String>,
    pub duration_ms: Option<u64>,
}

/// Errors that can occur when talking to a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Credential(#[from] MissingCredentialError),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout
        } else if e.is_decode() {
            CatalogError::InvalidResponse(e.to_string())
        } else {
            CatalogError::Connection(e.to_string())
        }
    }
}

/// Trait for music catalog backends.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Get the catalog's name (e.g., "spotify").
    fn name(&self) -> &str;

    /// Search tracks.
    ///
    /// # Arguments
    /// * `query` - Free text, or a field-qualified query such as
    ///   `track:Boss artist:Meet Bros`.
    /// * `market` - Optional market hint (ISO country code).
    /// * `limit` - Maximum number of tracks to return.
    async fn search(
        &self,
        query: &str,
        market: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, CatalogError>;

    /// Check that the catalog is reachable and the credentials are accepted.
    async fn health_check(&self) -> Result<(), CatalogError>;
}

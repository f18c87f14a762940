//! Data model of a recommendation request.
//!
//! Everything that comes out of the generative model is validated and
//! defaulted here, once, at deserialization time. Consumers never see a
//! missing field: text fields fall back to [`UNKNOWN`] or the empty string,
//! optional metadata is an `Option`, and malformed list entries are dropped.

use super::normalize::{self, DedupKey};
use crate::catalog::CatalogTrack;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Scene field value when nothing could be parsed.
pub const UNKNOWN: &str = "unknown";
/// Scene field value when only field-level extraction succeeded.
pub const EXTRACTED_FALLBACK: &str = "extracted_fallback";
/// `catalog_url` of a candidate with no catalog match.
pub const CATALOG_URL_UNAVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl EnergyLevel {
    /// Case-insensitive; anything other than low/medium/high is `Medium`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => EnergyLevel::Low,
            "high" => EnergyLevel::High,
            _ => EnergyLevel::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyLevel::Low => "low",
            EnergyLevel::Medium => "medium",
            EnergyLevel::High => "high",
        }
    }
}

impl<'de> Deserialize<'de> for EnergyLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => EnergyLevel::parse_lenient(&s),
            _ => EnergyLevel::Medium,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneAnalysis {
    #[serde(deserialize_with = "lenient_text")]
    pub primary_mood: String,
    #[serde(deserialize_with = "lenient_text")]
    pub visual_elements: String,
    #[serde(deserialize_with = "lenient_text")]
    pub atmosphere: String,
    pub energy_level: EnergyLevel,
    #[serde(deserialize_with = "lenient_text")]
    pub setting_type: String,
}

impl SceneAnalysis {
    fn filled_with(value: &str) -> Self {
        Self {
            primary_mood: value.to_string(),
            visual_elements: value.to_string(),
            atmosphere: value.to_string(),
            energy_level: EnergyLevel::Medium,
            setting_type: value.to_string(),
        }
    }

    pub fn unknown() -> Self {
        Self::filled_with(UNKNOWN)
    }

    pub fn extracted_fallback() -> Self {
        Self::filled_with(EXTRACTED_FALLBACK)
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::unknown()
    }
}

impl Default for SceneAnalysis {
    fn default() -> Self {
        Self::unknown()
    }
}

/// One song as suggested by the generative model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationEntry {
    /// Also read from `title` when `song_title` is absent.
    #[serde(default, deserialize_with = "lenient_string")]
    pub song_title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub artist: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional"
    )]
    pub suggested_caption: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional"
    )]
    pub language: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional"
    )]
    pub genre: Option<String>,
}

impl RecommendationEntry {
    pub fn new(song_title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            song_title: song_title.into(),
            artist: artist.into(),
            ..Default::default()
        }
    }
}

/// Structured content of one generative-model response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedResponse {
    /// Also read from `keywords` when `spotify_keywords` is absent, see
    /// [`ParsedResponse::from_value`].
    #[serde(rename = "spotify_keywords", deserialize_with = "lenient_keywords")]
    pub keywords: Vec<String>,
    #[serde(deserialize_with = "lenient_scene")]
    pub scene_analysis: SceneAnalysis,
    #[serde(deserialize_with = "lenient_entries")]
    pub recommendations: Vec<RecommendationEntry>,
}

impl ParsedResponse {
    /// Build from a JSON object, accepting `keywords` in place of
    /// `spotify_keywords`. `None` when `value` is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(mut fields) => {
                resolve_alias(&mut fields, "spotify_keywords", "keywords");
                serde_json::from_value(Value::Object(fields)).ok()
            }
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.recommendations.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Catalog,
    Generative,
}

impl CandidateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateSource::Catalog => "catalog",
            CandidateSource::Generative => "generative",
        }
    }
}

/// One song recommendation before or after merge and enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub artist: String,
    pub source: CandidateSource,
    /// Catalog link, or [`CATALOG_URL_UNAVAILABLE`].
    pub catalog_url: String,
    /// 0 when unknown.
    pub popularity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl Candidate {
    pub fn from_catalog(track: CatalogTrack) -> Self {
        Self {
            title: track.name,
            artist: track.artist,
            source: CandidateSource::Catalog,
            catalog_url: track.external_url,
            popularity: track.popularity,
            verified_title: None,
            verified_artist: None,
            album: track.album,
            album_cover: track.album_cover,
            preview_url: track.preview_url,
            suggested_caption: None,
            language: None,
            genre: None,
        }
    }

    /// Title is taken as-is; cleaning happens at merge time.
    pub fn from_entry(entry: RecommendationEntry) -> Self {
        Self {
            title: entry.song_title,
            artist: entry.artist,
            source: CandidateSource::Generative,
            catalog_url: CATALOG_URL_UNAVAILABLE.to_string(),
            popularity: 0,
            verified_title: None,
            verified_artist: None,
            album: None,
            album_cover: None,
            preview_url: None,
            suggested_caption: entry.suggested_caption,
            language: entry.language,
            genre: entry.genre,
        }
    }

    pub fn dedup_key(&self) -> DedupKey {
        normalize::dedup_key(&self.title, &self.artist)
    }

    pub fn has_catalog_url(&self) -> bool {
        self.catalog_url != CATALOG_URL_UNAVAILABLE
    }

    /// Attach the metadata of a matched catalog track.
    pub fn apply_catalog_match(&mut self, track: &CatalogTrack) {
        self.catalog_url = track.external_url.clone();
        self.verified_title = Some(track.name.clone());
        self.verified_artist = Some(track.artist.clone());
        self.popularity = track.popularity;
        if self.album.is_none() {
            self.album = track.album.clone();
        }
        if self.album_cover.is_none() {
            self.album_cover = track.album_cover.clone();
        }
        if self.preview_url.is_none() {
            self.preview_url = track.preview_url.clone();
        }
    }

    pub fn mark_unavailable(&mut self) {
        self.catalog_url = CATALOG_URL_UNAVAILABLE.to_string();
        self.popularity = 0;
        self.verified_title = None;
        self.verified_artist = None;
    }
}

/// Final output of one recommendation request.
///
/// The order of `recommendations` is the ranking shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub scene_analysis: SceneAnalysis,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub recommendations: Vec<Candidate>,
}

impl RecommendationResult {
    pub fn new(scene_analysis: SceneAnalysis, recommendations: Vec<Candidate>) -> Self {
        Self {
            scene_analysis,
            keywords: Vec::new(),
            recommendations,
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Unknown scene, no keywords, no recommendations.
    pub fn empty() -> Self {
        Self::new(SceneAnalysis::unknown(), Vec::new())
    }

    pub fn count_by_source(&self, source: CandidateSource) -> usize {
        self.recommendations
            .iter()
            .filter(|c| c.source == source)
            .count()
    }
}

/// Move `alias` to `canonical` when only the alias is present; drop it
/// otherwise. The canonical key always wins.
fn resolve_alias(fields: &mut Map<String, Value>, canonical: &str, alias: &str) {
    if let Some(value) = fields.remove(alias) {
        if !fields.contains_key(canonical) {
            fields.insert(canonical.to_string(), value);
        }
    }
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(value_to_text)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(value)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string()))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(value).unwrap_or_default())
}

fn lenient_optional<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(value).filter(|s| !s.is_empty()))
}

fn lenient_keywords<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let keywords: Vec<String> = match value {
        Value::Array(items) => items.into_iter().filter_map(value_to_text).collect(),
        Value::String(s) => s.split(',').map(|k| k.trim().to_string()).collect(),
        _ => Vec::new(),
    };
    Ok(keywords.into_iter().filter(|k| !k.is_empty()).collect())
}

fn lenient_scene<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SceneAnalysis, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => SceneAnalysis::unknown(),
    })
}

fn lenient_entries<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<RecommendationEntry>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(mut fields) => {
                    resolve_alias(&mut fields, "song_title", "title");
                    serde_json::from_value(Value::Object(fields)).ok()
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

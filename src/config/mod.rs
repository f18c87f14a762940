mod file_config;

pub use file_config::{CatalogConfig, EngineConfig, FileConfig, LlmConfig};

use crate::catalog::{SPOTIFY_API_BASE, SPOTIFY_AUTH_URL};
use crate::llm::{GenerationOptions, GEMINI_API_BASE};
use anyhow::{bail, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const GEMINI_DEFAULT_BASE_URL: &str = GEMINI_API_BASE;
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Minimum catalog popularity for a keyword-search hit to count as trending.
pub const DEFAULT_POPULARITY_THRESHOLD: u32 = 35;
/// Results requested per keyword search.
pub const DEFAULT_KEYWORD_SEARCH_LIMIT: usize = 8;
pub const DEFAULT_MAX_KEYWORDS: usize = 4;
/// Results requested per enrichment lookup query.
pub const DEFAULT_ENRICHMENT_SEARCH_LIMIT: usize = 10;
pub const DEFAULT_MARKET: &str = "IN";
pub const DEFAULT_MAX_FIELD_LENGTH: usize = 50;
pub const DEFAULT_MAX_TITLE_ONLY_LENGTH: usize = 100;
pub const DEFAULT_MAX_QUERY_LENGTH: usize = 200;
pub const DEFAULT_PACING_INTERVAL_MS: u64 = 300;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    #[default]
    Gemini,
    #[value(name = "openai")]
    #[serde(rename = "openai")]
    OpenAi,
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub llm_provider: LlmProviderKind,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub llm_api_key_command: Option<String>,
    pub llm_model: Option<String>,
    pub llm_base_url: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub market: Option<String>,
    pub pacing_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmSettings,
    pub catalog: CatalogSettings,
    pub engine: EngineSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    ///
    /// Credentials are carried through unchecked; a missing one is reported
    /// when the clients are constructed.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let llm_file = file.llm.unwrap_or_default();
        let provider = match llm_file.provider.as_deref() {
            Some(s) => match parse_provider(s) {
                Some(kind) => kind,
                None => bail!("Unknown LLM provider in config file: {:?}", s),
            },
            None => cli.llm_provider,
        };
        let defaults = LlmSettings::default_for(provider);
        let cli_api_key = match provider {
            LlmProviderKind::Gemini => cli.gemini_api_key.clone(),
            LlmProviderKind::OpenAi => cli.openai_api_key.clone(),
        };

        let llm = LlmSettings {
            provider,
            api_key: llm_file.api_key.or(cli_api_key),
            api_key_command: llm_file
                .api_key_command
                .or_else(|| cli.llm_api_key_command.clone()),
            model: llm_file
                .model
                .or_else(|| cli.llm_model.clone())
                .unwrap_or(defaults.model),
            base_url: llm_file
                .base_url
                .or_else(|| cli.llm_base_url.clone())
                .unwrap_or(defaults.base_url),
            temperature: llm_file.temperature.unwrap_or(defaults.temperature),
            max_output_tokens: llm_file
                .max_output_tokens
                .unwrap_or(defaults.max_output_tokens),
            top_p: llm_file.top_p.unwrap_or(defaults.top_p),
            timeout_sec: llm_file.timeout_sec.unwrap_or(defaults.timeout_sec),
        };

        if !(0.0..=2.0).contains(&llm.temperature) {
            bail!(
                "temperature must be between 0.0 and 2.0, got {}",
                llm.temperature
            );
        }
        if !(0.0..=1.0).contains(&llm.top_p) {
            bail!("top_p must be between 0.0 and 1.0, got {}", llm.top_p);
        }

        let catalog_file = file.catalog.unwrap_or_default();
        let catalog_defaults = CatalogSettings::default();
        let catalog = CatalogSettings {
            client_id: catalog_file
                .client_id
                .or_else(|| cli.spotify_client_id.clone()),
            client_secret: catalog_file
                .client_secret
                .or_else(|| cli.spotify_client_secret.clone()),
            api_base_url: catalog_file
                .api_base_url
                .unwrap_or(catalog_defaults.api_base_url),
            auth_url: catalog_file.auth_url.unwrap_or(catalog_defaults.auth_url),
            timeout_sec: catalog_file
                .timeout_sec
                .unwrap_or(catalog_defaults.timeout_sec),
        };

        let engine_file = file.engine.unwrap_or_default();
        let engine_defaults = EngineSettings::default();
        let market = match engine_file.market.or_else(|| cli.market.clone()) {
            Some(m) if m.trim().is_empty() => None,
            Some(m) => Some(m.trim().to_string()),
            None => engine_defaults.market,
        };
        let engine = EngineSettings {
            popularity_threshold: engine_file
                .popularity_threshold
                .unwrap_or(engine_defaults.popularity_threshold),
            keyword_search_limit: engine_file
                .keyword_search_limit
                .unwrap_or(engine_defaults.keyword_search_limit),
            max_keywords: engine_file
                .max_keywords
                .unwrap_or(engine_defaults.max_keywords),
            enrichment_search_limit: engine_file
                .enrichment_search_limit
                .unwrap_or(engine_defaults.enrichment_search_limit),
            market,
            max_field_length: engine_file
                .max_field_length
                .unwrap_or(engine_defaults.max_field_length),
            max_title_only_length: engine_file
                .max_title_only_length
                .unwrap_or(engine_defaults.max_title_only_length),
            max_query_length: engine_file
                .max_query_length
                .unwrap_or(engine_defaults.max_query_length),
            pacing_interval_ms: engine_file
                .pacing_interval_ms
                .or(cli.pacing_ms)
                .unwrap_or(engine_defaults.pacing_interval_ms),
        };

        if engine.popularity_threshold > 100 {
            bail!(
                "popularity_threshold must be at most 100, got {}",
                engine.popularity_threshold
            );
        }
        if engine.max_keywords == 0 {
            bail!("max_keywords must be at least 1");
        }

        Ok(Self {
            llm,
            catalog,
            engine,
        })
    }
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProviderKind,
    pub api_key: Option<String>,
    /// Shell command printing a fresh API key (openai only).
    pub api_key_command: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub timeout_sec: u64,
}

impl LlmSettings {
    /// Defaults for the given provider, without credentials.
    pub fn default_for(provider: LlmProviderKind) -> Self {
        let (model, base_url) = match provider {
            LlmProviderKind::Gemini => (GEMINI_DEFAULT_MODEL, GEMINI_DEFAULT_BASE_URL),
            LlmProviderKind::OpenAi => (OPENAI_DEFAULT_MODEL, OPENAI_DEFAULT_BASE_URL),
        };
        let options = GenerationOptions::default();
        Self {
            provider,
            api_key: None,
            api_key_command: None,
            model: model.to_string(),
            base_url: base_url.to_string(),
            temperature: options.temperature,
            max_output_tokens: options.max_tokens.unwrap_or(4000),
            top_p: options.top_p.unwrap_or(0.9),
            timeout_sec: options.timeout.as_secs(),
        }
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_tokens: Some(self.max_output_tokens),
            top_p: Some(self.top_p),
            timeout: Duration::from_secs(self.timeout_sec),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_base_url: String,
    pub auth_url: String,
    pub timeout_sec: u64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_base_url: SPOTIFY_API_BASE.to_string(),
            auth_url: SPOTIFY_AUTH_URL.to_string(),
            timeout_sec: 30,
        }
    }
}

/// Tuning knobs of the recommendation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub popularity_threshold: u32,
    pub keyword_search_limit: usize,
    pub max_keywords: usize,
    pub enrichment_search_limit: usize,
    pub market: Option<String>,
    /// Max chars of title or artist in a fielded enrichment query.
    pub max_field_length: usize,
    /// Max chars of the title in the title-only enrichment query.
    pub max_title_only_length: usize,
    pub max_query_length: usize,
    pub pacing_interval_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            popularity_threshold: DEFAULT_POPULARITY_THRESHOLD,
            keyword_search_limit: DEFAULT_KEYWORD_SEARCH_LIMIT,
            max_keywords: DEFAULT_MAX_KEYWORDS,
            enrichment_search_limit: DEFAULT_ENRICHMENT_SEARCH_LIMIT,
            market: Some(DEFAULT_MARKET.to_string()),
            max_field_length: DEFAULT_MAX_FIELD_LENGTH,
            max_title_only_length: DEFAULT_MAX_TITLE_ONLY_LENGTH,
            max_query_length: DEFAULT_MAX_QUERY_LENGTH,
            pacing_interval_ms: DEFAULT_PACING_INTERVAL_MS,
        }
    }
}

impl EngineSettings {
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.pacing_interval_ms)
    }
}

/// Parses a provider name into LlmProviderKind.
/// Uses clap's ValueEnum trait for parsing.
fn parse_provider(s: &str) -> Option<LlmProviderKind> {
    LlmProviderKind::from_str(s, true).ok()
}

//! The recommendation engine: one request from prompt to enriched result.

use super::enrich::MetadataEnricher;
use super::merge::merge_candidates;
use super::parser::parse_response;
use super::prompt::{build_prompt, RecommendationRequest};
use super::search::search_keywords;
use super::types::{Candidate, CandidateSource, RecommendationResult};
use super::vibe::VibeMatcher;
use crate::catalog::{CatalogClient, CatalogError, SpotifyClient};
use crate::config::{AppConfig, EngineSettings};
use crate::credentials::MissingCredentialError;
use crate::llm::{create_provider, GenerationOptions, LlmError, LlmProvider};
use crate::pacing::Pacer;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors raised while building or verifying the engine.
///
/// Requests themselves never fail; see [`RecommendationEngine::recommend`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    MissingCredential(#[from] MissingCredentialError),

    #[error("LLM provider error: {0}")]
    Llm(LlmError),

    #[error("Catalog error: {0}")]
    Catalog(CatalogError),
}

impl From<LlmError> for EngineError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Credential(missing) => EngineError::MissingCredential(missing),
            other => EngineError::Llm(other),
        }
    }
}

impl From<CatalogError> for EngineError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Credential(missing) => EngineError::MissingCredential(missing),
            other => EngineError::Catalog(other),
        }
    }
}

/// Turns a scene description into a ranked, enriched list of songs.
///
/// One model call yields keywords, scene analysis and suggestions; the
/// keywords drive catalog searches; both candidate streams are merged with
/// catalog hits first, and the remaining suggestions are enriched with
/// catalog metadata.
pub struct RecommendationEngine {
    llm: Arc<dyn LlmProvider>,
    catalog: Arc<dyn CatalogClient>,
    settings: EngineSettings,
    options: GenerationOptions,
    pacer: Arc<Pacer>,
    enricher: MetadataEnricher,
}

impl RecommendationEngine {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        catalog: Arc<dyn CatalogClient>,
        settings: EngineSettings,
        options: GenerationOptions,
    ) -> Self {
        let pacer = Arc::new(Pacer::new(settings.pacing_interval()));
        let enricher = MetadataEnricher::new(catalog.clone(), settings.clone(), pacer.clone());
        Self {
            llm,
            catalog,
            settings,
            options,
            pacer,
            enricher,
        }
    }

    /// Build the engine with the clients selected by the configuration.
    ///
    /// Fails with [`EngineError::MissingCredential`] when either client lacks
    /// a credential. No network call is made.
    pub fn from_config(config: &AppConfig) -> Result<Self, EngineError> {
        let llm = create_provider(&config.llm)?;
        let catalog: Arc<dyn CatalogClient> =
            Arc::new(SpotifyClient::from_settings(&config.catalog)?);
        info!(
            "Using {} ({}) with catalog {}",
            llm.name(),
            llm.model(),
            catalog.name()
        );
        Ok(Self::new(
            llm,
            catalog,
            config.engine.clone(),
            config.llm.generation_options(),
        ))
    }

    /// Check that both external services accept the configured credentials.
    pub async fn verify(&self) -> Result<(), EngineError> {
        self.llm.health_check().await?;
        self.catalog.health_check().await?;
        debug!("External services verified");
        Ok(())
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// A vibe matcher sharing this engine's model and pacing.
    pub fn vibe_matcher(&self) -> VibeMatcher {
        VibeMatcher::new(self.llm.clone(), self.options.clone(), self.pacer.clone())
    }

    /// Produce recommendations. Never fails: when the model call fails, the
    /// result is empty with an unknown scene.
    pub async fn recommend(&self, request: &RecommendationRequest) -> RecommendationResult {
        let prompt = build_prompt(request, self.settings.max_keywords);

        self.pacer.wait().await;
        let text = match self.llm.generate(&prompt, &self.options).await {
            Ok(text) => text,
            Err(e) => {
                error!("Generative model call failed: {}", e);
                return RecommendationResult::empty();
            }
        };
        debug!(response_chars = text.len(), "Model response received");

        let parsed = parse_response(&text);
        let keywords: Vec<String> = parsed
            .keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .take(self.settings.max_keywords)
            .collect();

        let catalog_candidates = search_keywords(
            self.catalog.as_ref(),
            &keywords,
            &self.settings,
            &self.pacer,
        )
        .await;
        let generative_candidates: Vec<Candidate> = parsed
            .recommendations
            .into_iter()
            .map(Candidate::from_entry)
            .collect();

        let mut result = merge_candidates(
            catalog_candidates,
            generative_candidates,
            parsed.scene_analysis,
        )
        .with_keywords(keywords);
        self.enricher.enrich(&mut result).await;

        info!(
            "Recommendation finished: {} songs ({} from catalog search, {} from model)",
            result.recommendations.len(),
            result.count_by_source(CandidateSource::Catalog),
            result.count_by_source(CandidateSource::Generative)
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CliConfig, LlmProviderKind};

    #[test]
    fn test_from_config_missing_llm_key() {
        let cli = CliConfig {
            spotify_client_id: Some("id".to_string()),
            spotify_client_secret: Some("secret".to_string()),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        let err = RecommendationEngine::from_config(&config).err().unwrap();
        match err {
            EngineError::MissingCredential(missing) => {
                assert_eq!(missing.client, "gemini");
                assert_eq!(missing.field, "api_key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_config_missing_catalog_secret() {
        let cli = CliConfig {
            llm_provider: LlmProviderKind::OpenAi,
            openai_api_key: Some("sk-test".to_string()),
            spotify_client_id: Some("id".to_string()),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        let err = RecommendationEngine::from_config(&config).err().unwrap();
        assert!(matches!(
            err,
            EngineError::MissingCredential(ref m) if m.client == "spotify" && m.field == "client_secret"
        ));
        assert!(err.to_string().contains("client_secret"));
    }

    #[test]
    fn test_from_config_with_all_credentials() {
        let cli = CliConfig {
            gemini_api_key: Some("key".to_string()),
            spotify_client_id: Some("id".to_string()),
            spotify_client_secret: Some("secret".to_string()),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        let engine = RecommendationEngine::from_config(&config).unwrap();
        assert_eq!(engine.settings().max_keywords, 4);
    }

    #[test]
    fn test_error_conversion_keeps_non_credential_errors() {
        assert!(matches!(
            EngineError::from(LlmError::RateLimited),
            EngineError::Llm(LlmError::RateLimited)
        ));
        assert!(matches!(
            EngineError::from(CatalogError::Auth("bad".to_string())),
            EngineError::Catalog(CatalogError::Auth(_))
        ));
    }
}

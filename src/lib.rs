//! Reel Curator Library
//!
//! Song recommendations for a described scene, combining a generative model
//! with a music catalog.

pub mod catalog;
pub mod config;
pub mod credentials;
pub mod llm;
pub mod pacing;
pub mod recommend;

// Re-export commonly used types for convenience
pub use catalog::{CatalogClient, CatalogError, CatalogTrack, SpotifyClient};
pub use config::{AppConfig, CliConfig, FileConfig};
pub use credentials::MissingCredentialError;
pub use llm::{GenerationOptions, LlmError, LlmProvider};
pub use recommend::{
    Candidate, CandidateSource, EngineError, RecommendationEngine, RecommendationRequest,
    RecommendationResult, SceneAnalysis,
};

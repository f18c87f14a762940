//! Recommendation synthesis.
//!
//! Pipeline of one request: prompt the generative model once, parse its
//! answer, search the catalog with the returned keywords, merge both
//! candidate streams, and enrich the model's suggestions with catalog
//! metadata.

mod engine;
mod enrich;
mod merge;
mod normalize;
mod parser;
mod prompt;
mod search;
mod types;
mod vibe;

pub use engine::{EngineError, RecommendationEngine};
pub use enrich::{lookup_queries, select_best_match, EnrichmentStats, MetadataEnricher};
pub use merge::merge_candidates;
pub use normalize::{clean_title, dedup_key, DedupKey};
pub use parser::{parse_response, parse_response_with_strategy, strip_code_fences, ParseStrategy};
pub use prompt::{build_prompt, RecommendationRequest};
pub use search::{rank_catalog_candidates, search_keywords};
pub use types::{
    Candidate, CandidateSource, EnergyLevel, ParsedResponse, RecommendationEntry,
    RecommendationResult, SceneAnalysis, CATALOG_URL_UNAVAILABLE, EXTRACTED_FALLBACK, UNKNOWN,
};
pub use vibe::{
    build_vibe_prompt, parse_vibe_response, VibeMatcher, VibeReport, VibeResult, VibeStatus,
    VibeVerdict,
};

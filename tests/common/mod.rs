//! Common test infrastructure
//!
//! Fakes for the two external services plus helpers wiring them into a
//! [`RecommendationEngine`] with pacing disabled.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{engine_with, FakeCatalog, ScriptedLlm};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (engine, _llm, _catalog) =
//!         engine_with(ScriptedLlm::answering("{}"), FakeCatalog::new());
//! }
//! ```

#[allow(dead_code)]
mod constants;
#[allow(dead_code)]
mod fakes;

pub use constants::*;
pub use fakes::{track, FakeCatalog, ScriptedLlm};

use reel_curator::config::EngineSettings;
use reel_curator::llm::GenerationOptions;
use reel_curator::RecommendationEngine;
use std::sync::Arc;

pub fn test_settings() -> EngineSettings {
    EngineSettings {
        pacing_interval_ms: 0,
        ..EngineSettings::default()
    }
}

/// Build an engine over the given fakes, returning handles to inspect them.
pub fn engine_with(
    llm: ScriptedLlm,
    catalog: FakeCatalog,
) -> (RecommendationEngine, Arc<ScriptedLlm>, Arc<FakeCatalog>) {
    let llm = Arc::new(llm);
    let catalog = Arc::new(catalog);
    let engine = RecommendationEngine::new(
        llm.clone(),
        catalog.clone(),
        test_settings(),
        GenerationOptions::default(),
    );
    (engine, llm, catalog)
}

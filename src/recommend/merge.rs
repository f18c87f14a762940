//! Merge of catalog and generative candidates.

use super::normalize::{clean_title, DedupKey};
use super::types::{Candidate, RecommendationResult, SceneAnalysis};
use std::collections::HashSet;
use tracing::{debug, info};

/// Combine both candidate streams into one deduplicated ranking.
///
/// Catalog candidates come first, in their input order, and win over any
/// generative candidate with the same dedup key. Generative titles are
/// cleaned before their key is computed. Candidates with an empty title or
/// artist are kept.
pub fn merge_candidates(
    catalog_candidates: Vec<Candidate>,
    generative_candidates: Vec<Candidate>,
    scene_analysis: SceneAnalysis,
) -> RecommendationResult {
    let mut seen: HashSet<DedupKey> = HashSet::new();
    let mut merged = Vec::with_capacity(catalog_candidates.len() + generative_candidates.len());

    for candidate in catalog_candidates {
        if seen.insert(candidate.dedup_key()) {
            merged.push(candidate);
        }
    }
    let catalog_count = merged.len();

    let mut skipped = 0;
    for mut candidate in generative_candidates {
        candidate.title = clean_title(&candidate.title);
        if seen.insert(candidate.dedup_key()) {
            merged.push(candidate);
        } else {
            debug!(title = %candidate.title, artist = %candidate.artist, "Skipping duplicate suggestion");
            skipped += 1;
        }
    }

    info!(
        "Merged {} catalog and {} generative candidates ({} duplicates skipped)",
        catalog_count,
        merged.len() - catalog_count,
        skipped
    );

    RecommendationResult::new(scene_analysis, merged)
}

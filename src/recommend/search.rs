//! Keyword search against the catalog.

use super::types::Candidate;
use crate::catalog::CatalogClient;
use crate::config::EngineSettings;
use crate::pacing::Pacer;
use futures::future::join_all;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Run one catalog search per keyword and keep the trending hits.
///
/// At most `settings.max_keywords` non-blank keywords are used. Searches run
/// concurrently, each waiting for its pacing slot. A failing search counts as
/// zero results for its keyword. The returned candidates are sorted by
/// descending popularity and deduplicated.
pub async fn search_keywords(
    catalog: &dyn CatalogClient,
    keywords: &[String],
    settings: &EngineSettings,
    pacer: &Pacer,
) -> Vec<Candidate> {
    let keywords: Vec<&str> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .take(settings.max_keywords)
        .collect();

    let searches = keywords.iter().map(|keyword| async move {
        pacer.wait().await;
        match catalog
            .search(
                keyword,
                settings.market.as_deref(),
                settings.keyword_search_limit,
            )
            .await
        {
            Ok(tracks) => {
                let total = tracks.len();
                let trending: Vec<Candidate> = tracks
                    .into_iter()
                    .filter(|t| t.popularity >= settings.popularity_threshold)
                    .map(Candidate::from_catalog)
                    .collect();
                debug!(
                    keyword = %keyword,
                    total,
                    trending = trending.len(),
                    "Keyword search finished"
                );
                trending
            }
            Err(e) => {
                warn!(keyword = %keyword, error = %e, "Keyword search failed, skipping");
                Vec::new()
            }
        }
    });

    let found: Vec<Candidate> = join_all(searches).await.into_iter().flatten().collect();
    let ranked = rank_catalog_candidates(found);

    info!(
        "Catalog search found {} trending candidates for {} keywords",
        ranked.len(),
        keywords.len()
    );
    ranked
}

/// Sort by descending popularity (stable) and keep the first occurrence of
/// each dedup key, i.e. the most popular one.
pub fn rank_catalog_candidates(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.popularity.cmp(&a.popularity));
    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert(c.dedup_key()));
    candidates
}

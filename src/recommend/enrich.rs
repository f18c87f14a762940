//! Catalog enrichment of generative candidates.

use super::normalize::clean_title;
use super::types::{CandidateSource, RecommendationResult};
use crate::catalog::{CatalogClient, CatalogTrack};
use crate::config::EngineSettings;
use crate::pacing::Pacer;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome counts of one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub matched: usize,
    pub unmatched: usize,
    /// Candidates with an empty title or artist, never looked up.
    pub skipped: usize,
}

/// Attaches catalog metadata to candidates suggested by the model.
pub struct MetadataEnricher {
    catalog: Arc<dyn CatalogClient>,
    settings: EngineSettings,
    pacer: Arc<Pacer>,
}

impl MetadataEnricher {
    pub fn new(catalog: Arc<dyn CatalogClient>, settings: EngineSettings, pacer: Arc<Pacer>) -> Self {
        Self {
            catalog,
            settings,
            pacer,
        }
    }

    /// Enrich every generative candidate in place.
    ///
    /// Catalog candidates are left untouched. Lookups run concurrently and
    /// each result is written back to its own candidate.
    pub async fn enrich(&self, result: &mut RecommendationResult) -> EnrichmentStats {
        let mut stats = EnrichmentStats::default();
        let mut pending = Vec::new();

        for (index, candidate) in result.recommendations.iter_mut().enumerate() {
            if candidate.source != CandidateSource::Generative {
                continue;
            }
            candidate.title = clean_title(&candidate.title);
            if candidate.title.is_empty() || candidate.artist.trim().is_empty() {
                candidate.mark_unavailable();
                stats.skipped += 1;
                continue;
            }
            pending.push((index, candidate.title.clone(), candidate.artist.trim().to_string()));
        }

        let lookups = pending.iter().map(|(index, title, artist)| async move {
            (*index, self.lookup(title, artist).await)
        });

        for (index, found) in join_all(lookups).await {
            let candidate = &mut result.recommendations[index];
            match found {
                Some(track) => {
                    candidate.apply_catalog_match(&track);
                    stats.matched += 1;
                }
                None => {
                    candidate.mark_unavailable();
                    stats.unmatched += 1;
                }
            }
        }

        info!(
            "Enrichment finished: {} matched, {} unmatched, {} skipped",
            stats.matched, stats.unmatched, stats.skipped
        );
        stats
    }

    /// Find the catalog track for a song, trying queries of decreasing
    /// specificity. The first query returning any tracks decides the result.
    pub async fn lookup(&self, title: &str, artist: &str) -> Option<CatalogTrack> {
        for query in lookup_queries(title, artist, &self.settings) {
            self.pacer.wait().await;
            match self
                .catalog
                .search(
                    &query,
                    self.settings.market.as_deref(),
                    self.settings.enrichment_search_limit,
                )
                .await
            {
                Ok(tracks) if !tracks.is_empty() => {
                    debug!(query = %query, count = tracks.len(), "Enrichment query matched");
                    return select_best_match(tracks, title, artist);
                }
                Ok(_) => {
                    debug!(query = %query, "Enrichment query returned nothing");
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "Enrichment query failed");
                }
            }
        }
        None
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((byte_index, _)) => &s[..byte_index],
        None => s,
    }
}

/// The three lookup queries: fielded, free text, title only.
pub fn lookup_queries(title: &str, artist: &str, settings: &EngineSettings) -> Vec<String> {
    let short_title = truncate_chars(title, settings.max_field_length);
    let short_artist = truncate_chars(artist, settings.max_field_length);
    [
        format!("track:{} artist:{}", short_title, short_artist),
        format!("{} {}", short_title, short_artist),
        truncate_chars(title, settings.max_title_only_length).to_string(),
    ]
    .into_iter()
    .map(|q| truncate_chars(&q, settings.max_query_length).to_string())
    .collect()
}

fn fuzzy_contains(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Prefer a track whose name and artist both overlap the requested ones
/// (substring in either direction, case-insensitive); otherwise the first.
pub fn select_best_match(tracks: Vec<CatalogTrack>, title: &str, artist: &str) -> Option<CatalogTrack> {
    let title = title.to_lowercase();
    let artist = artist.to_lowercase();
    let best = tracks.iter().position(|t| {
        fuzzy_contains(&title, &t.name.to_lowercase())
            && fuzzy_contains(&artist, &t.artist.to_lowercase())
    });
    tracks.into_iter().nth(best.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogError;
    use crate::recommend::types::{Candidate, RecommendationEntry, SceneAnalysis};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn track(name: &str, artist: &str, popularity: u32) -> CatalogTrack {
        CatalogTrack {
            id: name.to_string(),
            name: name.to_string(),
            artist: artist.to_string(),
            album: None,
            album_cover: None,
            external_url: format!("https://open.spotify.com/track/{}", name.replace(' ', "")),
            popularity,
            preview_url: None,
            duration_ms: None,
        }
    }

    #[derive(Default)]
    struct QueryCatalog {
        responses: HashMap<String, Result<Vec<CatalogTrack>, ()>>,
        queries: Mutex<Vec<String>>,
    }

    impl QueryCatalog {
        fn respond(mut self, query: &str, tracks: Vec<CatalogTrack>) -> Self {
            self.responses.insert(query.to_string(), Ok(tracks));
            self
        }

        fn fail(mut self, query: &str) -> Self {
            self.responses.insert(query.to_string(), Err(()));
            self
        }
    }

    #[async_trait]
    impl CatalogClient for QueryCatalog {
        fn name(&self) -> &str {
            "query"
        }

        async fn search(
            &self,
            query: &str,
            _market: Option<&str>,
            _limit: usize,
        ) -> Result<Vec<CatalogTrack>, CatalogError> {
            self.queries.lock().unwrap().push(query.to_string());
            match self.responses.get(query) {
                Some(Ok(tracks)) => Ok(tracks.clone()),
                Some(Err(())) => Err(CatalogError::RateLimited),
                None => Ok(Vec::new()),
            }
        }

        async fn health_check(&self) -> Result<(), CatalogError> {
            Ok(())
        }
    }

    fn enricher(catalog: QueryCatalog) -> (MetadataEnricher, Arc<QueryCatalog>) {
        let catalog = Arc::new(catalog);
        let enricher = MetadataEnricher::new(
            catalog.clone(),
            EngineSettings::default(),
            Arc::new(Pacer::disabled()),
        );
        (enricher, catalog)
    }

    #[test]
    fn test_lookup_queries() {
        let settings = EngineSettings::default();
        let queries = lookup_queries("Kesariya", "Arijit Singh", &settings);
        assert_eq!(
            queries,
            vec![
                "track:Kesariya artist:Arijit Singh",
                "Kesariya Arijit Singh",
                "Kesariya"
            ]
        );
    }

    #[test]
    fn test_lookup_queries_truncate_by_characters() {
        let settings = EngineSettings {
            max_field_length: 3,
            max_title_only_length: 5,
            max_query_length: 12,
            ..Default::default()
        };
        // "नमस्ते dunia" by "Ñandú Band"
        let title = "\u{928}\u{92e}\u{938}\u{94d}\u{924}\u{947} dunia";
        let artist = "\u{d1}and\u{fa} Band";
        let queries = lookup_queries(title, artist, &settings);
        assert_eq!(queries[0], "track:\u{928}\u{92e}\u{938} ar");
        assert_eq!(queries[1], "\u{928}\u{92e}\u{938} \u{d1}an");
        assert_eq!(queries[2], "\u{928}\u{92e}\u{938}\u{94d}\u{924}");
        assert!(queries.iter().all(|q| q.chars().count() <= 12));
    }

    #[test]
    fn test_select_best_match() {
        let tracks = vec![
            track("Kesariya Rap", "Someone Else", 40),
            track("Kesariya (From Brahmastra)", "Pritam, Arijit Singh", 85),
        ];
        let best = select_best_match(tracks.clone(), "kesariya", "arijit singh").unwrap();
        assert_eq!(best.popularity, 85);

        // No overlap: first item wins
        let best = select_best_match(tracks, "Something", "Else Entirely").unwrap();
        assert_eq!(best.name, "Kesariya Rap");

        assert!(select_best_match(Vec::new(), "a", "b").is_none());
    }

    #[tokio::test]
    async fn test_first_query_with_results_wins() {
        let catalog = QueryCatalog::default()
            .respond("Boss Meet Bros", vec![track("Boss", "Meet Bros", 64)])
            .respond("Boss", vec![track("Boss Title Track", "Other", 10)]);
        let (enricher, catalog) = enricher(catalog);

        let found = enricher.lookup("Boss", "Meet Bros").await.unwrap();
        assert_eq!(found.popularity, 64);
        assert_eq!(
            *catalog.queries.lock().unwrap(),
            vec!["track:Boss artist:Meet Bros", "Boss Meet Bros"]
        );
    }

    #[tokio::test]
    async fn test_failed_query_moves_to_next() {
        let catalog = QueryCatalog::default()
            .fail("track:Boss artist:Meet Bros")
            .respond("Boss Meet Bros", vec![track("Boss", "Meet Bros", 64)]);
        let (enricher, _) = enricher(catalog);
        assert!(enricher.lookup("Boss", "Meet Bros").await.is_some());
    }

    #[tokio::test]
    async fn test_enrich_only_generative_candidates() {
        let catalog = QueryCatalog::default()
            .respond("track:Boss artist:Meet Bros", vec![track("Boss", "Meet Bros", 64)]);
        let (enricher, catalog) = enricher(catalog);

        let mut result = RecommendationResult::new(
            SceneAnalysis::unknown(),
            vec![
                Candidate::from_catalog(track("Kala Chashma", "Badshah", 70)),
                Candidate::from_entry(RecommendationEntry::new("(Note: x) Boss", "Meet Bros")),
                Candidate::from_entry(RecommendationEntry::new("Zzz-NotARealSong-123", "Nobody")),
                Candidate::from_entry(RecommendationEntry::new("(only a note)", "Someone")),
                Candidate::from_entry(RecommendationEntry::new("Title", "  ")),
            ],
        );

        let stats = enricher.enrich(&mut result).await;

        assert_eq!(
            stats,
            EnrichmentStats {
                matched: 1,
                unmatched: 1,
                skipped: 2
            }
        );
        let recs = &result.recommendations;
        assert_eq!(recs[0].verified_title, None);
        assert_eq!(recs[0].popularity, 70);
        assert_eq!(recs[1].title, "Boss");
        assert_eq!(recs[1].verified_artist.as_deref(), Some("Meet Bros"));
        assert_eq!(recs[1].popularity, 64);
        assert_eq!(recs[1].catalog_url, "https://open.spotify.com/track/Boss");
        assert_eq!(recs[2].catalog_url, "N/A");
        assert_eq!(recs[2].popularity, 0);
        assert!(recs[2].verified_title.is_none());
        assert_eq!(recs[3].catalog_url, "N/A");
        assert_eq!(recs[4].catalog_url, "N/A");

        // Catalog candidates are never looked up, skipped ones neither
        let queries = catalog.queries.lock().unwrap();
        assert!(!queries.iter().any(|q| q.contains("Kala")));
        assert!(!queries.iter().any(|q| q.contains("Title")));
        assert_eq!(queries.len(), 1 + 3);
    }
}

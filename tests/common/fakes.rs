//! In-memory stand-ins for the generative model and the catalog.

use async_trait::async_trait;
use reel_curator::catalog::{CatalogClient, CatalogError, CatalogTrack};
use reel_curator::llm::{GenerationOptions, LlmError, LlmProvider};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// Answers every prompt from a script; the last answer repeats.
pub struct ScriptedLlm {
    answers: Mutex<VecDeque<Result<String, ()>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn answering(text: &str) -> Self {
        Self::script(vec![Ok(text.to_string())])
    }

    pub fn failing() -> Self {
        Self::script(vec![Err(())])
    }

    pub fn script(answers: Vec<Result<String, ()>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let mut answers = self.answers.lock().unwrap();
        let answer = if answers.len() > 1 {
            answers.pop_front().unwrap()
        } else {
            answers.front().cloned().unwrap_or(Err(()))
        };
        answer.map_err(|_| LlmError::Connection("scripted failure".to_string()))
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        Ok(())
    }
}

/// Catalog answering fixed results per query. Unknown queries return nothing.
#[derive(Default)]
pub struct FakeCatalog {
    responses: HashMap<String, Vec<CatalogTrack>>,
    failing: HashSet<String>,
    queries: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(mut self, query: &str, tracks: Vec<CatalogTrack>) -> Self {
        self.responses.insert(query.to_string(), tracks);
        self
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    /// Every query received, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search(
        &self,
        query: &str,
        _market: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, CatalogError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.failing.contains(query) {
            return Err(CatalogError::Api {
                status: 500,
                message: "boom".to_string(),
            });
        }
        let mut tracks = self.responses.get(query).cloned().unwrap_or_default();
        tracks.truncate(limit);
        Ok(tracks)
    }

    async fn health_check(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}

pub fn track(title: &str, artist: &str, url: &str, popularity: u32) -> CatalogTrack {
    CatalogTrack {
        id: title.to_lowercase().replace(' ', "-"),
        name: title.to_string(),
        artist: artist.to_string(),
        album: Some(format!("{} (Single)", title)),
        album_cover: None,
        external_url: url.to_string(),
        popularity,
        preview_url: None,
        duration_ms: Some(200_000),
    }
}

//! Second-opinion scoring of recommendations against the scene.
//!
//! Each song is judged by its own short model call answering in a fixed
//! three-line format (`STATUS:`, `CONFIDENCE:`, `EXPLANATION:`).

use super::types::Candidate;
use crate::llm::{GenerationOptions, LlmProvider};
use crate::pacing::Pacer;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

lazy_static! {
    static ref CONFIDENCE_VALUE: Regex =
        Regex::new(r"^\D*(\d+)").expect("Invalid confidence regex");
}

/// Verdict categories, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VibeStatus {
    PerfectMatch,
    GoodMatch,
    WeakMatch,
    NoMatch,
    CompletelyIrrelevant,
    Error,
}

impl VibeStatus {
    pub fn parse(token: &str) -> Self {
        let token = token
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '_')
            .to_ascii_uppercase();
        match token.as_str() {
            "PERFECT_MATCH" => VibeStatus::PerfectMatch,
            "GOOD_MATCH" => VibeStatus::GoodMatch,
            "WEAK_MATCH" => VibeStatus::WeakMatch,
            "NO_MATCH" => VibeStatus::NoMatch,
            "COMPLETELY_IRRELEVANT" => VibeStatus::CompletelyIrrelevant,
            _ => VibeStatus::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VibeStatus::PerfectMatch => "PERFECT_MATCH",
            VibeStatus::GoodMatch => "GOOD_MATCH",
            VibeStatus::WeakMatch => "WEAK_MATCH",
            VibeStatus::NoMatch => "NO_MATCH",
            VibeStatus::CompletelyIrrelevant => "COMPLETELY_IRRELEVANT",
            VibeStatus::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VibeVerdict {
    pub status: VibeStatus,
    pub explanation: String,
    /// `0..=100`
    pub confidence: u8,
}

impl VibeVerdict {
    fn analysis_failed() -> Self {
        Self {
            status: VibeStatus::Error,
            explanation: "Error in analysis".to_string(),
            confidence: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VibeResult {
    pub title: String,
    pub artist: String,
    #[serde(flatten)]
    pub verdict: VibeVerdict,
}

/// Verdicts grouped by status, each group sorted by descending confidence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VibeReport {
    pub groups: BTreeMap<VibeStatus, Vec<VibeResult>>,
}

impl VibeReport {
    pub fn group(&self, status: VibeStatus) -> &[VibeResult] {
        self.groups.get(&status).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Clamp a run of ASCII digits to `0..=100`, however long it is.
fn clamp_confidence(digits: &str) -> u8 {
    let significant = digits.trim_start_matches('0');
    if significant.len() > 3 {
        return 100;
    }
    significant.parse::<u16>().map_or(0, |v| v.min(100) as u8)
}

/// Parse a three-line verdict. Never fails.
///
/// Unknown or missing status gives [`VibeStatus::Error`], missing confidence
/// gives 0. Everything after the `EXPLANATION:` line belongs to the
/// explanation.
pub fn parse_vibe_response(text: &str) -> VibeVerdict {
    let lines: Vec<&str> = text.trim().lines().map(str::trim).collect();
    let mut status = VibeStatus::Error;
    let mut confidence = 0u8;
    let mut explanation = String::new();

    for (i, line) in lines.iter().enumerate() {
        if let Some(rest) = line.strip_prefix("STATUS:") {
            status = rest
                .split_whitespace()
                .next()
                .map(VibeStatus::parse)
                .unwrap_or(VibeStatus::Error);
        } else if let Some(rest) = line.strip_prefix("CONFIDENCE:") {
            confidence = CONFIDENCE_VALUE
                .captures(rest)
                .map(|caps| clamp_confidence(&caps[1]))
                .unwrap_or(0);
        } else if let Some(rest) = line.strip_prefix("EXPLANATION:") {
            let parts: Vec<&str> = std::iter::once(rest.trim())
                .chain(lines[i + 1..].iter().copied())
                .filter(|s| !s.is_empty())
                .collect();
            explanation = parts.join(" ");
            break;
        }
    }

    VibeVerdict {
        status,
        explanation,
        confidence,
    }
}

pub fn build_vibe_prompt(scene: &str, title: &str, artist: &str) -> String {
    format!(
        r#"INPUT TEXT: "{scene}"
SONG: "{title}" by {artist}

Based on what you know about this song, would it suit the background of an Instagram story showing the situation in the input text?

Respond in this EXACT format:
STATUS: [PERFECT_MATCH / GOOD_MATCH / WEAK_MATCH / NO_MATCH / COMPLETELY_IRRELEVANT]
CONFIDENCE: [0-100]
EXPLANATION: [short explanation of why it matches or doesn't]

Consider the situation described, whether the song's mood fits it, and whether it would work as background music for the post."#,
        scene = scene.trim(),
        title = title.trim(),
        artist = artist.trim(),
    )
}

pub struct VibeMatcher {
    llm: Arc<dyn LlmProvider>,
    options: GenerationOptions,
    pacer: Arc<Pacer>,
}

impl VibeMatcher {
    pub fn new(llm: Arc<dyn LlmProvider>, options: GenerationOptions, pacer: Arc<Pacer>) -> Self {
        Self {
            llm,
            options,
            pacer,
        }
    }

    /// Judge one song. A failed model call yields an `Error` verdict.
    pub async fn check(&self, scene: &str, title: &str, artist: &str) -> VibeVerdict {
        let prompt = build_vibe_prompt(scene, title, artist);
        match self.llm.generate(&prompt, &self.options).await {
            Ok(text) => parse_vibe_response(&text),
            Err(e) => {
                warn!(title = %title, artist = %artist, error = %e, "Vibe check failed");
                VibeVerdict::analysis_failed()
            }
        }
    }

    /// Judge every candidate with a title and artist, one call at a time.
    pub async fn analyze(&self, scene: &str, candidates: &[Candidate]) -> VibeReport {
        let mut report = VibeReport::default();

        for candidate in candidates {
            if candidate.title.trim().is_empty() || candidate.artist.trim().is_empty() {
                debug!(?candidate, "Skipping candidate without title or artist");
                continue;
            }
            self.pacer.wait().await;
            let verdict = self.check(scene, &candidate.title, &candidate.artist).await;
            debug!(
                title = %candidate.title,
                status = verdict.status.as_str(),
                confidence = verdict.confidence,
                "Vibe verdict"
            );
            report
                .groups
                .entry(verdict.status)
                .or_default()
                .push(VibeResult {
                    title: candidate.title.clone(),
                    artist: candidate.artist.clone(),
                    verdict,
                });
        }

        for group in report.groups.values_mut() {
            group.sort_by(|a, b| b.verdict.confidence.cmp(&a.verdict.confidence));
        }

        info!("Vibe check finished for {} songs", report.total());
        report
    }
}

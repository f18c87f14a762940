//! Fault-tolerant extraction of a [`ParsedResponse`] from model output.
//!
//! The model is asked for one bare JSON object but regularly wraps it in
//! markdown fences, surrounds it with prose, or emits something that is not
//! quite JSON. The parser tries a fixed cascade of strategies, from most to
//! least structured, and never fails: when nothing can be recovered the
//! result is the canonical empty response.

use super::types::{ParsedResponse, RecommendationEntry, SceneAnalysis};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, error};

/// Keywords kept by field-level extraction.
const MAX_EXTRACTED_KEYWORDS: usize = 4;
/// Characters of an unparseable response included in the error log.
const PREVIEW_CHARS: usize = 500;

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"```json\s*|\s*```|```").expect("Invalid code fence regex");
    static ref NESTED_OBJECT: Regex = Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}")
        .expect("Invalid nested object regex");
    static ref GREEDY_OBJECT: Regex =
        Regex::new(r"(?s)\{.*\}").expect("Invalid greedy object regex");
    static ref KEYWORDS_FIELD: Regex =
        Regex::new(r#"(?s)"spotify_keywords"\s*:\s*\[(.*?)\]"#)
            .expect("Invalid keywords field regex");
    static ref QUOTED: Regex = Regex::new(r#""([^"]*)""#).expect("Invalid quoted string regex");
    static ref RECOMMENDATION_FIELDS: Regex =
        Regex::new(r#""song_title"\s*:\s*"([^"]+)"[^}]*"artist"\s*:\s*"([^"]+)""#)
            .expect("Invalid recommendation fields regex");
}

/// One way of recovering structured data from a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// The whole text is a JSON object.
    Direct,
    /// The text is a JSON object once markdown fences are removed.
    FenceStripped,
    /// A brace-delimited substring is a JSON object with `recommendations`.
    BraceExtraction,
    /// Individual fields pulled out with regexes, no valid JSON required.
    FieldExtraction,
}

impl ParseStrategy {
    /// Order in which strategies are attempted.
    pub const CASCADE: [ParseStrategy; 4] = [
        ParseStrategy::Direct,
        ParseStrategy::FenceStripped,
        ParseStrategy::BraceExtraction,
        ParseStrategy::FieldExtraction,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ParseStrategy::Direct => "direct",
            ParseStrategy::FenceStripped => "fence_stripped",
            ParseStrategy::BraceExtraction => "brace_extraction",
            ParseStrategy::FieldExtraction => "field_extraction",
        }
    }

    /// Run this strategy alone against the raw response text.
    pub fn attempt(&self, text: &str) -> Option<ParsedResponse> {
        match self {
            ParseStrategy::Direct => parse_object(text.trim()),
            ParseStrategy::FenceStripped => parse_object(&strip_code_fences(text)),
            ParseStrategy::BraceExtraction => extract_braced_object(&strip_code_fences(text)),
            ParseStrategy::FieldExtraction => extract_fields(text),
        }
    }
}

pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

fn parse_object(text: &str) -> Option<ParsedResponse> {
    ParsedResponse::from_value(serde_json::from_str::<Value>(text).ok()?)
}

fn parse_recommendations_object(candidate: &str) -> Option<ParsedResponse> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    if value.get("recommendations").is_none() {
        return None;
    }
    ParsedResponse::from_value(value)
}

fn extract_braced_object(text: &str) -> Option<ParsedResponse> {
    NESTED_OBJECT
        .find_iter(text)
        .chain(GREEDY_OBJECT.find_iter(text))
        .find_map(|m| parse_recommendations_object(m.as_str()))
}

fn extract_fields(text: &str) -> Option<ParsedResponse> {
    let keywords: Vec<String> = KEYWORDS_FIELD
        .captures(text)
        .map(|caps| {
            QUOTED
                .captures_iter(&caps[1])
                .map(|k| k[1].trim().to_string())
                .filter(|k| !k.is_empty())
                .take(MAX_EXTRACTED_KEYWORDS)
                .collect()
        })
        .unwrap_or_default();

    let recommendations: Vec<RecommendationEntry> = RECOMMENDATION_FIELDS
        .captures_iter(text)
        .map(|caps| RecommendationEntry::new(caps[1].trim(), caps[2].trim()))
        .collect();

    if keywords.is_empty() && recommendations.is_empty() {
        return None;
    }

    Some(ParsedResponse {
        keywords,
        scene_analysis: SceneAnalysis::extracted_fallback(),
        recommendations,
    })
}

/// Parse a response, reporting which strategy succeeded.
///
/// The strategy is `None` when the canonical empty response was returned.
pub fn parse_response_with_strategy(text: &str) -> (ParsedResponse, Option<ParseStrategy>) {
    for strategy in ParseStrategy::CASCADE {
        if let Some(parsed) = strategy.attempt(text) {
            debug!(
                strategy = strategy.name(),
                keywords = parsed.keywords.len(),
                recommendations = parsed.recommendations.len(),
                "Parsed model response"
            );
            return (parsed, Some(strategy));
        }
    }

    let preview: String = text.chars().take(PREVIEW_CHARS).collect();
    error!(
        response_chars = text.len(),
        "Could not extract any data from model response: {:?}", preview
    );
    (ParsedResponse::default(), None)
}

/// Parse a response. Never fails.
pub fn parse_response(text: &str) -> ParsedResponse {
    parse_response_with_strategy(text).0
}

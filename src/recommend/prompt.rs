//! Prompt contract with the generative model.
//!
//! A single call returns the search keywords, the scene analysis and the
//! song suggestions. Keywords must be in lowercase Roman script because the
//! catalog indexes all metadata that way, whatever the song's language.

use serde::{Deserialize, Serialize};

/// Inputs of one recommendation request. Every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    /// Caption of the image or free-text description of the scene.
    pub scene_description: String,
    #[serde(default)]
    pub user_preferences: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub preferred_languages: String,
    /// Refinements given after a first round of recommendations.
    #[serde(default)]
    pub additional_preferences: String,
}

impl RecommendationRequest {
    pub fn new(scene_description: impl Into<String>) -> Self {
        Self {
            scene_description: scene_description.into(),
            ..Default::default()
        }
    }

    pub fn with_user_preferences(mut self, value: impl Into<String>) -> Self {
        self.user_preferences = value.into();
        self
    }

    pub fn with_context(mut self, value: impl Into<String>) -> Self {
        self.context = value.into();
        self
    }

    pub fn with_preferred_languages(mut self, value: impl Into<String>) -> Self {
        self.preferred_languages = value.into();
        self
    }

    pub fn with_additional_preferences(mut self, value: impl Into<String>) -> Self {
        self.additional_preferences = value.into();
        self
    }
}

/// Build the single prompt asking for keywords, scene analysis and songs.
pub fn build_prompt(request: &RecommendationRequest, keyword_count: usize) -> String {
    let mut prompt = format!(
        r#"You are a professional music curator and Instagram content creator. Based on this scene description and the user's preferences, provide:

1. Scene analysis
2. Exactly {count} catalog search keywords for finding trending songs
3. 10-15 specific, real song recommendations

SCENE DESCRIPTION: "{scene}"
INITIAL USER PREFERENCES: "{prefs}"
ADDITIONAL USER PREFERENCES: "{additional}"
CONTEXT: "{context}"
"#,
        count = keyword_count,
        scene = request.scene_description.trim(),
        prefs = request.user_preferences.trim(),
        additional = request.additional_preferences.trim(),
        context = request.context.trim(),
    );

    let languages = request.preferred_languages.trim();
    if !languages.is_empty() {
        prompt.push_str(&format!(
            "\nPREFERRED LANGUAGES FOR SONGS: {}\n\
             Prioritize songs in these languages. Search keywords must still be written in \
             English/Roman script (for example 'hindi sad', 'punjabi bhangra', 'tamil melody').\n",
            languages
        ));
    }

    let additional = request.additional_preferences.trim();
    if !additional.is_empty() {
        prompt.push_str(&format!(
            "\nThe additional preferences '{}' refine the earlier request and must strongly \
             influence both the keywords and the recommendations.\n",
            additional
        ));
    }

    prompt.push_str(&format!(
        r#"
TASK 1 - SEARCH KEYWORDS: Generate exactly {count} short keywords or phrases for catalog search. Always use ENGLISH/ROMAN script, even for regional-language preferences (transliterate, never native script), because the catalog stores all song metadata in Roman script. Always use lowercase.

TASK 2 - SCENE ANALYSIS: Describe the primary mood, visual elements, atmosphere, energy level (low, medium or high) and setting type.

TASK 3 - SONG RECOMMENDATIONS: Recommend 10-15 real, popular songs likely to be trending on Instagram and streaming charts, from a mix of artists. For each song write a short Instagram-style caption that fits the scene.

Keep song titles SHORT and CLEAN: no notes, labels or explanations in the song_title field.

Respond with exactly one JSON object in this format, with no markdown and no extra text:
{{
    "spotify_keywords": ["keyword1", "keyword2", "keyword3", "keyword4"],
    "scene_analysis": {{
        "primary_mood": "main emotional tone",
        "visual_elements": "key visual components",
        "atmosphere": "overall feeling",
        "energy_level": "low/medium/high",
        "setting_type": "indoor/outdoor/urban/nature/etc"
    }},
    "recommendations": [
        {{
            "song_title": "Exact Song Title",
            "artist": "Artist Name",
            "suggested_caption": "Short caption for the post",
            "language": "Song language",
            "genre": "Genre"
        }}
    ]
}}
"#,
        count = keyword_count
    ));

    prompt
}

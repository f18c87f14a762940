//! Vibe check over the recommendations of a full request.

mod common;

use common::*;
use reel_curator::recommend::{Candidate, RecommendationEntry, RecommendationRequest, VibeStatus};

fn suggestion(title: &str, artist: &str) -> Candidate {
    Candidate::from_entry(RecommendationEntry::new(title, artist))
}

#[tokio::test]
async fn test_verdicts_grouped_and_sorted() {
    let llm = ScriptedLlm::script(vec![
        Ok("STATUS: GOOD_MATCH\nCONFIDENCE: 60\nEXPLANATION: Mellow.".to_string()),
        Ok("STATUS: PERFECT_MATCH\nCONFIDENCE: 95\nEXPLANATION: Made for sunsets.".to_string()),
        Ok("STATUS: GOOD_MATCH\nCONFIDENCE: 85\nEXPLANATION: Warm and slow.".to_string()),
        Err(()),
    ]);
    let (engine, llm, _catalog) = engine_with(llm, FakeCatalog::new());

    let candidates = vec![
        suggestion("Kesariya", "Arijit Singh"),
        suggestion("Golden Hour", "JVKE"),
        suggestion("Ilahi", "Arijit Singh"),
        suggestion("", "Nobody"),
        suggestion("Boss", "Meet Bros"),
    ];
    let report = engine
        .vibe_matcher()
        .analyze(SUNSET_SCENE, &candidates)
        .await;

    assert_eq!(report.total(), 4);
    assert_eq!(llm.prompts().len(), 4);

    let good = report.group(VibeStatus::GoodMatch);
    assert_eq!(good.len(), 2);
    assert_eq!(good[0].title, "Ilahi");
    assert_eq!(good[0].verdict.confidence, 85);
    assert_eq!(good[1].title, "Kesariya");

    let perfect = report.group(VibeStatus::PerfectMatch);
    assert_eq!(perfect[0].verdict.explanation, "Made for sunsets.");

    let failed = report.group(VibeStatus::Error);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].title, "Boss");
    assert_eq!(failed[0].verdict.confidence, 0);
    assert_eq!(failed[0].verdict.explanation, "Error in analysis");

    assert!(report.group(VibeStatus::NoMatch).is_empty());
}

#[tokio::test]
async fn test_vibe_prompt_names_song_and_scene() {
    let (engine, llm, _catalog) = engine_with(
        ScriptedLlm::answering("STATUS: NO_MATCH\nCONFIDENCE: 70\nEXPLANATION: Too loud."),
        FakeCatalog::new(),
    );

    let report = engine
        .vibe_matcher()
        .analyze("quiet library", &[suggestion("Boss", "Meet Bros")])
        .await;

    assert_eq!(report.group(VibeStatus::NoMatch).len(), 1);
    let prompt = &llm.prompts()[0];
    assert!(prompt.contains("quiet library"));
    assert!(prompt.contains("\"Boss\" by Meet Bros"));
}

#[tokio::test]
async fn test_report_serialization() {
    let recommend_answer = serde_json::json!({
        "recommendations": [{"song_title": "Ilahi", "artist": "Arijit Singh"}]
    })
    .to_string();
    let llm = ScriptedLlm::script(vec![
        Ok(recommend_answer),
        Ok("STATUS: WEAK_MATCH\nCONFIDENCE: 40\nEXPLANATION: Maybe.".to_string()),
    ]);
    let (engine, _llm, _catalog) = engine_with(llm, FakeCatalog::new());

    let result = engine
        .recommend(&RecommendationRequest::new(SUNSET_SCENE))
        .await;
    let report = engine
        .vibe_matcher()
        .analyze(SUNSET_SCENE, &result.recommendations)
        .await;

    let json = serde_json::to_value(&report).unwrap();
    let weak = &json["groups"]["WEAK_MATCH"][0];
    assert_eq!(weak["title"], "Ilahi");
    assert_eq!(weak["status"], "WEAK_MATCH");
    assert_eq!(weak["confidence"], 40);
}

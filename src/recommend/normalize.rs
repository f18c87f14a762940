//! Title normalization and dedup keys.

use lazy_static::lazy_static;
use regex::Regex;

/// Identity of a song for deduplication: trimmed, lowercased title and artist.
pub type DedupKey = (String, String);

lazy_static! {
    static ref PARENTHETICAL_PREFIX: Regex =
        Regex::new(r"^\([^)]*\)\s*").expect("Invalid parenthetical prefix regex");
    static ref NOTE_PREFIX: Regex =
        Regex::new(r"(?i)^note\s*:[^:]*:\s*").expect("Invalid note prefix regex");
    static ref LABEL_PREFIX: Regex = Regex::new(
        r"(?i)^(?:note|label|song title|song|title|track|recommendation|suggestion|pick)\s*:\s*"
    )
    .expect("Invalid label prefix regex");
}

pub fn dedup_key(title: &str, artist: &str) -> DedupKey {
    (title.trim().to_lowercase(), artist.trim().to_lowercase())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_prefixes_once(s: &str) -> String {
    let s = collapse_whitespace(s);
    let s = PARENTHETICAL_PREFIX.replace(&s, "");
    let s = NOTE_PREFIX.replace(&s, "");
    let s = LABEL_PREFIX.replace(&s, "");
    collapse_whitespace(&s)
}

/// Remove explanatory prefixes a model tends to put in front of a song title
/// (`(Note: trending) Boss`, `Song: Boss`), then collapse whitespace.
///
/// Idempotent. Only a fixed set of labels is stripped, so titles that
/// contain a colon themselves (`Mission: Impossible`) survive.
pub fn clean_title(raw: &str) -> String {
    let mut current = collapse_whitespace(raw);
    loop {
        let next = strip_prefixes_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

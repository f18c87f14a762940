//! Shared test data

pub const SUNSET_SCENE: &str = "sunset beach walk";

pub const KEYWORD_SUNSET: &str = "sunset vibes";

pub const TRACK_1_TITLE: &str = "Golden Hour";
pub const TRACK_1_ARTIST: &str = "JVKE";
pub const TRACK_1_URL: &str = "https://open.spotify.com/track/golden";
pub const TRACK_1_POPULARITY: u32 = 80;

pub const TRACK_2_TITLE: &str = "Kesariya";
pub const TRACK_2_ARTIST: &str = "Arijit Singh";
pub const TRACK_2_URL: &str = "https://open.spotify.com/track/kesariya";
pub const TRACK_2_POPULARITY: u32 = 60;

pub const NEW_SONG_TITLE: &str = "Ilahi";
pub const NEW_SONG_ARTIST: &str = "Arijit Singh";

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub llm: Option<LlmConfig>,
    pub catalog: Option<CatalogConfig>,
    pub engine: Option<EngineConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider to use: "gemini", "openai"
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_base_url: Option<String>,
    pub auth_url: Option<String>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub popularity_threshold: Option<u32>,
    pub keyword_search_limit: Option<usize>,
    pub max_keywords: Option<usize>,
    pub enrichment_search_limit: Option<usize>,
    /// Market hint for catalog searches; an empty string disables it.
    pub market: Option<String>,
    pub max_field_length: Option<usize>,
    pub max_title_only_length: Option<usize>,
    pub max_query_length: Option<usize>,
    pub pacing_interval_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_sections() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[llm]
provider = "openai"
model = "gpt-4o-mini"
temperature = 0.5

[engine]
market = ""
popularity_threshold = 50
"#
        )
        .unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        let llm = config.llm.unwrap();
        assert_eq!(llm.provider.as_deref(), Some("openai"));
        assert_eq!(llm.temperature, Some(0.5));
        assert!(llm.api_key.is_none());
        assert!(config.catalog.is_none());
        let engine = config.engine.unwrap();
        assert_eq!(engine.market.as_deref(), Some(""));
        assert_eq!(engine.popularity_threshold, Some(50));
    }

    #[test]
    fn test_load_missing_file() {
        let err = FileConfig::load(Path::new("/nonexistent/reel-curator.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[llm\nprovider = ").unwrap();
        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use reel_curator::config::{AppConfig, CliConfig, FileConfig, LlmProviderKind};
use reel_curator::recommend::{
    RecommendationEngine, RecommendationRequest, RecommendationResult, VibeReport,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Description of the scene (e.g. an image caption).
    pub scene_description: String,

    /// Initial musical preferences of the user.
    #[clap(long, default_value = "")]
    pub preferences: String,

    /// Where the post will be shared, occasion, etc.
    #[clap(long, default_value = "")]
    pub context: String,

    /// Preferred song languages, comma separated.
    #[clap(long, default_value = "")]
    pub languages: String,

    /// Refinements on top of the initial preferences.
    #[clap(long, default_value = "")]
    pub additional: String,

    /// Path to a TOML config file. Values in it override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Generative model provider.
    #[clap(long, default_value = "gemini")]
    pub llm_provider: LlmProviderKind,

    #[clap(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[clap(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Shell command printing an API key, run before each request (openai only).
    #[clap(long)]
    pub llm_api_key_command: Option<String>,

    #[clap(long)]
    pub llm_model: Option<String>,

    #[clap(long)]
    pub llm_base_url: Option<String>,

    #[clap(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    pub spotify_client_id: Option<String>,

    #[clap(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: Option<String>,

    /// Catalog market hint (ISO country code). Pass an empty string to disable.
    #[clap(long)]
    pub market: Option<String>,

    /// Minimum delay in milliseconds between calls to external services.
    #[clap(long)]
    pub pacing_ms: Option<u64>,

    /// Skip the startup credential check against the external services.
    #[clap(long)]
    pub skip_verify: bool,

    /// Ask the model to score every recommendation against the scene.
    #[clap(long)]
    pub vibe_check: bool,

    #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            llm_provider: self.llm_provider,
            gemini_api_key: self.gemini_api_key.clone(),
            openai_api_key: self.openai_api_key.clone(),
            llm_api_key_command: self.llm_api_key_command.clone(),
            llm_model: self.llm_model.clone(),
            llm_base_url: self.llm_base_url.clone(),
            spotify_client_id: self.spotify_client_id.clone(),
            spotify_client_secret: self.spotify_client_secret.clone(),
            market: self.market.clone(),
            pacing_ms: self.pacing_ms,
        }
    }

    fn to_request(&self) -> RecommendationRequest {
        RecommendationRequest::new(self.scene_description.clone())
            .with_user_preferences(self.preferences.clone())
            .with_context(self.context.clone())
            .with_preferred_languages(self.languages.clone())
            .with_additional_preferences(self.additional.clone())
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    result: &'a RecommendationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    vibe_check: Option<&'a VibeReport>,
}

fn print_text(result: &RecommendationResult, vibe: Option<&VibeReport>) {
    let scene = &result.scene_analysis;
    println!("Scene");
    println!("  mood:       {}", scene.primary_mood);
    println!("  visuals:    {}", scene.visual_elements);
    println!("  atmosphere: {}", scene.atmosphere);
    println!("  energy:     {}", scene.energy_level.as_str());
    println!("  setting:    {}", scene.setting_type);
    if !result.keywords.is_empty() {
        println!("  keywords:   {}", result.keywords.join(", "));
    }
    println!();

    if result.recommendations.is_empty() {
        println!("No recommendations found.");
    }
    for (i, candidate) in result.recommendations.iter().enumerate() {
        println!(
            "{:>2}. {} - {} [{}, popularity {}]",
            i + 1,
            candidate.title,
            candidate.artist,
            candidate.source.as_str(),
            candidate.popularity
        );
        if let (Some(title), Some(artist)) = (&candidate.verified_title, &candidate.verified_artist)
        {
            println!("    matched: {} - {}", title, artist);
        }
        println!("    {}", candidate.catalog_url);
        if let Some(caption) = &candidate.suggested_caption {
            println!("    caption: {}", caption);
        }
    }

    if let Some(report) = vibe {
        println!();
        println!("Vibe check");
        for (status, results) in &report.groups {
            println!("  {}", status.as_str());
            for r in results {
                println!(
                    "    {} - {} ({}%): {}",
                    r.title, r.artist, r.verdict.confidence, r.verdict.explanation
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let engine = RecommendationEngine::from_config(&config)
        .context("Failed to set up recommendation engine")?;
    if !cli_args.skip_verify {
        info!("Verifying credentials...");
        engine
            .verify()
            .await
            .context("External service rejected the configured credentials")?;
    }

    let request = cli_args.to_request();
    let result = engine.recommend(&request).await;

    let vibe = if cli_args.vibe_check {
        Some(
            engine
                .vibe_matcher()
                .analyze(&request.scene_description, &result.recommendations)
                .await,
        )
    } else {
        None
    };

    match cli_args.output {
        OutputFormat::Text => print_text(&result, vibe.as_ref()),
        OutputFormat::Json => {
            let output = JsonOutput {
                result: &result,
                vibe_check: vibe.as_ref(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

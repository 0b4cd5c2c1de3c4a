//! Engine configuration. Everything is environment-derived with defaults and
//! handed to the engine as one explicit struct; no module-level globals.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiNotesMode {
    Rules,
    OpenAi,
}

impl AiNotesMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AiNotesMode::Rules => "rules",
            AiNotesMode::OpenAi => "openai",
        }
    }

    fn parse(value: &str) -> AiNotesMode {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => AiNotesMode::OpenAi,
            _ => AiNotesMode::Rules,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Flat persisted document location.
    pub data_file: PathBuf,
    pub max_items: usize,
    pub max_history_per_source: usize,
    pub max_observations: usize,
    /// Persistence gate on item confidence.
    pub min_confidence: f64,
    pub fetch_timeout: Duration,
    pub ai_notes_mode: AiNotesMode,
    pub openai_api_key: String,
    pub openai_model: String,
    pub max_ai_notes_per_run: u32,
    /// Background collection cadence.
    pub refresh_hours: u64,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/store.json"),
            max_items: 3000,
            max_history_per_source: 80,
            max_observations: 12_000,
            min_confidence: 0.8,
            fetch_timeout: Duration::from_millis(12_000),
            ai_notes_mode: AiNotesMode::Rules,
            openai_api_key: String::new(),
            openai_model: "gpt-5".to_string(),
            max_ai_notes_per_run: 25,
            refresh_hours: 4,
            port: 8787,
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            data_file: std::env::var("DATA_FILE")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            max_items: env_parse("MAX_ITEMS", defaults.max_items),
            max_history_per_source: env_parse(
                "MAX_HISTORY_PER_SOURCE",
                defaults.max_history_per_source,
            ),
            max_observations: env_parse("MAX_OBSERVATIONS", defaults.max_observations),
            min_confidence: env_parse("MIN_CONFIDENCE", defaults.min_confidence),
            fetch_timeout: Duration::from_millis(env_parse("FETCH_TIMEOUT_MS", 12_000u64)),
            ai_notes_mode: AiNotesMode::parse(&env_string("AI_NOTES_MODE", "rules")),
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: env_string("OPENAI_MODEL", &defaults.openai_model),
            max_ai_notes_per_run: env_parse("MAX_AI_NOTES_PER_RUN", defaults.max_ai_notes_per_run),
            refresh_hours: env_parse("REFRESH_HOURS", defaults.refresh_hours),
            port: env_parse("PORT", defaults.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parse_defaults_to_rules() {
        assert_eq!(AiNotesMode::parse("openai"), AiNotesMode::OpenAi);
        assert_eq!(AiNotesMode::parse("OpenAI"), AiNotesMode::OpenAi);
        assert_eq!(AiNotesMode::parse("rules"), AiNotesMode::Rules);
        assert_eq!(AiNotesMode::parse("anything-else"), AiNotesMode::Rules);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.max_items, 3000);
        assert_eq!(config.max_history_per_source, 80);
        assert_eq!(config.max_observations, 12_000);
        assert_eq!(config.min_confidence, 0.8);
        assert_eq!(config.fetch_timeout, Duration::from_millis(12_000));
        assert_eq!(config.max_ai_notes_per_run, 25);
    }
}

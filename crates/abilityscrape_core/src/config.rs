use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};
use crate::report_url::{DEFAULT_HOST, PageType};

pub const DEFAULT_CONFIG_FILENAME: &str = "abilityscrape.toml";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_DELAY_MS: u64 = 2_000;

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ScrapeConfig {
    #[serde(default)]
    pub scrape: ScrapeSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ScrapeSection {
    pub host: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_ms: Option<u64>,
    pub delay_ms: Option<u64>,
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub page_types: Vec<PageType>,
}

/// Environment lookup used by the config getters; tests substitute their own.
pub type EnvLookup = fn(&str) -> Option<String>;

impl ScrapeConfig {
    /// Report host: env ABILITYSCRAPE_HOST > config > DEFAULT_HOST.
    pub fn host(&self) -> String {
        self.host_with(env_string)
    }

    pub fn host_with(&self, env: EnvLookup) -> String {
        env("ABILITYSCRAPE_HOST")
            .or_else(|| self.scrape.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    /// Browser user agent: env ABILITYSCRAPE_USER_AGENT > config > DEFAULT_USER_AGENT.
    pub fn user_agent(&self) -> String {
        self.user_agent_with(env_string)
    }

    pub fn user_agent_with(&self, env: EnvLookup) -> String {
        env("ABILITYSCRAPE_USER_AGENT")
            .or_else(|| self.scrape.user_agent.clone())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_with(env_string)
    }

    pub fn timeout_with(&self, env: EnvLookup) -> Duration {
        Duration::from_millis(
            env_u64(env, "ABILITYSCRAPE_TIMEOUT_MS")
                .or(self.scrape.timeout_ms)
                .unwrap_or(DEFAULT_TIMEOUT_MS),
        )
    }

    /// Pause between successive page requests.
    pub fn delay(&self) -> Duration {
        self.delay_with(env_string)
    }

    pub fn delay_with(&self, env: EnvLookup) -> Duration {
        Duration::from_millis(
            env_u64(env, "ABILITYSCRAPE_DELAY_MS")
                .or(self.scrape.delay_ms)
                .unwrap_or(DEFAULT_DELAY_MS),
        )
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir_with(env_string)
    }

    pub fn output_dir_with(&self, env: EnvLookup) -> PathBuf {
        env("ABILITYSCRAPE_OUTPUT_DIR")
            .map(PathBuf::from)
            .or_else(|| self.scrape.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Page types to scrape, always in fight order. Empty config means all of them.
    pub fn page_types(&self) -> Vec<PageType> {
        PageType::canonical(&self.scrape.page_types)
    }
}

/// Load and parse a ScrapeConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<ScrapeConfig> {
    if !config_path.exists() {
        return Ok(ScrapeConfig::default());
    }
    let content = fs::read_to_string(config_path).map_err(|error| ScrapeError::Config {
        path: config_path.display().to_string(),
        message: format!("failed to read: {error}"),
    })?;
    toml::from_str(&content).map_err(|error| ScrapeError::Config {
        path: config_path.display().to_string(),
        message: format!("failed to parse: {error}"),
    })
}

/// Non-empty, trimmed process environment value.
pub fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_u64(env: EnvLookup, key: &str) -> Option<u64> {
    env(key).and_then(|value| value.trim().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_matches_scraper_etiquette() {
        let config = ScrapeConfig::default();
        assert!(config.scrape.host.is_none());
        assert_eq!(config.scrape.timeout_ms, None);
        assert_eq!(config.page_types(), PageType::FIGHT_ORDER.to_vec());
    }

    #[test]
    fn load_config_returns_default_for_missing_file() {
        let config = load_config(Path::new("/nonexistent/abilityscrape.toml")).expect("load");
        assert_eq!(config, ScrapeConfig::default());
    }

    #[test]
    fn load_config_parses_scrape_section() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(
            &config_path,
            r#"
[scrape]
host = "logs.example.org"
user_agent = "test-agent/1.0"
timeout_ms = 5000
delay_ms = 0
output_dir = "out"
page_types = ["summary", "casts"]
"#,
        )
        .expect("write config");

        let config = load_config(&config_path).expect("load config");
        assert_eq!(config.scrape.host.as_deref(), Some("logs.example.org"));
        assert_eq!(config.scrape.user_agent.as_deref(), Some("test-agent/1.0"));
        assert_eq!(config.scrape.timeout_ms, Some(5000));
        assert_eq!(config.scrape.delay_ms, Some(0));
        assert_eq!(config.scrape.output_dir, Some(PathBuf::from("out")));
        // Configured order does not override fight order.
        assert_eq!(
            config.page_types(),
            vec![PageType::Casts, PageType::Summary]
        );
    }

    fn no_env(_key: &str) -> Option<String> {
        None
    }

    fn fake_env(key: &str) -> Option<String> {
        match key {
            "ABILITYSCRAPE_HOST" => Some("env.example.org".to_string()),
            "ABILITYSCRAPE_DELAY_MS" => Some("250".to_string()),
            "ABILITYSCRAPE_TIMEOUT_MS" => Some("not-a-number".to_string()),
            _ => None,
        }
    }

    #[test]
    fn getters_fall_back_from_config_to_defaults() {
        let config = ScrapeConfig {
            scrape: ScrapeSection {
                host: Some("file.example.org".to_string()),
                delay_ms: Some(0),
                ..ScrapeSection::default()
            },
        };
        assert_eq!(config.host_with(no_env), "file.example.org");
        assert_eq!(config.delay_with(no_env), Duration::ZERO);
        assert_eq!(
            config.timeout_with(no_env),
            Duration::from_millis(DEFAULT_TIMEOUT_MS)
        );
        assert_eq!(config.user_agent_with(no_env), DEFAULT_USER_AGENT);
        assert_eq!(config.output_dir_with(no_env), PathBuf::from("."));
    }

    #[test]
    fn env_overrides_config_values() {
        let config = ScrapeConfig {
            scrape: ScrapeSection {
                host: Some("file.example.org".to_string()),
                delay_ms: Some(0),
                timeout_ms: Some(5_000),
                ..ScrapeSection::default()
            },
        };
        assert_eq!(config.host_with(fake_env), "env.example.org");
        assert_eq!(config.delay_with(fake_env), Duration::from_millis(250));
        // Unparseable env values are ignored.
        assert_eq!(config.timeout_with(fake_env), Duration::from_millis(5_000));
    }

    #[test]
    fn load_config_tolerates_other_sections() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(&config_path, "[api]\nclient_id = \"abc\"\n").expect("write config");

        let config = load_config(&config_path).expect("load config");
        assert_eq!(config, ScrapeConfig::default());
    }

    #[test]
    fn load_config_returns_error_for_invalid_toml() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(&config_path, "[scrape\nhost = \"oops\"").expect("write config");
        let error = load_config(&config_path).expect_err("must fail");
        assert!(error.to_string().contains("failed to parse"));
    }

    #[test]
    fn load_config_rejects_unknown_page_type() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(&config_path, "[scrape]\npage_types = [\"deaths\"]\n").expect("write config");
        assert!(load_config(&config_path).is_err());
    }
}

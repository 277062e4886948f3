//! Configuration loading, validation, and management for aulabot.
//!
//! Loads configuration from `~/.aulabot/config.toml` with environment
//! variable overrides. Validates all settings at startup. The resulting
//! [`AppConfig`] is built once and passed by reference to the provider
//! router and agent factory.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.aulabot/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model used when a request does not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Agent used when a request does not name one
    #[serde(default = "default_agent")]
    pub default_agent: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// LLM provider credentials and endpoints
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Google Custom Search
    #[serde(default)]
    pub google: GoogleSearchConfig,

    /// Page fetch limits
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Aula school portal
    #[serde(default)]
    pub aula: AulaConfig,
}

fn default_model() -> String {
    "gpt-4o".into()
}
fn default_agent() -> String {
    "research_agent".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2000
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Model-call/tool-batch cycles before the forced final answer
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Prior messages loaded into each transcript
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Optional deadline for one whole query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_timeout_secs: Option<u64>,
}

fn default_max_iterations() -> u32 {
    5
}
fn default_history_window() -> usize {
    20
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            history_window: default_history_window(),
            session_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "ProviderConfig::openai", deserialize_with = "openai_section")]
    pub openai: ProviderConfig,

    #[serde(
        default = "ProviderConfig::anthropic",
        deserialize_with = "anthropic_section"
    )]
    pub anthropic: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: ProviderConfig::openai(),
            anthropic: ProviderConfig::anthropic(),
        }
    }
}

/// One provider section. Missing fields take that provider's defaults,
/// so a key-only section is enough.
#[derive(Clone, Serialize)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub api_url: String,

    /// Model used when only the provider is named
    pub default_model: String,

    pub timeout_secs: u64,
}

/// A provider section as written in the file.
#[derive(Deserialize)]
struct ProviderSection {
    api_key: Option<String>,
    api_url: Option<String>,
    default_model: Option<String>,
    timeout_secs: Option<u64>,
}

impl ProviderSection {
    fn over(self, base: ProviderConfig) -> ProviderConfig {
        ProviderConfig {
            api_key: self.api_key.or(base.api_key),
            api_url: self.api_url.unwrap_or(base.api_url),
            default_model: self.default_model.unwrap_or(base.default_model),
            timeout_secs: self.timeout_secs.unwrap_or(base.timeout_secs),
        }
    }
}

fn openai_section<'de, D: Deserializer<'de>>(d: D) -> Result<ProviderConfig, D::Error> {
    ProviderSection::deserialize(d).map(|s| s.over(ProviderConfig::openai()))
}

fn anthropic_section<'de, D: Deserializer<'de>>(d: D) -> Result<ProviderConfig, D::Error> {
    ProviderSection::deserialize(d).map(|s| s.over(ProviderConfig::anthropic()))
}

fn default_provider_timeout() -> u64 {
    120
}

impl ProviderConfig {
    pub fn openai() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.openai.com/v1".into(),
            default_model: "gpt-4o".into(),
            timeout_secs: default_provider_timeout(),
        }
    }

    pub fn anthropic() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.anthropic.com/v1".into(),
            default_model: "claude-3-5-sonnet-20241022".into(),
            timeout_secs: default_provider_timeout(),
        }
    }

    /// A non-empty key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GoogleSearchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Programmable Search Engine id (`cx`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_id: Option<String>,

    #[serde(default = "default_search_url")]
    pub api_url: String,

    /// Country restriction (`cr`)
    #[serde(default = "default_country")]
    pub country: String,

    #[serde(default = "default_num_results")]
    pub num_results: u32,

    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_search_url() -> String {
    "https://customsearch.googleapis.com/customsearch/v1".into()
}
fn default_country() -> String {
    "countryDK".into()
}
fn default_num_results() -> u32 {
    5
}
fn default_tool_timeout() -> u64 {
    30
}

impl GoogleSearchConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
            && self.engine_id.as_deref().is_some_and(|c| !c.is_empty())
    }
}

impl Default for GoogleSearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            api_url: default_search_url(),
            country: default_country(),
            num_results: default_num_results(),
            timeout_secs: default_tool_timeout(),
        }
    }
}

impl std::fmt::Debug for GoogleSearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSearchConfig")
            .field("api_key", &redact(&self.api_key))
            .field("engine_id", &self.engine_id)
            .field("api_url", &self.api_url)
            .field("country", &self.country)
            .field("num_results", &self.num_results)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Characters of page text kept before truncation
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_max_chars() -> usize {
    5000
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            timeout_secs: default_tool_timeout(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AulaConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default = "default_aula_api_url")]
    pub api_url: String,

    #[serde(default = "default_aula_login_url")]
    pub login_url: String,

    /// How long a portal session is reused before logging in again
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_aula_api_url() -> String {
    "https://www.aula.dk/api/v20".into()
}
fn default_aula_login_url() -> String {
    "https://login.aula.dk/auth/authenticate".into()
}
fn default_session_ttl() -> u64 {
    3600
}

impl AulaConfig {
    pub fn is_configured(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty())
            && self.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

impl Default for AulaConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            api_url: default_aula_api_url(),
            login_url: default_aula_login_url(),
            session_ttl_secs: default_session_ttl(),
            timeout_secs: default_tool_timeout(),
        }
    }
}

impl std::fmt::Debug for AulaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AulaConfig")
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("api_url", &self.api_url)
            .field("login_url", &self.login_url)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.aulabot/config.toml),
    /// then apply environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load a specific file, then apply environment variable overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Non-empty values win over the file. Empty values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.providers.openai.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_ENDPOINT") {
            self.providers.openai.api_url = v;
        }
        if let Some(v) = get("OPENAI_DEFAULT_MODEL") {
            self.providers.openai.default_model = v;
        }
        if let Some(v) = get("ANTHROPIC_API_KEY") {
            self.providers.anthropic.api_key = Some(v);
        }
        if let Some(v) = get("ANTHROPIC_ENDPOINT") {
            self.providers.anthropic.api_url = v;
        }
        if let Some(v) = get("ANTHROPIC_DEFAULT_MODEL") {
            self.providers.anthropic.default_model = v;
        }
        if let Some(v) = get("GOOGLE_SEARCH_API_KEY") {
            self.google.api_key = Some(v);
        }
        if let Some(v) = get("GOOGLE_SEARCH_ENGINE_ID") {
            self.google.engine_id = Some(v);
        }
        if let Some(v) = get("AULA_USERNAME") {
            self.aula.username = Some(v);
        }
        if let Some(v) = get("AULA_PASSWORD") {
            self.aula.password = Some(v);
        }
        if let Some(v) = get("AULABOT_MODEL") {
            self.default_model = v;
        }
        if let Some(v) = get("AULABOT_AGENT") {
            self.default_agent = v;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".aulabot")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }
        if self.agent.history_window == 0 {
            return Err(ConfigError::ValidationError(
                "agent.history_window must be at least 1".into(),
            ));
        }
        if self.fetch.max_chars == 0 {
            return Err(ConfigError::ValidationError(
                "fetch.max_chars must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Whether any LLM provider has a key.
    pub fn has_api_key(&self) -> bool {
        self.providers.openai.is_configured() || self.providers.anthropic.is_configured()
    }

}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            default_agent: default_agent(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            agent: AgentSettings::default(),
            providers: ProvidersConfig::default(),
            google: GoogleSearchConfig::default(),
            fetch: FetchConfig::default(),
            aula: AulaConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.agent.max_iterations, 5);
        assert_eq!(config.agent.history_window, 20);
        assert_eq!(config.fetch.max_chars, 5000);
        assert_eq!(config.google.country, "countryDK");
        assert!(config.validate().is_ok());
        assert!(!config.has_api_key());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_model, config.default_model);
        assert_eq!(parsed.providers.anthropic.api_url, config.providers.anthropic.api_url);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_agent, "research_agent");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_model = "claude-3-5-haiku-20241022"

[agent]
max_iterations = 3

[providers.anthropic]
api_key = "sk-ant-test"
api_url = "http://localhost:9999/v1"

[aula]
username = "parent"
password = "secret"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "claude-3-5-haiku-20241022");
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.agent.history_window, 20);
        assert!(config.providers.anthropic.is_configured());
        assert!(!config.providers.openai.is_configured());
        assert_eq!(config.providers.openai.api_url, "https://api.openai.com/v1");
        assert_eq!(config.providers.anthropic.api_url, "http://localhost:9999/v1");
        assert_eq!(
            config.providers.anthropic.default_model,
            "claude-3-5-sonnet-20241022"
        );
        assert!(config.aula.is_configured());
        assert_eq!(config.aula.session_ttl_secs, 3600);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_model = [").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("OPENAI_API_KEY", "sk-test"),
            ("GOOGLE_SEARCH_API_KEY", "g-key"),
            ("GOOGLE_SEARCH_ENGINE_ID", "cx-1"),
            ("AULA_USERNAME", "parent"),
            ("AULA_PASSWORD", ""),
            ("AULABOT_AGENT", "aula_agent"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert!(config.providers.openai.is_configured());
        assert!(config.google.is_configured());
        assert_eq!(config.default_agent, "aula_agent");
        // Empty password is ignored, so Aula stays unconfigured.
        assert!(!config.aula.is_configured());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig::default();
        config.providers.openai.api_key = Some("sk-very-secret".into());
        config.aula.password = Some("hunter2".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn key_only_provider_section_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
[providers.openai]
api_key = "sk-test"

[providers.anthropic]
api_key = "sk-ant-test"
timeout_secs = 60
"#,
        )
        .unwrap();

        let openai = &config.providers.openai;
        assert!(openai.is_configured());
        assert_eq!(openai.api_url, "https://api.openai.com/v1");
        assert_eq!(openai.default_model, "gpt-4o");
        assert_eq!(openai.timeout_secs, 120);

        let anthropic = &config.providers.anthropic;
        assert_eq!(anthropic.api_url, "https://api.anthropic.com/v1");
        assert_eq!(anthropic.default_model, "claude-3-5-sonnet-20241022");
        assert_eq!(anthropic.timeout_secs, 60);
    }

    #[test]
    fn default_model_env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("OPENAI_DEFAULT_MODEL", "gpt-4o-mini"),
            ("ANTHROPIC_DEFAULT_MODEL", "claude-3-haiku-20240307"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.providers.openai.default_model, "gpt-4o-mini");
        assert_eq!(
            config.providers.anthropic.default_model,
            "claude-3-haiku-20240307"
        );
    }
}

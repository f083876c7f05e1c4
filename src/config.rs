use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const OPENAI_KEY_PLACEHOLDER: &str = "your-openai-key-here";
pub const SERPAPI_KEY_PLACEHOLDER: &str = "your-serpapi-key-here";

/// Main configuration structure for the travel agent backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub openai: OpenAiConfig,
    pub serpapi: SerpApiConfig,
    pub rate_limiter: RateLimiterConfig,
    pub logging: LoggingConfig,
    pub agent: AgentConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub title: String,
    pub description: String,
    pub version: String,
    pub debug: bool,
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
    /// Bytes.
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub origins: Vec<String>,
    pub methods: Vec<String>,
    pub headers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerpApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimiterConfig {
    pub max_requests: u32,
    pub window_seconds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model calls allowed per user turn.
    pub max_iterations: usize,
    /// Trailing messages shown to the model.
    pub memory_limit: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub valid_api_keys: Vec<String>,
    pub require_api_key: bool,
}

impl Config {
    /// Load configuration from file with environment variable overrides
    /// ALWAYS returns a valid config - never fails
    pub fn load() -> Self {
        let env_paths = ["../.env", ".env"];

        let mut env_loaded = false;
        for path in &env_paths {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                env_loaded = true;
                break;
            }
        }

        if !env_loaded {
            tracing::warn!(
                "No .env file found in any expected location - continuing with env vars only"
            );
        }

        let config_path =
            env::var("TRAVEL_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match serde_yaml::from_str::<Config>(&contents) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", config_path);
                        config
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to parse config file {}: {} - using defaults",
                            config_path,
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::error!(
                        "Failed to read config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            }
        } else {
            tracing::debug!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides(|key| env::var(key).ok());
        config.apply_key_placeholders();

        if let Err(e) = config.validate() {
            tracing::warn!("Config validation warnings: {} - continuing anyway", e);
        }

        config
    }

    /// Apply overrides from `lookup` (the process environment in production).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(title) = lookup("API_TITLE") {
            self.server.title = title;
        }
        if let Some(description) = lookup("API_DESCRIPTION") {
            self.server.description = description;
        }
        if let Some(version) = lookup("API_VERSION") {
            self.server.version = version;
        }
        if let Some(debug) = lookup("DEBUG") {
            if let Some(flag) = parse_flag(&debug) {
                self.server.debug = flag;
            }
        }
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            if let Ok(port_num) = port.parse() {
                self.server.port = port_num;
            }
        }
        if let Some(timeout) = lookup("REQUEST_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.server.request_timeout_seconds = secs;
            }
        }
        if let Some(size) = lookup("MAX_REQUEST_SIZE") {
            if let Ok(bytes) = size.parse() {
                self.server.max_request_size = bytes;
            }
        }

        // CORS overrides
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.cors.origins = split_list(&origins);
        }
        if let Some(methods) = lookup("CORS_METHODS") {
            self.cors.methods = split_list(&methods);
        }
        if let Some(headers) = lookup("CORS_HEADERS") {
            self.cors.headers = split_list(&headers);
        }

        // OpenAI overrides
        if let Some(api_key) = lookup("OPENAI_API_KEY") {
            self.openai.api_key = api_key;
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            self.openai.model = model;
        }
        if let Some(temperature) = lookup("OPENAI_TEMPERATURE") {
            if let Ok(t) = temperature.parse() {
                self.openai.temperature = t;
            }
        }
        if let Some(max_tokens) = lookup("OPENAI_MAX_TOKENS") {
            if let Ok(n) = max_tokens.parse() {
                self.openai.max_tokens = n;
            }
        }

        // SerpAPI overrides
        if let Some(api_key) = lookup("SERPAPI_API_KEY") {
            self.serpapi.api_key = api_key;
        }
        if let Some(base_url) = lookup("SERPAPI_BASE_URL") {
            self.serpapi.base_url = base_url;
        }
        if let Some(timeout) = lookup("SERPAPI_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.serpapi.timeout_seconds = secs;
            }
        }

        // Rate limiter overrides
        if let Some(max_requests) = lookup("RATE_LIMIT_REQUESTS") {
            if let Ok(max) = max_requests.parse() {
                self.rate_limiter.max_requests = max;
            }
        }
        if let Some(window) = lookup("RATE_LIMIT_WINDOW") {
            if let Ok(window_secs) = window.parse() {
                self.rate_limiter.window_seconds = window_secs;
            }
        }

        // Logging overrides
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = if format.eq_ignore_ascii_case("json") {
                LogFormat::Json
            } else {
                LogFormat::Text
            };
        }
        if let Some(file) = lookup("LOG_FILE") {
            self.logging.file = Some(file).filter(|f| !f.is_empty());
        }

        // Agent overrides
        if let Some(iterations) = lookup("AGENT_MAX_ITERATIONS") {
            if let Ok(n) = iterations.parse() {
                self.agent.max_iterations = n;
            }
        }
        if let Some(limit) = lookup("AGENT_MEMORY_LIMIT") {
            if let Ok(n) = limit.parse() {
                self.agent.memory_limit = n;
            }
        }

        // Auth overrides
        if let Some(keys) = lookup("VALID_API_KEYS") {
            self.auth.valid_api_keys = split_list(&keys);
        }
        if let Some(required) = lookup("REQUIRE_API_KEY") {
            if let Some(flag) = parse_flag(&required) {
                self.auth.require_api_key = flag;
            }
        }
    }

    /// Missing keys get placeholders so the process can still start.
    fn apply_key_placeholders(&mut self) {
        if self.openai.api_key.is_empty() {
            tracing::warn!("OPENAI_API_KEY not set - agent replies will fail until it is configured");
            self.openai.api_key = OPENAI_KEY_PLACEHOLDER.to_string();
        }
        if self.serpapi.api_key.is_empty() {
            tracing::warn!("SERPAPI_API_KEY not set - searches will fail until it is configured");
            self.serpapi.api_key = SERPAPI_KEY_PLACEHOLDER.to_string();
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".into());
        }
        if self.rate_limiter.max_requests == 0 {
            return Err("Rate limiter max_requests cannot be 0".into());
        }
        if self.rate_limiter.window_seconds == 0 {
            return Err("Rate limiter window_seconds cannot be 0".into());
        }
        if !(0.0..=2.0).contains(&self.openai.temperature) {
            return Err("OpenAI temperature must be between 0.0 and 2.0".into());
        }
        if self.agent.max_iterations == 0 {
            return Err("Agent max_iterations cannot be 0".into());
        }
        if !self.has_openai_key() {
            return Err("OPENAI_API_KEY environment variable must be set".into());
        }
        if !self.has_serpapi_key() {
            return Err("SERPAPI_API_KEY environment variable must be set".into());
        }
        Ok(())
    }

    pub fn has_openai_key(&self) -> bool {
        is_real_key(&self.openai.api_key, OPENAI_KEY_PLACEHOLDER)
    }

    pub fn has_serpapi_key(&self) -> bool {
        is_real_key(&self.serpapi.api_key, SERPAPI_KEY_PLACEHOLDER)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_seconds)
    }

    pub fn serpapi_timeout(&self) -> Duration {
        Duration::from_secs(self.serpapi.timeout_seconds)
    }
}

fn is_real_key(key: &str, placeholder: &str) -> bool {
    !key.trim().is_empty() && key != placeholder
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            title: "Travel Agent API".to_string(),
            description: "AI-powered travel agent for flight and hotel search".to_string(),
            version: "1.0.0".to_string(),
            debug: false,
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_seconds: 30,
            max_request_size: 1024 * 1024,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            headers: vec!["*".to_string()],
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4.1-mini".to_string(),
            temperature: 0.1,
            max_tokens: 1000,
        }
    }
}

impl Default for SerpApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://serpapi.com".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_seconds: 3600,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            format: LogFormat::Text,
            file: None,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            memory_limit: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_replace_defaults() {
        let mut config = Config::default();
        config.apply_env_overrides(lookup(&[
            ("API_PORT", "9000"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("RATE_LIMIT_REQUESTS", "5"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("LOG_FORMAT", "JSON"),
            ("REQUIRE_API_KEY", "true"),
        ]));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.rate_limiter.max_requests, 5);
        assert_eq!(
            config.cors.origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.auth.require_api_key);
    }

    #[test]
    fn unparseable_overrides_are_ignored() {
        let mut config = Config::default();
        config.apply_env_overrides(lookup(&[
            ("API_PORT", "eighty"),
            ("OPENAI_TEMPERATURE", "warm"),
        ]));
        assert_eq!(config.server.port, 8000);
        assert!((config.openai.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_keys_fall_back_to_placeholders() {
        let mut config = Config::default();
        config.apply_key_placeholders();
        assert_eq!(config.openai.api_key, OPENAI_KEY_PLACEHOLDER);
        assert!(!config.has_openai_key());
        assert!(!config.has_serpapi_key());
        assert!(config.validate().is_err());

        config.openai.api_key = "sk-test".into();
        config.serpapi.api_key = "serp-test".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str(
            "server:\n  port: 8080\nagent:\n  memory_limit: 8\n",
        )
        .expect("yaml should parse");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.title, "Travel Agent API");
        assert_eq!(config.agent.memory_limit, 8);
        assert_eq!(config.agent.max_iterations, 10);
        assert_eq!(config.openai.model, "gpt-4.1-mini");
        assert_eq!(config.rate_limiter.window_seconds, 3600);
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// State backend configuration
    pub state: StateConfig,

    /// Classifier configuration
    pub models: ModelsConfig,

    /// Chat broker configuration
    pub chat: ChatConfig,

    /// Account configuration
    #[serde(default)]
    pub accounts: AccountsConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/local.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: SYMPTOSCAN_)
            .add_source(
                config::Environment::with_prefix("SYMPTOSCAN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults, used when loading fails
    pub fn embedded_defaults() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// State backend type
    #[serde(default)]
    pub backend: StateBackend,

    /// Path for the embedded database
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StateBackend {
    #[default]
    Sled,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Directory holding serialized classifier artifacts
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Directory holding the bundled training CSVs
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Trees per ensemble
    #[serde(default = "default_n_trees")]
    pub n_trees: u16,

    /// RNG seed for the split and the bootstrap samples
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Held-out fraction
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    /// Load or train every classifier before accepting requests
    #[serde(default = "default_true")]
    pub warm_up: bool,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            data_dir: default_data_dir(),
            n_trees: default_n_trees(),
            seed: default_seed(),
            test_size: default_test_size(),
            warm_up: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Enable the chat broker routes
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_chat_api_url")]
    pub api_url: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_chat_api_key_env")]
    pub api_key_env: String,

    /// Model name sent to the endpoint
    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_chat_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_chat_temperature")]
    pub temperature: f32,

    /// LLM request timeout (seconds)
    #[serde(default = "default_chat_timeout")]
    pub timeout_secs: u64,

    /// Number of earlier messages replayed to the model
    #[serde(default = "default_chat_history_limit")]
    pub history_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: default_chat_api_url(),
            api_key_env: default_chat_api_key_env(),
            model: default_chat_model(),
            max_tokens: default_chat_max_tokens(),
            temperature: default_chat_temperature(),
            timeout_secs: default_chat_timeout(),
            history_limit: default_chat_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Minimum password length accepted at signup
    #[serde(default = "default_min_password_length")]
    pub min_password_length: u64,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("./data/models")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_n_trees() -> u16 {
    100
}

fn default_seed() -> u64 {
    42
}

fn default_test_size() -> f64 {
    0.2
}

fn default_chat_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_chat_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_chat_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_chat_max_tokens() -> u32 {
    500
}

fn default_chat_temperature() -> f32 {
    0.7
}

fn default_chat_timeout() -> u64 {
    20
}

fn default_chat_history_limit() -> usize {
    10
}

fn default_min_password_length() -> u64 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "symptoscan".to_string()
}

fn default_true() -> bool {
    true
}

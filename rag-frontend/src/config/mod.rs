use client_core::config::CoreConfig;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(flatten)]
    pub common: CoreConfig,
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub preview: PreviewSettings,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default)]
    pub library: LibrarySettings,
    #[serde(default)]
    pub upload: UploadSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    /// Base URL of the RAG backend (e.g., http://localhost:8000).
    #[serde(default = "default_backend_url")]
    pub url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PreviewSettings {
    /// Seconds a preview load may take before it is failed with a timeout.
    #[serde(default = "default_watchdog_secs")]
    pub watchdog_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatSettings {
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LibrarySettings {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Extra attempts for a failed listing request; there is no backoff between them.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadSettings {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: u32,
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_watchdog_secs() -> u64 {
    30
}

fn default_max_results() -> u32 {
    4
}

fn default_model() -> String {
    "gpt-4.1".to_string()
}

fn default_welcome_message() -> String {
    "Hello! Ask me anything about this document.".to_string()
}

fn default_max_query_chars() -> usize {
    1000
}

fn default_page_size() -> u32 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_chunk_size() -> u32 {
    1000
}

fn default_chunk_overlap() -> u32 {
    400
}

fn default_collection_name() -> String {
    "default".to_string()
}

fn default_max_file_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl BackendSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            watchdog_secs: default_watchdog_secs(),
        }
    }
}

impl PreviewSettings {
    pub fn watchdog(&self) -> Duration {
        Duration::from_secs(self.watchdog_secs)
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            model: default_model(),
            welcome_message: default_welcome_message(),
            max_query_chars: default_max_query_chars(),
        }
    }
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            collection_name: default_collection_name(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("Cannot read current directory: {e}")))?;

    // Check if we're already in rag-frontend directory or need to navigate to it
    let configuration_directory = if base_path.ends_with("rag-frontend") {
        base_path.join("config")
    } else {
        base_path.join("rag-frontend").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Where snapshots, rendered reports and uploaded images live on disk.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub sessions_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub uploads_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sessions_dir: PathBuf::from("data/sessions"),
            reports_dir: PathBuf::from("reports"),
            uploads_dir: PathBuf::from("uploads"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    pub faq_path: PathBuf,
    pub min_score: f32,
    pub history_window: usize,
    pub system_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            faq_path: PathBuf::from("data/faq.json"),
            min_score: 0.6,
            history_window: 6,
            system_prompt: "You are a Dog Health AI assistant. \
                Provide expert, friendly, and contextual advice about dog health, nutrition, and care. \
                Always try to engage with follow-up questions if useful."
                .to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VisionConfig {
    /// Base URL of the image classification service. Uploads are rejected
    /// with a capability error when unset.
    pub endpoint: Option<String>,
    pub dog_threshold: f32,
    /// Uploads larger than this are rejected with 400 before analysis.
    pub max_upload_bytes: usize,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            dog_threshold: 0.30,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub api_base: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    /// Sampling temperature; the provider default applies when unset.
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub chat: ChatConfig,
    pub vision: VisionConfig,
    pub llm: Option<LlmConfig>,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("DOGCARE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;

        // Expand environment variables if present like ${OPENAI_API_KEY}
        app_config.server.host = expand_env(&app_config.server.host);
        if let Some(ref mut llm) = app_config.llm {
            llm.api_key = expand_env(&llm.api_key);
            llm.api_base = expand_env(&llm.api_base);
        }
        if let Some(ref mut endpoint) = app_config.vision.endpoint {
            *endpoint = expand_env(endpoint);
        }

        Ok(app_config)
    }
}

fn expand_env(val: &str) -> String {
    if val.starts_with("${") && val.ends_with('}') {
        let var_name = &val[2..val.len() - 1];
        std::env::var(var_name).unwrap_or_default()
    } else {
        val.to_string()
    }
}

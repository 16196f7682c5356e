use anyhow::{bail, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Request body cap, mainly for uploads
    pub max_upload_bytes: usize,
}

#[derive(Clone, Deserialize)]
pub struct LLMConfig {
    pub openai_api_key: String,
    pub api_base: String,
    pub default_model: String,
    pub request_timeout_secs: u64,
}

// Keep the key out of startup logs.
impl std::fmt::Debug for LLMConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LLMConfig")
            .field("openai_api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("default_model", &self.default_model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub base_dir: PathBuf,
}

impl StorageConfig {
    /// Directory holding uploaded documents
    pub fn documents_dir(&self) -> PathBuf {
        self.base_dir.join("documents")
    }

    /// Directory served under `/static`
    pub fn static_dir(&self) -> PathBuf {
        self.base_dir.join("static")
    }

    pub fn charts_dir(&self) -> PathBuf {
        self.static_dir().join("images")
    }

    pub fn chart_path(&self) -> PathBuf {
        self.charts_dir().join("chart.png")
    }

    pub fn report_path(&self) -> PathBuf {
        self.static_dir().join("report.txt")
    }

    pub fn response_path(&self) -> PathBuf {
        self.static_dir().join("response.txt")
    }
}

#[derive(Clone, Deserialize)]
pub struct SessionConfig {
    pub secret_key: String,
    /// Sessions untouched for this long are dropped along with their uploads
    pub idle_timeout_secs: u64,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret_key", &"<redacted>")
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let openai_api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        if openai_api_key.trim().is_empty() {
            bail!("OPENAI_API_KEY must be set");
        }

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "5001".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                max_upload_bytes: env::var("MAX_UPLOAD_MB")
                    .unwrap_or_else(|_| "16".to_string())
                    .parse::<usize>()?
                    * 1024
                    * 1024,
            },
            llm: LLMConfig {
                openai_api_key,
                api_base: env::var("OPENAI_API_BASE")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                default_model: env::var("OPENAI_MODEL")
                    .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
                request_timeout_secs: env::var("OPENAI_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()?,
            },
            storage: StorageConfig {
                base_dir: env::var("BASE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(".")),
            },
            session: SessionConfig {
                // A fresh key per process invalidates old cookies on restart,
                // which matches the in-memory session store.
                secret_key: env::var("SECRET_KEY")
                    .ok()
                    .filter(|k| !k.is_empty())
                    .unwrap_or_else(|| hex::encode(rand::random::<[u8; 24]>())),
                idle_timeout_secs: env::var("SESSION_IDLE_MINUTES")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse::<u64>()?
                    * 60,
            },
            logging: LoggingConfig {
                log_dir: env::var("LOG_DIR").ok().map(PathBuf::from),
            },
        })
    }

    /// Configuration rooted at `base_dir`, used by tests and embedders
    pub fn for_base_dir(base_dir: impl Into<PathBuf>, api_key: &str) -> Self {
        Self {
            server: ServerConfig {
                port: 5001,
                host: "127.0.0.1".to_string(),
                max_upload_bytes: 16 * 1024 * 1024,
            },
            llm: LLMConfig {
                openai_api_key: api_key.to_string(),
                api_base: "https://api.openai.com/v1".to_string(),
                default_model: "gpt-3.5-turbo".to_string(),
                request_timeout_secs: 60,
            },
            storage: StorageConfig {
                base_dir: base_dir.into(),
            },
            session: SessionConfig {
                secret_key: hex::encode(rand::random::<[u8; 24]>()),
                idle_timeout_secs: 2 * 60 * 60,
            },
            logging: LoggingConfig { log_dir: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_layout() {
        let storage = StorageConfig {
            base_dir: PathBuf::from("/srv/app"),
        };
        assert_eq!(storage.documents_dir(), PathBuf::from("/srv/app/documents"));
        assert_eq!(storage.chart_path(), PathBuf::from("/srv/app/static/images/chart.png"));
        assert_eq!(storage.report_path(), PathBuf::from("/srv/app/static/report.txt"));
        assert_eq!(storage.response_path(), PathBuf::from("/srv/app/static/response.txt"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::for_base_dir("/tmp", "sk-very-secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-very-secret"));
        assert!(!rendered.contains(&config.session.secret_key));
    }
}

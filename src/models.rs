use std::path::PathBuf;

use crate::agents::ChatPipeline;
use crate::config::Config;
use crate::llm::LLM;
use crate::session::SessionStore;
use crate::storage::Storage;
use crate::types::AppResult;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub llm: LLM,
}

impl AppState {
    /// State backed by the configured OpenAI endpoint
    pub fn new(config: Config) -> AppResult<Self> {
        let llm = LLM::openai(&config.llm)?;
        Ok(Self::with_llm(config, llm))
    }

    pub fn with_llm(config: Config, llm: LLM) -> Self {
        let sessions = SessionStore::new(&config.session.secret_key);
        Self { config, sessions, llm }
    }

    pub fn storage(&self) -> Storage {
        Storage::new(self.config.storage.documents_dir())
    }

    pub fn pipeline(&self) -> ChatPipeline {
        ChatPipeline::new(
            self.llm.clone(),
            self.config.llm.default_model.clone(),
            self.config.storage.clone(),
        )
    }
}

/// An uploaded file tracked by a session
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    pub name: String,
    pub path: PathBuf,
}

impl Document {
    /// Lowercased text after the last dot of the stored path
    pub fn extension(&self) -> String {
        self.path
            .to_string_lossy()
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistoryEntry {
    pub question: String,
    /// Answer as stored in the session (already formatted for display)
    pub response: String,
}

// API Request/Response types

#[derive(Debug, Default, serde::Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub sessions: usize,
}

//! Question answering
//!
//! ```text
//! Question
//!    │
//!    ▼
//! ┌─────────────┐
//! │   Context   │  → re-extract every uploaded document
//! └─────────────┘
//!    │
//!    ▼
//! ┌─────────────┐
//! │    Reply    │  → one chat completion, answer formatted for HTML
//! └─────────────┘
//!    │
//!    ▼
//! ┌─────────────┐
//! │ Chart/Report│  → keyword rules over the first document's table
//! └─────────────┘
//! ```

pub mod chart_policy;
pub mod reply;

pub use chart_policy::{chart_for_question, wants_report};
pub use reply::{Context, ReplyAgent, FALLBACK_ANSWER, SYSTEM_PROMPT};

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::analysis::{charts, report};
use crate::config::StorageConfig;
use crate::documents::{Extension, Table};
use crate::llm::LLM;
use crate::models::{Document, HistoryEntry};
use crate::session::Session;
use crate::types::{AppError, AppResult};

/// What a chat turn produced besides the stored answer
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChatOutcome {
    /// False when the completion failed and the fallback was stored
    pub answered: bool,
    pub chart_path: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
}

#[derive(Clone)]
pub struct ChatPipeline {
    llm: LLM,
    model: String,
    storage: StorageConfig,
}

impl ChatPipeline {
    pub fn new(llm: LLM, model: String, storage: StorageConfig) -> Self {
        Self { llm, model, storage }
    }

    /// Answer `question` against the session's documents.
    ///
    /// Validation failures return an error and leave the session untouched.
    /// Everything after that is recorded in the session: the answer (or the
    /// fallback), a history entry, artifact paths and flash messages.
    pub async fn run(&self, session: &mut Session, question: &str) -> AppResult<ChatOutcome> {
        let question = question.trim();
        if session.documents.is_empty() {
            return Err(AppError::Validation(
                "No documents loaded. Please load document content first.".to_string(),
            ));
        }
        if question.is_empty() {
            return Err(AppError::Validation("Please enter a question.".to_string()));
        }

        let documents = session.documents.clone();
        let context = tokio::task::spawn_blocking(move || ReplyAgent::build_context(&documents)).await?;
        for warning in context.warnings {
            session.flash(warning);
        }

        info!(
            documents = session.documents.len(),
            context_chars = context.text.len(),
            "Answering question"
        );

        let request = ReplyAgent::build_request(&self.model, &context.text, question);
        let mut outcome = ChatOutcome::default();

        let answer = match self.llm.create_chat_completion(&request).await {
            Ok(response) => {
                info!(
                    response_len = response.content.len(),
                    total_tokens = response.usage.total_tokens,
                    "Generated reply"
                );
                outcome.answered = true;
                ReplyAgent::format_answer(&response.content)
            }
            Err(e) => {
                error!(error = %e, "Chat completion failed");
                FALLBACK_ANSWER.to_string()
            }
        };

        session.response = Some(answer.clone());
        session.history.push(HistoryEntry {
            question: question.to_string(),
            response: answer,
        });

        if !outcome.answered {
            return Ok(outcome);
        }

        let first = session.documents[0].clone();

        if let Some(kind) = chart_for_question(question) {
            match self.render_chart(first.clone(), kind).await {
                Ok(path) => {
                    session.chart_path = Some(path.clone());
                    outcome.chart_path = Some(path);
                }
                Err(e) => {
                    warn!(error = %e, chart = ?kind, "Chart generation failed");
                    session.flash(e.to_string());
                }
            }
        }

        if wants_report(question) {
            match self.write_report(first).await {
                Ok(path) => {
                    session.report_path = Some(path.clone());
                    outcome.report_path = Some(path);
                }
                Err(e) => {
                    warn!(error = %e, "Report generation failed");
                    session.flash(format!("Error generating report: {}", e));
                }
            }
        }

        Ok(outcome)
    }

    /// The chart table is always read as CSV, whatever the document's extension.
    async fn render_chart(&self, document: Document, kind: charts::ChartKind) -> AppResult<PathBuf> {
        let output = self.storage.chart_path();
        let path = tokio::task::spawn_blocking(move || {
            let table = Table::from_csv_path(&document.path)
                .map_err(|e| charts::ChartError::Table(e.to_string()))?;
            charts::render(&table, kind, &output)
        })
        .await??;
        Ok(path)
    }

    async fn write_report(&self, document: Document) -> AppResult<PathBuf> {
        let output = self.storage.report_path();
        let path = tokio::task::spawn_blocking(move || {
            let table = Extension::parse(&document.extension())
                .filter(|ext| ext.is_tabular())
                .and_then(|ext| Table::load(&document.path, ext).ok());
            report::summarize(table.as_ref(), &output)
        })
        .await??;
        Ok(path)
    }
}

//! Reply Agent
//!
//! Turns the uploaded documents and a question into a single chat-completion
//! request, and the model's answer into the HTML fragment stored in the session.

use std::path::Path;

use crate::documents::DocumentProcessor;
use crate::models::Document;
use crate::types::{LLMMessage, LLMRequest};
use crate::utils::escape_text;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant capable of generating charts, tables, and reports.";

/// Stored in place of an answer when the completion call fails
pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't process your request.";

const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.5;

/// Context assembled from every document plus extraction warnings
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Context {
    pub text: String,
    pub warnings: Vec<String>,
}

pub struct ReplyAgent;

impl ReplyAgent {
    /// Re-extract every document, in upload order. Blocking.
    pub fn build_context(documents: &[Document]) -> Context {
        let mut context = Context::default();
        for doc in documents {
            let extraction = DocumentProcessor::extract(Path::new(&doc.path), &doc.extension());
            context.text.push_str(&extraction.text);
            context.text.push_str("\n\n");
            context.warnings.extend(extraction.warnings);
        }
        context
    }

    pub fn create_prompt(context: &str, question: &str) -> String {
        format!(
            "Use the following context to answer the question. You may provide tabular data or generate a chart if needed.\n\nContext:\n{}\n\nQuestion: {}\nAnswer:",
            context, question
        )
    }

    pub fn build_request(model: &str, context: &str, question: &str) -> LLMRequest {
        LLMRequest {
            model: model.to_string(),
            messages: vec![
                LLMMessage::system(SYSTEM_PROMPT),
                LLMMessage::user(Self::create_prompt(context, question)),
            ],
            max_tokens: Some(MAX_TOKENS),
            temperature: Some(TEMPERATURE),
            top_p: Some(1.0),
            frequency_penalty: Some(0.0),
            presence_penalty: Some(0.0),
        }
    }

    /// Trim and escape the answer so it can be rendered as HTML verbatim.
    /// Pipes are entity-encoded and newlines become `<br>`; quotes are left
    /// alone so the downloaded text stays readable.
    pub fn format_answer(raw: &str) -> String {
        escape_text(raw.trim())
            .replace('|', "&#124;")
            .replace('\n', "<br>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_prompt_layout() {
        let prompt = ReplyAgent::create_prompt("some text\n\n", "What?");
        assert!(prompt.starts_with("Use the following context to answer the question."));
        assert!(prompt.contains("Context:\nsome text\n\n\n\nQuestion: What?\nAnswer:"));
    }

    #[test]
    fn test_request_sampling_parameters() {
        let request = ReplyAgent::build_request("gpt-3.5-turbo", "ctx", "q");
        assert_eq!(request.model, "gpt-3.5-turbo");
        assert_eq!(request.messages[0], LLMMessage::system(SYSTEM_PROMPT));
        assert_eq!(request.messages[1].role, "user");
        assert_eq!(request.max_tokens, Some(500));
        assert_eq!(request.temperature, Some(0.5));
        assert_eq!(request.top_p, Some(1.0));
        assert_eq!(request.presence_penalty, Some(0.0));
    }

    #[test]
    fn test_format_answer() {
        assert_eq!(
            ReplyAgent::format_answer("  | a | b |\n| 1 | 2 |\n"),
            "&#124; a &#124; b &#124;<br>&#124; 1 &#124; 2 &#124;"
        );
        assert_eq!(
            ReplyAgent::format_answer("<script>x</script> & co"),
            "&lt;script&gt;x&lt;/script&gt; &amp; co"
        );
        assert_eq!(ReplyAgent::format_answer("don't \"quote\""), "don't \"quote\"");
    }

    #[test]
    fn test_context_joins_documents_and_collects_warnings() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, "alpha").unwrap();
        std::fs::write(&b, "beta").unwrap();

        let docs = vec![
            Document { name: "a.txt".into(), path: a },
            Document { name: "b.txt".into(), path: b },
            Document { name: "gone.pdf".into(), path: PathBuf::from("/nonexistent/gone.pdf") },
        ];
        let context = ReplyAgent::build_context(&docs);
        assert_eq!(context.text, "alpha\n\nbeta\n\n\n\n");
        assert_eq!(context.warnings.len(), 1);
    }
}

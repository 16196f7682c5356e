// DocuChat - ask questions about uploaded documents through a chat-completion model

pub mod config;
pub mod models;
pub mod types;
pub mod agents;
pub mod llm;
pub mod documents;
pub mod analysis;
pub mod session;
pub mod storage;
pub mod routes;
pub mod middleware;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}

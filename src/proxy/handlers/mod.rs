// Handlers module - HTTP endpoints

pub mod common;
pub mod debug;
pub mod models;
pub mod openai;

pub use debug::handle_debug_logs;
pub use models::handle_list_models;
pub use openai::handle_chat_completions;

/// GET /healthz
pub async fn handle_healthz() -> &'static str {
    "ok"
}

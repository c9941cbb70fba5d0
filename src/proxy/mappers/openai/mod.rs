// OpenAI mapper module
// OpenAI chat payloads ↔ Copilot prompt / reply

pub mod models;
pub mod request;
pub mod response;

pub use models::*;
pub use request::*;
pub use response::*;

// Upstream module - Copilot client seam and its HTTP implementation

pub mod client;
pub mod sdk;

pub use client::HttpCopilotClientFactory;
pub use sdk::{ClientOptions, CopilotClient, CopilotClientFactory, CopilotSession, SdkError};

/// Log target of everything under this module; routed to the files in `COPILOT_LOG_DIR`.
pub const LOG_TARGET: &str = module_path!();

// Proxy module - OpenAI-compatible front for GitHub Copilot

pub mod common;
pub mod config;
pub mod handlers;
pub mod mappers;
pub mod middleware;
pub mod server;
pub mod upstream;

#[cfg(test)]
mod tests;

pub use config::ProxyConfig;
pub use server::{build_router, serve, AppState};

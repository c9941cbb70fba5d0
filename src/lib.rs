pub mod constants;
pub mod error;
pub mod modules;
pub mod proxy;

use proxy::config::ProxyConfig;

/// Boots the gateway: configuration, logging, then the HTTP server until Ctrl-C.
pub fn run() -> anyhow::Result<()> {
    let config = ProxyConfig::from_env()?;
    let _log_guard = modules::logger::init_logger(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(proxy::server::serve(config))?;
    Ok(())
}

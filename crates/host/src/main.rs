//! Headless host binary.
//!
//! Runs one authority peer and one observer peer of the same session in a
//! single process, joined by an in-process relay. Each peer owns its own
//! world; both spawn the same lurkers, and the observers follow whatever the
//! authority decides. Final snapshots of both peers are printed as JSON.
//!
//! ```bash
//! RUST_LOG=runtime::driver=debug cargo run -p agent-host -- lurker.toml
//! ```
mod session;

use std::path::PathBuf;

use agent_content::ConfigLoader;
use agent_runtime::RuntimeConfig;
use anyhow::Result;
use session::{Session, SessionConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime_config = RuntimeConfig::from_env();
    let session_config = SessionConfig::from_env();
    let lurker_path = std::env::args_os().nth(1).map(PathBuf::from);
    let lurker_config = ConfigLoader::load_or_default(lurker_path.as_deref())?;

    tracing::info!("Starting session");
    tracing::info!("Map seed: {}", runtime_config.map_seed);
    tracing::info!("Lurkers: {}", session_config.lurkers);

    let report = Session::start(runtime_config, session_config, &lurker_config)?
        .run()
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

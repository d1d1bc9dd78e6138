//!
//! vertocraft server binary
//! ------------------------
//! Command-line entry point for the vertocraft HTTP API. Configuration comes from
//! environment variables and CLI flags; see `--help`.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use vertocraft::config::{has_flag, ServerConfig, USAGE};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        print!("{}", USAGE);
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env_and_args(&args)?;
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "vertocraft",
        "vertocraft starting: RUST_LOG='{}', bind={}, http_port={}, store={}, uploads='{}'",
        rust_log,
        config.bind,
        config.http_port,
        if config.database_url.is_some() { "postgres" } else { "memory" },
        config.uploads_dir.display()
    );

    vertocraft::server::run(config).await
}

use std::process::ExitCode;

use shopwright_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();
    shopwright_cli::run()
}

/// Log level precedence: RUST_LOG, then the configured level. Config
/// problems are deliberately swallowed here; the command itself reports
/// them with a proper exit code.
fn init_tracing() {
    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

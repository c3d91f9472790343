pub mod config;
pub mod cot;
pub mod location;
pub mod pipeline;
pub mod templates;
pub mod transport;

use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "RepGen";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for binaries embedding the pipeline.
/// `RUST_LOG` overrides the default filter. Call once per process.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("RepGen core v{}", APP_VERSION);
}

//! PTMD command-line interface.

pub mod commands;
pub mod context;
pub mod report;

pub use commands::{Cli, Commands, SearchArgs};
pub use context::AppContext;
pub use report::ErrorReport;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

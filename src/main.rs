//! Testrig host — embeds a dynamically loaded test runtime in this process.
//!
//! Main entry point that loads configuration, initializes logging, and
//! hands off to the harness.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use testrig_core::HarnessConfig;
use testrig_harness::{HarnessOptions, harness_main};

/// Host process for a dynamically loaded test runtime.
#[derive(Debug, Parser)]
#[command(name = "testrig-host", version, about)]
struct Args {
    /// Bootstrap the runner on a background thread.
    #[arg(long)]
    async_start: bool,
    /// Reroute main-thread-affine runner calls onto the serial context.
    #[arg(long)]
    main_thread_override: bool,
    /// Park the main thread in a run loop while the tests run.
    #[arg(long)]
    foreground: bool,
}

fn main() {
    let args = Args::parse();

    let config = match HarnessConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    tracing::info!("Starting testrig-host v{}", env!("CARGO_PKG_VERSION"));

    let mut options = HarnessOptions::empty();
    options.set(HarnessOptions::ASYNC_START, args.async_start);
    options.set(HarnessOptions::MAIN_THREAD_OVERRIDE, args.main_thread_override);
    options.set(HarnessOptions::FOREGROUND, args.foreground);

    harness_main(config, options);
}

/// Initialize tracing/logging
fn init_logging(config: &HarnessConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

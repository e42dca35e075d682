//! prooflink binary entry point.

use clap::Parser;
use tracing::{error, info};

use prooflink_client::{run, Cli, ClientConfig};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = prooflink_core::init_logging(
        cli.log_verbosity(),
        cli.log_file.as_deref(),
        cli.log_format.into(),
    ) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let config = match ClientConfig::try_from(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            eprintln!("prooflink: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        endpoint = %config.endpoint,
        "prooflink starting"
    );

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "Failed to create tokio runtime");
            std::process::exit(1);
        }
    };

    let result = rt.block_on(run(config));

    // A pending stdin read lives on the blocking pool; don't wait for it.
    rt.shutdown_background();

    match result {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            error!(error = %e, "prooflink failed");
            eprintln!("prooflink: {}", e);
            std::process::exit(1);
        }
    }
}

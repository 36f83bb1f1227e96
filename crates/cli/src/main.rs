//! swiftly - Swift object storage CLI
//!
//! A command-line interface for Swift-style object storage services.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use swiftly_cli::controller;
use swiftly_core::{Environment, IoManager};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing subscriber for logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = std::env::args().skip(1).collect();
    let exit_code = controller::run(args, Environment::from_process(), IoManager::standard()).await;
    tracing::debug!(%exit_code, "exiting");

    std::process::exit(exit_code.as_i32());
}

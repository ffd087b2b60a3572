use std::process;

use design_tokens_language_server::logging;
use design_tokens_language_server::server::start_language_server;
use log::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // The protocol stream owns stdout, so only stderr is safe before the logger exists
    match logging::init_logger() {
        Ok(path) => eprintln!("Logging to {}", path.display()),
        Err(e) => {
            eprintln!("Failed to initialize logger: {}", e);
            process::exit(1);
        }
    }

    info!(
        "Design Tokens Language Server {} starting",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = start_language_server().await {
        error!("Language server error: {:?}", e);
        process::exit(1);
    }

    info!("Design Tokens Language Server stopped");
}

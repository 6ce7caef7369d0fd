use std::sync::Arc;

use sessionguard::config::{load_config, print_schema};
use sessionguard::startup;
use sessionguard::utils::logger::init_logging;
use tracing::error;

#[tokio::main]
async fn main() {
    if std::env::args().any(|arg| arg == "--schema") {
        print_schema();
        return;
    }

    let config = load_config();
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = startup::run(Arc::new(config)).await {
        error!("Server terminated: {}", e);
        std::process::exit(1);
    }
}

//! docchat - interactive client for a document-grounded assistant
//!
//! A client-side session state machine over chat history and an
//! uploaded-document set, reconciled with a remote answering service
//! over HTTP.

mod backend;
mod config;
mod runtime;
mod session;
mod ui;

use backend::HttpBackend;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging. Logs go to stderr so the REPL owns stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docchat=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    tracing::info!(backend = %config.backend_url, "Using answering service");

    let backend = HttpBackend::new(&config.backend_url, config.request_timeout);
    let handle = runtime::spawn(backend);

    ui::run(handle).await?;

    Ok(())
}

mod commands;

use clap::Parser;
use commands::serve::{self, ServeArgs};
use std::error::Error;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "mediacatalog")]
#[command(author, version, about = "Launch the media catalog: JSON API, browser and static server")]
struct Cli {
    #[command(flatten)]
    serve: ServeArgs,
}

impl Cli {
    async fn run(self) -> Result<(), Box<dyn Error>> {
        serve::run(self.serve).await
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with env filter (e.g. MEDIACATALOG_LOG=debug)
    let filter = match EnvFilter::try_from_env("MEDIACATALOG_LOG") {
        Ok(f) => f,
        Err(_) => EnvFilter::new("info"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

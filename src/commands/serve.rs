use std::{error::Error, future::Future, path::PathBuf};

use clap::Args;
use mediacatalog::{config::ServerConfig, launcher::Launcher};
use tracing::{info, warn};

/// Every flag is optional; with none the catalog runs on its usual ports.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Directory to serve (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Catalog store, relative to the served directory
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Static file server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Mock API port
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Mock API command, e.g. "npx json-server"
    #[arg(long, value_name = "CMD")]
    pub api_command: Option<String>,

    /// Page opened in the browser
    #[arg(long, value_name = "PATH")]
    pub entry: Option<String>,

    /// Do not start the mock API
    #[arg(long)]
    pub no_api: bool,

    /// Do not open a browser
    #[arg(long)]
    pub no_browser: bool,
}

impl ServeArgs {
    pub fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::default();
        if let Some(root) = self.root {
            config.root = root;
        }
        if let Some(store) = self.store {
            config.store_path = store;
        }
        if let Some(port) = self.port {
            config.http_port = port;
        }
        if let Some(port) = self.api_port {
            config.api_port = port;
        }
        if let Some(cmd) = self.api_command {
            config.api_program = cmd;
        }
        if let Some(entry) = self.entry {
            config.entry_path = entry;
        }
        config.launch_api = !self.no_api;
        config.open_browser = !self.no_browser;
        config
    }
}

pub async fn run(args: ServeArgs) -> Result<(), Box<dyn Error>> {
    let config = args.into_config().resolved()?;
    info!(root = %config.root.display(), "starting media catalog");

    Launcher::new(config).run(shutdown_signal()).await?;
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
///
/// The handlers are registered before this returns, so a signal that
/// arrives while the launcher is still starting up is not lost.
#[cfg(unix)]
fn shutdown_signal() -> impl Future<Output = ()> {
    use tokio::signal::unix::{signal, SignalKind};

    let interrupt = signal(SignalKind::interrupt())
        .map_err(|e| warn!(error = %e, "failed to listen for SIGINT"))
        .ok();
    let terminate = signal(SignalKind::terminate())
        .map_err(|e| warn!(error = %e, "failed to listen for SIGTERM"))
        .ok();

    async move {
        tokio::select! {
            _ = recv_or_pending(interrupt) => {},
            _ = recv_or_pending(terminate) => {},
        }
        info!("shutdown requested");
    }
}

#[cfg(unix)]
async fn recv_or_pending(sig: Option<tokio::signal::unix::Signal>) {
    match sig {
        Some(mut sig) => {
            sig.recv().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(not(unix))]
fn shutdown_signal() -> impl Future<Output = ()> {
    async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("shutdown requested");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        serve: ServeArgs,
    }

    #[test]
    fn no_flags_keeps_defaults() {
        let config = TestCli::parse_from(["mediacatalog"]).serve.into_config();
        let defaults = ServerConfig::default();
        assert_eq!(config.http_port, defaults.http_port);
        assert_eq!(config.api_port, defaults.api_port);
        assert_eq!(config.api_program, "json-server");
        assert!(config.launch_api);
        assert!(config.open_browser);
    }

    #[test]
    fn flags_override_defaults() {
        let config = TestCli::parse_from([
            "mediacatalog",
            "--port",
            "9000",
            "--api-port",
            "4000",
            "--api-command",
            "npx json-server",
            "--entry",
            "index.html",
            "--no-browser",
        ])
        .serve
        .into_config();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.api_port, 4000);
        assert_eq!(config.api_program, "npx json-server");
        assert_eq!(config.entry_url(), "http://localhost:9000/index.html");
        assert!(!config.open_browser);
        assert!(config.launch_api);
    }
}

use std::future::Future;

use tokio::time::sleep;
use tracing::info;

use crate::{
    browser::{open_entry_point, BrowserOpener, SystemBrowser},
    config::ServerConfig,
    error::LaunchError,
    http::server::StaticServer,
    store::ensure_store,
    supervisor::{launch_mock_api, DetachedProcess, MockApiCommand},
};

/// Result of a successful start: a bound server plus whatever mock API
/// process could be spawned.
pub struct Launched {
    pub server: StaticServer,
    pub mock_api: Option<DetachedProcess>,
}

impl Launched {
    /// Whether the mock API process was spawned. Says nothing about whether
    /// it is accepting connections yet.
    pub fn launched(&self) -> bool {
        self.mock_api.is_some()
    }
}

/// Brings the catalog up in order: store, mock API, settle, browser, server.
pub struct Launcher<O = SystemBrowser> {
    config: ServerConfig,
    opener: O,
}

impl Launcher<SystemBrowser> {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_opener(config, SystemBrowser)
    }
}

impl<O: BrowserOpener> Launcher<O> {
    pub fn with_opener(config: ServerConfig, opener: O) -> Self {
        Self { config, opener }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs every step up to and including binding the static server.
    ///
    /// Only an unwritable store or an unavailable port fail here; the mock API
    /// and the browser are best effort.
    pub async fn start(&self) -> Result<Launched, LaunchError> {
        let config = &self.config;

        ensure_store(&config.store_path)?;

        let mock_api = if config.launch_api {
            let process = launch_mock_api(&MockApiCommand::from_config(config));
            // Readiness is approximated; the API is never probed.
            sleep(config.api_settle).await;
            if process.is_some() {
                info!(url = %config.api_url(), "JSON API");
            }
            process
        } else {
            None
        };

        info!(url = %config.web_url(), "web server");
        if config.open_browser {
            sleep(config.browser_delay).await;
            open_entry_point(&self.opener, &config.entry_url());
        }

        let mut server = StaticServer::new(config.root.clone());
        server.bind(config.http_addr()).await?;

        Ok(Launched { server, mock_api })
    }

    /// Starts everything and serves until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<(), LaunchError>
    where
        F: Future<Output = ()>,
    {
        let Launched {
            mut server,
            mock_api,
        } = self.start().await?;

        info!("server running, press Ctrl+C to stop");
        server.serve_until(shutdown).await?;

        // The child is not ours to stop.
        drop(mock_api);
        info!("server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io,
        net::{IpAddr, Ipv4Addr},
        sync::{Arc, Mutex},
        time::Duration,
    };
    use tempfile::TempDir;

    fn quiet_config(root: &std::path::Path) -> ServerConfig {
        ServerConfig {
            root: root.to_path_buf(),
            store_path: root.join("db.json"),
            bind_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            http_port: 0,
            api_program: "mediacatalog-no-such-tool-7c1f".into(),
            api_settle: Duration::ZERO,
            browser_delay: Duration::ZERO,
            ..ServerConfig::default()
        }
    }

    fn free_port() -> u16 {
        std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[tokio::test]
    async fn start_creates_store_and_opens_entry_url() {
        let tmp = TempDir::new().unwrap();
        let port = free_port();
        let config = ServerConfig {
            http_port: port,
            ..quiet_config(tmp.path())
        };
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let launcher = Launcher::with_opener(config, move |url: &str| -> io::Result<()> {
            sink.lock().unwrap().push(url.to_string());
            Ok(())
        });

        let launched = launcher.start().await.unwrap();
        assert!(tmp.path().join("db.json").exists());
        assert_eq!(launched.server.local_addr().map(|a| a.port()), Some(port));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![format!("http://localhost:{}/catalog.html", port)]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launched_reports_whether_the_api_spawned() {
        let tmp = TempDir::new().unwrap();
        let missing = Launcher::with_opener(quiet_config(tmp.path()), |_: &str| -> io::Result<()> {
            Ok(())
        });
        assert!(!missing.start().await.unwrap().launched());

        let config = ServerConfig {
            api_program: "true".into(),
            ..quiet_config(tmp.path())
        };
        let present = Launcher::with_opener(config, |_: &str| -> io::Result<()> { Ok(()) });
        assert!(present.start().await.unwrap().launched());
    }

    #[tokio::test]
    async fn disabled_steps_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let config = ServerConfig {
            launch_api: false,
            open_browser: false,
            ..quiet_config(tmp.path())
        };
        let launcher = Launcher::with_opener(config, |_: &str| -> io::Result<()> {
            panic!("browser must not be opened")
        });

        let launched = launcher.start().await.unwrap();
        assert!(launched.mock_api.is_none());
        assert!(!launched.launched());
    }

    #[tokio::test]
    async fn unwritable_store_aborts_before_binding() {
        let tmp = TempDir::new().unwrap();
        let config = ServerConfig {
            store_path: tmp.path().join("missing").join("db.json"),
            ..quiet_config(tmp.path())
        };
        let launcher = Launcher::with_opener(config, |_: &str| -> io::Result<()> { Ok(()) });

        assert!(matches!(
            launcher.start().await,
            Err(LaunchError::Store { .. })
        ));
    }
}

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use super::resolver::{resolve_cwd, resolve_path};
use crate::error::LaunchError;

pub const STORE_FILE: &str = "db.json";
pub const ENTRY_FILE: &str = "catalog.html";
pub const MOCK_API_PROGRAM: &str = "json-server";

pub fn default_http_port() -> u16 {
    8000
}

pub fn default_api_port() -> u16 {
    3001
}

/// Immutable settings for one run, resolved once in `main` and handed to
/// every component.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory served over HTTP; also the mock API's working directory.
    pub root: PathBuf,
    pub store_path: PathBuf,
    pub bind_host: IpAddr,
    pub http_port: u16,
    /// Host name placed in the URLs shown to the user and opened in the browser.
    pub public_host: String,
    pub api_program: String,
    pub api_port: u16,
    /// Wait after spawning the mock API before reporting it as up.
    pub api_settle: Duration,
    /// Further wait before opening the browser.
    pub browser_delay: Duration,
    pub entry_path: String,
    pub launch_api: bool,
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            store_path: PathBuf::from(STORE_FILE),
            bind_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            http_port: default_http_port(),
            public_host: "localhost".to_string(),
            api_program: MOCK_API_PROGRAM.to_string(),
            api_port: default_api_port(),
            api_settle: Duration::from_secs(3),
            browser_delay: Duration::from_secs(2),
            entry_path: ENTRY_FILE.to_string(),
            launch_api: true,
            open_browser: true,
        }
    }
}

impl ServerConfig {
    /// Makes `root` absolute and anchors a relative store path inside it.
    pub fn resolved(mut self) -> Result<Self, LaunchError> {
        self.root = resolve_cwd(&self.root)?;
        self.store_path = resolve_path(&self.store_path, &self.root);
        Ok(self)
    }

    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.http_port)
    }

    pub fn web_url(&self) -> String {
        format!("http://{}:{}", self.public_host, self.http_port)
    }

    pub fn api_url(&self) -> String {
        format!("http://{}:{}", self.public_host, self.api_port)
    }

    pub fn entry_url(&self) -> String {
        format!("{}/{}", self.web_url(), self.entry_path.trim_start_matches('/'))
    }
}

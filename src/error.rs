use std::{io, net::SocketAddr, path::PathBuf};

use thiserror::Error;

/// Everything that can go wrong while bringing the catalog up.
///
/// Only `Store`, `ServerBind` and `Config` ever reach `main`; the child and
/// browser variants are logged where they happen and then dropped.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to create catalog store '{}': {source}", .path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch mock API '{command}': {source}")]
    ChildLaunch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to open '{url}' in the browser: {source}")]
    BrowserLaunch {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to bind static server on {addr}: {source}")]
    ServerBind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("static server is not listening")]
    NotListening,

    #[error("invalid configuration: {0}")]
    Config(String),
}

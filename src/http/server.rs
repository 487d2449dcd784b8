use std::{
    future::Future,
    net::SocketAddr,
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use tokio::{net::TcpListener, task::JoinSet};
use tracing::{debug, error, info};

use super::handler::handle_client;
use crate::error::LaunchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    Listening,
    Stopped,
}

/// Static file server over `root`.
///
/// `Idle -> Listening` happens in [`StaticServer::bind`], `Listening -> Stopped`
/// when the shutdown future passed to [`StaticServer::serve_until`] resolves.
pub struct StaticServer {
    root: Arc<PathBuf>,
    state: ServerState,
    listener: Option<TcpListener>,
}

impl StaticServer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
            state: ServerState::Idle,
            listener: None,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Binds the listening socket. A port already in use is a hard error.
    pub async fn bind(&mut self, addr: SocketAddr) -> Result<SocketAddr, LaunchError> {
        if self.state != ServerState::Idle {
            return Err(LaunchError::Config(format!(
                "cannot bind a server in state {:?}",
                self.state
            )));
        }
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| LaunchError::ServerBind { addr, source })?;
        let local = listener
            .local_addr()
            .map_err(|source| LaunchError::ServerBind { addr, source })?;

        info!(addr = %local, root = %self.root.display(), "static server listening");
        self.listener = Some(listener);
        self.state = ServerState::Listening;
        Ok(local)
    }

    /// Accepts connections until `shutdown` resolves, then releases the port
    /// and returns `Ok(())`. Connections still in flight are aborted.
    pub async fn serve_until<F>(&mut self, shutdown: F) -> Result<(), LaunchError>
    where
        F: Future<Output = ()>,
    {
        let listener = self.listener.take().ok_or(LaunchError::NotListening)?;
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let root = Arc::clone(&self.root);
                        connections.spawn(async move {
                            if let Err(e) = handle_client(stream, &root).await {
                                debug!(%peer, error = %e, "connection closed with error");
                            }
                        });
                    }
                    Err(e) => {
                        // Usually fd exhaustion; back off instead of spinning.
                        error!(error = %e, "failed to accept connection");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        drop(listener);
        connections.shutdown().await;
        self.state = ServerState::Stopped;
        info!("static server stopped");
        Ok(())
    }
}

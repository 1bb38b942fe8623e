use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::http::connection::Connection;
use crate::router::Router;

/// Owns the listening socket and the accept loop.
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    recv_buffer_size: usize,
    max_request_size: usize,
}

impl Server {
    /// Binds the configured address with address reuse enabled and the
    /// configured listen backlog.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(cfg: &Config) -> Result<Self> {
        let addr: SocketAddr = cfg
            .server
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address {}", cfg.server.listen_addr))?;

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .context("creating listen socket")?;
        socket.set_reuse_address(true)?;
        socket
            .bind(&addr.into())
            .with_context(|| format!("binding {addr}"))?;
        socket.listen(cfg.server.backlog)?;
        socket.set_nonblocking(true)?;

        let listener = TcpListener::from_std(socket.into())?;
        info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            router: Arc::new(Router::new(cfg)),
            recv_buffer_size: cfg.server.recv_buffer_size,
            max_request_size: cfg.server.max_request_size,
        })
    }

    /// The address actually bound; lets callers bind port 0 and discover
    /// the assigned port.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections forever, handing each to its own task.
    ///
    /// The loop never awaits a connection: a slow client only occupies its
    /// own task. Accept errors are logged and accepting continues; only
    /// cancellation (the caller racing this future against a shutdown
    /// signal) stops the loop.
    pub async fn run(self) -> Result<()> {
        loop {
            let (socket, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!("Accept error: {e}");
                    continue;
                }
            };
            info!("Accepted connection from {peer}");

            let router = Arc::clone(&self.router);
            let recv_buffer_size = self.recv_buffer_size;
            let max_request_size = self.max_request_size;
            tokio::spawn(async move {
                let mut conn = Connection::new(socket, router, recv_buffer_size, max_request_size);
                if let Err(e) = conn.run().await {
                    tracing::error!("Connection error from {peer}: {e}");
                }
            });
        }
    }
}

//! Connection server: one `tokio` task per accepted connection, each
//! running read → parse → dispatch → write strictly in sequence. The
//! configured thread count `T` becomes the runtime's worker-thread pool,
//! standing in for the source's `boost::asio` thread group.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

use crate::http;
use crate::work::Work;

const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ConnServer {
    work: Arc<Work>,
    read_timeout: Duration,
}

impl ConnServer {
    pub fn new(work: Arc<Work>) -> Self {
        Self {
            work,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub async fn run(self: Arc<Self>, port: u16) -> std::io::Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        tracing::info!(port, "accepting connections");
        loop {
            let (socket, peer) = listener.accept().await?;
            tracing::debug!(%peer, "accepted connection");
            let this = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(err) = this.handle_connection(socket).await {
                    tracing::debug!(%peer, %err, "connection closed with I/O error");
                }
            });
        }
    }

    async fn handle_connection(&self, mut socket: TcpStream) -> std::io::Result<()> {
        let req = match tokio::time::timeout(self.read_timeout, http::read_request(&mut socket)).await {
            Ok(Ok(req)) => req,
            Ok(Err(err)) => {
                tracing::warn!(%err, "malformed request");
                return self.write_404(&mut socket).await;
            }
            Err(_) => {
                tracing::debug!("read deadline exceeded, closing connection");
                return Ok(());
            }
        };

        match self.work.dispatch(&req) {
            Ok((body, content_type)) => self.write_200(&mut socket, content_type, body).await,
            Err(err) => {
                tracing::warn!(%err, "request error");
                self.write_404(&mut socket).await
            }
        }
    }

    /// Writes the status line and headers, then the body, as two sequential
    /// buffers. Writes on this connection always complete before any
    /// further reads are scheduled on it.
    async fn write_200(&self, socket: &mut TcpStream, content_type: &str, body: String) -> std::io::Result<()> {
        let head = format!(
            "HTTP/1.0 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n\r\n",
            body.len()
        );
        socket.write_all(head.as_bytes()).await?;
        socket.write_all(body.as_bytes()).await?;
        socket.shutdown().await
    }

    async fn write_404(&self, socket: &mut TcpStream) -> std::io::Result<()> {
        socket
            .write_all(b"HTTP/1.0 404 NOT FOUND\r\nContent-Length: 0\r\n\r\n")
            .await?;
        socket.shutdown().await
    }
}

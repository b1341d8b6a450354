//! TCP listener and per-connection task spawning.
//!
//! One task per accepted connection; tasks share nothing but the
//! read-only key tables baked into `rover-core`. A semaphore bounds
//! concurrent connections: the permit is acquired before accepting and
//! travels with the connection task, so a full house simply pauses the
//! accept loop.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use rover_core::RoverConfig;

use crate::protocol::framing::FramingConfig;
use crate::session::Session;

/// The rover control server.
pub struct Server {
    listener: TcpListener,
    framing: FramingConfig,
    connection_sem: Arc<Semaphore>,
}

impl Server {
    /// Bind the TCP listener described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the address cannot be
    /// bound.
    pub async fn bind(config: &RoverConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.listen_addr()).await?;
        info!(addr = %listener.local_addr()?, "listening");
        Ok(Self {
            listener,
            framing: FramingConfig::from(config),
            connection_sem: Arc::new(Semaphore::new(config.max_connections)),
        })
    }

    /// The bound address, useful when the port was 0.
    ///
    /// # Errors
    ///
    /// Propagates the underlying socket error.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever, one session task each.
    ///
    /// Runs until the accept loop itself fails; individual session
    /// failures are logged and never tear down the server.
    ///
    /// # Errors
    ///
    /// Returns only fatal accept-loop I/O errors.
    pub async fn run(self) -> io::Result<()> {
        loop {
            let permit = self
                .connection_sem
                .clone()
                .acquire_owned()
                .await
                .expect("connection semaphore never closes");
            let (stream, peer) = self.listener.accept().await?;
            debug!(%peer, "connection accepted");
            let framing = self.framing;
            tokio::spawn(async move {
                handle_connection(stream, peer, framing).await;
                drop(permit);
            });
        }
    }
}

/// Drive one session and log its outcome. The socket is closed when
/// the split halves drop, on every path.
async fn handle_connection(stream: TcpStream, peer: SocketAddr, framing: FramingConfig) {
    let (reader, writer) = stream.into_split();
    let session = Session::new(reader, writer, framing);
    match session.run().await {
        Ok(()) => info!(%peer, "session completed"),
        Err(err) if err.is_protocol_violation() => {
            warn!(%peer, error = %err, "session rejected");
        },
        Err(err) => info!(%peer, error = %err, "session dropped"),
    }
}

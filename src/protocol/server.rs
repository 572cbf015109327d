//! Protocol Server
//!
//! TCP accept loop; every client is served on its own task.

use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use super::connection::serve_connection;
use crate::dispatcher::CommandDispatcher;

/// Accepts clients on `listener` until the surrounding task is dropped.
///
/// # Arguments
/// * `listener` - Bound protocol listener
/// * `dispatcher` - Shared command dispatcher, cloned per connection
/// * `idle_timeout` - Per-connection idle limit, None to disable
pub async fn serve(
    listener: TcpListener,
    dispatcher: CommandDispatcher,
    idle_timeout: Option<Duration>,
) -> std::io::Result<()> {
    info!("Protocol listener ready on {}", listener.local_addr()?);

    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "accept failed");
                continue;
            }
        };

        if let Err(err) = socket.set_nodelay(true) {
            debug!(%peer, error = %err, "could not disable Nagle");
        }

        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            debug!(%peer, "client connected");
            match serve_connection(socket, dispatcher, idle_timeout).await {
                Ok(()) => debug!(%peer, "client disconnected"),
                Err(err) => debug!(%peer, error = %err, "connection closed"),
            }
        });
    }
}

//! Client Connection
//!
//! Buffers bytes from one client, decodes commands, runs them through the
//! dispatcher and writes the replies back.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::codec::{encode_error, encode_response, CommandDecoder};
use crate::dispatcher::CommandDispatcher;
use crate::error::{ProtocolError, Result};
use crate::models::{Command, Response};

const READ_CHUNK: usize = 4 * 1024;

/// A framed memcache connection over any async byte stream.
#[derive(Debug)]
pub struct Connection<S> {
    stream: S,
    decoder: CommandDecoder,
    read_buf: BytesMut,
    write_buf: BytesMut,
    idle_timeout: Option<Duration>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, idle_timeout: Option<Duration>) -> Self {
        Self {
            stream,
            decoder: CommandDecoder::new(),
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            write_buf: BytesMut::new(),
            idle_timeout,
        }
    }

    /// Reads until one full command is buffered.
    ///
    /// # Returns
    /// `Ok(None)` once the peer has closed the stream.
    pub async fn read_command(&mut self) -> Result<Option<Command>> {
        loop {
            if let Some(command) = self.decoder.decode(&mut self.read_buf)? {
                return Ok(Some(command));
            }

            let read = match self.idle_timeout {
                Some(limit) => tokio::time::timeout(limit, self.stream.read_buf(&mut self.read_buf))
                    .await
                    .map_err(|_| ProtocolError::IdleTimeout(limit))??,
                None => self.stream.read_buf(&mut self.read_buf).await?,
            };

            if read == 0 {
                if !self.read_buf.is_empty() {
                    debug!(pending = self.read_buf.len(), "peer closed mid-command");
                }
                return Ok(None);
            }
        }
    }

    pub async fn write_response(&mut self, response: &Response) -> Result<()> {
        encode_response(response, &mut self.write_buf);
        self.flush().await
    }

    pub async fn write_error(&mut self, error: &ProtocolError) -> Result<()> {
        encode_error(error, &mut self.write_buf);
        self.flush().await
    }

    async fn flush(&mut self) -> Result<()> {
        if self.write_buf.is_empty() {
            return Ok(());
        }
        self.stream.write_all(&self.write_buf).await?;
        self.stream.flush().await?;
        self.write_buf.clear();
        Ok(())
    }
}

// == Connection Loop ==
/// Serves one client until it disconnects or a fatal error occurs.
///
/// Unknown commands are answered with `ERROR` and the loop continues; any
/// other protocol error is reported and then closes the connection.
pub async fn serve_connection<S>(
    stream: S,
    dispatcher: CommandDispatcher,
    idle_timeout: Option<Duration>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut conn = Connection::new(stream, idle_timeout);

    loop {
        match conn.read_command().await {
            Ok(Some(command)) => {
                let noreply = command.is_noreply();
                let response = dispatcher.execute(command).await;
                if !noreply {
                    conn.write_response(&response).await?;
                }
            }
            Ok(None) => return Ok(()),
            Err(err) => {
                conn.write_error(&err).await?;
                if err.closes_connection() {
                    return Err(err);
                }
                warn!(error = %err, "rejected command");
            }
        }
    }
}

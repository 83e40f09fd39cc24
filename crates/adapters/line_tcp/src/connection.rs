//! Persistent, lazily opened instrument connection.
//!
//! The socket is opened on first use and kept for the adapter's lifetime.
//! Any IO error or timeout drops it, and so does cancelling an exchange
//! midway: a late reply would otherwise be read as the answer to the next
//! query. The next command reconnects.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::error::LineTcpError;
use crate::protocol::Command;

pub(crate) struct LineConnection {
    addr: String,
    timeout: Duration,
    stream: Option<BufReader<TcpStream>>,
}

impl LineConnection {
    pub(crate) fn new(addr: String, timeout: Duration) -> Self {
        Self {
            addr,
            timeout,
            stream: None,
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Send `command` and, for queries, return the trimmed reply line.
    ///
    /// The socket is taken out of the connection for the duration of the
    /// exchange and put back only once it completes, so a failed or cancelled
    /// exchange leaves the connection closed.
    pub(crate) async fn exchange(&mut self, command: Command) -> Result<String, LineTcpError> {
        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.connect().await?,
        };
        match send(&mut stream, command, self.timeout).await {
            Ok(reply) => {
                self.stream = Some(stream);
                Ok(reply)
            }
            Err(err) => {
                tracing::warn!(addr = %self.addr, %command, error = %err, "dropping connection");
                Err(err)
            }
        }
    }

    async fn connect(&self) -> Result<BufReader<TcpStream>, LineTcpError> {
        let connect = TcpStream::connect(self.addr.as_str());
        let stream = tokio::time::timeout(self.timeout, connect)
            .await
            .map_err(|_| std::io::Error::from(std::io::ErrorKind::TimedOut))
            .and_then(|connected| connected)
            .map_err(|source| LineTcpError::Connect {
                addr: self.addr.clone(),
                source,
            })?;
        tracing::debug!(addr = %self.addr, "connected");
        Ok(BufReader::new(stream))
    }
}

async fn send(
    stream: &mut BufReader<TcpStream>,
    command: Command,
    timeout: Duration,
) -> Result<String, LineTcpError> {
    let line = command.encode();
    let timed_out = || LineTcpError::Timeout {
        command: command.to_string(),
    };

    tokio::time::timeout(timeout, stream.get_mut().write_all(line.as_bytes()))
        .await
        .map_err(|_| timed_out())??;
    tracing::trace!(%command, "sent");

    if !command.expects_reply() {
        return Ok(String::new());
    }

    let mut reply = String::new();
    let read = tokio::time::timeout(timeout, stream.read_line(&mut reply))
        .await
        .map_err(|_| timed_out())??;
    if read == 0 {
        return Err(LineTcpError::Closed);
    }
    let reply = reply.trim().to_string();
    tracing::trace!(%command, %reply, "received");
    Ok(reply)
}

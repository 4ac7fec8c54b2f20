//! # beanstalkd Protocol Client
//!
//! Minimal client for the beanstalkd text protocol covering the commands a
//! freshness check issues: `list-tubes`, `use`, `peek-ready`, and `stats-job`.
//!
//! Commands are single CRLF-terminated lines. Replies are a status line,
//! optionally followed by a body of the announced length and a trailing CRLF.

use super::{Job, JobStats, PeekReady, QueueClient};
use crate::config::ServerAddress;
use crate::constants::system;
use crate::error::{CheckError, CheckResult};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

const CRLF: &[u8] = b"\r\n";

/// Byte stream a client can run over
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// beanstalkd connection
///
/// After an IO or framing error the unread remainder of the reply may still be
/// buffered, so the client refuses every later command with the same error.
pub struct BeanstalkClient {
    stream: BufReader<Box<dyn Transport>>,
    address: String,
    active_tube: String,
    broken: Option<CheckError>,
}

impl std::fmt::Debug for BeanstalkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanstalkClient")
            .field("address", &self.address)
            .field("active_tube", &self.active_tube)
            .field("broken", &self.broken)
            .finish()
    }
}

impl BeanstalkClient {
    /// Connect to the server, failing after `timeout`
    pub async fn connect(address: &ServerAddress, timeout: Duration) -> CheckResult<Self> {
        let label = address.to_string();
        debug!(
            address = %label,
            timeout_ms = timeout.as_millis() as u64,
            "🚀 Connecting to beanstalkd"
        );

        let transport = tokio::time::timeout(timeout, open_transport(address))
            .await
            .map_err(|_| CheckError::timeout(&label, timeout.as_secs()))??;

        info!(address = %label, "✅ Connected to beanstalkd");
        Ok(Self::from_transport(transport, label))
    }

    /// Wrap an already-open stream
    pub fn from_transport(transport: Box<dyn Transport>, address: impl Into<String>) -> Self {
        Self {
            stream: BufReader::new(transport),
            address: address.into(),
            active_tube: "default".to_string(),
            broken: None,
        }
    }

    /// Tube currently selected with `use`
    pub fn active_tube(&self) -> &str {
        &self.active_tube
    }

    /// Remember a fatal error so later commands fail fast
    fn track<T>(&mut self, result: CheckResult<T>) -> CheckResult<T> {
        if let Err(err) = &result {
            if err.is_fatal() && self.broken.is_none() {
                warn!(
                    address = %self.address,
                    error = %err,
                    "⚠️ beanstalkd connection unusable"
                );
                self.broken = Some(err.clone());
            }
        }
        result
    }

    fn io_error(&self, err: std::io::Error) -> CheckError {
        CheckError::connection(&self.address, err.to_string())
    }

    async fn send(&mut self, command: &str) -> CheckResult<()> {
        if let Some(err) = &self.broken {
            return Err(err.clone());
        }
        let result = self.write_command(command).await;
        self.track(result)
    }

    async fn write_command(&mut self, command: &str) -> CheckResult<()> {
        debug!(command = %command, "📤 Sending command");
        let written = write_line(self.stream.get_mut().as_mut(), command).await;
        written.map_err(|e| self.io_error(e))
    }

    async fn read_line(&mut self, operation: &str) -> CheckResult<Vec<String>> {
        let result = self.read_reply_line(operation).await;
        self.track(result)
    }

    async fn read_reply_line(&mut self, operation: &str) -> CheckResult<Vec<String>> {
        let mut line = String::new();
        let read = match self.stream.read_line(&mut line).await {
            Ok(read) => read,
            Err(e) => return Err(self.io_error(e)),
        };
        if read == 0 {
            return Err(CheckError::connection(
                &self.address,
                format!("connection closed while waiting for {operation} reply"),
            ));
        }
        if !line.ends_with("\r\n") {
            return Err(CheckError::protocol(operation, "reply line not CRLF-terminated"));
        }
        debug!(reply = %line.trim_end(), "📨 Received reply");
        Ok(line.split_whitespace().map(str::to_string).collect())
    }

    async fn read_body(&mut self, operation: &str, raw_len: &str) -> CheckResult<Vec<u8>> {
        let result = self.read_reply_body(operation, raw_len).await;
        self.track(result)
    }

    async fn read_reply_body(&mut self, operation: &str, raw_len: &str) -> CheckResult<Vec<u8>> {
        let len: usize = raw_len
            .parse()
            .map_err(|_| CheckError::protocol(operation, format!("bad body length {raw_len:?}")))?;
        if len > system::MAX_BODY_BYTES {
            return Err(CheckError::protocol(
                operation,
                format!("body length {len} exceeds limit of {} bytes", system::MAX_BODY_BYTES),
            ));
        }
        let framed = len
            .checked_add(CRLF.len())
            .ok_or_else(|| CheckError::protocol(operation, format!("bad body length {len}")))?;

        let mut body = vec![0u8; framed];
        if let Err(e) = self.stream.read_exact(&mut body).await {
            return Err(self.io_error(e));
        }
        if !body.ends_with(CRLF) {
            return Err(CheckError::protocol(operation, "body not CRLF-terminated"));
        }
        body.truncate(len);
        Ok(body)
    }
}

async fn write_line(stream: &mut dyn Transport, command: &str) -> std::io::Result<()> {
    stream.write_all(command.as_bytes()).await?;
    stream.write_all(CRLF).await?;
    stream.flush().await
}

async fn open_transport(address: &ServerAddress) -> CheckResult<Box<dyn Transport>> {
    match address {
        ServerAddress::Tcp(addr) => {
            let stream = TcpStream::connect(addr.as_str())
                .await
                .map_err(|e| CheckError::connection(addr, e.to_string()))?;
            stream
                .set_nodelay(true)
                .map_err(|e| CheckError::connection(addr, e.to_string()))?;
            Ok(Box::new(stream))
        }
        #[cfg(unix)]
        ServerAddress::Unix(path) => {
            let stream = tokio::net::UnixStream::connect(path)
                .await
                .map_err(|e| CheckError::connection(path.display().to_string(), e.to_string()))?;
            Ok(Box::new(stream))
        }
        #[cfg(not(unix))]
        ServerAddress::Unix(path) => Err(CheckError::connection(
            path.display().to_string(),
            "unix sockets are not supported on this platform",
        )),
    }
}

/// Describe an unexpected reply for error messages
fn unexpected(reply: &[String]) -> String {
    match reply.first().map(String::as_str) {
        None => "empty reply".to_string(),
        Some(_) => format!("unexpected reply {:?}", reply.join(" ")),
    }
}

#[async_trait]
impl QueueClient for BeanstalkClient {
    async fn list_tubes(&mut self) -> CheckResult<Vec<String>> {
        let op = "list-tubes";
        self.send(op)
            .await
            .map_err(|e| CheckError::list_tubes(e.to_string()))?;
        let reply = self
            .read_line(op)
            .await
            .map_err(|e| CheckError::list_tubes(e.to_string()))?;

        match reply.as_slice() {
            [status, len] if status == "OK" => {
                let body = self
                    .read_body(op, len)
                    .await
                    .map_err(|e| CheckError::list_tubes(e.to_string()))?;
                serde_yaml::from_slice::<Vec<String>>(&body)
                    .map_err(|e| CheckError::list_tubes(format!("malformed tube list: {e}")))
            }
            _ => Err(CheckError::list_tubes(unexpected(&reply))),
        }
    }

    // Transport errors are passed through unwrapped so the caller can tell a
    // dead connection from a tube-level failure.

    async fn use_tube(&mut self, tube: &str) -> CheckResult<()> {
        self.send(&format!("use {tube}")).await?;
        let reply = self.read_line("use").await?;

        match reply.as_slice() {
            [status, name] if status == "USING" && name == tube => {
                self.active_tube = tube.to_string();
                Ok(())
            }
            _ => Err(CheckError::select_tube(tube, unexpected(&reply))),
        }
    }

    async fn peek_ready(&mut self) -> CheckResult<PeekReady> {
        let op = "peek-ready";
        let tube = self.active_tube.clone();
        self.send(op).await?;
        let reply = self.read_line(op).await?;

        match reply.as_slice() {
            [status] if status == "NOT_FOUND" => Ok(PeekReady::Empty),
            [status, id, len] if status == "FOUND" => {
                let id: u64 = id
                    .parse()
                    .map_err(|_| CheckError::peek(&tube, format!("bad job id {id:?}")))?;
                let body = self.read_body(op, len).await?;
                Ok(PeekReady::Found(Job::new(id, body)))
            }
            _ => Err(CheckError::peek(&tube, unexpected(&reply))),
        }
    }

    async fn stats_job(&mut self, job_id: u64) -> CheckResult<JobStats> {
        let op = "stats-job";
        self.send(&format!("{op} {job_id}")).await?;
        let reply = self.read_line(op).await?;

        match reply.as_slice() {
            [status] if status == "NOT_FOUND" => Err(CheckError::JobVanished { job_id }),
            [status, len] if status == "OK" => {
                let body = self.read_body(op, len).await?;
                serde_yaml::from_slice::<JobStats>(&body)
                    .map_err(|e| CheckError::stats_fetch(job_id, format!("malformed stats: {e}")))
            }
            _ => Err(CheckError::stats_fetch(job_id, unexpected(&reply))),
        }
    }
}

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::shared::pump_config::PumpConfig;
use crate::shared::sleeper::{Sleeper, ThreadSleeper};
use crate::source::domain::source_descriptor::ContentFormat;
use crate::source::domain::source_error::SourceError;
use crate::source::infrastructure::backoff::Backoff;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("body read failed: {0}")]
    Body(String),
}

/// Outcome of one GET whose body was copied into the caller's buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub content_type: Option<String>,
    pub body_len: usize,
    /// The body did not fit into the buffer.
    pub truncated: bool,
}

/// One request per call; the body lands in `buf`.
pub trait HttpTransport: Send {
    fn get(&mut self, url: &str, buf: &mut [u8]) -> Result<HttpResponse, TransportError>;

    /// Drops pooled connections and starts over with a fresh client.
    fn reset(&mut self) -> Result<(), TransportError>;
}

pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            timeout,
        })
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
}

impl HttpTransport for ReqwestTransport {
    fn get(&mut self, url: &str, buf: &mut [u8]) -> Result<HttpResponse, TransportError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut filled = 0;
        while filled < buf.len() {
            match response.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::Body(e.to_string())),
            }
        }

        let truncated = filled == buf.len() && {
            let mut probe = [0u8; 1];
            matches!(response.read(&mut probe), Ok(n) if n > 0)
        };

        Ok(HttpResponse {
            content_type,
            body_len: filled,
            truncated,
        })
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        self.client =
            build_client(self.timeout).map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(())
    }
}

/// Polls a URL for one frame per request, reconnecting with exponential backoff.
pub struct HttpSource<T: HttpTransport = ReqwestTransport> {
    transport: T,
    url: String,
    backoff: Backoff,
    sleeper: Arc<dyn Sleeper>,
    last_content_type: Option<String>,
    content_format: ContentFormat,
}

impl HttpSource {
    pub fn open(url: &str, config: &PumpConfig) -> Result<Self, SourceError> {
        let transport =
            ReqwestTransport::new(config.http_timeout()).map_err(SourceError::ClientBuild)?;
        log::info!(
            "HTTP source: {url} (timeout {} ms)",
            config.http_timeout_ms
        );
        Ok(Self::with_transport(transport, url, config))
    }
}

impl<T: HttpTransport> HttpSource<T> {
    pub fn with_transport(transport: T, url: &str, config: &PumpConfig) -> Self {
        Self {
            transport,
            url: url.to_string(),
            backoff: Backoff::new(config.initial_backoff(), config.max_reconnect_attempts),
            sleeper: Arc::new(ThreadSleeper),
            last_content_type: None,
            content_format: ContentFormat::Unknown,
        }
    }

    /// Replaces the sleeper used between reconnect attempts.
    pub fn set_sleeper(&mut self, sleeper: Arc<dyn Sleeper>) {
        self.sleeper = sleeper;
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Format implied by the most recent response's Content-Type.
    pub fn content_format(&self) -> &ContentFormat {
        &self.content_format
    }

    /// Fetches one response body into `buf`. Connection failures are retried
    /// with the backoff schedule; exhausting it yields `ReconnectExhausted`.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        loop {
            match self.transport.get(&self.url, buf) {
                Ok(response) => {
                    self.backoff.reset();
                    self.observe_content_type(response.content_type);
                    if response.truncated {
                        return Err(SourceError::FrameTooLarge {
                            capacity: buf.len(),
                        });
                    }
                    if response.body_len == 0 {
                        return Err(SourceError::EmptyBody {
                            url: self.url.clone(),
                        });
                    }
                    return Ok(response.body_len);
                }
                Err(TransportError::Connect(reason)) => {
                    let delay = self.backoff.record_failure();
                    log::warn!(
                        "Connect attempt {}/{} to {} failed: {reason}; retrying in {} ms",
                        self.backoff.failures(),
                        self.backoff.max_attempts(),
                        self.url,
                        delay.as_millis()
                    );
                    if !self.sleeper.sleep(delay) {
                        return Err(SourceError::Interrupted);
                    }
                    if self.backoff.exhausted() {
                        let attempts = self.backoff.failures();
                        self.backoff.reset();
                        return Err(SourceError::ReconnectExhausted {
                            url: self.url.clone(),
                            attempts,
                        });
                    }
                }
                Err(TransportError::Status(status)) => {
                    self.backoff.reset();
                    return Err(SourceError::Status {
                        url: self.url.clone(),
                        status,
                    });
                }
                Err(TransportError::Body(reason)) => {
                    return Err(SourceError::Request {
                        url: self.url.clone(),
                        reason,
                    });
                }
            }
        }
    }

    /// Tears down the connection and begins a new reconnect cycle.
    pub fn reset_transport(&mut self) -> Result<(), SourceError> {
        log::warn!("Resetting HTTP transport for {}", self.url);
        self.backoff.reset();
        self.transport
            .reset()
            .map_err(|e| SourceError::Request {
                url: self.url.clone(),
                reason: e.to_string(),
            })
    }

    fn observe_content_type(&mut self, content_type: Option<String>) {
        if content_type == self.last_content_type {
            return;
        }
        let format = ContentFormat::from_content_type(content_type.as_deref());
        match (&self.last_content_type, &format) {
            (_, ContentFormat::Unsupported(name)) => {
                log::warn!("{} serves unsupported content type {name}", self.url)
            }
            (None, _) => log::info!(
                "{} content type: {}",
                self.url,
                content_type.as_deref().unwrap_or("<none>")
            ),
            (Some(previous), _) => log::warn!(
                "{} content type changed from {previous} to {}",
                self.url,
                content_type.as_deref().unwrap_or("<none>")
            ),
        }
        self.content_format = format;
        self.last_content_type = content_type;
    }
}

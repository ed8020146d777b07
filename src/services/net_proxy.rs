// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Network proxy for the cloud service.
//!
//! Handles:
//! - Device pairing (pre-auth token, then long-lived auth token)
//! - One data connection at a time, either outbound (POST) or inbound (GET)
//! - Status classification for the sync error taxonomy
//!
//! The proxy is a small state machine:
//!
//! ```text
//! Fresh --pre_auth--> PreAuthorized --auth--> Authorized
//! Authorized/Disconnected --write/read--> Connected --disconnect--> Disconnected
//! ```
//!
//! Opening a second connection, or authorizing before pre-authorizing, is
//! a programmer error.

use std::io::{self, Cursor, Read, Write};
use std::time::Duration;

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::services::url_encoded::UrlEncodedWriter;

/// Header carrying the long-lived auth token on data requests.
pub const AUTH_TOKEN_HEADER: &str = "X-AuthToken";
/// Form field carrying the outbound JSON document.
pub const DATA_FIELD: &str = "data";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Lifecycle of a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    Fresh,
    PreAuthorized,
    Authorized,
    Connected,
    Disconnected,
}

/// Transport to the cloud service.
#[allow(async_fn_in_trait)]
pub trait NetProxy {
    /// Request a short-lived pairing token for this device.
    async fn pre_auth(&mut self) -> Result<String>;

    /// Exchange the pairing token for a long-lived auth token.
    async fn auth(&mut self) -> Result<()>;

    /// Open the outbound connection and return the stream to write into.
    fn write(&mut self) -> Result<&mut OutboundStream>;

    /// Open the inbound connection and return the downloaded document.
    ///
    /// Only HTTP 200 opens the connection. Any other status, including other
    /// 2xx codes, fails with `AuthDenied` for 401/403/405 and `Unreachable`
    /// otherwise, and leaves no connection open.
    async fn read(&mut self) -> Result<InboundStream>;

    /// Check the outcome of the open connection.
    ///
    /// `Ok(true)` only for HTTP 200; 403 is `AuthDenied`, anything else
    /// `Unreachable`. An outbound body is submitted on the first call, and a
    /// failed submission keeps failing without being retried.
    async fn success(&mut self) -> Result<bool>;

    /// Release the open connection.
    fn disconnect(&mut self) -> Result<()>;

    fn state(&self) -> ProxyState;
}

/// Writable body of an outbound connection.
///
/// Holds `data=` followed by the url-encoded bytes written so far.
#[derive(Debug)]
pub struct OutboundStream {
    writer: UrlEncodedWriter<Vec<u8>>,
}

impl OutboundStream {
    pub fn new() -> Self {
        let mut prefix = urlencoding::encode(DATA_FIELD).into_owned().into_bytes();
        prefix.push(b'=');
        Self {
            writer: UrlEncodedWriter::new(prefix),
        }
    }

    /// The form body accumulated so far.
    pub fn body(&self) -> &[u8] {
        self.writer.get_ref()
    }
}

impl Default for OutboundStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for OutboundStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Readable body of an inbound connection.
#[derive(Debug)]
pub struct InboundStream {
    inner: Cursor<Vec<u8>>,
}

impl InboundStream {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            inner: Cursor::new(body),
        }
    }
}

impl From<&str> for InboundStream {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

impl Read for InboundStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Progress of the outbound upload.
#[derive(Debug)]
enum Upload {
    /// Still buffering; submitted the first time the outcome is queried.
    Pending(OutboundStream),
    Sent(u16),
    /// The submission failed or was interrupted; never retried.
    Failed(String),
}

/// The single open data connection.
#[derive(Debug)]
enum Connection {
    Outbound(Upload),
    Inbound { status: u16 },
}

/// HTTP implementation of [`NetProxy`].
pub struct HttpNetProxy {
    http: reqwest::Client,
    base_url: String,
    device_id: String,
    pairing_token: Option<String>,
    auth_token: Option<String>,
    connection: Option<Connection>,
    state: ProxyState,
}

impl HttpNetProxy {
    /// Create a proxy for the service at `base_url` (must end with `/`).
    pub fn new(
        base_url: impl Into<String>,
        device_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            device_id: device_id.into(),
            pairing_token: None,
            auth_token: None,
            connection: None,
            state: ProxyState::Fresh,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            config.device_id.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn pre_auth_url(&self) -> String {
        format!("{}tokens/{}", self.base_url, urlencoding::encode(&self.device_id))
    }

    fn auth_url(&self, pairing_token: &str) -> String {
        format!("{}users/pair/{}", self.base_url, urlencoding::encode(pairing_token))
    }

    fn data_url(&self) -> String {
        format!("{}data/", self.base_url)
    }

    fn ensure_idle(&self, op: &str) -> Result<()> {
        if self.connection.is_some() {
            return Err(SyncError::programmer(format!(
                "{}: a connection is already open, disconnect first",
                op
            )));
        }
        Ok(())
    }

    fn auth_token(&self) -> Result<String> {
        self.auth_token
            .clone()
            .ok_or_else(|| SyncError::AuthDenied("Device is not paired yet".to_string()))
    }

    /// GET a plain-text token.
    async fn fetch_token(&self, url: &str, context: &str) -> Result<String> {
        let response = self.http.get(url).send().await?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(SyncError::from_status(status, context));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("text/plain") {
            return Err(SyncError::UnexpectedContentType(format!(
                "{}: content type was '{}'",
                context, content_type
            )));
        }

        Ok(response.text().await?.trim().to_string())
    }

    /// Submit a buffered outbound body and return the response status.
    async fn submit(&self, body: Vec<u8>) -> Result<u16> {
        let token = self.auth_token()?;
        let response = self
            .http
            .post(self.data_url())
            .header(AUTH_TOKEN_HEADER, token)
            .header(reqwest::header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        Ok(response.status().as_u16())
    }
}

impl NetProxy for HttpNetProxy {
    async fn pre_auth(&mut self) -> Result<String> {
        self.ensure_idle("pre_auth")?;
        self.pairing_token = None;
        self.auth_token = None;
        self.state = ProxyState::Fresh;

        let token = self.fetch_token(&self.pre_auth_url(), "Pre-authorization").await?;
        tracing::info!(device_id = %self.device_id, "Obtained pairing token");

        self.pairing_token = Some(token.clone());
        self.state = ProxyState::PreAuthorized;
        Ok(token)
    }

    async fn auth(&mut self) -> Result<()> {
        self.ensure_idle("auth")?;
        let pairing_token = self
            .pairing_token
            .clone()
            .ok_or_else(|| SyncError::programmer("auth() called without a pairing token, call pre_auth() first"))?;
        self.auth_token = None;

        let token = self
            .fetch_token(&self.auth_url(&pairing_token), "Authorization")
            .await?;
        tracing::info!(device_id = %self.device_id, "Device paired");

        self.auth_token = Some(token);
        self.pairing_token = None;
        self.state = ProxyState::Authorized;
        Ok(())
    }

    fn write(&mut self) -> Result<&mut OutboundStream> {
        self.ensure_idle("write")?;
        self.auth_token()?;

        self.connection = Some(Connection::Outbound(Upload::Pending(OutboundStream::new())));
        self.state = ProxyState::Connected;
        tracing::debug!("Opened outbound connection");

        match &mut self.connection {
            Some(Connection::Outbound(Upload::Pending(body))) => Ok(body),
            _ => Err(SyncError::programmer("write: outbound connection vanished")),
        }
    }

    async fn read(&mut self) -> Result<InboundStream> {
        self.ensure_idle("read")?;
        let token = self.auth_token()?;

        let response = self
            .http
            .get(self.data_url())
            .header(AUTH_TOKEN_HEADER, token)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            tracing::warn!(status, "Data download refused");
            return Err(SyncError::from_status(status, "Data download"));
        }

        let body = response.bytes().await?.to_vec();
        tracing::debug!(bytes = body.len(), "Opened inbound connection");

        self.connection = Some(Connection::Inbound { status });
        self.state = ProxyState::Connected;
        Ok(InboundStream::new(body))
    }

    async fn success(&mut self) -> Result<bool> {
        let pending = match &mut self.connection {
            None => return Err(SyncError::programmer("success() queried with no open connection")),
            Some(Connection::Outbound(upload)) if matches!(upload, Upload::Pending(_)) => {
                // Marked failed until the submission completes.
                match std::mem::replace(upload, Upload::Failed("Upload interrupted".to_string())) {
                    Upload::Pending(body) => Some(body.writer.into_inner()),
                    _ => None,
                }
            }
            Some(_) => None,
        };

        if let Some(payload) = pending {
            tracing::debug!(bytes = payload.len(), "Submitting outbound document");
            let outcome = self.submit(payload).await;
            if let Some(Connection::Outbound(upload)) = &mut self.connection {
                *upload = match &outcome {
                    Ok(code) => Upload::Sent(*code),
                    Err(SyncError::Unreachable(reason)) => Upload::Failed(reason.clone()),
                    Err(e) => Upload::Failed(e.to_string()),
                };
            }
            outcome?;
        }

        let status = match &self.connection {
            Some(Connection::Inbound { status })
            | Some(Connection::Outbound(Upload::Sent(status))) => *status,
            Some(Connection::Outbound(Upload::Failed(reason))) => {
                return Err(SyncError::Unreachable(reason.clone()));
            }
            _ => return Err(SyncError::programmer("success(): connection has no response")),
        };

        match status {
            200 => Ok(true),
            403 => Err(SyncError::AuthDenied(format!("Unauthorized, got HTTP {}", status))),
            _ => Err(SyncError::Unreachable(format!("Network error, got HTTP {}", status))),
        }
    }

    fn disconnect(&mut self) -> Result<()> {
        match self.connection.take() {
            None => Err(SyncError::NotConnected),
            Some(_) => {
                self.state = ProxyState::Disconnected;
                tracing::debug!("Connection closed");
                Ok(())
            }
        }
    }

    fn state(&self) -> ProxyState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_stream_prefix_and_encoding() {
        let mut s = OutboundStream::new();
        s.write_all(br#"{"data":[]}"#).unwrap();
        assert_eq!(s.body(), b"data=%7B%22data%22%3A%5B%5D%7D");
    }

    #[test]
    fn test_urls() {
        let proxy = HttpNetProxy::new("http://cloud/", "dev 1", Duration::from_secs(1)).unwrap();
        assert_eq!(proxy.pre_auth_url(), "http://cloud/tokens/dev%201");
        assert_eq!(proxy.auth_url("123456"), "http://cloud/users/pair/123456");
        assert_eq!(proxy.data_url(), "http://cloud/data/");
    }

    #[test]
    fn test_from_config() {
        let proxy = HttpNetProxy::from_config(&Config::test_default()).unwrap();
        assert_eq!(proxy.pre_auth_url(), "http://localhost:8080/tokens/test-device");
        assert_eq!(proxy.state(), ProxyState::Fresh);
    }

    #[test]
    fn test_fresh_proxy_has_nothing_to_disconnect() {
        let mut proxy = HttpNetProxy::new("http://cloud/", "d", Duration::from_secs(1)).unwrap();
        assert_eq!(proxy.state(), ProxyState::Fresh);
        assert!(proxy.disconnect().unwrap_err().is_not_connected());
    }

    #[test]
    fn test_write_requires_pairing() {
        let mut proxy = HttpNetProxy::new("http://cloud/", "d", Duration::from_secs(1)).unwrap();
        assert!(proxy.write().unwrap_err().is_auth_error());
    }
}

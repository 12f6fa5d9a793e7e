//! Scoped HTTP sessions
//!
//! Every client operation either borrows a [`Session`] supplied by the caller
//! or opens its own. A locally opened session is owned by a
//! [`SessionHandle::Owned`] and closed when that handle goes out of scope,
//! whichever way the operation exits. Borrowed sessions are never closed here.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::time::Duration;

use crate::error::{UpstreamError, UpstreamResult};

/// Timeout applied to catalog, tabular and metrics calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Header carrying the optional data.gouv.fr API key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Description of a single upstream GET request
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub url: String,
    pub query: BTreeMap<String, String>,
    pub api_key: Option<String>,
    pub user_agent: Option<String>,
}

impl UpstreamRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: BTreeMap::new(),
            api_key: None,
            user_agent: None,
        }
    }

    /// Add or replace a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(key.into(), value.to_string());
        self
    }
}

impl fmt::Debug for UpstreamRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamRequest")
            .field("url", &self.url)
            .field("query", &self.query)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Status and body of an upstream response, before interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// An open HTTP connection context
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request. Transport-level faults (timeouts, refused
    /// connections) are reported as errors; any HTTP status is a response.
    async fn execute(&self, request: &UpstreamRequest) -> UpstreamResult<RawResponse>;

    /// Release the underlying connections.
    fn close(&self);
}

/// Opens transports for new sessions
pub trait Connector: Send + Sync + fmt::Debug {
    fn open(&self, timeout: Duration) -> UpstreamResult<Box<dyn Transport>>;
}

/// [`Connector`] backed by `reqwest`, one client per session
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestConnector;

impl Connector for ReqwestConnector {
    fn open(&self, timeout: Duration) -> UpstreamResult<Box<dyn Transport>> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Transport {
                url: String::new(),
                message: format!("could not create HTTP client: {e}"),
            })?;
        Ok(Box::new(ReqwestTransport { client, timeout }))
    }
}

struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &UpstreamRequest) -> UpstreamResult<RawResponse> {
        let mut builder = self.client.get(&request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(key) = &request.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        if let Some(user_agent) = &request.user_agent {
            builder = builder.header(reqwest::header::USER_AGENT, user_agent);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(&request.url, self.timeout, e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::from_reqwest(&request.url, self.timeout, e))?;

        Ok(RawResponse { status, body })
    }

    fn close(&self) {
        tracing::trace!("closing upstream session");
    }
}

/// HTTP session used for one or more upstream calls
///
/// Dropping a session closes its transport exactly once.
pub struct Session {
    transport: Box<dyn Transport>,
    timeout: Duration,
}

impl Session {
    pub fn open(connector: &dyn Connector, timeout: Duration) -> UpstreamResult<Self> {
        let transport = connector.open(timeout)?;
        Ok(Self { transport, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send the request and return the raw response, whatever its status.
    pub async fn send(&self, request: &UpstreamRequest) -> UpstreamResult<RawResponse> {
        tracing::debug!(url = %request.url, query = ?request.query, "upstream request");
        let response = self.transport.execute(request).await;
        match &response {
            Ok(raw) => {
                tracing::debug!(url = %request.url, status = raw.status, "upstream response")
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "upstream request failed")
            }
        }
        response
    }

    /// Send the request and decode a 2xx JSON body into `T`.
    ///
    /// Non-2xx responses become [`UpstreamError::Status`]; bodies that do not
    /// decode become [`UpstreamError::Shape`].
    pub async fn get_json<T>(&self, request: &UpstreamRequest) -> UpstreamResult<T>
    where
        T: DeserializeOwned,
    {
        let raw = self.send(request).await?;
        if !raw.is_success() {
            return Err(UpstreamError::from_status(raw.status, &raw.body));
        }
        serde_json::from_str(&raw.body).map_err(|e| UpstreamError::Shape {
            url: request.url.clone(),
            message: e.to_string(),
        })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.transport.close();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// A session for the duration of one logical operation
#[derive(Debug)]
pub enum SessionHandle<'a> {
    /// Supplied by the caller, who keeps ownership
    Borrowed(&'a Session),
    /// Opened for this operation, closed when the handle drops
    Owned(Session),
}

impl SessionHandle<'_> {
    pub fn is_owned(&self) -> bool {
        matches!(self, SessionHandle::Owned(_))
    }
}

impl Deref for SessionHandle<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        match self {
            SessionHandle::Borrowed(session) => session,
            SessionHandle::Owned(session) => session,
        }
    }
}

/// Use `existing` if given, otherwise open a new session owned by the handle.
pub fn acquire<'a>(
    connector: &dyn Connector,
    existing: Option<&'a Session>,
    timeout: Duration,
) -> UpstreamResult<SessionHandle<'a>> {
    match existing {
        Some(session) => Ok(SessionHandle::Borrowed(session)),
        None => Session::open(connector, timeout).map(SessionHandle::Owned),
    }
}

//! Client trait definition
//!
//! This trait is the contract between the commands and a storage backend.
//! Paths are relative to the account: `""` is the account itself,
//! `"container"` a container and `"container/some/object"` an object.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;

use crate::error::Result;
use crate::io::EmitScope;
use crate::verbose::VerboseLogger;

/// Request method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Head,
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Head => "HEAD",
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }

    /// Parse a method name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "HEAD" => Some(Self::Head),
            "GET" => Some(Self::Get),
            "PUT" => Some(Self::Put),
            "POST" => Some(Self::Post),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request issued against a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    /// Header names are lowercase
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    /// Route to the CDN management interface
    pub cdn: bool,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into().trim_matches('/').to_string(),
            headers: BTreeMap::new(),
            body: Vec::new(),
            cdn: false,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn cdn(mut self, cdn: bool) -> Self {
        self.cdn = cdn;
        self
    }
}

/// A backend response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub reason: String,
    /// Header names are lowercase
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

/// Which transport a client uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Direct,
    Standard,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Local => "local",
            Self::Direct => "direct",
            Self::Standard => "standard",
        };
        f.write_str(name)
    }
}

/// Trait for storage backends
///
/// Implemented by the backends in `swiftly-client` and mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Client: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Total tries per request, including the first
    fn attempts(&self) -> u32;

    /// Non-secret connection parameters, for display
    fn describe(&self) -> Vec<(String, String)>;

    /// Base URL of the account, when the backend has one
    fn storage_url(&self) -> Option<String>;

    /// Issue one request
    async fn request(&self, request: Request) -> Result<Response>;
}

/// Issue `request`, retrying server errors up to the client's attempt count
///
/// The last response is returned whatever its status.
pub async fn send_with_retries(
    client: &dyn Client,
    request: Request,
    verbose: Option<&VerboseLogger>,
) -> Result<Response> {
    let attempts = client.attempts().max(1);
    let mut attempt = 1;
    loop {
        let response = client.request(request.clone()).await?;
        if !response.is_server_error() || attempt >= attempts {
            return Ok(response);
        }
        tracing::warn!(
            status = response.status,
            attempt,
            attempts,
            "server error, retrying {} {}",
            request.method,
            request.path
        );
        if let Some(verbose) = verbose {
            verbose.emit(
                EmitScope::Command,
                "{} {} -> {}; retry {} of {}",
                &[
                    &request.method,
                    &request.path,
                    &response.status,
                    &attempt,
                    &(attempts - 1),
                ],
            )?;
        }
        attempt += 1;
    }
}

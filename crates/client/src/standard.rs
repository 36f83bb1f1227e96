//! Standard auth-based backend
//!
//! Authenticates against an auth URL and then talks to the storage URL it
//! hands back. The parameters are kept as given and the URLs are only
//! checked when a request is made; the HTTP transport itself is not bundled.

use async_trait::async_trait;
use url::Url;

use swiftly_core::{BackendKind, Client, Error, Request, Response, Result, StandardParams};

/// Client for the standard auth + storage URL flow
#[derive(Debug, Clone)]
pub struct StandardClient {
    params: StandardParams,
}

impl StandardClient {
    pub fn new(params: StandardParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &StandardParams {
        &self.params
    }

    /// Parsed auth URL, failing the request when it is malformed
    fn auth_url(&self) -> Result<Url> {
        parse_url("Auth URL", &self.params.auth_url)
    }

    fn proxy(&self) -> Result<Option<Url>> {
        self.params
            .proxy
            .as_deref()
            .map(|proxy| parse_url("Proxy", proxy))
            .transpose()
    }
}

fn parse_url(what: &str, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::command(format!("{what} {raw:?} is not a valid URL: {e}")))
}

#[async_trait]
impl Client for StandardClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Standard
    }

    fn attempts(&self) -> u32 {
        self.params.attempts
    }

    fn describe(&self) -> Vec<(String, String)> {
        let params = &self.params;
        let mut info = vec![("Auth URL".to_string(), params.auth_url.clone())];
        let optional = [
            ("Auth User", params.auth_user.as_deref()),
            ("Auth Tenant", params.auth_tenant.as_deref()),
            ("Auth Methods", params.auth_methods.as_deref()),
            ("Region", params.region.as_deref()),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                info.push((name.to_string(), value.to_string()));
            }
        }
        if let Some(path) = &params.auth_cache_path {
            info.push(("Auth Cache".to_string(), path.display().to_string()));
        }
        if let Some(proxy) = &params.proxy {
            info.push(("Proxy".to_string(), proxy.clone()));
        }
        info.push(("SNet".to_string(), params.snet.to_string()));
        info.push(("Attempts".to_string(), params.attempts.to_string()));
        info.push(("Cooperative".to_string(), params.cooperative.to_string()));
        info
    }

    fn storage_url(&self) -> Option<String> {
        None
    }

    async fn request(&self, request: Request) -> Result<Response> {
        let auth_url = self.auth_url()?;
        self.proxy()?;
        Err(Error::UnsupportedFeature(format!(
            "{} {}: the HTTP transport for {} is not part of this build",
            request.method, request.path, auth_url
        )))
    }
}

//! Direct cluster backend
//!
//! Talks to the object servers directly using the cluster rings. Only the
//! parameters are carried here; the ring-based transport is not bundled.

use std::path::PathBuf;

use async_trait::async_trait;

use swiftly_core::{BackendKind, Client, Error, Request, Response, Result};

/// Client for direct cluster access
#[derive(Debug, Clone)]
pub struct DirectClient {
    account_path: String,
    object_ring: Option<PathBuf>,
    attempts: u32,
    cooperative: bool,
}

impl DirectClient {
    pub fn new(
        account_path: String,
        object_ring: Option<PathBuf>,
        attempts: u32,
        cooperative: bool,
    ) -> Self {
        Self {
            account_path,
            object_ring,
            attempts,
            cooperative,
        }
    }
}

#[async_trait]
impl Client for DirectClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Direct
    }

    fn attempts(&self) -> u32 {
        self.attempts
    }

    fn describe(&self) -> Vec<(String, String)> {
        let mut info = vec![("Account Path".to_string(), self.account_path.clone())];
        if let Some(ring) = &self.object_ring {
            info.push(("Object Ring".to_string(), ring.display().to_string()));
        }
        info.push(("Attempts".to_string(), self.attempts.to_string()));
        info.push(("Cooperative".to_string(), self.cooperative.to_string()));
        info
    }

    fn storage_url(&self) -> Option<String> {
        None
    }

    async fn request(&self, request: Request) -> Result<Response> {
        Err(Error::UnsupportedFeature(format!(
            "{} {}: direct cluster access to {} needs the ring transport, which is not part of this build",
            request.method, request.path, self.account_path
        )))
    }
}

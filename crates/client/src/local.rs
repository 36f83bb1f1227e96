//! Local filesystem backend
//!
//! Simulates an account under a root directory: each subdirectory is a
//! container and each file below it an object, keyed by its relative path.
//! Metadata headers are kept in a JSON file at the root.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use swiftly_core::{
    BackendKind, Client, EmitScope, Error, Method, Request, Response, Result, VerboseLogger,
};

/// File at the account root holding metadata headers
pub const METADATA_FILE: &str = ".swiftly-meta.json";

type Metadata = BTreeMap<String, BTreeMap<String, String>>;

/// Client backed by a local directory
pub struct LocalClient {
    root: PathBuf,
    verbose: Option<VerboseLogger>,
    metadata_lock: Mutex<()>,
}

/// What a request path points at
enum Target<'a> {
    Account,
    Container(&'a str),
    Object(&'a str, &'a str),
}

impl LocalClient {
    pub fn new(root: PathBuf, verbose: Option<VerboseLogger>) -> Self {
        Self {
            root,
            verbose,
            metadata_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn target<'a>(&self, path: &'a str) -> Option<Target<'a>> {
        if path.is_empty() {
            return Some(Target::Account);
        }
        let unsafe_component = Path::new(path)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if unsafe_component || path.starts_with(METADATA_FILE) {
            return None;
        }
        match path.split_once('/') {
            None => Some(Target::Container(path)),
            Some((container, object)) => Some(Target::Object(container, object)),
        }
    }

    async fn load_metadata(&self) -> Result<Metadata> {
        match tokio::fs::read(self.root.join(METADATA_FILE)).await {
            Ok(data) => serde_json::from_slice(&data).map_err(|e| Error::Json(e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Metadata::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_metadata(&self, metadata: &Metadata) -> Result<()> {
        let data = serde_json::to_vec_pretty(metadata).map_err(|e| Error::Json(e.to_string()))?;
        tokio::fs::write(self.root.join(METADATA_FILE), data).await?;
        Ok(())
    }

    async fn metadata_for(&self, path: &str) -> Result<BTreeMap<String, String>> {
        Ok(self.load_metadata().await?.remove(path).unwrap_or_default())
    }

    /// Merge (or with `replace`, overwrite) the metadata headers of `path`
    ///
    /// An empty header value removes that header when merging.
    async fn update_metadata(
        &self,
        path: &str,
        headers: &BTreeMap<String, String>,
        replace: bool,
    ) -> Result<()> {
        let _guard = self.metadata_lock.lock().await;
        let mut metadata = self.load_metadata().await?;
        let entry = metadata.entry(path.to_string()).or_default();
        if replace {
            entry.clear();
        }
        for (name, value) in headers.iter().filter(|(name, _)| name.contains("-meta-")) {
            if value.is_empty() {
                entry.remove(name);
            } else {
                entry.insert(name.clone(), value.clone());
            }
        }
        if entry.is_empty() {
            metadata.remove(path);
        }
        self.save_metadata(&metadata).await
    }

    async fn forget_metadata(&self, path: &str) -> Result<()> {
        let _guard = self.metadata_lock.lock().await;
        let mut metadata = self.load_metadata().await?;
        if metadata.remove(path).is_some() {
            self.save_metadata(&metadata).await?;
        }
        Ok(())
    }

    async fn with_metadata(&self, path: &str, mut response: Response) -> Result<Response> {
        response.headers.extend(self.metadata_for(path).await?);
        Ok(response)
    }

    async fn account(&self, request: &Request) -> Result<Response> {
        if !is_dir(&self.root).await {
            return Ok(not_found());
        }
        match request.method {
            Method::Head | Method::Get => {
                let containers = list_dir(&self.root, false).await?;
                let response = listing_response(
                    request.method,
                    "x-account-container-count",
                    &containers,
                );
                self.with_metadata("", response).await
            }
            Method::Post => {
                self.update_metadata("", &request.headers, false).await?;
                Ok(no_content())
            }
            Method::Put | Method::Delete => Ok(not_allowed()),
        }
    }

    async fn container(&self, name: &str, request: &Request) -> Result<Response> {
        let dir = self.root.join(name);
        let exists = is_dir(&dir).await;
        match request.method {
            Method::Head | Method::Get => {
                if !exists {
                    return Ok(not_found());
                }
                let objects = list_dir(&dir, true).await?;
                let response =
                    listing_response(request.method, "x-container-object-count", &objects);
                self.with_metadata(name, response).await
            }
            Method::Put => {
                tokio::fs::create_dir_all(&dir).await?;
                self.update_metadata(name, &request.headers, false).await?;
                Ok(if exists {
                    Response::new(202, "Accepted")
                } else {
                    Response::new(201, "Created")
                })
            }
            Method::Post => {
                if !exists {
                    return Ok(not_found());
                }
                self.update_metadata(name, &request.headers, false).await?;
                Ok(no_content())
            }
            Method::Delete => {
                if !exists {
                    return Ok(not_found());
                }
                if !list_dir(&dir, true).await?.is_empty() {
                    return Ok(Response::new(409, "Conflict"));
                }
                tokio::fs::remove_dir_all(&dir).await?;
                self.forget_metadata(name).await?;
                Ok(no_content())
            }
        }
    }

    async fn object(&self, container: &str, object: &str, request: &Request) -> Result<Response> {
        let container_dir = self.root.join(container);
        if !is_dir(&container_dir).await {
            return Ok(not_found());
        }
        let file = container_dir.join(object);
        let key = request.path.as_str();
        match request.method {
            Method::Head | Method::Get => {
                let Some(len) = file_len(&file).await else {
                    return Ok(not_found());
                };
                let mut response =
                    Response::new(200, "OK").header("content-length", len.to_string());
                if request.method == Method::Get {
                    response.body = tokio::fs::read(&file).await?;
                }
                self.with_metadata(key, response).await
            }
            Method::Put => {
                if let Some(parent) = file.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&file, &request.body).await?;
                self.update_metadata(key, &request.headers, true).await?;
                Ok(Response::new(201, "Created"))
            }
            Method::Post => {
                if file_len(&file).await.is_none() {
                    return Ok(not_found());
                }
                self.update_metadata(key, &request.headers, true).await?;
                Ok(Response::new(202, "Accepted"))
            }
            Method::Delete => {
                if file_len(&file).await.is_none() {
                    return Ok(not_found());
                }
                tokio::fs::remove_file(&file).await?;
                self.forget_metadata(key).await?;
                Ok(no_content())
            }
        }
    }
}

#[async_trait]
impl Client for LocalClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn attempts(&self) -> u32 {
        1
    }

    fn describe(&self) -> Vec<(String, String)> {
        vec![("Local Path".to_string(), self.root.display().to_string())]
    }

    fn storage_url(&self) -> Option<String> {
        let root = std::path::absolute(&self.root).ok()?;
        url::Url::from_directory_path(root)
            .ok()
            .map(|url| url.to_string())
    }

    async fn request(&self, request: Request) -> Result<Response> {
        if let Some(verbose) = &self.verbose {
            verbose.emit(
                EmitScope::Command,
                "LOCAL {} {}",
                &[&request.method, &request.path],
            )?;
        }
        if request.cdn {
            return Err(Error::UnsupportedFeature(
                "CDN management is not available for local storage".into(),
            ));
        }
        match self.target(&request.path) {
            None => Ok(Response::new(400, "Bad Request")),
            Some(Target::Account) => self.account(&request).await,
            Some(Target::Container(name)) => self.container(name, &request).await,
            Some(Target::Object(container, object)) => {
                self.object(container, object, &request).await
            }
        }
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

async fn file_len(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path)
        .await
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

/// Sorted entry names under `dir`; with `recursive`, files as relative paths
async fn list_dir(dir: &Path, recursive: bool) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut pending = vec![(dir.to_path_buf(), String::new())];
    while let Some((current, prefix)) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == METADATA_FILE {
                continue;
            }
            let file_type = entry.file_type().await?;
            if !recursive {
                if file_type.is_dir() {
                    names.push(name);
                }
            } else if file_type.is_dir() {
                pending.push((entry.path(), format!("{prefix}{name}/")));
            } else {
                names.push(format!("{prefix}{name}"));
            }
        }
    }
    names.sort();
    Ok(names)
}

/// HEAD answers with the count only; GET adds a newline-separated listing
fn listing_response(method: Method, count_header: &str, names: &[String]) -> Response {
    let response = Response::new(204, "No Content").header(count_header, names.len().to_string());
    if method != Method::Get {
        return response;
    }
    let body = names
        .iter()
        .flat_map(|name| format!("{name}\n").into_bytes())
        .collect();
    Response {
        status: 200,
        reason: "OK".into(),
        ..response
    }
    .body(body)
}

fn not_found() -> Response {
    Response::new(404, "Not Found")
}

fn no_content() -> Response {
    Response::new(204, "No Content")
}

fn not_allowed() -> Response {
    Response::new(405, "Method Not Allowed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn client() -> (LocalClient, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        (LocalClient::new(temp_dir.path().to_path_buf(), None), temp_dir)
    }

    async fn send(client: &LocalClient, request: Request) -> Response {
        client.request(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_container_lifecycle() {
        let (client, _temp_dir) = client();

        let response = send(&client, Request::new(Method::Put, "photos")).await;
        assert_eq!(response.status, 201);
        let response = send(&client, Request::new(Method::Put, "photos")).await;
        assert_eq!(response.status, 202);

        let response = send(&client, Request::new(Method::Get, "")).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"photos\n");
        assert_eq!(
            response.headers.get("x-account-container-count").map(String::as_str),
            Some("1")
        );

        let response = send(&client, Request::new(Method::Delete, "photos")).await;
        assert_eq!(response.status, 204);
        let response = send(&client, Request::new(Method::Head, "photos")).await;
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_object_roundtrip_with_metadata() {
        let (client, _temp_dir) = client();
        send(&client, Request::new(Method::Put, "c")).await;

        let put = Request::new(Method::Put, "c/dir/file.txt")
            .header("X-Object-Meta-Color", "blue")
            .header("Content-Type", "text/plain")
            .body(b"hello".to_vec());
        assert_eq!(send(&client, put).await.status, 201);

        let response = send(&client, Request::new(Method::Get, "c/dir/file.txt")).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"hello");
        assert_eq!(
            response.headers.get("x-object-meta-color").map(String::as_str),
            Some("blue")
        );
        assert!(!response.headers.contains_key("content-type"));

        let response = send(&client, Request::new(Method::Get, "c")).await;
        assert_eq!(response.body, b"dir/file.txt\n");

        let response = send(&client, Request::new(Method::Delete, "c")).await;
        assert_eq!(response.status, 409);

        let post = Request::new(Method::Post, "c/dir/file.txt").header("X-Object-Meta-Size", "big");
        assert_eq!(send(&client, post).await.status, 202);
        let response = send(&client, Request::new(Method::Head, "c/dir/file.txt")).await;
        assert!(response.body.is_empty());
        assert!(!response.headers.contains_key("x-object-meta-color"));
        assert_eq!(
            response.headers.get("content-length").map(String::as_str),
            Some("5")
        );

        let response = send(&client, Request::new(Method::Delete, "c/dir/file.txt")).await;
        assert_eq!(response.status, 204);
        let response = send(&client, Request::new(Method::Get, "c/dir/file.txt")).await;
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_object_without_container() {
        let (client, _temp_dir) = client();
        let put = Request::new(Method::Put, "missing/obj").body(b"x".to_vec());
        assert_eq!(send(&client, put).await.status, 404);
    }

    #[tokio::test]
    async fn test_account_metadata_merges() {
        let (client, _temp_dir) = client();
        let post = Request::new(Method::Post, "").header("X-Account-Meta-Temp-Url-Key", "k1");
        assert_eq!(send(&client, post).await.status, 204);
        let post = Request::new(Method::Post, "").header("X-Account-Meta-Other", "v");
        send(&client, post).await;

        let response = send(&client, Request::new(Method::Head, "")).await;
        assert_eq!(response.status, 204);
        assert_eq!(
            response
                .headers
                .get("x-account-meta-temp-url-key")
                .map(String::as_str),
            Some("k1")
        );
        assert!(response.headers.contains_key("x-account-meta-other"));

        // The metadata file never shows up as a container.
        let response = send(&client, Request::new(Method::Get, "")).await;
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let (client, _temp_dir) = client();
        let response = send(&client, Request::new(Method::Get, "c/../../etc/passwd")).await;
        assert_eq!(response.status, 400);
        let response = send(&client, Request::new(Method::Get, METADATA_FILE)).await;
        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn test_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let client = LocalClient::new(temp_dir.path().join("absent"), None);
        assert_eq!(send(&client, Request::new(Method::Head, "")).await.status, 404);
    }

    #[tokio::test]
    async fn test_cdn_unsupported() {
        let (client, _temp_dir) = client();
        let err = client
            .request(Request::new(Method::Head, "").cdn(true))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature(_)));
    }

    #[test]
    fn test_storage_url() {
        let (client, temp_dir) = client();
        let url = client.storage_url().unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with('/'));
        assert!(url.contains(&*temp_dir.path().file_name().unwrap().to_string_lossy()));
    }
}

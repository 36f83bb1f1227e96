//! tempurl command - Generate a temporary URL for an object
//!
//! The signature is the hex HMAC-SHA1 of `METHOD\nEXPIRES\nPATH` keyed with
//! the account's temp URL key.

use async_trait::async_trait;
use clap::Parser;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use url::Url;

use swiftly_core::{Error, Method, Request, Result};

use super::{parse_args, request, schema_for};
use crate::controller::Controller;
use crate::registry::{Command, CommandDescriptor};

const TEMP_URL_KEY_HEADER: &str = "x-account-meta-temp-url-key";
const DEFAULT_SECONDS: u64 = 3600;

type HmacSha1 = Hmac<Sha1>;

/// Arguments of the tempurl command
#[derive(Parser, Debug)]
pub struct TempurlArgs {
    /// Key to sign with instead of the account's X-Account-Meta-Temp-Url-Key
    #[arg(long)]
    pub key: Option<String>,

    /// Method the URL allows: GET, HEAD, PUT, POST or DELETE
    pub method: String,

    /// Object path, container/object
    pub path: String,

    /// How long the URL stays valid
    #[arg(default_value_t = DEFAULT_SECONDS)]
    pub seconds: u64,
}

/// Unix time `seconds` after `now`
pub fn expires_at(now: i64, seconds: u64) -> Result<i64> {
    i64::try_from(seconds)
        .ok()
        .and_then(|seconds| now.checked_add(seconds))
        .ok_or_else(|| Error::command(format!("Expiration of {seconds} seconds is out of range")))
}

/// Hex signature for `method` on `path` until `expires`
pub fn signature(key: &str, method: Method, expires: i64, path: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| Error::General(format!("HMAC init failed: {e}")))?;
    mac.update(format!("{method}\n{expires}\n{path}").as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub struct TempurlCommand;

#[async_trait]
impl Command for TempurlCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "tempurl",
            usage: "tempurl [options] <method> <path> [seconds]",
            about: "Outputs a temporary URL allowing <method> on the object at \
                    <path> for [seconds], default 3600. The signing key is the \
                    account's X-Account-Meta-Temp-Url-Key unless --key is given.",
        }
    }

    fn schema(&self) -> clap::Command {
        schema_for::<TempurlArgs>(self.descriptor())
    }

    async fn invoke(&self, controller: &Controller, args: Vec<String>) -> Result<()> {
        let context = controller.context();
        let Some(args) = parse_args::<TempurlArgs>(self, context, &args)? else {
            return Ok(());
        };

        let method = Method::parse(&args.method)
            .ok_or_else(|| Error::command(format!("Invalid method {:?}", args.method)))?;
        let path = args.path.trim_matches('/');
        if !path.contains('/') {
            return Err(Error::command(format!(
                "tempurl needs an object path, container/object; got {:?}",
                args.path
            )));
        }

        let storage_url = context
            .client()?
            .storage_url()
            .ok_or_else(|| Error::command("The backend does not provide a storage URL"))?;

        let key = match args.key {
            Some(key) => key,
            None => {
                let response = request(context, Request::new(Method::Head, "")).await?;
                response
                    .headers
                    .get(TEMP_URL_KEY_HEADER)
                    .cloned()
                    .ok_or_else(|| {
                        Error::command(
                            "No temp URL key; set X-Account-Meta-Temp-Url-Key on the account or \
                             pass --key",
                        )
                    })?
            }
        };

        let base = if storage_url.ends_with('/') {
            storage_url
        } else {
            format!("{storage_url}/")
        };
        let url = Url::parse(&base)
            .and_then(|base| base.join(path))
            .map_err(|e| Error::command(format!("Invalid storage URL {base:?}: {e}")))?;
        let expires = expires_at(jiff::Timestamp::now().as_second(), args.seconds)?;
        let sig = signature(&key, method, expires, url.path())?;

        context.io.with_stdout(|out| {
            writeln!(out, "{url}?temp_url_sig={sig}&temp_url_expires={expires}")
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature() {
        let sig = signature("mykey", Method::Get, 1_400_000_000, "/v1/AUTH_test/c/o").unwrap();
        assert_eq!(sig, "b67e58e2c1324459259286e90d12adce2433749a");
    }

    #[test]
    fn test_signature_depends_on_method() {
        let get = signature("k", Method::Get, 1, "/a/c/o").unwrap();
        let put = signature("k", Method::Put, 1, "/a/c/o").unwrap();
        assert_ne!(get, put);
        assert_eq!(get.len(), 40);
    }

    #[test]
    fn test_default_seconds() {
        let args = TempurlArgs::try_parse_from(["tempurl", "GET", "c/o"]).unwrap();
        assert_eq!(args.seconds, DEFAULT_SECONDS);
        assert!(TempurlArgs::try_parse_from(["tempurl", "GET", "c/o", "soon"]).is_err());
    }

    #[test]
    fn test_expires_at_out_of_range() {
        assert_eq!(expires_at(1_400_000_000, 60).unwrap(), 1_400_000_060);
        assert!(expires_at(1_400_000_000, u64::MAX).unwrap_err().is_described());
        assert!(expires_at(1_400_000_000, i64::MAX as u64).unwrap_err().is_described());
    }
}

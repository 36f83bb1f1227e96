//! Backend selection
//!
//! Exactly one backend is chosen per invocation, in this order:
//! a local filesystem root (`--local`), a direct cluster account path
//! (`--direct`), or the standard auth-based client. Selection only decides
//! and collects parameters; `swiftly_client::connect` builds the client.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::options::{Environment, OptionName, ResolvedOptions};

/// Suffix of the auth cache file in the temporary directory
pub const AUTH_CACHE_SUFFIX: &str = ".clientcache";

/// Parameters for the standard auth-based backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardParams {
    pub auth_url: String,
    pub auth_user: Option<String>,
    pub auth_key: Option<String>,
    pub auth_tenant: Option<String>,
    pub auth_methods: Option<String>,
    pub region: Option<String>,
    pub snet: bool,
    pub auth_cache_path: Option<PathBuf>,
    pub attempts: u32,
    pub cooperative: bool,
    pub proxy: Option<String>,
}

/// The chosen backend and its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSelection {
    Local {
        path: PathBuf,
    },
    Direct {
        account_path: String,
        object_ring: Option<PathBuf>,
        attempts: u32,
        cooperative: bool,
    },
    Standard(StandardParams),
}

/// Inputs to selection that do not come from the main options
#[derive(Debug, Clone)]
pub struct SelectorEnv {
    pub user: String,
    pub temp_dir: PathBuf,
}

impl SelectorEnv {
    /// Current user from `USER` and the OS temporary directory
    pub fn from_environment(env: &Environment) -> Self {
        Self {
            user: env.get("USER").unwrap_or("user").to_string(),
            temp_dir: std::env::temp_dir(),
        }
    }

    pub fn auth_cache_path(&self) -> PathBuf {
        self.temp_dir
            .join(format!("{}{AUTH_CACHE_SUFFIX}", self.user))
    }
}

/// Choose the backend for `options`
///
/// Fails with [`Error::MissingAuthUrl`] when neither a local nor a direct
/// path is set and no auth URL resolved.
pub fn select_backend(
    options: &ResolvedOptions,
    cooperative: bool,
    env: &SelectorEnv,
) -> Result<BackendSelection> {
    if let Some(local) = options.non_empty(OptionName::Local) {
        return Ok(BackendSelection::Local {
            path: PathBuf::from(local),
        });
    }

    if let Some(direct) = options.non_empty(OptionName::Direct) {
        return Ok(BackendSelection::Direct {
            account_path: direct.to_string(),
            object_ring: options
                .non_empty(OptionName::DirectObjectRing)
                .map(PathBuf::from),
            attempts: options.attempts(),
            cooperative,
        });
    }

    let auth_url = options
        .non_empty(OptionName::AuthUrl)
        .ok_or(Error::MissingAuthUrl)?;
    let owned = |name| options.string(name).map(str::to_string);

    Ok(BackendSelection::Standard(StandardParams {
        auth_url: auth_url.to_string(),
        auth_user: owned(OptionName::AuthUser),
        auth_key: owned(OptionName::AuthKey),
        auth_tenant: owned(OptionName::AuthTenant),
        auth_methods: owned(OptionName::AuthMethods),
        region: owned(OptionName::Region),
        snet: options.flag(OptionName::Snet),
        auth_cache_path: options
            .flag(OptionName::CacheAuth)
            .then(|| env.auth_cache_path()),
        attempts: options.attempts(),
        cooperative,
        proxy: options.non_empty(OptionName::Proxy).map(str::to_string),
    }))
}

impl BackendSelection {
    /// Short description for verbose output
    pub fn summary(&self) -> String {
        match self {
            Self::Local { path } => format!("local {}", path.display()),
            Self::Direct { account_path, .. } => format!("direct {account_path}"),
            Self::Standard(params) => format!("standard {}", params.auth_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigStore, SECTION};
    use crate::options::{CommandLineValues, OptionResolver};

    fn options(env: &[(&str, &str)]) -> ResolvedOptions {
        let env = Environment::from_pairs(env.iter().copied());
        let store = ConfigStore::from_sections([(SECTION, Vec::<(&str, &str)>::new())]);
        OptionResolver::new(&env, &store)
            .resolve(&CommandLineValues::new())
            .unwrap()
    }

    fn selector_env() -> SelectorEnv {
        SelectorEnv {
            user: "tester".into(),
            temp_dir: PathBuf::from("/tmp"),
        }
    }

    #[test]
    fn test_local_wins_over_direct() {
        let opts = options(&[
            ("SWIFTLY_LOCAL", "/srv/fake"),
            ("SWIFTLY_DIRECT", "/v1/AUTH_test"),
            ("SWIFTLY_AUTH_URL", "http://auth"),
        ]);
        let selection = select_backend(&opts, false, &selector_env()).unwrap();
        assert_eq!(
            selection,
            BackendSelection::Local {
                path: PathBuf::from("/srv/fake")
            }
        );
    }

    #[test]
    fn test_direct_selection() {
        let opts = options(&[
            ("SWIFTLY_DIRECT", "/v1/AUTH_test"),
            ("SWIFTLY_DIRECT_OBJECT_RING", "/etc/swift/object.ring.gz"),
            ("SWIFTLY_RETRIES", "2"),
        ]);
        let selection = select_backend(&opts, true, &selector_env()).unwrap();
        assert_eq!(
            selection,
            BackendSelection::Direct {
                account_path: "/v1/AUTH_test".into(),
                object_ring: Some(PathBuf::from("/etc/swift/object.ring.gz")),
                attempts: 3,
                cooperative: true,
            }
        );
    }

    #[test]
    fn test_standard_from_environment() {
        let opts = options(&[("SWIFTLY_AUTH_URL", "http://auth/v1.0")]);
        let BackendSelection::Standard(params) =
            select_backend(&opts, false, &selector_env()).unwrap()
        else {
            panic!("expected standard backend");
        };
        assert_eq!(params.auth_url, "http://auth/v1.0");
        assert_eq!(params.attempts, 5);
        assert_eq!(params.auth_cache_path, None);
        assert_eq!(params.proxy, None);
    }

    #[test]
    fn test_standard_with_cache_and_proxy() {
        let opts = options(&[
            ("SWIFTLY_AUTH_URL", "http://auth/v2.0"),
            ("SWIFTLY_AUTH_USER", "test:tester"),
            ("SWIFTLY_CACHE_AUTH", "yes"),
            ("SWIFTLY_PROXY", "http://proxy:3128"),
            ("SWIFTLY_SNET", "on"),
        ]);
        let BackendSelection::Standard(params) =
            select_backend(&opts, false, &selector_env()).unwrap()
        else {
            panic!("expected standard backend");
        };
        assert_eq!(params.auth_user.as_deref(), Some("test:tester"));
        assert_eq!(
            params.auth_cache_path,
            Some(PathBuf::from("/tmp/tester.clientcache"))
        );
        assert_eq!(params.proxy.as_deref(), Some("http://proxy:3128"));
        assert!(params.snet);
    }

    #[test]
    fn test_no_cache_auth_disables_cache() {
        let opts = options(&[
            ("SWIFTLY_AUTH_URL", "http://auth"),
            ("SWIFTLY_CACHE_AUTH", "true"),
            ("SWIFTLY_NO_CACHE_AUTH", "true"),
        ]);
        let BackendSelection::Standard(params) =
            select_backend(&opts, false, &selector_env()).unwrap()
        else {
            panic!("expected standard backend");
        };
        assert_eq!(params.auth_cache_path, None);
    }

    #[test]
    fn test_missing_auth_url() {
        let err = select_backend(&options(&[]), false, &selector_env()).unwrap_err();
        assert!(matches!(err, Error::MissingAuthUrl));

        let err = select_backend(
            &options(&[("SWIFTLY_AUTH_URL", ""), ("SWIFTLY_LOCAL", "")]),
            false,
            &selector_env(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingAuthUrl));
    }

    #[test]
    fn test_selector_env_defaults_user() {
        let env = SelectorEnv::from_environment(&Environment::default());
        assert_eq!(env.user, "user");
        assert!(env.auth_cache_path().ends_with("user.clientcache"));
    }
}

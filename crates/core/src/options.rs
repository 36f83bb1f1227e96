//! Main option resolution
//!
//! Every main option is resolved through the same cascade: a command-line
//! value, then `SWIFTLY_<OPTION>` from the environment, then the `swiftly`
//! section of the configuration file, then a built-in default. The first
//! source that has a value wins.
//!
//! The resolver only sees the sources it is handed. The process environment
//! is captured once into an [`Environment`] snapshot by the binary.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::config::{ConfigStore, SECTION};
use crate::error::{Error, Result};

/// Lowercase strings that coerce to `true`
pub const TRUE_VALUES: [&str; 6] = ["1", "on", "t", "true", "y", "yes"];

/// Prefix for option environment variables
pub const ENV_PREFIX: &str = "SWIFTLY_";

/// Default for `retries`
pub const DEFAULT_RETRIES: i64 = 4;

/// Default for `concurrency`
pub const DEFAULT_CONCURRENCY: i64 = 1;

/// Declared type of a main option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Bool,
    Int,
    Str,
}

/// Every recognized main option
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionName {
    AuthUrl,
    AuthUser,
    AuthKey,
    AuthTenant,
    AuthMethods,
    Region,
    Direct,
    Local,
    Proxy,
    Snet,
    NoSnet,
    Retries,
    CacheAuth,
    NoCacheAuth,
    Cdn,
    NoCdn,
    Concurrency,
    Eventlet,
    NoEventlet,
    Verbose,
    NoVerbose,
    DirectObjectRing,
}

impl OptionName {
    /// All options in resolution order
    pub const ALL: [OptionName; 22] = [
        Self::AuthUrl,
        Self::AuthUser,
        Self::AuthKey,
        Self::AuthTenant,
        Self::AuthMethods,
        Self::Region,
        Self::Direct,
        Self::Local,
        Self::Proxy,
        Self::Snet,
        Self::NoSnet,
        Self::Retries,
        Self::CacheAuth,
        Self::NoCacheAuth,
        Self::Cdn,
        Self::NoCdn,
        Self::Concurrency,
        Self::Eventlet,
        Self::NoEventlet,
        Self::Verbose,
        Self::NoVerbose,
        Self::DirectObjectRing,
    ];

    /// Option name as used in the configuration file
    pub const fn key(self) -> &'static str {
        match self {
            Self::AuthUrl => "auth_url",
            Self::AuthUser => "auth_user",
            Self::AuthKey => "auth_key",
            Self::AuthTenant => "auth_tenant",
            Self::AuthMethods => "auth_methods",
            Self::Region => "region",
            Self::Direct => "direct",
            Self::Local => "local",
            Self::Proxy => "proxy",
            Self::Snet => "snet",
            Self::NoSnet => "no_snet",
            Self::Retries => "retries",
            Self::CacheAuth => "cache_auth",
            Self::NoCacheAuth => "no_cache_auth",
            Self::Cdn => "cdn",
            Self::NoCdn => "no_cdn",
            Self::Concurrency => "concurrency",
            Self::Eventlet => "eventlet",
            Self::NoEventlet => "no_eventlet",
            Self::Verbose => "verbose",
            Self::NoVerbose => "no_verbose",
            Self::DirectObjectRing => "direct_object_ring",
        }
    }

    pub const fn kind(self) -> OptionKind {
        match self {
            Self::Snet
            | Self::NoSnet
            | Self::CacheAuth
            | Self::NoCacheAuth
            | Self::Cdn
            | Self::NoCdn
            | Self::Eventlet
            | Self::NoEventlet
            | Self::Verbose
            | Self::NoVerbose => OptionKind::Bool,
            Self::Retries | Self::Concurrency => OptionKind::Int,
            _ => OptionKind::Str,
        }
    }

    /// The `no_` half that overrides this option, if any
    pub const fn negation(self) -> Option<OptionName> {
        match self {
            Self::Snet => Some(Self::NoSnet),
            Self::CacheAuth => Some(Self::NoCacheAuth),
            Self::Cdn => Some(Self::NoCdn),
            Self::Eventlet => Some(Self::NoEventlet),
            Self::Verbose => Some(Self::NoVerbose),
            _ => None,
        }
    }

    /// Environment variable consulted for this option
    pub fn env_name(self) -> String {
        format!("{ENV_PREFIX}{}", self.key().to_uppercase())
    }

    fn default_value(self) -> OptionValue {
        match self {
            Self::Retries => OptionValue::Int(DEFAULT_RETRIES),
            Self::Concurrency => OptionValue::Int(DEFAULT_CONCURRENCY),
            _ if self.kind() == OptionKind::Bool => OptionValue::Bool(false),
            _ => OptionValue::Unset,
        }
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A raw or resolved option value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OptionValue {
    #[default]
    Unset,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl OptionValue {
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }
}

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    CommandLine,
    Environment,
    ConfigFile,
    Default,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CommandLine => "command line",
            Self::Environment => "environment",
            Self::ConfigFile => "configuration file",
            Self::Default => "default",
        };
        f.write_str(name)
    }
}

/// Snapshot of environment variables
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the current process environment
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// Option values given explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct CommandLineValues {
    values: HashMap<OptionName, OptionValue>,
}

impl CommandLineValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a string-valued flag; `None` means the flag was not given
    pub fn set_str(&mut self, name: OptionName, value: Option<String>) -> &mut Self {
        if let Some(value) = value {
            self.values.insert(name, OptionValue::Str(value));
        }
        self
    }

    /// Record a switch; an absent switch is not a command-line value
    pub fn set_flag(&mut self, name: OptionName, present: bool) -> &mut Self {
        if present {
            self.values.insert(name, OptionValue::Bool(true));
        }
        self
    }

    fn get(&self, name: OptionName) -> Option<&OptionValue> {
        self.values.get(&name)
    }
}

/// Coerce a raw string using the boolean vocabulary
pub fn parse_bool(raw: &str) -> bool {
    let lowered = raw.to_lowercase();
    TRUE_VALUES.contains(&lowered.as_str())
}

/// Resolves main options from explicit sources
#[derive(Debug)]
pub struct OptionResolver<'a> {
    env: &'a Environment,
    store: &'a ConfigStore,
}

impl<'a> OptionResolver<'a> {
    pub fn new(env: &'a Environment, store: &'a ConfigStore) -> Self {
        Self { env, store }
    }

    /// Resolve every recognized option
    ///
    /// Fails on the first integer option whose winning value does not parse.
    pub fn resolve(&self, cli: &CommandLineValues) -> Result<ResolvedOptions> {
        let mut values = BTreeMap::new();
        let mut sources = BTreeMap::new();

        for name in OptionName::ALL {
            let (raw, source) = self.lookup(cli, name);
            let value = coerce(name, raw)?;
            tracing::debug!(option = name.key(), %source, "resolved option");
            values.insert(name, value);
            sources.insert(name, source);
        }

        for name in OptionName::ALL {
            let Some(negation) = name.negation() else {
                continue;
            };
            if values.get(&negation) == Some(&OptionValue::Bool(true)) {
                values.insert(name, OptionValue::Bool(false));
            }
        }

        Ok(ResolvedOptions { values, sources })
    }

    fn lookup(&self, cli: &CommandLineValues, name: OptionName) -> (OptionValue, Source) {
        if let Some(value) = cli.get(name) {
            return (value.clone(), Source::CommandLine);
        }
        if let Some(value) = self.env.get(&name.env_name()) {
            return (OptionValue::Str(value.to_string()), Source::Environment);
        }
        if let Some(value) = self.store.get(SECTION, name.key()) {
            return (OptionValue::Str(value.to_string()), Source::ConfigFile);
        }
        (OptionValue::Unset, Source::Default)
    }
}

fn coerce(name: OptionName, raw: OptionValue) -> Result<OptionValue> {
    if !raw.is_set() {
        return Ok(name.default_value());
    }
    match (name.kind(), raw) {
        (OptionKind::Bool, OptionValue::Str(s)) => Ok(OptionValue::Bool(parse_bool(&s))),
        (OptionKind::Int, OptionValue::Str(s)) => {
            let parsed: i64 = s
                .trim()
                .parse()
                .map_err(|_| Error::resolution(name.key(), format!("'{s}' is not an integer")))?;
            check_range(name, parsed)
        }
        (OptionKind::Int, OptionValue::Bool(_)) => Err(Error::resolution(
            name.key(),
            "expected an integer, not a switch",
        )),
        (OptionKind::Str, OptionValue::Bool(b)) => Ok(OptionValue::Str(b.to_string())),
        (_, value) => Ok(value),
    }
}

fn check_range(name: OptionName, value: i64) -> Result<OptionValue> {
    let min = match name {
        OptionName::Concurrency => 1,
        _ => 0,
    };
    if value < min || value >= i64::from(u32::MAX) {
        return Err(Error::resolution(
            name.key(),
            format!("{value} is out of range (minimum {min})"),
        ));
    }
    Ok(OptionValue::Int(value))
}

/// The final value of every main option
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    values: BTreeMap<OptionName, OptionValue>,
    sources: BTreeMap<OptionName, Source>,
}

impl ResolvedOptions {
    pub fn get(&self, name: OptionName) -> &OptionValue {
        // Every name in OptionName::ALL is inserted by the resolver.
        self.values.get(&name).unwrap_or(&OptionValue::Unset)
    }

    pub fn source(&self, name: OptionName) -> Source {
        self.sources.get(&name).copied().unwrap_or(Source::Default)
    }

    pub fn flag(&self, name: OptionName) -> bool {
        matches!(self.get(name), OptionValue::Bool(true))
    }

    pub fn string(&self, name: OptionName) -> Option<&str> {
        match self.get(name) {
            OptionValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Like [`string`](Self::string) but treats an empty value as absent
    pub fn non_empty(&self, name: OptionName) -> Option<&str> {
        self.string(name).filter(|s| !s.is_empty())
    }

    pub fn retries(&self) -> u32 {
        match self.get(OptionName::Retries) {
            OptionValue::Int(i) => u32::try_from(*i).unwrap_or(DEFAULT_RETRIES as u32),
            _ => DEFAULT_RETRIES as u32,
        }
    }

    /// Attempts handed to a backend: one try plus the retries
    pub fn attempts(&self) -> u32 {
        self.retries() + 1
    }

    pub fn concurrency(&self) -> usize {
        match self.get(OptionName::Concurrency) {
            OptionValue::Int(i) => usize::try_from(*i).unwrap_or(1),
            _ => 1,
        }
    }

    pub fn verbosity(&self) -> u8 {
        u8::from(self.flag(OptionName::Verbose))
    }
}

//! CLI command definitions and execution
//!
//! This module holds the main option schema and one module per command.
//! Each command parses its own arguments with a clap derive struct and talks
//! to the backend through the execution context.

use std::collections::BTreeMap;

use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches, Parser};

use swiftly_core::{
    CommandLineValues, Error, ExecutionContext, Method, OptionName, Request, Response, Result,
    send_with_retries,
};

use crate::registry::{Command, CommandDescriptor, CommandRegistry};

pub mod auth;
pub mod crypt;
pub mod delete;
pub mod fordo;
pub mod get;
pub mod head;
pub mod help;
pub mod ping;
pub mod post;
pub mod put;
pub mod tempurl;
pub mod trans;

const MAIN_ABOUT: &str = "\
Client for Swift-style object storage.

Main options can be given on the command line, through environment variables
named SWIFTLY_<OPTION> (SWIFTLY_AUTH_URL, SWIFTLY_RETRIES, ...) or in the
[swiftly] section of the configuration file (auth_url = ..., retries = ...).
The command line wins over the environment, which wins over the file.";

/// swiftly - Swift object storage CLI
#[derive(Parser, Debug, Default)]
#[command(name = "swiftly")]
#[command(version, about = MAIN_ABOUT)]
#[command(override_usage = "swiftly [options] <command> [command_options] [args]")]
pub struct Cli {
    /// Path to the configuration file [default: ~/.swiftly.conf]
    #[arg(long, value_name = "PATH")]
    pub conf: Option<String>,

    /// URL to auth system, example: https://identity.api.rackspacecloud.com/v2.0
    #[arg(short = 'A', long, value_name = "URL")]
    pub auth_url: Option<String>,

    /// User name for auth system, example: test:tester
    #[arg(short = 'U', long, value_name = "USER")]
    pub auth_user: Option<String>,

    /// Key for auth system, example: testing
    #[arg(short = 'K', long, value_name = "KEY")]
    pub auth_key: Option<String>,

    /// Tenant name for auth system, if different from the user
    #[arg(short = 'T', long, value_name = "TENANT")]
    pub auth_tenant: Option<String>,

    /// Auth methods to use with the auth system
    #[arg(long, value_name = "auth2key,auth2password,auth1")]
    pub auth_methods: Option<String>,

    /// Region to use, if supported by the auth system
    #[arg(long, value_name = "VALUE")]
    pub region: Option<String>,

    /// Uses direct connect method to access Swift; requires access to rings
    /// and backend servers. The value is the account path, example:
    /// /v1/AUTH_test
    #[arg(short = 'D', long, value_name = "PATH")]
    pub direct: Option<String>,

    /// Uses the local file system method to access a fake Swift cluster.
    /// The value is the path to the local directory to use.
    #[arg(short = 'L', long, value_name = "PATH")]
    pub local: Option<String>,

    /// Uses the given proxy URL
    #[arg(short = 'P', long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Internal network access is used where possible
    #[arg(short = 'S', long)]
    pub snet: bool,

    /// Disables the above snet value if it had been set true
    #[arg(long)]
    pub no_snet: bool,

    /// Indicates how many times to retry the request on a server error
    /// [default: 4]
    #[arg(short = 'R', long, value_name = "INTEGER")]
    pub retries: Option<String>,

    /// If set true, the storage URL and auth token are cached in
    /// <temp dir>/<user>.clientcache
    #[arg(short = 'C', long)]
    pub cache_auth: bool,

    /// Disables the above cache_auth value if it had been set true
    #[arg(long)]
    pub no_cache_auth: bool,

    /// Directs requests to the CDN management interface
    #[arg(long)]
    pub cdn: bool,

    /// Disables the above cdn value if it had been set true
    #[arg(long)]
    pub no_cdn: bool,

    /// Number of concurrent actions to allow [default: 1]
    #[arg(long, value_name = "INTEGER")]
    pub concurrency: Option<String>,

    /// Enables cooperative scheduling of subprocesses; on by default when
    /// the async runtime is available
    #[arg(long)]
    pub eventlet: bool,

    /// Disables cooperative scheduling
    #[arg(long)]
    pub no_eventlet: bool,

    /// Causes output to standard error indicating actions being taken
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Disables the above verbose value if it had been set true
    #[arg(long)]
    pub no_verbose: bool,

    /// The current object ring of the cluster being pinged; used with the
    /// direct method
    #[arg(short = 'O', long, value_name = "PATH")]
    pub direct_object_ring: Option<String>,

    /// Command to run followed by its options and arguments
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

impl Cli {
    /// Values supplied on the command line, for the option resolver
    pub fn command_line_values(&self) -> CommandLineValues {
        let mut values = CommandLineValues::new();
        values
            .set_str(OptionName::AuthUrl, self.auth_url.clone())
            .set_str(OptionName::AuthUser, self.auth_user.clone())
            .set_str(OptionName::AuthKey, self.auth_key.clone())
            .set_str(OptionName::AuthTenant, self.auth_tenant.clone())
            .set_str(OptionName::AuthMethods, self.auth_methods.clone())
            .set_str(OptionName::Region, self.region.clone())
            .set_str(OptionName::Direct, self.direct.clone())
            .set_str(OptionName::Local, self.local.clone())
            .set_str(OptionName::Proxy, self.proxy.clone())
            .set_flag(OptionName::Snet, self.snet)
            .set_flag(OptionName::NoSnet, self.no_snet)
            .set_str(OptionName::Retries, self.retries.clone())
            .set_flag(OptionName::CacheAuth, self.cache_auth)
            .set_flag(OptionName::NoCacheAuth, self.no_cache_auth)
            .set_flag(OptionName::Cdn, self.cdn)
            .set_flag(OptionName::NoCdn, self.no_cdn)
            .set_str(OptionName::Concurrency, self.concurrency.clone())
            .set_flag(OptionName::Eventlet, self.eventlet)
            .set_flag(OptionName::NoEventlet, self.no_eventlet)
            .set_flag(OptionName::Verbose, self.verbose)
            .set_flag(OptionName::NoVerbose, self.no_verbose)
            .set_str(OptionName::DirectObjectRing, self.direct_object_ring.clone());
        values
    }
}

/// Main option schema with the registry's command listing as epilog
pub fn main_command(registry: &CommandRegistry) -> clap::Command {
    Cli::command().after_help(registry.render_help())
}

/// Schema for a command: its clap derive struct named and described by
/// its descriptor
pub(crate) fn schema_for<T: CommandFactory>(descriptor: CommandDescriptor) -> clap::Command {
    T::command()
        .name(descriptor.name)
        .bin_name(format!("swiftly {}", descriptor.name))
        .about(descriptor.about)
        .override_usage(format!("swiftly [main_options] {}", descriptor.usage))
}

/// Parse a command's arguments against its schema
///
/// Returns `None` when help was requested and has already been written to
/// stdout. Parse failures become command errors carrying clap's message.
pub(crate) fn parse_args<T: FromArgMatches>(
    command: &dyn Command,
    context: &ExecutionContext,
    args: &[String],
) -> Result<Option<T>> {
    let name = command.descriptor().name;
    let argv = std::iter::once(name.to_string()).chain(args.iter().cloned());
    let matches = match command.schema().try_get_matches_from(argv) {
        Ok(matches) => matches,
        Err(err) if err.kind() == ErrorKind::DisplayHelp => {
            let help = err.render().to_string();
            context.io.with_stdout(|out| out.write_all(help.as_bytes()))?;
            return Ok(None);
        }
        Err(err) => return Err(Error::command(clap_message(&err))),
    };
    T::from_arg_matches(&matches)
        .map(Some)
        .map_err(|err| Error::command(clap_message(&err)))
}

/// First line of a clap error without its `error: ` prefix
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

/// Send a request with retries and turn a non-success status into a
/// command error
pub(crate) async fn request(context: &ExecutionContext, request: Request) -> Result<Response> {
    let method = request.method;
    let path = request.path.clone();
    context.verbose("{} {}", &[&method, &display_path(&path)])?;
    let request = request.cdn(context.cdn);
    let response = send_with_retries(context.client()?, request, context.verbose_logger()).await?;
    context.verbose(
        "{} {} {} {}",
        &[&response.status, &response.reason, &method, &display_path(&path)],
    )?;
    check(response, method, &path)
}

fn check(response: Response, method: Method, path: &str) -> Result<Response> {
    if response.is_success() {
        return Ok(response);
    }
    let text = format!(
        "{} {} {} {}",
        response.status,
        response.reason,
        method,
        display_path(path)
    );
    Err(Error::command(text.trim_end().to_string()))
}

fn display_path(path: &str) -> String {
    format!("/{path}")
}

/// Parse `Name: value` header options
pub(crate) fn parse_headers(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|header| match header.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(Error::command(format!(
                "Invalid header {header:?}; expected \"Name: value\""
            ))),
        })
        .collect()
}

/// Capitalize each dash-separated part of a header name
pub(crate) fn title_case(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Write `Name: value` lines with the values aligned
pub(crate) fn write_pairs<'a>(
    context: &ExecutionContext,
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<()> {
    let pairs: Vec<_> = pairs.into_iter().collect();
    let width = pairs.iter().map(|(name, _)| name.len()).max().unwrap_or(0) + 1;
    context.io.with_stdout(|out| {
        for (name, value) in &pairs {
            writeln!(out, "{:<width$} {value}", format!("{name}:"))?;
        }
        Ok(())
    })?;
    Ok(())
}

/// Write response headers as aligned, title-cased lines
pub(crate) fn write_headers(
    context: &ExecutionContext,
    headers: &BTreeMap<String, String>,
) -> Result<()> {
    let titled: Vec<_> = headers
        .iter()
        .map(|(name, value)| (title_case(name), value.as_str()))
        .collect();
    write_pairs(
        context,
        titled.iter().map(|(name, value)| (name.as_str(), *value)),
    )
}

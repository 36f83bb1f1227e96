//! Front controller
//!
//! [`run`] turns the process arguments into an exit code: it parses the main
//! options, resolves every option through the command line, environment,
//! configuration file and default cascade, picks and builds the backend,
//! and hands the command token to the [`Controller`] for dispatch.

use std::backtrace::Backtrace;
use std::time::Instant;

use clap::error::ErrorKind;
use clap::FromArgMatches;

use swiftly_core::{
    capability, cooperative_mode, resolve_conf_path, select_backend, spawner_for, ConfigStore,
    EmitScope, Environment, Error, ExecutionContext, IoManager, OptionName, OptionResolver, Result,
    SelectorEnv,
};

use crate::commands::{main_command, Cli};
use crate::exit_code::ExitCode;
use crate::registry::{canonical_name, CommandRegistry, COMMANDS};

/// Token of the command that runs without a backend
const HELP_COMMAND: &str = "help";

/// Dispatches command tokens against the registry
pub struct Controller {
    context: ExecutionContext,
    registry: CommandRegistry,
}

impl Controller {
    pub fn new(context: ExecutionContext, registry: CommandRegistry) -> Self {
        Self { context, registry }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Main help text, including the command listing
    pub fn main_help(&self) -> String {
        main_command(&self.registry).render_help().to_string()
    }

    /// Run `args[0]` with the remaining arguments
    ///
    /// Errors are returned to the caller, so commands can use this to run
    /// other commands.
    pub async fn invoke(&self, args: &[String]) -> Result<()> {
        let Some((token, rest)) = args.split_first() else {
            return Err(Error::command("no command given"));
        };
        let command = self
            .registry
            .get(token)
            .ok_or_else(|| Error::UnknownCommand(token.clone()))?;
        self.context.verbose("{} {}", &[&canonical_name(token), &DebugArgs(rest)])?;
        command.invoke(self, rest.to_vec()).await
    }

    /// Run `args[0]` and report any failure on stderr
    pub async fn perform(&self, args: &[String]) -> ExitCode {
        match self.invoke(args).await {
            Ok(()) => ExitCode::Success,
            Err(err) => {
                let token = args.first().map(String::as_str).unwrap_or_default();
                report(&self.context.io, token, &err)
            }
        }
    }
}

/// Arguments rendered as a list for verbose output
struct DebugArgs<'a>(&'a [String]);

impl std::fmt::Display for DebugArgs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Write the failure for `err` to stderr and map it to an exit code
fn report(io: &IoManager, token: &str, err: &Error) -> ExitCode {
    let text = if err.is_described() {
        format!("ERROR {err}\n")
    } else {
        diagnostic(token, err)
    };
    if let Err(write_err) = io.with_stderr(|out| out.write_all(text.as_bytes())) {
        tracing::error!(error = %write_err, "failed to report command failure");
    }
    if err.is_described() {
        ExitCode::from_i32(err.exit_code())
    } else {
        ExitCode::GeneralError
    }
}

/// Full diagnostic for errors that carry no user-facing text
fn diagnostic(token: &str, err: &Error) -> String {
    let mut out = format!("Unhandled error while running '{token}': {err}\n");
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        out.push_str(&format!("Caused by: {cause}\n"));
        source = cause.source();
    }
    out.push_str(&format!("Details: {err:?}\n"));
    out.push_str(&format!("Backtrace:\n{}\n", Backtrace::force_capture()));
    out
}

/// Write a setup-phase error as a single line
fn report_setup(io: &IoManager, err: &Error) -> ExitCode {
    let text = format!("{err}\n");
    if let Err(write_err) = io.with_stderr(|out| out.write_all(text.as_bytes())) {
        tracing::error!(error = %write_err, "failed to report setup failure");
    }
    ExitCode::GeneralError
}

/// Parse the main options
///
/// Help and version output is written here; `Err` carries the exit code to
/// stop with.
fn parse_main(
    registry: &CommandRegistry,
    io: &IoManager,
    args: &[String],
) -> std::result::Result<Cli, ExitCode> {
    let argv = std::iter::once("swiftly".to_string()).chain(args.iter().cloned());
    let parsed = main_command(registry)
        .try_get_matches_from(argv)
        .and_then(|matches| Cli::from_arg_matches(&matches));
    match parsed {
        Ok(cli) => Ok(cli),
        Err(err) => {
            let text = err.render().to_string();
            let (result, code) = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    (io.with_stdout(|out| out.write_all(text.as_bytes())), ExitCode::Success)
                }
                _ => (
                    io.with_stderr(|out| out.write_all(text.as_bytes())),
                    ExitCode::GeneralError,
                ),
            };
            if let Err(write_err) = result {
                tracing::error!(error = %write_err, "failed to write usage output");
            }
            Err(code)
        }
    }
}

/// Run one invocation of the CLI
///
/// `args` excludes the program name. Sources are passed in explicitly so
/// callers control the environment and the standard streams.
pub async fn run(args: Vec<String>, env: Environment, io: IoManager) -> ExitCode {
    let begin = Instant::now();
    let registry = match CommandRegistry::new(&COMMANDS) {
        Ok(registry) => registry,
        Err(err) => return report(&io, "", &err),
    };
    run_with_registry(begin, args, env, io, registry).await
}

/// [`run`] against a caller-supplied registry
pub async fn run_with_registry(
    begin: Instant,
    args: Vec<String>,
    env: Environment,
    io: IoManager,
    registry: CommandRegistry,
) -> ExitCode {
    let cli = match parse_main(&registry, &io, &args) {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    if cli.args.is_empty() {
        let help = main_command(&registry).render_help().to_string();
        if let Err(err) = io.with_stdout(|out| out.write_all(help.as_bytes())) {
            tracing::error!(error = %err, "failed to write help");
        }
        return ExitCode::GeneralError;
    }

    let context = match setup(begin, &cli, &env, io.clone()) {
        Ok(context) => context,
        Err(err) if err.is_described() => return report(&io, &cli.args[0], &err),
        Err(err @ (Error::Resolution { .. } | Error::MissingAuthUrl)) => {
            return report_setup(&io, &err);
        }
        Err(err) => return report(&io, &cli.args[0], &err),
    };

    Controller::new(context, registry).perform(&cli.args).await
}

/// Resolve options and build the execution context
fn setup(
    begin: Instant,
    cli: &Cli,
    env: &Environment,
    io: IoManager,
) -> Result<ExecutionContext> {
    let conf_path = resolve_conf_path(cli.conf.as_deref(), env);
    let store = ConfigStore::load(&conf_path);
    let options = OptionResolver::new(env, &store).resolve(&cli.command_line_values())?;

    let runtime = capability::detect();
    let cooperative = cooperative_mode(
        options.flag(OptionName::Eventlet),
        options.flag(OptionName::NoEventlet),
        runtime.as_ref(),
    );
    tracing::debug!(runtime = runtime.name(), cooperative, "cooperative mode");
    let io = io.with_spawner(spawner_for(cooperative, runtime.as_ref()));

    let context = ExecutionContext::new(begin, io)
        .with_verbosity(options.verbosity())
        .with_concurrency(options.concurrency())
        .with_cdn(options.flag(OptionName::Cdn))
        .with_cooperative(cooperative);
    context.emit(
        EmitScope::Controller,
        "conf {} ({})",
        &[&conf_path.display(), &if store.is_empty() { "empty" } else { "loaded" }],
    )?;

    if canonical_name(&cli.args[0]) == HELP_COMMAND {
        return Ok(context);
    }

    let selection = select_backend(&options, cooperative, &SelectorEnv::from_environment(env))?;
    context.emit(EmitScope::Controller, "backend {}", &[&selection.summary()])?;
    let client = swiftly_client::connect(&selection, context.verbose_logger().cloned())?;
    Ok(context.with_client(client))
}

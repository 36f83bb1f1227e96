//! get command - Output the contents of an account, container or object
//!
//! The body goes to stdout by default. `-o PATH` writes it to a file instead
//! and `-o "|command"` pipes it through a subprocess whose output is written
//! to stdout.

use async_trait::async_trait;
use clap::Parser;

use swiftly_core::{Error, ExecutionContext, Method, Request, Result};

use super::{parse_args, request, schema_for, write_headers};
use crate::controller::Controller;
use crate::registry::{Command, CommandDescriptor};

/// Arguments of the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Write the contents to PATH, or pipe them into a command given as
    /// "|command"
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<String>,

    /// Output the response headers before the contents
    #[arg(long)]
    pub headers: bool,

    /// Container or container/object; the account when omitted
    pub path: Option<String>,
}

pub struct GetCommand;

#[async_trait]
impl Command for GetCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "get",
            usage: "get [options] [path]",
            about: "Outputs the resulting contents from a GET request of the \
                    [path] given. If no [path] is given, a GET request on the \
                    account is performed.",
        }
    }

    fn schema(&self) -> clap::Command {
        schema_for::<GetArgs>(self.descriptor())
    }

    async fn invoke(&self, controller: &Controller, args: Vec<String>) -> Result<()> {
        let context = controller.context();
        let Some(args) = parse_args::<GetArgs>(self, context, &args)? else {
            return Ok(());
        };

        let path = args.path.unwrap_or_default();
        let response = request(context, Request::new(Method::Get, path)).await?;
        if args.headers {
            write_headers(context, &response.headers)?;
            context.io.with_stdout(|out| out.write_all(b"\n"))?;
        }
        write_body(context, args.output.as_deref(), response.body).await
    }
}

async fn write_body(context: &ExecutionContext, output: Option<&str>, body: Vec<u8>) -> Result<()> {
    match output {
        None => {
            context.io.with_stdout(|out| out.write_all(&body))?;
        }
        Some(target) => match target.strip_prefix('|') {
            Some(command_line) => {
                context.verbose("piping through {}", &[&command_line.trim()])?;
                let output = context.io.spawner().pipe(command_line.trim(), body).await?;
                context.io.with_stdout(|out| out.write_all(&output.stdout))?;
                if !output.status.success() {
                    return Err(Error::command(format!(
                        "{:?} exited with {}",
                        command_line.trim(),
                        output.status
                    )));
                }
            }
            None => {
                context.verbose("writing {} bytes to {}", &[&body.len(), &target])?;
                tokio::fs::write(target, &body).await?;
            }
        },
    }
    Ok(())
}

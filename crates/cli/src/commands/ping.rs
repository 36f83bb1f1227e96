//! ping command - Check that the backend answers

use std::time::Instant;

use async_trait::async_trait;
use clap::Parser;

use swiftly_core::{Method, Request, Result};

use super::{parse_args, request, schema_for};
use crate::controller::Controller;
use crate::registry::{Command, CommandDescriptor};

/// Arguments of the ping command
#[derive(Parser, Debug)]
pub struct PingArgs {}

pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "ping",
            usage: "ping [options]",
            about: "Issues a HEAD request on the account and reports how long \
                    the backend took to answer.",
        }
    }

    fn schema(&self) -> clap::Command {
        schema_for::<PingArgs>(self.descriptor())
    }

    async fn invoke(&self, controller: &Controller, args: Vec<String>) -> Result<()> {
        let context = controller.context();
        let Some(PingArgs {}) = parse_args::<PingArgs>(self, context, &args)? else {
            return Ok(());
        };

        let begin = Instant::now();
        let response = request(context, Request::new(Method::Head, "")).await?;
        let elapsed = begin.elapsed().as_secs_f64();
        context.io.with_stdout(|out| {
            writeln!(
                out,
                "{} {} {:.3}s",
                response.status, response.reason, elapsed
            )
        })?;
        Ok(())
    }
}

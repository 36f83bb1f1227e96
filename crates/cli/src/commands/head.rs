//! head command - Show the headers of an account, container or object

use async_trait::async_trait;
use clap::Parser;

use swiftly_core::{Method, Request, Result};

use super::{parse_args, request, schema_for, write_headers};
use crate::controller::Controller;
use crate::registry::{Command, CommandDescriptor};

/// Arguments of the head command
#[derive(Parser, Debug)]
pub struct HeadArgs {
    /// Container or container/object; the account when omitted
    pub path: Option<String>,
}

pub struct HeadCommand;

#[async_trait]
impl Command for HeadCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "head",
            usage: "head [options] [path]",
            about: "Outputs the resulting headers from a HEAD request of the \
                    [path] given. If no [path] is given, a HEAD request on the \
                    account is performed.",
        }
    }

    fn schema(&self) -> clap::Command {
        schema_for::<HeadArgs>(self.descriptor())
    }

    async fn invoke(&self, controller: &Controller, args: Vec<String>) -> Result<()> {
        let context = controller.context();
        let Some(args) = parse_args::<HeadArgs>(self, context, &args)? else {
            return Ok(());
        };

        let path = args.path.unwrap_or_default();
        let response = request(context, Request::new(Method::Head, path)).await?;
        write_headers(context, &response.headers)
    }
}

//! post command - Update the metadata of an account, container or object

use async_trait::async_trait;
use clap::{ArgAction, Parser};

use swiftly_core::{Method, Request, Result};

use super::{parse_args, parse_headers, request, schema_for};
use crate::controller::Controller;
use crate::registry::{Command, CommandDescriptor};

/// Arguments of the post command
#[derive(Parser, Debug)]
#[command(disable_help_flag = true)]
pub struct PostArgs {
    /// Add a header to the request; may be given more than once
    #[arg(short = 'h', long = "header", value_name = "NAME:VALUE")]
    pub headers: Vec<String>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Container or container/object; the account when omitted
    pub path: Option<String>,
}

pub struct PostCommand;

#[async_trait]
impl Command for PostCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "post",
            usage: "post [options] [path]",
            about: "Issues a POST request of the [path] given. If no [path] is \
                    given, a POST request on the account is performed.",
        }
    }

    fn schema(&self) -> clap::Command {
        schema_for::<PostArgs>(self.descriptor())
    }

    async fn invoke(&self, controller: &Controller, args: Vec<String>) -> Result<()> {
        let context = controller.context();
        let Some(args) = parse_args::<PostArgs>(self, context, &args)? else {
            return Ok(());
        };

        let mut post = Request::new(Method::Post, args.path.unwrap_or_default());
        for (name, value) in parse_headers(&args.headers)? {
            post = post.header(&name, value);
        }
        request(context, post).await?;
        Ok(())
    }
}

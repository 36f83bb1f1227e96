//! put command - Create a container or upload an object

use std::path::PathBuf;

use async_trait::async_trait;
use clap::{ArgAction, Parser};

use swiftly_core::{Method, Request, Result};

use super::{parse_args, parse_headers, request, schema_for};
use crate::controller::Controller;
use crate::registry::{Command, CommandDescriptor};

/// Arguments of the put command
#[derive(Parser, Debug)]
#[command(disable_help_flag = true)]
pub struct PutArgs {
    /// Read the object contents from PATH instead of standard input
    #[arg(short = 'i', long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Add a header to the request; may be given more than once
    #[arg(short = 'h', long = "header", value_name = "NAME:VALUE")]
    pub headers: Vec<String>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Container or container/object
    pub path: String,
}

pub struct PutCommand;

#[async_trait]
impl Command for PutCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "put",
            usage: "put [options] <path>",
            about: "Performs a PUT request on the <path> given. If the <path> \
                    is a container, the container will be created. If the \
                    <path> is an object, the object will be created with the \
                    contents of standard input or the --input file.",
        }
    }

    fn schema(&self) -> clap::Command {
        schema_for::<PutArgs>(self.descriptor())
    }

    async fn invoke(&self, controller: &Controller, args: Vec<String>) -> Result<()> {
        let context = controller.context();
        let Some(args) = parse_args::<PutArgs>(self, context, &args)? else {
            return Ok(());
        };

        let mut put = Request::new(Method::Put, args.path);
        for (name, value) in parse_headers(&args.headers)? {
            put = put.header(&name, value);
        }
        if put.path.contains('/') {
            let body = match &args.input {
                Some(input) => tokio::fs::read(input).await?,
                None => context.io.read_stdin()?,
            };
            put = put.body(body);
        }
        request(context, put).await?;
        Ok(())
    }
}

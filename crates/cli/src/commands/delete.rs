//! delete command - Remove a container or object

use async_trait::async_trait;
use clap::Parser;

use swiftly_core::{Error, Method, Request, Result};

use super::{parse_args, request, schema_for};
use crate::controller::Controller;
use crate::registry::{Command, CommandDescriptor};

/// Arguments of the delete command
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Required to issue a DELETE against the account itself
    #[arg(long)]
    pub yes_i_mean_delete_the_account: bool,

    /// Container or container/object
    pub path: Option<String>,
}

pub struct DeleteCommand;

#[async_trait]
impl Command for DeleteCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "delete",
            usage: "delete [options] [path]",
            about: "Issues a DELETE request of the [path] given. Deleting the \
                    account itself requires --yes-i-mean-delete-the-account.",
        }
    }

    fn schema(&self) -> clap::Command {
        schema_for::<DeleteArgs>(self.descriptor())
    }

    async fn invoke(&self, controller: &Controller, args: Vec<String>) -> Result<()> {
        let context = controller.context();
        let Some(args) = parse_args::<DeleteArgs>(self, context, &args)? else {
            return Ok(());
        };

        let path = args.path.unwrap_or_default();
        if path.trim_matches('/').is_empty() && !args.yes_i_mean_delete_the_account {
            return Err(Error::command(
                "Deleting the account requires --yes-i-mean-delete-the-account",
            ));
        }
        request(context, Request::new(Method::Delete, path)).await?;
        Ok(())
    }
}

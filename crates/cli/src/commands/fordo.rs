//! fordo command - Run a command for every item in a listing
//!
//! `for <path> do <command> [args]` lists the account or container at
//! `<path>` and dispatches `<command>` once per item, replacing `<item>` in
//! its arguments. At most `concurrency` sub-commands run at once.

use async_trait::async_trait;
use clap::Parser;
use futures::{StreamExt, stream};

use swiftly_core::{Error, Method, Request, Result};

use super::{parse_args, request, schema_for};
use crate::controller::Controller;
use crate::registry::{Command, CommandDescriptor};

const ITEM_PLACEHOLDER: &str = "<item>";
const DO_KEYWORD: &str = "do";

/// Arguments of the fordo command
#[derive(Parser, Debug)]
pub struct FordoArgs {
    /// Only items starting with PREFIX
    #[arg(long)]
    pub prefix: Option<String>,

    /// Account (empty string) or container to list
    pub path: String,

    /// `do` followed by the command to run and its arguments
    #[arg(
        value_name = "do <command>",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Arguments for one item, with `<item>` replaced
pub fn substitute(template: &[String], item: &str) -> Vec<String> {
    template
        .iter()
        .map(|arg| arg.replace(ITEM_PLACEHOLDER, item))
        .collect()
}

pub struct FordoCommand;

#[async_trait]
impl Command for FordoCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "fordo",
            usage: "for [options] <path> do <command> [command_options] [args]",
            about: "Performs the given command on each item listed by the \
                    <path> given, an account when <path> is empty or a \
                    container otherwise. The string <item> in the command's \
                    arguments is replaced with each item's name. Up to \
                    --concurrency commands are run at the same time.",
        }
    }

    fn schema(&self) -> clap::Command {
        schema_for::<FordoArgs>(self.descriptor())
    }

    async fn invoke(&self, controller: &Controller, args: Vec<String>) -> Result<()> {
        let context = controller.context();
        let Some(args) = parse_args::<FordoArgs>(self, context, &args)? else {
            return Ok(());
        };

        let template = match args.command.split_first() {
            Some((keyword, rest)) if keyword == DO_KEYWORD && !rest.is_empty() => rest.to_vec(),
            _ => {
                return Err(Error::command(
                    "fordo requires \"do <command>\" after the <path>",
                ));
            }
        };

        let response = request(context, Request::new(Method::Get, args.path.as_str())).await?;
        let listing = String::from_utf8_lossy(&response.body);
        let prefix = args.prefix.as_deref().unwrap_or_default();
        let items: Vec<String> = listing
            .lines()
            .filter(|item| !item.is_empty() && item.starts_with(prefix))
            .map(str::to_string)
            .collect();
        context.verbose(
            "for {} items in /{}, concurrency {}",
            &[&items.len(), &args.path, &context.concurrency],
        )?;

        let results: Vec<Result<()>> = stream::iter(items)
            .map(|item| {
                let argv = substitute(&template, &item);
                async move { controller.invoke(&argv).await }
            })
            .buffer_unordered(context.concurrency)
            .collect()
            .await;
        results.into_iter().collect()
    }
}

//! help command - Main help or the help of one command

use async_trait::async_trait;
use clap::Parser;

use swiftly_core::{Error, Result};

use super::{parse_args, schema_for};
use crate::controller::Controller;
use crate::registry::{Command, CommandDescriptor};

/// Arguments of the help command
#[derive(Parser, Debug)]
pub struct HelpArgs {
    /// Command to describe
    pub command: Option<String>,
}

pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "help",
            usage: "help [command]",
            about: "Outputs help information for the given [command] or \
                    general help if no [command] is given.",
        }
    }

    fn schema(&self) -> clap::Command {
        schema_for::<HelpArgs>(self.descriptor())
    }

    async fn invoke(&self, controller: &Controller, args: Vec<String>) -> Result<()> {
        let context = controller.context();
        let Some(args) = parse_args::<HelpArgs>(self, context, &args)? else {
            return Ok(());
        };

        let help = match args.command {
            None => controller.main_help(),
            Some(name) => controller
                .registry()
                .get(&name)
                .ok_or(Error::UnknownCommand(name))?
                .schema()
                .render_help()
                .to_string(),
        };
        context.io.with_stdout(|out| out.write_all(help.as_bytes()))?;
        Ok(())
    }
}

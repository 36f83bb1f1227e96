//! auth command - Show the backend in use
//!
//! Prints the backend kind and its connection parameters. Secrets such as the
//! auth key are never printed.

use async_trait::async_trait;
use clap::Parser;

use swiftly_core::Result;

use super::{parse_args, schema_for, write_pairs};
use crate::controller::Controller;
use crate::registry::{Command, CommandDescriptor};

/// Arguments of the auth command
#[derive(Parser, Debug)]
pub struct AuthArgs {}

pub struct AuthCommand;

#[async_trait]
impl Command for AuthCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "auth",
            usage: "auth",
            about: "Outputs the backend in use and the information it was \
                    configured with, such as the auth URL or local path.",
        }
    }

    fn schema(&self) -> clap::Command {
        schema_for::<AuthArgs>(self.descriptor())
    }

    async fn invoke(&self, controller: &Controller, args: Vec<String>) -> Result<()> {
        let context = controller.context();
        let Some(AuthArgs {}) = parse_args::<AuthArgs>(self, context, &args)? else {
            return Ok(());
        };

        let client = context.client()?;
        let kind = client.kind().to_string();
        let info = client.describe();
        let storage_url = client.storage_url();

        let mut pairs = vec![("Backend", kind.as_str())];
        pairs.extend(info.iter().map(|(name, value)| (name.as_str(), value.as_str())));
        if let Some(url) = &storage_url {
            pairs.push(("Storage URL", url.as_str()));
        }
        write_pairs(context, pairs)
    }
}

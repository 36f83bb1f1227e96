//! Command registry
//!
//! Commands are registered from a static factory table keyed by
//! [`CommandId`]. The registry owns the command objects for the lifetime of
//! the invocation and renders the combined command listing used in the main
//! help text.

use std::collections::BTreeMap;

use async_trait::async_trait;

use swiftly_core::{Error, Result};

use crate::commands;
use crate::controller::Controller;

/// Width of the usage column in the command listing
const LABEL_WIDTH: usize = 24;

/// Width the command descriptions are reflowed to
const HELP_WIDTH: usize = 79;

/// Token accepted in place of `fordo`
const FOR_ALIAS: &str = "for";

/// Name, usage line and description of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub usage: &'static str,
    pub about: &'static str,
}

/// A command the dispatcher can invoke
#[async_trait]
pub trait Command: Send + Sync {
    fn descriptor(&self) -> CommandDescriptor;

    /// Option schema used to parse the command's arguments and render its help
    fn schema(&self) -> clap::Command;

    /// Run the command with the arguments that followed its token
    async fn invoke(&self, controller: &Controller, args: Vec<String>) -> Result<()>;
}

/// Identifier of every built-in command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandId {
    Auth,
    Decrypt,
    Delete,
    Encrypt,
    Fordo,
    Get,
    Head,
    Help,
    Ping,
    Post,
    Put,
    Tempurl,
    Trans,
}

/// The built-in command table
pub const COMMANDS: [CommandId; 13] = [
    CommandId::Auth,
    CommandId::Decrypt,
    CommandId::Delete,
    CommandId::Encrypt,
    CommandId::Fordo,
    CommandId::Get,
    CommandId::Head,
    CommandId::Help,
    CommandId::Ping,
    CommandId::Post,
    CommandId::Put,
    CommandId::Tempurl,
    CommandId::Trans,
];

impl CommandId {
    /// Build the command object for this identifier
    pub fn build(self) -> Box<dyn Command> {
        match self {
            Self::Auth => Box::new(commands::auth::AuthCommand),
            Self::Decrypt => Box::new(commands::crypt::DecryptCommand),
            Self::Delete => Box::new(commands::delete::DeleteCommand),
            Self::Encrypt => Box::new(commands::crypt::EncryptCommand),
            Self::Fordo => Box::new(commands::fordo::FordoCommand),
            Self::Get => Box::new(commands::get::GetCommand),
            Self::Head => Box::new(commands::head::HeadCommand),
            Self::Help => Box::new(commands::help::HelpCommand),
            Self::Ping => Box::new(commands::ping::PingCommand),
            Self::Post => Box::new(commands::post::PostCommand),
            Self::Put => Box::new(commands::put::PutCommand),
            Self::Tempurl => Box::new(commands::tempurl::TempurlCommand),
            Self::Trans => Box::new(commands::trans::TransCommand),
        }
    }
}

/// Map a command token to the registered name
pub fn canonical_name(token: &str) -> &str {
    if token == FOR_ALIAS { "fordo" } else { token }
}

/// Commands available to the dispatcher, keyed by name
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, Box<dyn Command>>,
}

impl CommandRegistry {
    /// Build the registry from the factory table
    pub fn new(ids: &[CommandId]) -> Result<Self> {
        Self::from_commands(ids.iter().map(|id| id.build()))
    }

    /// Build the registry from already constructed commands
    pub fn from_commands(commands: impl IntoIterator<Item = Box<dyn Command>>) -> Result<Self> {
        let mut registry = BTreeMap::new();
        for command in commands {
            let name = command.descriptor().name;
            if registry.insert(name, command).is_some() {
                return Err(Error::General(format!("command '{name}' registered twice")));
            }
        }
        Ok(Self { commands: registry })
    }

    /// Look up a command by token, honoring the `for` alias
    pub fn get(&self, token: &str) -> Option<&dyn Command> {
        self.commands
            .get(canonical_name(token))
            .map(|command| command.as_ref())
    }

    /// Registered names in order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    /// Render the command listing appended to the main help
    pub fn render_help(&self) -> String {
        let mut out = String::from("Commands:\n");
        for command in self.commands.values() {
            let descriptor = command.descriptor();
            out.push_str(&render_entry(descriptor.usage, descriptor.about));
            out.push('\n');
        }
        out
    }
}

fn render_entry(usage: &str, about: &str) -> String {
    let label = format!("  {usage}");
    let indent = " ".repeat(LABEL_WIDTH);
    let about = about.split_whitespace().collect::<Vec<_>>().join(" ");

    let (prefix, initial) = if label.len() < LABEL_WIDTH {
        (String::new(), format!("{label:<LABEL_WIDTH$}"))
    } else {
        (format!("{label}\n"), indent.clone())
    };
    let options = textwrap::Options::new(HELP_WIDTH)
        .initial_indent(&initial)
        .subsequent_indent(&indent);
    format!("{prefix}{}", textwrap::fill(&about, options))
}

//! trans command - Decode the time embedded in a transaction id
//!
//! Transaction ids look like `tx<21 hex chars>-<10 hex chars of unix
//! seconds>[suffix]`.

use async_trait::async_trait;
use clap::Parser;
use jiff::Timestamp;

use swiftly_core::{Error, Result};

use super::{parse_args, schema_for, write_pairs};
use crate::controller::Controller;
use crate::registry::{Command, CommandDescriptor};

const TIME_HEX_LEN: usize = 10;

/// Arguments of the trans command
#[derive(Parser, Debug)]
pub struct TransArgs {
    /// Transaction id, as found in X-Trans-Id response headers
    pub trans_id: String,
}

/// Parts of a transaction id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransId {
    pub seconds: i64,
    pub timestamp: Timestamp,
    pub suffix: String,
}

/// Decode the timestamp and suffix from a transaction id
pub fn parse_trans_id(raw: &str) -> Result<TransId> {
    let invalid = || Error::command(format!("Invalid transaction id {raw:?}"));
    let (_, tail) = raw.split_once('-').ok_or_else(invalid)?;
    let hex_part = tail.get(..TIME_HEX_LEN).ok_or_else(invalid)?;
    let seconds = i64::from_str_radix(hex_part, 16).map_err(|_| invalid())?;
    let timestamp = Timestamp::from_second(seconds).map_err(|_| invalid())?;
    Ok(TransId {
        seconds,
        timestamp,
        suffix: tail[TIME_HEX_LEN..].to_string(),
    })
}

pub struct TransCommand;

#[async_trait]
impl Command for TransCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "trans",
            usage: "trans [options] <trans_id>",
            about: "Outputs information about the transaction id given, such \
                    as when it was created.",
        }
    }

    fn schema(&self) -> clap::Command {
        schema_for::<TransArgs>(self.descriptor())
    }

    async fn invoke(&self, controller: &Controller, args: Vec<String>) -> Result<()> {
        let context = controller.context();
        let Some(args) = parse_args::<TransArgs>(self, context, &args)? else {
            return Ok(());
        };

        let trans = parse_trans_id(&args.trans_id)?;
        let raw = trans.seconds.to_string();
        let utc = trans.timestamp.to_string();
        let mut pairs = vec![
            ("Trans ID", args.trans_id.as_str()),
            ("UTC Raw", raw.as_str()),
            ("UTC", utc.as_str()),
        ];
        if !trans.suffix.is_empty() {
            pairs.push(("Trans Suffix", trans.suffix.as_str()));
        }
        write_pairs(context, pairs)
    }
}

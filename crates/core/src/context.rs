//! Per-invocation execution context
//!
//! Built once by the front controller before any command runs and handed to
//! the dispatched command by reference.

use std::fmt::Display;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::io::{EmitScope, IoManager};
use crate::traits::Client;
use crate::verbose::VerboseLogger;

/// Shared state for one invocation
pub struct ExecutionContext {
    /// When the invocation started
    pub original_begin: Instant,
    pub verbosity: u8,
    /// Upper bound on simultaneous backend operations
    pub concurrency: usize,
    /// Route requests to the CDN management interface
    pub cdn: bool,
    /// Subprocesses go through the async runtime
    pub cooperative: bool,
    pub io: IoManager,
    client: Option<Box<dyn Client>>,
    verbose: Option<VerboseLogger>,
}

impl ExecutionContext {
    /// A context with defaults: quiet, concurrency 1, no backend
    pub fn new(original_begin: Instant, io: IoManager) -> Self {
        Self {
            original_begin,
            verbosity: 0,
            concurrency: 1,
            cdn: false,
            cooperative: false,
            io,
            client: None,
            verbose: None,
        }
    }

    /// Set verbosity and install the verbose logger when it is non-zero
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self.verbose = (verbosity > 0)
            .then(|| VerboseLogger::new(self.original_begin, verbosity, self.io.clone()));
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_cdn(mut self, cdn: bool) -> Self {
        self.cdn = cdn;
        self
    }

    pub fn with_cooperative(mut self, cooperative: bool) -> Self {
        self.cooperative = cooperative;
        self
    }

    pub fn with_client(mut self, client: Box<dyn Client>) -> Self {
        self.client = Some(client);
        self
    }

    /// The backend for this invocation
    ///
    /// Absent only while running `help`, which skips backend construction.
    pub fn client(&self) -> Result<&dyn Client> {
        self.client
            .as_deref()
            .ok_or_else(|| Error::General("no storage backend was configured".into()))
    }

    pub fn verbose_logger(&self) -> Option<&VerboseLogger> {
        self.verbose.as_ref()
    }

    /// Emit a command-scope verbose line
    pub fn verbose(&self, template: &str, args: &[&dyn Display]) -> Result<()> {
        self.emit(EmitScope::Command, template, args)
    }

    /// Emit a verbose line in `scope`; a no-op when verbosity is off
    pub fn emit(&self, scope: EmitScope, template: &str, args: &[&dyn Display]) -> Result<()> {
        match &self.verbose {
            Some(logger) => logger.emit(scope, template, args),
            None => Ok(()),
        }
    }
}

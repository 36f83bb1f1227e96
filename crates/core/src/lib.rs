//! swiftly-core: Core library for the swiftly object-storage client
//!
//! This crate provides the front controller's building blocks:
//! - Main option resolution (command line, environment, config file, default)
//! - The configuration file store
//! - Backend selection
//! - The execution context, IO manager and verbose logger
//! - The Client trait implemented by the storage backends
//!
//! It does not speak any storage protocol itself.

pub mod backend;
pub mod capability;
pub mod config;
pub mod context;
pub mod error;
pub mod io;
pub mod options;
pub mod traits;
pub mod verbose;

pub use backend::{select_backend, BackendSelection, SelectorEnv, StandardParams};
pub use capability::{cooperative_mode, spawner_for, CooperativeRuntime, NoRuntime, TokioRuntime};
pub use config::{resolve_conf_path, ConfigStore};
pub use context::ExecutionContext;
pub use error::{Error, Result};
pub use io::{Captured, EmitScope, IoManager, SharedBuffer, Spawner};
pub use options::{
    CommandLineValues, Environment, OptionName, OptionResolver, OptionValue, ResolvedOptions,
    Source,
};
pub use traits::{send_with_retries, BackendKind, Client, Method, Request, Response};
pub use verbose::VerboseLogger;

//! swiftly-client: Storage backends for the swiftly client
//!
//! This crate turns a [`BackendSelection`] into a [`Client`]. The local
//! backend simulates an account on the filesystem; the direct and standard
//! backends carry their full parameter sets but do not bundle a wire
//! transport.

pub mod direct;
pub mod local;
pub mod standard;

use swiftly_core::{BackendSelection, Client, Result, VerboseLogger};

pub use direct::DirectClient;
pub use local::LocalClient;
pub use standard::StandardClient;

/// Construct the client for `selection`
pub fn connect(
    selection: &BackendSelection,
    verbose: Option<VerboseLogger>,
) -> Result<Box<dyn Client>> {
    tracing::debug!(backend = %selection.summary(), "constructing client");
    let client: Box<dyn Client> = match selection {
        BackendSelection::Local { path } => Box::new(LocalClient::new(path.clone(), verbose)),
        BackendSelection::Direct {
            account_path,
            object_ring,
            attempts,
            cooperative,
        } => Box::new(DirectClient::new(
            account_path.clone(),
            object_ring.clone(),
            *attempts,
            *cooperative,
        )),
        BackendSelection::Standard(params) => Box::new(StandardClient::new(params.clone())),
    };
    Ok(client)
}

//! swiftly CLI library
//!
//! This module exports the CLI components for use in integration tests.

pub mod commands;
pub mod controller;
pub mod exit_code;
pub mod registry;

//! Configuration shared by the scorer service and its tests.
//!
//! Exposes runtime environment detection, hierarchical configuration loading and the typed
//! configuration structures deserialized from `configuration/` files.

// The `config` crate from crates.io is imported as `rust-cli-config` to avoid clashing with
// this crate's name.
extern crate rust_cli_config as config;

mod environment;
mod load;
pub mod shared;

pub use environment::*;
pub use load::*;

//! External data sources that work items are fetched from.
//!
//! This module provides the [`DataStore`] and [`Connection`] traits, the minimal capability the
//! fetch stage needs from a store, together with an in-memory store for tests and a Postgres
//! store for real runs.

mod base;
pub mod memory;
pub mod postgres;

pub use base::{Connection, DataStore, Row, Value};

//! Concurrency utilities for coordinating workers.
//!
//! The [`shutdown`] module implements a broadcast-based stop signal: a single
//! [`shutdown::ShutdownTx`] stops every worker of a run at its next claim, after the item it is
//! working on has been written.

pub mod shutdown;

//! Utilities for testing runs without a database.
//!
//! [`fetcher::ScriptedFetcher`] decides per item whether it is found, absent or failing,
//! [`sink::TestSinkWrapper`] records and optionally fails appends, and [`logs::ErrorLogCapture`]
//! captures error events so tests can count how often each item was reported.

pub mod fetcher;
pub mod logs;
pub mod notify;
pub mod sink;

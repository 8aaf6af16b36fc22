use std::fmt;
use std::future::Future;

use crate::error::FanoutResult;

/// Single value exchanged with a [`DataStore`], either as a query parameter or a row cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Text(value) => write!(f, "{value}"),
        }
    }
}

/// Row returned by [`Connection::execute`], with cells in select-list order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Open connection to an external [`DataStore`].
///
/// A connection is owned by exactly one caller for the duration of a single fetch. Callers must
/// [`Connection::close`] it on every path; implementations also release their resources on drop
/// so that a cancelled fetch cannot leak a connection.
pub trait Connection: Send {
    /// Runs `query` with positional `params` and returns all resulting rows.
    fn execute(
        &mut self,
        query: &str,
        params: &[Value],
    ) -> impl Future<Output = FanoutResult<Vec<Row>>> + Send;

    /// Closes the connection, consuming it.
    fn close(self) -> impl Future<Output = FanoutResult<()>> + Send;
}

/// External data source that items are fetched from.
///
/// [`DataStore`] is the minimal capability the fetch stage needs: open a connection, run a query
/// on it, close it. Connection pooling is deliberately not part of this contract.
pub trait DataStore: Send + Sync {
    type Connection: Connection;

    /// Returns the name of the store, used in logs.
    fn name() -> &'static str;

    /// Opens a new connection.
    fn connect(&self) -> impl Future<Output = FanoutResult<Self::Connection>> + Send;
}

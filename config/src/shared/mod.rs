mod base;
mod connection;
mod input;
mod log;
mod query;
mod scorer;
mod sink;
mod workers;

pub use base::*;
pub use connection::*;
pub use input::*;
pub use log::*;
pub use query::*;
pub use scorer::*;
pub use sink::*;
pub use workers::*;

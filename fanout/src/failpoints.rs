//! Named fault injection points used by the failpoints test suite.
//!
//! Without the `failpoints` feature every point compiles to a no-op. When a point is configured
//! with `return`, its optional argument is a `;`-separated list of item ids to fail; without an
//! argument every item fails.

use fail::fail_point;

use crate::error::FanoutResult;
use crate::types::WorkItem;

pub const FETCH_ITEM: &str = "fanout.fetch_item";
pub const PROCESS_ITEM: &str = "fanout.process_item";
pub const WRITE_RESULT: &str = "fanout.write_result";
/// Makes [`crate::sink::csv::CsvFileSink`] write half of the next row and then fail.
pub const CSV_WRITE: &str = "fanout.csv_write";

#[allow(unused_variables)]
pub fn fanout_fail_point(name: &str, item: WorkItem) -> FanoutResult<()> {
    fail_point!(name, |parameter: Option<String>| {
        let targeted = parameter.as_deref().is_none_or(|ids| {
            ids.split(';')
                .any(|id| id.trim().parse::<i64>().ok() == Some(item.id()))
        });

        if targeted {
            crate::bail!(
                crate::error::ErrorKind::InjectedFailure,
                "An error occurred in a fail point",
                format!("The failpoint '{name}' returned an error for item {item}")
            );
        }

        Ok(())
    });

    Ok(())
}

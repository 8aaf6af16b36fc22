use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Error event captured by [`ErrorLogCapture`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedError {
    pub item_id: Option<i64>,
    pub message: String,
    pub error: Option<String>,
}

#[derive(Default)]
struct CapturedErrorVisitor(CapturedError);

impl Visit for CapturedErrorVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        if field.name() == "item_id" {
            self.0.item_id = Some(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.0.message = value.to_string(),
            "error" => self.0.error = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.0.message = format!("{value:?}"),
            "error" => self.0.error = Some(format!("{value:?}")),
            _ => {}
        }
    }
}

/// [`Layer`] recording every `ERROR` event.
///
/// Install it with [`tracing::subscriber::set_default`] on a current-thread runtime so that
/// events of spawned workers reach it.
#[derive(Debug, Clone, Default)]
pub struct ErrorLogCapture {
    events: Arc<Mutex<Vec<CapturedError>>>,
}

impl ErrorLogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every captured error event in emission order.
    pub fn events(&self) -> Vec<CapturedError> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Returns the number of error events referencing `item_id`.
    pub fn count_for_item(&self, item_id: i64) -> usize {
        self.events()
            .iter()
            .filter(|event| event.item_id == Some(item_id))
            .count()
    }
}

impl<S> Layer<S> for ErrorLogCapture
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::ERROR {
            return;
        }

        let mut visitor = CapturedErrorVisitor::default();
        event.record(&mut visitor);

        if let Ok(mut events) = self.events.lock() {
            events.push(visitor.0);
        }
    }
}

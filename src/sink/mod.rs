//! Presentation side of a harvest run.
//!
//! The engine reports through [`PresentationSink`]: one call per newly
//! inserted record, one call with the whole batch when the run ends, and
//! free-form status lines in between.

mod console;
mod events;

pub use console::ConsoleSink;
pub use events::{EventSink, HarvestEvent};

use crate::domain::Record;

/// Receiver of harvest progress. All methods default to no-ops.
pub trait PresentationSink: Send {
    /// Called once per newly inserted record, in insertion order.
    fn on_incremental_record(&mut self, _record: &Record) {}

    /// Called once when the run ends, with every record collected.
    fn on_batch_complete(&mut self, _records: &[Record]) {}

    /// Human-readable progress text.
    fn on_status(&mut self, _text: &str) {}
}

use tokio::sync::mpsc;

use crate::domain::Record;
use crate::sink::PresentationSink;

/// Harvest progress as a message for UI subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    Record(Record),
    Batch(Vec<Record>),
    Status(String),
}

/// Forwards sink calls over a channel. A closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<HarvestEvent>,
}

impl EventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HarvestEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PresentationSink for EventSink {
    fn on_incremental_record(&mut self, record: &Record) {
        let _ = self.tx.send(HarvestEvent::Record(record.clone()));
    }

    fn on_batch_complete(&mut self, records: &[Record]) {
        let _ = self.tx.send(HarvestEvent::Batch(records.to_vec()));
    }

    fn on_status(&mut self, text: &str) {
        let _ = self.tx.send(HarvestEvent::Status(text.to_string()));
    }
}

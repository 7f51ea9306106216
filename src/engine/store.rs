use std::collections::HashSet;

use crate::domain::Record;

/// Append-only record list keyed by job id.
///
/// A job id is accepted once per store; records are kept in discovery order
/// and never changed after insertion.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    seen: HashSet<String>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` unless its job id is already present.
    pub fn insert(&mut self, record: Record) -> bool {
        if !self.seen.insert(record.job_id.clone()) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.seen.contains(job_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn last(&self) -> Option<&Record> {
        self.records.last()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

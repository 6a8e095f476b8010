//! Audit sink boundary.
//!
//! The contract is narrow: `emit` is synchronous and must succeed before the
//! mutation that produced the record is acknowledged. Implementations may
//! forward to a log pipeline, a database table, or an external collector.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::AuditRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Emit failed due to internal lock poisoning.
    #[error("audit sink lock poisoned")]
    Poisoned,
}

/// Where audit records go.
pub trait AuditSink: Send + Sync {
    fn emit(&self, record: AuditRecord) -> Result<(), SinkError>;
}

impl<S> AuditSink for Arc<S>
where
    S: AuditSink + ?Sized,
{
    fn emit(&self, record: AuditRecord) -> Result<(), SinkError> {
        (**self).emit(record)
    }
}

/// In-memory recording sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far, in emission order.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, record: AuditRecord) -> Result<(), SinkError> {
        let mut records = self.records.lock().map_err(|_| SinkError::Poisoned)?;
        records.push(record);
        Ok(())
    }
}

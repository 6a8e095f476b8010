//! `fieldserv-audit` — audit record model and the sink boundary.
//!
//! Every successful administrative mutation emits exactly one record,
//! synchronously, before success is acknowledged to the caller. The sink's
//! storage and retention are out of scope; this crate only defines the
//! contract and an in-memory implementation for tests/dev.

pub mod record;
pub mod sink;

pub use record::{AuditAction, AuditRecord};
pub use sink::{AuditSink, InMemoryAuditSink, SinkError};

//! Persistence port for the TestKeel engine.
//!
//! Two narrow capabilities, each with a filesystem backend and an
//! in-memory backend for tests and ephemeral workers:
//! - [`RecordLog`]: append-only JSON-lines log of execution records.
//!   Appends are serialized through a single writer; reads are eventually
//!   consistent.
//! - [`ImageStore`]: PNG blobs keyed by name (baselines, diff artifacts).
//!   Concurrent writes to the same name are last-writer-wins.

pub mod errors;
pub mod images;
pub mod records;

pub use errors::StoreError;
pub use images::{FsImageStore, ImageStore, MemoryImageStore};
pub use records::{FsRecordLog, MemoryRecordLog, RecordLog};

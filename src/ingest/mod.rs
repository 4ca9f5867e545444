//! Upload ingestion: archive → CSV members → validated records → store
//!
//! ## Flow
//!
//! `Received → Staged → Extracted → {Parsed → Validated} (per member) → Inserted → Aggregated → Responded`
//!
//! Every member is parsed and validated before anything is written, and all
//! batches of one upload go through a single store transaction. A failure at
//! any stage ends the request; nothing is retried.

pub mod archive;
pub mod csv_parser;
pub mod pipeline;
pub mod record;

pub use archive::{ArchiveError, CsvMember};
pub use pipeline::{ingest_upload, IngestError, IngestStage};
pub use record::{ParseError, Record};

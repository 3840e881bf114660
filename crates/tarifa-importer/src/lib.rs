//! Destination rate import pipeline
//!
//! Wires the collaborators of an import run together:
//!
//! - [`csv_parser`]: lazy decoding of the uploaded file
//! - [`service`]: the run itself (load, validate, build, write, reload)
//! - [`status`]: exactly-once status bookkeeping
//! - [`emitter`]: post-commit entity-created events
//! - [`intake`]: per-job entry point with request-id scoped logging
//! - [`store`]: local file storage of uploaded rate files

pub mod csv_parser;
pub mod emitter;
pub mod intake;
pub mod service;
pub mod status;
pub mod store;

pub use csv_parser::{CsvParser, CsvRows};
pub use emitter::EventEmitter;
pub use intake::JobIntake;
pub use service::{parse_rows, ImportSummary, RateImportService};
pub use status::RunGuard;
pub use store::LocalFileStore;

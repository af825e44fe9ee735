//! Modem diagnostic log collection.
//!
//! The pipeline pauses the diag logging daemon, gathers its newest logs and
//! the auxiliary radio logs into a staging directory, archives the result
//! and streams the archive into the caller's modem channel.
//!
//! ```text
//! gate ─► info commands ─► mkdir staging ─► smlog | diag stop+scan | none
//!      ─► aux logs ─► restore diag ─► archive ─► stream ─► cleanup
//! ```

pub mod aggregator;
pub mod archive;
pub mod diag_logger;
pub mod pipeline;
pub mod scanner;

pub use aggregator::{AggregateReport, LogAggregator};
pub use archive::{ArchiveReport, ArchiveStreamer, CleanupReport};
pub use diag_logger::{Clock, DiagLoggerController, DiagLoggerState, QuiesceOutcome, StopReport, SystemClock};
pub use pipeline::{CollectionBranch, GateDecision, ModemDumpReport, ModemLogPipeline, TitledStatus};
pub use scanner::{select_diag_logs, RetentionFilteringScanner, RetentionPolicy, ScanReport, Selection};

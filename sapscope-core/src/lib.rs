//! # sapscope-core
//!
//! Core library for sapscope - a batch classifier for Super Auto Pets
//! win screenshots.
//!
//! This library provides:
//! - The packed-result protocol codec (both wire revisions)
//! - The arena bridge over the external image-recognition oracle
//! - A durable per-file result cache for idempotent, incremental runs
//! - The sequential classification pipeline
//! - The aggregation engine deriving all reported statistics
//! - Configuration, logging, and the remote log sink
//!
//! ## Architecture
//!
//! Data flows one way:
//!
//! ```text
//! FileSource ──► ClassificationPipeline ──► ResultCache (durable)
//!                      │        ▲                │
//!                      ▼        │                ▼
//!                 ArenaBridge ──┘           WinStats (derived)
//!                 (oracle module)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use sapscope_core::cache::ResultCache;
//! use sapscope_core::oracle::{ArenaBridge, BuiltinOracle};
//! use sapscope_core::pipeline::ClassificationPipeline;
//! use sapscope_core::sink::RemoteSink;
//! use sapscope_core::source::DirSource;
//! use sapscope_core::stats::WinStats;
//! use sapscope_core::Config;
//!
//! # fn main() -> sapscope_core::Result<()> {
//! let config = Config::load()?;
//! let mut cache = ResultCache::load(&Config::cache_path());
//! let mut bridge = ArenaBridge::new(
//!     Box::new(BuiltinOracle::new(config.oracle.max_pages)),
//!     config.oracle.max_pages,
//! )?;
//! let sink = RemoteSink::disabled();
//!
//! let source = DirSource::new("/path/to/screenshots");
//! let report = ClassificationPipeline::new(&mut bridge, &mut cache, &sink)
//!     .run(&source, config.scan.min_date)?;
//! let stats = WinStats::from_results(&report.results);
//! println!("total wins: {}", stats.total_wins);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use codec::{Outcome, Protocol};
pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{ClassificationPipeline, ScanReport, ScanSummary};
pub use types::ScreenshotResult;

// Public modules
pub mod cache;
pub mod codec;
pub mod config;
pub mod datekey;
pub mod error;
pub mod logging;
pub mod oracle;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod stats;
pub mod types;

//! # blocklog
//!
//! Concurrent fixed-record-size append log backed by a single file.
//!
//! This crate provides:
//! - Lock-free slot allocation for any number of producers and consumers
//! - Serialized positioned I/O against one shared file
//! - Blocking reads that wait for the writer responsible for their slot

pub mod config;
pub mod error;
pub mod log;
pub mod stats;

pub use config::BlockLogConfig;
pub use error::BlockLogError;
pub use log::{BlockLogReader, BlockLogWriter, FixedRecordLog};
pub use stats::BlockLogStats;

/// Default block size (4 KiB).
pub const DEFAULT_BLOCK_SIZE: u32 = 4096;

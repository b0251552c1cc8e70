//! Fixed-record-size append log.
//!
//! The log is a flat file of consecutive `block_size` byte blocks with no
//! header and no per-block metadata. Block `n` lives at byte offset
//! `n * block_size`.
//!
//! Writers and readers each claim slots from their own cursor with a
//! compare-exchange loop, so allocation never blocks. The actual file access
//! is serialized under one mutex, and the condition variable paired with that
//! same mutex lets a reader that outran the writers park until its slot has
//! been written.

use crate::config::BlockLogConfig;
use crate::error::BlockLogError;
use crate::stats::{BlockLogStats, StatsCounters};
use bytes::{Bytes, BytesMut};
use parking_lot::{Condvar, Mutex};
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Tracks which write slots have finished their write attempt.
///
/// Slots below `frontier` are all settled. Slots that finished out of order
/// wait in `ahead` until the gap before them closes.
#[derive(Debug, Default)]
struct SettledSlots {
    frontier: u64,
    ahead: BTreeSet<u64>,
}

impl SettledSlots {
    fn settle(&mut self, sequence: u64) {
        if sequence != self.frontier {
            self.ahead.insert(sequence);
            return;
        }
        self.frontier += 1;
        while self.ahead.remove(&self.frontier) {
            self.frontier += 1;
        }
    }

    fn is_settled(&self, sequence: u64) -> bool {
        sequence < self.frontier || self.ahead.contains(&sequence)
    }
}

/// State guarded by the file lock.
struct LogFile {
    file: File,
    settled: SettledSlots,
}

impl LogFile {
    fn write_block(&mut self, offset: u64, block: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(block)
    }

    fn read_block(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)
    }
}

/// Concurrent append log of fixed-size blocks over a single file.
pub struct FixedRecordLog {
    path: PathBuf,
    block_size: u32,
    /// Byte offset of the next write slot.
    write_offset: AtomicU64,
    /// Byte offset of the next read slot.
    read_offset: AtomicU64,
    file: Mutex<LogFile>,
    /// Signalled after every settled write. Always waited on with `file` held.
    data_ready: Condvar,
    stats: StatsCounters,
}

impl FixedRecordLog {
    /// Creates the log file at `path`, truncating any existing content.
    pub fn create(path: impl Into<PathBuf>, block_size: u32) -> Result<Self, BlockLogError> {
        Self::open(BlockLogConfig::new(path).with_block_size(block_size))
    }

    /// Creates a log from a configuration.
    ///
    /// The configuration is validated before the file is touched, so an
    /// invalid block size leaves the filesystem unchanged.
    pub fn open(config: BlockLogConfig) -> Result<Self, BlockLogError> {
        config.validate()?;

        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(&config.path)
            .map_err(|source| BlockLogError::Create {
                path: config.path.clone(),
                source,
            })?;

        tracing::info!(
            "Block log created at {} (block_size={})",
            config.path.display(),
            config.block_size
        );

        Ok(Self {
            path: config.path,
            block_size: config.block_size,
            write_offset: AtomicU64::new(0),
            read_offset: AtomicU64::new(0),
            file: Mutex::new(LogFile {
                file,
                settled: SettledSlots::default(),
            }),
            data_ready: Condvar::new(),
            stats: StatsCounters::default(),
        })
    }

    /// Claims the next slot from `cursor` and returns its byte offset.
    fn allocate(&self, cursor: &AtomicU64) -> u64 {
        let step = u64::from(self.block_size);
        let mut current = cursor.load(Ordering::Acquire);
        loop {
            match cursor.compare_exchange_weak(
                current,
                current + step,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(offset) => return offset,
                Err(actual) => current = actual,
            }
        }
    }

    fn sequence_of(&self, offset: u64) -> u64 {
        offset / u64::from(self.block_size)
    }

    /// Appends one block and returns its sequence number.
    ///
    /// Payloads longer than the block size are truncated. Shorter payloads
    /// are written as-is. If the write fails the slot stays consumed and
    /// becomes a permanent hole.
    pub fn append(&self, data: &[u8]) -> Result<u64, BlockLogError> {
        let offset = self.allocate(&self.write_offset);
        self.write_slot(offset, data)
    }

    fn write_slot(&self, offset: u64, data: &[u8]) -> Result<u64, BlockLogError> {
        let sequence = self.sequence_of(offset);
        let len = data.len().min(self.block_size as usize);
        let block = &data[..len];

        let result = {
            let mut file = self.file.lock();
            let result = file.write_block(offset, block);
            file.settled.settle(sequence);
            // Readers wait on different slots, so all of them must recheck.
            self.data_ready.notify_all();
            result
        };

        match result {
            Ok(()) => {
                self.stats.record_write(len);
                tracing::trace!("Appended block {} ({} bytes)", sequence, len);
                Ok(sequence)
            }
            Err(e) => {
                self.stats.record_write_error();
                tracing::warn!("Write of block {} failed, leaving a hole: {}", sequence, e);
                Err(e.into())
            }
        }
    }

    /// Reads the next unread block, blocking until it has been written.
    ///
    /// Each call claims a distinct slot. There is no timeout: a read of a
    /// slot no writer ever produces blocks forever.
    pub fn read(&self) -> Result<(u64, Bytes), BlockLogError> {
        let offset = self.allocate(&self.read_offset);
        let sequence = self.sequence_of(offset);
        let mut buf = BytesMut::zeroed(self.block_size as usize);

        let mut file = self.file.lock();
        loop {
            if file.settled.is_settled(sequence) {
                match file.read_block(offset, &mut buf) {
                    Ok(()) => break,
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {}
                    Err(e) => return Err(e.into()),
                }
            }
            self.stats.record_wait();
            tracing::debug!("Reader waiting for block {}", sequence);
            self.data_ready.wait(&mut file);
        }
        drop(file);

        self.stats.record_read(buf.len());
        tracing::trace!("Read block {}", sequence);
        Ok((sequence, buf.freeze()))
    }

    /// Number of write slots allocated so far. A racy snapshot.
    pub fn write_cursor(&self) -> u64 {
        self.sequence_of(self.write_offset.load(Ordering::Acquire))
    }

    /// Number of read slots allocated so far. A racy snapshot.
    pub fn read_cursor(&self) -> u64 {
        self.sequence_of(self.read_offset.load(Ordering::Acquire))
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current I/O statistics.
    pub fn stats(&self) -> BlockLogStats {
        self.stats.snapshot()
    }
}

/// Producer handle for appending blocks.
#[derive(Clone)]
pub struct BlockLogWriter {
    log: Arc<FixedRecordLog>,
}

impl BlockLogWriter {
    pub fn new(log: Arc<FixedRecordLog>) -> Self {
        Self { log }
    }

    pub fn append(&self, data: &[u8]) -> Result<u64, BlockLogError> {
        self.log.append(data)
    }

    pub fn write_cursor(&self) -> u64 {
        self.log.write_cursor()
    }

    pub fn block_size(&self) -> u32 {
        self.log.block_size()
    }
}

/// Consumer handle for reading blocks.
#[derive(Clone)]
pub struct BlockLogReader {
    log: Arc<FixedRecordLog>,
}

impl BlockLogReader {
    pub fn new(log: Arc<FixedRecordLog>) -> Self {
        Self { log }
    }

    pub fn read(&self) -> Result<(u64, Bytes), BlockLogError> {
        self.log.read()
    }

    pub fn read_cursor(&self) -> u64 {
        self.log.read_cursor()
    }

    pub fn block_size(&self) -> u32 {
        self.log.block_size()
    }
}

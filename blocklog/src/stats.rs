//! I/O counters for the block log.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of block log I/O statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockLogStats {
    /// Blocks successfully written.
    pub blocks_written: u64,
    /// Payload bytes written, after truncation to the block size.
    pub bytes_written: u64,
    /// Blocks successfully read.
    pub blocks_read: u64,
    /// Bytes returned to readers.
    pub bytes_read: u64,
    /// Writes that failed and left a hole in the log.
    pub write_errors: u64,
    /// Times a reader parked waiting for its slot to be written.
    pub read_waits: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    blocks_written: AtomicU64,
    bytes_written: AtomicU64,
    blocks_read: AtomicU64,
    bytes_read: AtomicU64,
    write_errors: AtomicU64,
    read_waits: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_write(&self, bytes: usize) {
        self.blocks_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self, bytes: usize) {
        self.blocks_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_wait(&self) {
        self.read_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> BlockLogStats {
        BlockLogStats {
            blocks_written: self.blocks_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            blocks_read: self.blocks_read.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            read_waits: self.read_waits.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let counters = StatsCounters::default();
        counters.record_write(4);
        counters.record_write(2);
        counters.record_read(4);
        counters.record_wait();
        counters.record_write_error();

        let stats = counters.snapshot();
        assert_eq!(stats.blocks_written, 2);
        assert_eq!(stats.bytes_written, 6);
        assert_eq!(stats.blocks_read, 1);
        assert_eq!(stats.bytes_read, 4);
        assert_eq!(stats.read_waits, 1);
        assert_eq!(stats.write_errors, 1);
    }
}

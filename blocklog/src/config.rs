//! Block log configuration.

use crate::error::BlockLogError;
use crate::DEFAULT_BLOCK_SIZE;
use std::path::PathBuf;

/// Block log configuration.
#[derive(Debug, Clone)]
pub struct BlockLogConfig {
    /// Path of the backing file. Created, or truncated if it exists.
    pub path: PathBuf,
    /// Size of every block in bytes.
    pub block_size: u32,
}

impl BlockLogConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    /// Checks the configuration without touching the filesystem.
    pub fn validate(&self) -> Result<(), BlockLogError> {
        if self.block_size == 0 {
            return Err(BlockLogError::InvalidConfiguration {
                reason: "block size must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

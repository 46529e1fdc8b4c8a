// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Path to the kernel message device
pub const KMSG_DEVICE_PATH: &str = "/dev/kmsg";

/// Default size of the buffer handed to each read (16 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 1 << 14;

/// Configuration for a single kmsg snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Capacity of the per-read buffer in bytes. A record larger than this is
    /// lost and reported through the snapshot's `truncated` flag.
    pub buffer_size: usize,

    /// Device to read records from
    pub device_path: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            device_path: PathBuf::from(KMSG_DEVICE_PATH),
        }
    }
}

impl FetchConfig {
    /// Create a config reading from `/dev/kmsg` with the given buffer size
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_size == 0 {
            return Err("Buffer size must be at least 1, got 0".to_string());
        }

        if self.device_path.as_os_str().is_empty() {
            return Err("Device path must not be empty".to_string());
        }

        Ok(())
    }

    /// Read from a different device path
    pub fn with_device_path(mut self, device_path: impl Into<PathBuf>) -> Self {
        self.device_path = device_path.into();
        self
    }
}

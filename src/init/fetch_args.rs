// SPDX-License-Identifier: Apache-2.0

use crate::kmsg::config::FetchConfig;
use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;

/// Snapshot options, for embedding in a command line or a config file
#[derive(Debug, Args, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FetchArgs {
    /// Size of the buffer used for each record read, in bytes (default: 16384)
    /// Records larger than this are dropped and reported as truncated.
    #[arg(long, env = "KMSG_BUFFER_SIZE")]
    pub kmsg_buffer_size: Option<usize>,

    /// Kernel message device to read from (default: /dev/kmsg)
    #[arg(long, env = "KMSG_DEVICE_PATH")]
    pub kmsg_device_path: Option<PathBuf>,
}

impl FetchArgs {
    pub fn build_config(&self) -> FetchConfig {
        let mut config = FetchConfig::default();

        if let Some(buffer_size) = self.kmsg_buffer_size {
            config.buffer_size = buffer_size;
        }
        if let Some(device_path) = &self.kmsg_device_path {
            config = config.with_device_path(device_path);
        }

        config
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Record-oriented access to the kernel message device
//!
//! Every read on `/dev/kmsg` returns exactly one record. The syscall result is
//! classified here, once, into a [`ReadOutcome`] so the drain loop never has to
//! inspect errno values.

use crate::kmsg::error::{KmsgError, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use tracing::debug;

/// Result of attempting to read one record
#[derive(Debug)]
pub enum ReadOutcome {
    /// A record of this many bytes was written to the buffer
    Record(usize),
    /// No further records are available right now (EAGAIN or EOF)
    NoData,
    /// The record did not fit in the buffer (EINVAL). The kernel has already
    /// moved past it.
    TooSmall,
    /// Any other read error
    Failed(io::Error),
}

/// A source delivering one record per read
pub trait RecordSource {
    fn read_record(&mut self, buf: &mut [u8]) -> ReadOutcome;
}

/// Non-blocking, read-only handle on a kmsg device. Closed on drop.
#[derive(Debug)]
pub struct KmsgDevice {
    file: File,
}

impl KmsgDevice {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(|source| KmsgError::ResourceUnavailable {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(device_path = %path.display(), "Opened kmsg device");

        Ok(Self { file })
    }
}

impl RecordSource for KmsgDevice {
    fn read_record(&mut self, buf: &mut [u8]) -> ReadOutcome {
        loop {
            return match self.file.read(buf) {
                // EOF only happens on non-device files and ends the snapshot the same way
                Ok(0) => ReadOutcome::NoData,
                Ok(n) => ReadOutcome::Record(n),
                Err(e) => match e.kind() {
                    io::ErrorKind::Interrupted => continue,
                    io::ErrorKind::WouldBlock => ReadOutcome::NoData,
                    _ if e.raw_os_error() == Some(libc::EINVAL) => ReadOutcome::TooSmall,
                    _ => ReadOutcome::Failed(e),
                },
            };
        }
    }
}

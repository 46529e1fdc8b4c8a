// SPDX-License-Identifier: Apache-2.0

//! Linux kernel message (kmsg) snapshots
//!
//! Reads the records currently held in the kernel ring buffer through
//! `/dev/kmsg` and decodes them into [`Message`]s. Each record has the form
//! `priority,sequence,timestamp,flags[,caller];message\n` followed by optional
//! ` KEY=value` device property lines.
//!
//! Only compiled on Linux, as `/dev/kmsg` doesn't exist on other platforms.

pub mod config;
pub mod device;
pub mod error;
pub mod fetch;
pub mod parser;

pub use config::{DEFAULT_BUFFER_SIZE, FetchConfig, KMSG_DEVICE_PATH};
pub use device::{KmsgDevice, ReadOutcome, RecordSource};
pub use error::{KmsgError, Result};
pub use fetch::{Snapshot, dmesg, drain, fetch, fetch_messages, fetch_raw_records, raw_dmesg};
pub use parser::{Facility, Message, Priority, parse_record};

// SPDX-License-Identifier: Apache-2.0

pub mod init;
#[cfg(target_os = "linux")]
pub mod kmsg;

#[cfg(target_os = "linux")]
pub use kmsg::{
    FetchConfig, KmsgError, Message, Snapshot, dmesg, fetch_messages, fetch_raw_records,
    raw_dmesg,
};

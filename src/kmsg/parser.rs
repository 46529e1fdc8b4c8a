// SPDX-License-Identifier: Apache-2.0

//! Decoder for the Linux kernel record format
//!
//! Each read from `/dev/kmsg` returns one record:
//! `priority,sequence,timestamp,flags[,caller][,...];message\n[ KEY=value\n]...`
//!
//! Where:
//! - priority: syslog level in bits 0-2, facility in the higher bits
//! - sequence: kernel record sequence number
//! - timestamp: microseconds since boot
//! - flags: `-` for a complete message, anything else marks a fragment
//! - caller: optional thread or CPU identifier, e.g. `T1` or `C3`
//! - message: the log text
//!
//! Lines following the message that start with a space carry device
//! properties such as ` SUBSYSTEM=pci`.
//!
//! Example: `6,1234,567890123,-;eth0: link up\n`

use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

/// Bits of the raw priority value holding the syslog level
pub const LEVEL_MASK: u64 = 0b111;

/// Syslog severity carried in the low three bits of the priority value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

const PRIORITIES: [Priority; 8] = [
    Priority::Emergency,
    Priority::Alert,
    Priority::Critical,
    Priority::Error,
    Priority::Warning,
    Priority::Notice,
    Priority::Info,
    Priority::Debug,
];

impl Priority {
    /// Bits above the level are ignored, so a full priority value works too
    pub fn from_level(value: u64) -> Self {
        PRIORITIES[(value & LEVEL_MASK) as usize]
    }
}

/// Syslog facility, RFC 5424 section 6.2.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facility {
    Kern,
    User,
    Mail,
    Daemon,
    Auth,
    Syslog,
    Lpr,
    News,
    Uucp,
    Cron,
    Authpriv,
    Ftp,
    Ntp,
    Audit,
    Alert,
    Clock,
    Local(u8),
}

impl Facility {
    /// `None` for codes outside the 0-23 range syslog defines
    pub fn from_code(code: u64) -> Option<Self> {
        use Facility::*;

        let facility = match code {
            0 => Kern,
            1 => User,
            2 => Mail,
            3 => Daemon,
            4 => Auth,
            5 => Syslog,
            6 => Lpr,
            7 => News,
            8 => Uucp,
            9 => Cron,
            10 => Authpriv,
            11 => Ftp,
            12 => Ntp,
            13 => Audit,
            14 => Alert,
            15 => Clock,
            16..=23 => Local((code - 16) as u8),
            _ => return None,
        };
        Some(facility)
    }
}

/// A decoded kernel log record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Syslog level, 0-7
    pub level: u64,
    /// Raw priority value with the level bits cleared
    pub facility: u64,
    /// Kernel record sequence number
    pub sequence: u64,
    /// Microseconds since boot (monotonic, unaffected by NTP)
    pub timestamp_us: i64,
    /// Thread or CPU that emitted the record, empty when the kernel omits it
    pub caller: String,
    /// Whether this record continues an earlier, unterminated message
    pub is_fragment: bool,
    /// The log message content
    pub text: String,
    /// Device properties from continuation lines. Keys keep their leading
    /// space marker, e.g. `" SUBSYSTEM"`.
    pub device_info: HashMap<String, String>,
}

impl Message {
    pub fn priority(&self) -> Priority {
        Priority::from_level(self.level)
    }

    /// Facility number without the level bits, e.g. 1 for `user`
    pub fn facility_code(&self) -> u64 {
        self.facility >> 3
    }

    pub fn facility_kind(&self) -> Option<Facility> {
        Facility::from_code(self.facility_code())
    }

    /// Look up a device property by its bare name, e.g. `"SUBSYSTEM"`
    pub fn device_property(&self, name: &str) -> Option<&str> {
        self.device_info
            .get(&format!(" {}", name))
            .map(String::as_str)
    }
}

/// Decode one raw record.
///
/// Returns `None` when the record lacks the `;` separator or the newline
/// terminating the message text. Numeric prefix fields that fail to parse
/// decode as zero instead of rejecting the record.
pub fn parse_record(data: &[u8]) -> Option<Message> {
    let prefix_end = data.iter().position(|&b| b == b';')?;

    let mut msg = Message::default();
    for (index, field) in data[..prefix_end].split(|&b| b == b',').enumerate() {
        match index {
            0 => {
                let raw: u64 = parse_or_zero(field);
                msg.level = raw & LEVEL_MASK;
                msg.facility = raw & !LEVEL_MASK;
            }
            1 => msg.sequence = parse_or_zero(field),
            2 => msg.timestamp_us = parse_or_zero(field),
            3 => msg.is_fragment = field.first() != Some(&b'-'),
            4 => msg.caller = lossy(field),
            _ => {}
        }
    }

    let text_end = data.iter().position(|&b| b == b'\n')?;
    if text_end <= prefix_end {
        return None;
    }

    msg.text = lossy(&data[prefix_end + 1..text_end]);
    if text_end == data.len() - 1 {
        return Some(msg);
    }

    // The final byte is the record terminator
    for line in data[text_end + 1..data.len() - 1].split(|&b| b == b'\n') {
        if line.first() != Some(&b' ') {
            continue;
        }

        let mut kv = line.split(|&b| b == b'=');
        if let (Some(key), Some(value), None) = (kv.next(), kv.next(), kv.next()) {
            msg.device_info.insert(lossy(key), lossy(value));
        }
    }

    Some(msg)
}

fn parse_or_zero<T: FromStr + Default>(field: &[u8]) -> T {
    std::str::from_utf8(field)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

// SPDX-License-Identifier: Apache-2.0

//! Snapshot of the records currently held in the kernel ring buffer
//!
//! The device is opened non-blocking and drained until the kernel reports that
//! no more records are available. A record too large for the buffer is lost
//! but does not stop the drain; it is reported through [`Snapshot::truncated`].

use crate::kmsg::config::{DEFAULT_BUFFER_SIZE, FetchConfig};
use crate::kmsg::device::{KmsgDevice, ReadOutcome, RecordSource};
use crate::kmsg::error::{KmsgError, Result};
use crate::kmsg::parser::{Message, parse_record};
use tracing::{debug, error, warn};

/// Records collected by one drain of the device
#[derive(Debug)]
pub struct Snapshot<T> {
    /// Records in the order they were read
    pub records: Vec<T>,
    /// At least one record was lost because the buffer was too small
    pub truncated: bool,
    /// Fatal read error that ended the drain early. Records read before the
    /// failure are still present.
    pub error: Option<KmsgError>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            truncated: false,
            error: None,
        }
    }
}

impl<T> Snapshot<T> {
    /// The drain ended normally and no record was truncated
    pub fn is_complete(&self) -> bool {
        !self.truncated && self.error.is_none()
    }

    /// Discard partial results on a read failure, returning the records and
    /// the truncation flag otherwise.
    pub fn into_result(self) -> Result<(Vec<T>, bool)> {
        match self.error {
            Some(e) => Err(e),
            None => Ok((self.records, self.truncated)),
        }
    }
}

/// Read records from `source` until it runs dry or fails.
///
/// Each record is handed to `project`; `None` results are dropped. The buffer
/// is allocated once and reused for every read.
pub fn drain<S, T, F>(source: &mut S, buffer_size: usize, mut project: F) -> Snapshot<T>
where
    S: RecordSource + ?Sized,
    F: FnMut(&[u8]) -> Option<T>,
{
    let mut snapshot = Snapshot::default();
    let mut buf = vec![0u8; buffer_size];
    let mut truncated_count: u64 = 0;
    let mut skipped_count: u64 = 0;

    loop {
        match source.read_record(&mut buf) {
            ReadOutcome::Record(n) => match project(&buf[..n]) {
                Some(record) => snapshot.records.push(record),
                None => {
                    skipped_count += 1;
                    debug!(len = n, "Skipping malformed kmsg record");
                }
            },
            ReadOutcome::TooSmall => {
                truncated_count += 1;
                snapshot.truncated = true;
                warn!(
                    buffer_size,
                    "Kmsg record exceeds read buffer and was dropped. \
                     Retry with a larger buffer size to capture it."
                );
            }
            ReadOutcome::NoData => break,
            ReadOutcome::Failed(e) => {
                error!("Error reading from kmsg: {}", e);
                snapshot.error = Some(KmsgError::ReadFailed(e));
                break;
            }
        }
    }

    debug!(
        records = snapshot.records.len(),
        truncated = truncated_count,
        skipped = skipped_count,
        failed = snapshot.error.is_some(),
        "Kmsg drain finished"
    );

    snapshot
}

/// Open the configured device and drain it through `project`.
///
/// Only an invalid configuration or a failure to open the device returns
/// `Err`. Read failures after the device is open end up in
/// [`Snapshot::error`]. The device is closed before returning.
pub fn fetch<T, F>(config: &FetchConfig, project: F) -> Result<Snapshot<T>>
where
    F: FnMut(&[u8]) -> Option<T>,
{
    config.validate().map_err(KmsgError::Configuration)?;

    let mut device = KmsgDevice::open(&config.device_path)?;
    Ok(drain(&mut device, config.buffer_size, project))
}

/// Decoded messages from `/dev/kmsg`, using `buffer_size` bytes per read.
/// Malformed records are skipped.
pub fn fetch_messages(buffer_size: usize) -> Result<Snapshot<Message>> {
    fetch(&FetchConfig::new(buffer_size), parse_record)
}

/// Raw, undecoded records from `/dev/kmsg`, using `buffer_size` bytes per read
pub fn fetch_raw_records(buffer_size: usize) -> Result<Snapshot<Vec<u8>>> {
    fetch(&FetchConfig::new(buffer_size), |data| Some(data.to_vec()))
}

/// Decoded messages using the default 16 KiB buffer.
/// If the snapshot reports truncation, use [`fetch_messages`] with a larger size.
pub fn dmesg() -> Result<Snapshot<Message>> {
    fetch_messages(DEFAULT_BUFFER_SIZE)
}

/// Raw records using the default 16 KiB buffer
pub fn raw_dmesg() -> Result<Snapshot<Vec<u8>>> {
    fetch_raw_records(DEFAULT_BUFFER_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;
    use tracing_test::traced_test;

    /// Replays a fixed sequence of read results, then reports no data
    struct ScriptedSource {
        script: VecDeque<Step>,
        reads: usize,
    }

    enum Step {
        Record(&'static [u8]),
        TooSmall,
        NoData,
        Fail(io::ErrorKind),
    }

    impl ScriptedSource {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                script: steps.into(),
                reads: 0,
            }
        }
    }

    impl RecordSource for ScriptedSource {
        fn read_record(&mut self, buf: &mut [u8]) -> ReadOutcome {
            self.reads += 1;
            match self.script.pop_front() {
                Some(Step::Record(data)) => {
                    if data.len() > buf.len() {
                        return ReadOutcome::TooSmall;
                    }
                    buf[..data.len()].copy_from_slice(data);
                    ReadOutcome::Record(data.len())
                }
                Some(Step::TooSmall) => ReadOutcome::TooSmall,
                Some(Step::Fail(kind)) => ReadOutcome::Failed(io::Error::from(kind)),
                Some(Step::NoData) | None => ReadOutcome::NoData,
            }
        }
    }

    fn raw(data: &[u8]) -> Option<Vec<u8>> {
        Some(data.to_vec())
    }

    #[test]
    fn test_empty_source() {
        let mut source = ScriptedSource::new(vec![Step::NoData]);
        let snapshot = drain(&mut source, 1024, parse_record);

        assert!(snapshot.records.is_empty());
        assert!(!snapshot.truncated);
        assert!(snapshot.error.is_none());
        assert!(snapshot.is_complete());
        assert_eq!(source.reads, 1);
    }

    #[test]
    fn test_messages_in_read_order() {
        let mut source = ScriptedSource::new(vec![
            Step::Record(b"6,1,100,-;first\n"),
            Step::Record(b"4,2,200,-;second\n"),
            Step::Record(b"3,3,300,-;third\n SUBSYSTEM=usb\n"),
        ]);
        let snapshot = drain(&mut source, 1024, parse_record);

        let texts: Vec<&str> = snapshot.records.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(snapshot.records[2].device_property("SUBSYSTEM"), Some("usb"));
        assert!(snapshot.is_complete());
    }

    #[test]
    fn test_invalid_records_are_skipped() {
        let steps = || {
            vec![
                Step::Record(b"6,1,100,-;valid\n"),
                Step::Record(b"garbage without separator"),
                Step::Record(b"6,2,200,-;no newline"),
                Step::Record(b"6,3,300,-;also valid\n"),
            ]
        };

        let parsed = drain(&mut ScriptedSource::new(steps()), 1024, parse_record);
        let unparsed = drain(&mut ScriptedSource::new(steps()), 1024, raw);

        assert_eq!(unparsed.records.len(), 4);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[1].sequence, 3);
        assert!(!parsed.truncated);
        assert!(parsed.error.is_none());
    }

    #[traced_test]
    #[test]
    fn test_truncation_does_not_stop_drain() {
        let mut source = ScriptedSource::new(vec![
            Step::Record(b"6,1,100,-;before\n"),
            Step::TooSmall,
            Step::Record(b"6,3,300,-;after\n"),
        ]);
        let snapshot = drain(&mut source, 1024, parse_record);

        assert_eq!(snapshot.records.len(), 2);
        assert!(snapshot.truncated);
        assert!(snapshot.error.is_none());
        assert!(!snapshot.is_complete());
        assert!(logs_contain("exceeds read buffer"));
    }

    #[test]
    fn test_small_buffer_truncates_large_records() {
        let mut source = ScriptedSource::new(vec![
            Step::Record(b"6,1,100,-;ok\n"),
            Step::Record(b"6,2,200,-;this record is far too long for the buffer\n"),
        ]);
        let snapshot = drain(&mut source, 16, raw);

        assert_eq!(snapshot.records, vec![b"6,1,100,-;ok\n".to_vec()]);
        assert!(snapshot.truncated);
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn test_fatal_error_keeps_partial_results() {
        let mut source = ScriptedSource::new(vec![
            Step::Record(b"6,1,100,-;one\n"),
            Step::Record(b"6,2,200,-;two\n"),
            Step::Fail(io::ErrorKind::BrokenPipe),
            Step::Record(b"6,3,300,-;never read\n"),
        ]);
        let snapshot = drain(&mut source, 1024, parse_record);

        assert_eq!(snapshot.records.len(), 2);
        assert!(!snapshot.truncated);
        assert_eq!(source.reads, 3);
        match snapshot.error {
            Some(KmsgError::ReadFailed(ref e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            ref other => panic!("unexpected error: {:?}", other),
        }
        assert!(snapshot.into_result().is_err());
    }

    #[test]
    fn test_truncation_and_failure_are_reported_separately() {
        let mut source = ScriptedSource::new(vec![
            Step::TooSmall,
            Step::Record(b"6,2,200,-;kept\n"),
            Step::Fail(io::ErrorKind::Other),
        ]);
        let snapshot = drain(&mut source, 1024, parse_record);

        assert!(snapshot.truncated);
        assert!(snapshot.error.is_some());
        assert_eq!(snapshot.records.len(), 1);
    }

    #[test]
    fn test_into_result() {
        let mut source =
            ScriptedSource::new(vec![Step::Record(b"6,1,100,-;one\n"), Step::TooSmall]);
        let (records, truncated) = drain(&mut source, 1024, parse_record)
            .into_result()
            .unwrap();

        assert_eq!(records.len(), 1);
        assert!(truncated);
    }

    #[test]
    fn test_fetch_rejects_zero_buffer() {
        let config = FetchConfig::new(0);
        let err = fetch(&config, raw).unwrap_err();
        assert!(matches!(err, KmsgError::Configuration(_)));
    }

    #[test]
    fn test_fetch_missing_device() {
        let dir = tempfile::tempdir().unwrap();
        let config = FetchConfig::default().with_device_path(dir.path().join("missing"));

        let err = fetch(&config, parse_record).unwrap_err();
        assert!(matches!(err, KmsgError::ResourceUnavailable { .. }));
    }

    #[test]
    fn test_fetch_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kmsg");
        std::fs::write(&path, b"6,1234,99999,-;kernel: starting up\n").unwrap();

        let config = FetchConfig::default().with_device_path(&path);
        let snapshot = fetch(&config, parse_record).unwrap();

        assert_eq!(snapshot.records.len(), 1);
        let msg = &snapshot.records[0];
        assert_eq!(msg.sequence, 1234);
        assert_eq!(msg.text, "kernel: starting up");
        assert!(snapshot.is_complete());
    }
}

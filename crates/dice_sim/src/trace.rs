//! Reading state traces back: streaming, hashing, and comparing dumps.

use crate::recorder::{record_len, CHIP_LIST_FILE, STATE_FILE, STATE_FILE_GZ};
use crate::time::SimTime;
use dice_common::ContentHash;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Errors from reading a state trace.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The trace or chip list could not be read.
    #[error("trace I/O error: {0}")]
    Io(#[from] io::Error),

    /// The trace ends in the middle of a record.
    #[error("record {record} is truncated: expected {expected} bytes, found {found}")]
    Truncated {
        /// Zero-based index of the partial record.
        record: u64,
        /// Bytes per record.
        expected: usize,
        /// Bytes actually present.
        found: usize,
    },

    /// The chip list names no chips.
    #[error("chip list '{}' is empty", path.display())]
    EmptyChipList {
        /// The chip list file.
        path: PathBuf,
    },

    /// The dump directory holds no trace file.
    #[error("no state trace in '{}'", dir.display())]
    MissingTrace {
        /// The dump directory.
        dir: PathBuf,
    },

    /// Two traces record different numbers of chips.
    #[error("traces record different chip counts ({left} vs {right})")]
    ChipCountMismatch {
        /// Chip count of the first trace.
        left: usize,
        /// Chip count of the second trace.
        right: usize,
    },
}

/// One decoded record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceRow {
    /// Simulated time of the sample.
    pub time: SimTime,
    /// Packed chip outputs.
    pub bits: Vec<u8>,
}

impl TraceRow {
    /// Output of chip `index`; chips past the record read as low.
    pub fn output(&self, index: usize) -> bool {
        self.bits
            .get(index >> 3)
            .is_some_and(|byte| byte & (1 << (index & 7)) != 0)
    }

    /// Indices of chips whose outputs differ between the two rows.
    pub fn differing_chips(&self, other: &TraceRow) -> Vec<usize> {
        let bytes = self.bits.len().max(other.bits.len());
        let mut out = Vec::new();
        for byte in 0..bytes {
            let a = self.bits.get(byte).copied().unwrap_or(0);
            let b = other.bits.get(byte).copied().unwrap_or(0);
            let diff = a ^ b;
            for bit in 0..8 {
                if diff & (1 << bit) != 0 {
                    out.push(byte * 8 + bit);
                }
            }
        }
        out
    }
}

/// Streams records out of a trace.
pub struct TraceReader<R> {
    reader: R,
    record_len: usize,
    record: u64,
    done: bool,
}

impl<R: Read> TraceReader<R> {
    /// Reads records of `chip_count` chips from `reader`.
    pub fn new(reader: R, chip_count: usize) -> Self {
        Self {
            reader,
            record_len: record_len(chip_count),
            record: 0,
            done: false,
        }
    }

    fn next_row(&mut self) -> Result<Option<TraceRow>, TraceError> {
        let mut buf = vec![0u8; self.record_len];
        let found = read_full(&mut self.reader, &mut buf)?;
        if found == 0 {
            return Ok(None);
        }
        if found < self.record_len {
            return Err(TraceError::Truncated {
                record: self.record,
                expected: self.record_len,
                found,
            });
        }
        self.record += 1;
        let mut time = [0u8; 8];
        time.copy_from_slice(&buf[..8]);
        Ok(Some(TraceRow {
            time: SimTime::from_ps(u64::from_le_bytes(time)),
            bits: buf.split_off(8),
        }))
    }
}

impl TraceReader<Box<dyn Read>> {
    /// Opens a trace file, plain or gzip.
    pub fn open(path: &Path, chip_count: usize) -> Result<Self, TraceError> {
        Ok(Self::new(open_trace_stream(path)?, chip_count))
    }
}

impl<R: Read> Iterator for TraceReader<R> {
    type Item = Result<TraceRow, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let row = self.next_row().transpose();
        if !matches!(row, Some(Ok(_))) {
            self.done = true;
        }
        row
    }
}

/// Reads until `buf` is full or the stream ends; returns the bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Opens a trace file and undoes gzip wrapping when present.
pub fn open_trace_stream(path: &Path) -> Result<Box<dyn Read>, TraceError> {
    let mut reader = BufReader::new(File::open(path)?);
    let gzip = reader.fill_buf()?.starts_with(&[0x1f, 0x8b]);
    Ok(if gzip {
        Box::new(GzDecoder::new(reader))
    } else {
        Box::new(reader)
    })
}

/// Hash of a trace's uncompressed contents.
pub fn trace_hash(path: &Path) -> Result<ContentHash, TraceError> {
    Ok(ContentHash::from_reader(open_trace_stream(path)?)?)
}

/// A dump directory: chip list plus trace.
#[derive(Clone, Debug)]
pub struct TraceDump {
    labels: Vec<String>,
    trace: PathBuf,
}

impl TraceDump {
    /// Opens the dump in `dir`, preferring an uncompressed trace.
    pub fn open(dir: &Path) -> Result<Self, TraceError> {
        let list_path = dir.join(CHIP_LIST_FILE);
        let labels: Vec<String> = fs::read_to_string(&list_path)?
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        if labels.is_empty() {
            return Err(TraceError::EmptyChipList { path: list_path });
        }

        let trace = [STATE_FILE, STATE_FILE_GZ]
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
            .ok_or_else(|| TraceError::MissingTrace {
                dir: dir.to_path_buf(),
            })?;

        Ok(Self { labels, trace })
    }

    /// Chip labels in trace order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of chips per record.
    pub fn chip_count(&self) -> usize {
        self.labels.len()
    }

    /// The trace file.
    pub fn trace_path(&self) -> &Path {
        &self.trace
    }

    /// Streams the records.
    pub fn rows(&self) -> Result<TraceReader<Box<dyn Read>>, TraceError> {
        TraceReader::open(&self.trace, self.chip_count())
    }

    /// Hash of the uncompressed trace.
    pub fn hash(&self) -> Result<ContentHash, TraceError> {
        trace_hash(&self.trace)
    }
}

/// Where two traces first disagree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Divergence {
    /// Zero-based index of the first differing record.
    pub record: u64,
    /// Time of that record in the first trace.
    pub left_time: SimTime,
    /// Time of that record in the second trace.
    pub right_time: SimTime,
    /// Chips whose outputs differ in that record.
    pub chips: Vec<usize>,
}

/// Result of comparing two traces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceDiff {
    /// Same records, same length.
    Identical {
        /// Number of records.
        rows: u64,
    },
    /// A record differs.
    Diverged(Divergence),
    /// One trace is a strict prefix of the other.
    LengthMismatch {
        /// Records both traces have.
        common_rows: u64,
        /// Records in the first trace.
        left_rows: u64,
        /// Records in the second trace.
        right_rows: u64,
    },
}

/// Compares two dumps record by record.
pub fn diff_traces(left: &TraceDump, right: &TraceDump) -> Result<TraceDiff, TraceError> {
    if left.chip_count() != right.chip_count() {
        return Err(TraceError::ChipCountMismatch {
            left: left.chip_count(),
            right: right.chip_count(),
        });
    }

    let mut l = left.rows()?;
    let mut r = right.rows()?;
    let mut common = 0u64;
    loop {
        match (l.next().transpose()?, r.next().transpose()?) {
            (Some(a), Some(b)) => {
                if a != b {
                    return Ok(TraceDiff::Diverged(Divergence {
                        record: common,
                        left_time: a.time,
                        right_time: b.time,
                        chips: a.differing_chips(&b),
                    }));
                }
                common += 1;
            }
            (None, None) => return Ok(TraceDiff::Identical { rows: common }),
            (Some(_), None) => {
                let left_rows = common + 1 + count_rows(&mut l)?;
                return Ok(TraceDiff::LengthMismatch {
                    common_rows: common,
                    left_rows,
                    right_rows: common,
                });
            }
            (None, Some(_)) => {
                let right_rows = common + 1 + count_rows(&mut r)?;
                return Ok(TraceDiff::LengthMismatch {
                    common_rows: common,
                    left_rows: common,
                    right_rows,
                });
            }
        }
    }
}

fn count_rows<R: Read>(reader: &mut TraceReader<R>) -> Result<u64, TraceError> {
    let mut n = 0;
    for row in reader {
        row?;
        n += 1;
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::StateRecorder;
    use dice_config::SampleMode;

    fn write_dump(dir: &Path, rows: &[(u64, [bool; 3])], compress: bool) {
        let labels: Vec<String> = ["a.1", "b.2", "c.3"].iter().map(|s| s.to_string()).collect();
        let mut rec = StateRecorder::open_dir(dir, &labels, SampleMode::Tick, compress).unwrap();
        for (t, bits) in rows {
            rec.sample_bits(SimTime::from_ps(*t), *bits).unwrap();
        }
        rec.finish().unwrap();
    }

    #[test]
    fn reads_back_rows() {
        let dir = tempfile::tempdir().unwrap();
        write_dump(dir.path(), &[(5, [true, false, true]), (9, [false, true, false])], false);
        let dump = TraceDump::open(dir.path()).unwrap();
        assert_eq!(dump.chip_count(), 3);
        let rows: Vec<TraceRow> = dump.rows().unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time, SimTime::from_ps(5));
        assert!(rows[0].output(0) && !rows[0].output(1) && rows[0].output(2));
        assert_eq!(rows[0].differing_chips(&rows[1]), vec![0, 1, 2]);
    }

    #[test]
    fn gzip_and_plain_hash_alike() {
        let rows = [(1, [true, true, false]), (2, [false, true, false])];
        let plain = tempfile::tempdir().unwrap();
        let gz = tempfile::tempdir().unwrap();
        write_dump(plain.path(), &rows, false);
        write_dump(gz.path(), &rows, true);
        let a = TraceDump::open(plain.path()).unwrap();
        let b = TraceDump::open(gz.path()).unwrap();
        assert!(b.trace_path().ends_with(STATE_FILE_GZ));
        assert_eq!(a.hash().unwrap(), b.hash().unwrap());
        assert_eq!(diff_traces(&a, &b).unwrap(), TraceDiff::Identical { rows: 2 });
    }

    #[test]
    fn truncated_record_is_an_error() {
        let bytes = [0u8; 12];
        let mut reader = TraceReader::new(&bytes[..], 3);
        assert!(reader.next().unwrap().is_ok());
        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            TraceError::Truncated {
                record: 1,
                expected: 9,
                found: 3
            }
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn divergence_and_length() {
        let base = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let longer = tempfile::tempdir().unwrap();
        write_dump(base.path(), &[(1, [true, false, false]), (2, [true, true, false])], false);
        write_dump(other.path(), &[(1, [true, false, false]), (2, [true, false, true])], false);
        write_dump(
            longer.path(),
            &[
                (1, [true, false, false]),
                (2, [true, true, false]),
                (3, [false, false, false]),
            ],
            false,
        );
        let base = TraceDump::open(base.path()).unwrap();
        let other = TraceDump::open(other.path()).unwrap();
        let longer = TraceDump::open(longer.path()).unwrap();

        match diff_traces(&base, &other).unwrap() {
            TraceDiff::Diverged(d) => {
                assert_eq!(d.record, 1);
                assert_eq!(d.chips, vec![1, 2]);
            }
            other => panic!("expected divergence, got {other:?}"),
        }
        assert_eq!(
            diff_traces(&base, &longer).unwrap(),
            TraceDiff::LengthMismatch {
                common_rows: 2,
                left_rows: 2,
                right_rows: 3
            }
        );
    }

    #[test]
    fn missing_pieces() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(TraceDump::open(dir.path()), Err(TraceError::Io(_))));
        fs::write(dir.path().join(CHIP_LIST_FILE), "\n").unwrap();
        assert!(matches!(
            TraceDump::open(dir.path()),
            Err(TraceError::EmptyChipList { .. })
        ));
        fs::write(dir.path().join(CHIP_LIST_FILE), "a.1\n").unwrap();
        assert!(matches!(
            TraceDump::open(dir.path()),
            Err(TraceError::MissingTrace { .. })
        ));
    }
}

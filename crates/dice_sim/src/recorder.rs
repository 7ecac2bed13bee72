//! Deterministic state traces.
//!
//! Each record is the simulated time as a little-endian `u64` followed by
//! the output of every chip, one bit per chip: chip `i` is bit `i % 8` of
//! byte `i / 8`. There is no header. With compression enabled the same byte
//! stream is gzip-wrapped.

use crate::arena::Arena;
use crate::chip::Chip;
use crate::error::SimError;
use crate::ids::ChipId;
use crate::time::SimTime;
use dice_config::SampleMode;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Trace file name inside a dump directory.
pub const STATE_FILE: &str = "state.bin";
/// Compressed trace file name inside a dump directory.
pub const STATE_FILE_GZ: &str = "state.bin.gz";
/// Chip list file name inside a dump directory, one label per line.
pub const CHIP_LIST_FILE: &str = "chips.txt";

/// Bytes per record for `chip_count` chips.
pub fn record_len(chip_count: usize) -> usize {
    8 + chip_count.div_ceil(8)
}

enum TraceSink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Writer(Box<dyn Write + Send>),
}

impl Write for TraceSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            TraceSink::Plain(w) => w.write(buf),
            TraceSink::Gzip(w) => w.write(buf),
            TraceSink::Writer(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            TraceSink::Plain(w) => w.flush(),
            TraceSink::Gzip(w) => w.flush(),
            TraceSink::Writer(w) => w.flush(),
        }
    }
}

/// Appends chip output snapshots to a trace.
pub struct StateRecorder {
    sink: TraceSink,
    mode: SampleMode,
    chip_count: usize,
    record: Vec<u8>,
    samples: u64,
    path: Option<PathBuf>,
}

impl StateRecorder {
    /// Creates (or truncates) the trace file at `path`.
    pub fn create(
        path: &Path,
        chip_count: usize,
        mode: SampleMode,
        compress: bool,
    ) -> Result<Self, SimError> {
        let file = File::create(path).map_err(|source| SimError::RecorderOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let writer = BufWriter::new(file);
        let sink = if compress {
            TraceSink::Gzip(GzEncoder::new(writer, Compression::default()))
        } else {
            TraceSink::Plain(writer)
        };
        let mut recorder = Self::with_sink(sink, chip_count, mode);
        recorder.path = Some(path.to_path_buf());
        Ok(recorder)
    }

    /// Records into an arbitrary writer.
    pub fn from_writer(
        writer: impl Write + Send + 'static,
        chip_count: usize,
        mode: SampleMode,
    ) -> Self {
        Self::with_sink(TraceSink::Writer(Box::new(writer)), chip_count, mode)
    }

    fn with_sink(sink: TraceSink, chip_count: usize, mode: SampleMode) -> Self {
        Self {
            sink,
            mode,
            chip_count,
            record: Vec::with_capacity(record_len(chip_count)),
            samples: 0,
            path: None,
        }
    }

    /// Sets up a dump directory: writes the chip list and opens the trace.
    ///
    /// `labels` name the chips in arena order; their count fixes the record size.
    pub fn open_dir(
        dir: &Path,
        labels: &[String],
        mode: SampleMode,
        compress: bool,
    ) -> Result<Self, SimError> {
        fs::create_dir_all(dir).map_err(|source| SimError::RecorderOpen {
            path: dir.to_path_buf(),
            source,
        })?;

        let list_path = dir.join(CHIP_LIST_FILE);
        let mut list = String::new();
        for label in labels {
            list.push_str(label);
            list.push('\n');
        }
        fs::write(&list_path, list).map_err(|source| SimError::RecorderOpen {
            path: list_path,
            source,
        })?;

        let file = if compress { STATE_FILE_GZ } else { STATE_FILE };
        Self::create(&dir.join(file), labels.len(), mode, compress)
    }

    /// When this recorder wants to be sampled.
    pub fn mode(&self) -> SampleMode {
        self.mode
    }

    /// Number of records written so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Number of chips per record.
    pub fn chip_count(&self) -> usize {
        self.chip_count
    }

    /// The trace file, when recording to one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Appends the current output of every chip.
    pub fn sample(&mut self, time: SimTime, chips: &Arena<ChipId, Chip>) -> Result<(), SimError> {
        self.sample_bits(time, chips.values().map(Chip::output))
    }

    /// Appends one record built from `outputs`, in chip order.
    ///
    /// Outputs beyond the recorder's chip count are ignored; missing ones read as low.
    pub fn sample_bits(
        &mut self,
        time: SimTime,
        outputs: impl IntoIterator<Item = bool>,
    ) -> Result<(), SimError> {
        self.record.clear();
        self.record.extend_from_slice(&time.as_ps().to_le_bytes());
        self.record.resize(record_len(self.chip_count), 0);
        for (i, level) in outputs.into_iter().take(self.chip_count).enumerate() {
            if level {
                self.record[8 + (i >> 3)] |= 1 << (i & 7);
            }
        }
        self.sink.write_all(&self.record)?;
        self.samples += 1;
        Ok(())
    }

    /// Flushes and closes the trace, returning the number of records.
    pub fn finish(self) -> Result<u64, SimError> {
        match self.sink {
            TraceSink::Plain(mut w) => w.flush()?,
            TraceSink::Gzip(enc) => enc.finish()?.flush()?,
            TraceSink::Writer(mut w) => w.flush()?,
        }
        Ok(self.samples)
    }
}

impl std::fmt::Debug for StateRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateRecorder")
            .field("mode", &self.mode)
            .field("chip_count", &self.chip_count)
            .field("samples", &self.samples)
            .field("path", &self.path)
            .finish()
    }
}

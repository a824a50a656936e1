//! Buffered output writers for records, wiggle tracks and counts.
//!
//! Uses itoa for integer formatting and ryu for track values to avoid
//! allocation in the hot path.

use crate::config::LIKELIHOOD_PRECISION;
use crate::record::Record;
use crate::snvmix::Result;
use std::io::{BufWriter, Write};

/// Default buffer size for the writers (2 MB).
const DEFAULT_BUFFER_SIZE: usize = 2 * 1024 * 1024;

/// SNVMix record writer.
///
/// Produces the same layout as `Record`'s `Display` impl, one record per
/// line.
pub struct RecordWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, output)
    }

    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            written: 0,
        }
    }

    /// Write one record followed by a newline.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let w = &mut self.writer;
        w.write_all(record.chromosome.as_bytes())?;
        w.write_all(b":")?;
        w.write_all(self.itoa_buf.format(record.position).as_bytes())?;
        w.write_all(b"\t")?;
        w.write_all(record.reference_allele.as_bytes())?;
        w.write_all(b"\t")?;
        w.write_all(record.alternative_allele.as_bytes())?;
        w.write_all(b"\t")?;
        w.write_all(record.reference_allele.as_bytes())?;
        w.write_all(b":")?;
        w.write_all(self.itoa_buf.format(record.reference_count).as_bytes())?;
        w.write_all(b",")?;
        w.write_all(record.alternative_allele.as_bytes())?;
        w.write_all(b":")?;
        w.write_all(self.itoa_buf.format(record.alternative_count).as_bytes())?;
        for likelihood in record.genotype_likelihoods {
            write!(w, ",{:.p$}", likelihood, p = LIKELIHOOD_PRECISION)?;
        }
        w.write_all(b",")?;
        w.write_all(self.itoa_buf.format(record.genotype).as_bytes())?;
        w.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Wiggle (variableStep) track writer.
///
/// Emits a `track` header on creation, a `variableStep` declaration each time
/// the chromosome changes, then one `position\tvalue` line per point.
pub struct WiggleWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
    current_chrom: Option<String>,
}

impl<W: Write> WiggleWriter<W> {
    /// Create a writer and emit the track header.
    pub fn new(output: W, name: Option<&str>) -> Result<Self> {
        let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, output);
        match name {
            Some(n) => writeln!(writer, "track type=wiggle_0 name=\"{}\"", n)?,
            None => writeln!(writer, "track type=wiggle_0")?,
        }
        Ok(Self {
            writer,
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
            current_chrom: None,
        })
    }

    /// Write one track point.
    pub fn write_point(&mut self, chrom: &str, position: u64, value: f64) -> Result<()> {
        if self.current_chrom.as_deref() != Some(chrom) {
            writeln!(self.writer, "variableStep chrom={}", chrom)?;
            self.current_chrom = Some(chrom.to_string());
        }
        self.writer
            .write_all(self.itoa_buf.format(position).as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer.write_all(self.ryu_buf.format(value).as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Write a single count to a log sink.
pub fn write_count<W: Write>(log: &mut W, count: u64) -> Result<()> {
    let mut buf = itoa::Buffer::new();
    log.write_all(buf.format(count).as_bytes())?;
    log.write_all(b"\n")?;
    log.flush()?;
    Ok(())
}

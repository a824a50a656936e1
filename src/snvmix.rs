//! Streaming SNVMix file parser.
//!
//! One record per line:
//!
//! ```text
//! chr1:12345    A    G    A:10,G:5,0.0000000001,0.4999999999,0.5000000000,1
//! ```

use crate::record::Record;
use memchr::memrchr;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading or processing SNVMix data.
#[derive(Error, Debug)]
pub enum SnvmixError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed record{}: {message}: '{content}'", at_line(.line))]
    Malformed {
        line: Option<usize>,
        message: String,
        content: String,
    },

    #[error("Invalid interval at line {line}: {message}")]
    Interval { line: usize, message: String },

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

fn at_line(line: &Option<usize>) -> String {
    match line {
        Some(n) => format!(" at line {}", n),
        None => String::new(),
    }
}

impl SnvmixError {
    fn malformed(message: impl Into<String>, content: &str) -> Self {
        SnvmixError::Malformed {
            line: None,
            message: message.into(),
            content: content.to_string(),
        }
    }

    /// Attach a line number to a malformed-record error.
    fn at(self, line_number: usize) -> Self {
        match self {
            SnvmixError::Malformed {
                message, content, ..
            } => SnvmixError::Malformed {
                line: Some(line_number),
                message,
                content,
            },
            other => other,
        }
    }

    /// True for errors caused by a line that does not fit the record grammar.
    pub fn is_malformed(&self) -> bool {
        matches!(self, SnvmixError::Malformed { .. })
    }
}

pub type Result<T> = std::result::Result<T, SnvmixError>;

/// Parse one SNVMix line.
///
/// Fields are separated by any run of whitespace; leading and trailing
/// whitespace is ignored, as is anything after the fourth field.
pub fn parse_record(line: &str) -> Result<Record> {
    let trimmed = line.trim();
    let mut fields = trimmed.split_whitespace();

    let (location, reference, alternative, details) =
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(l), Some(r), Some(a), Some(d)) => (l, r, a, d),
            _ => {
                return Err(SnvmixError::malformed(
                    format!(
                        "Expected at least 4 fields, got {}",
                        trimmed.split_whitespace().count()
                    ),
                    trimmed,
                ))
            }
        };

    let (chromosome, position) = parse_location(location, trimmed)?;

    let sub: Vec<&str> = details.split(',').collect();
    if sub.len() != 6 {
        return Err(SnvmixError::malformed(
            format!("Expected 6 comma-separated details, got {}", sub.len()),
            trimmed,
        ));
    }

    let reference_count = parse_count(sub[0], "reference count", trimmed)?;
    let alternative_count = parse_count(sub[1], "alternative count", trimmed)?;
    if reference_count.checked_add(alternative_count).is_none() {
        return Err(SnvmixError::malformed(
            "Read depth exceeds the 64-bit count range",
            trimmed,
        ));
    }
    let genotype_likelihoods = [
        parse_likelihood(sub[2], trimmed)?,
        parse_likelihood(sub[3], trimmed)?,
        parse_likelihood(sub[4], trimmed)?,
    ];
    let genotype = sub[5].parse().map_err(|_| {
        SnvmixError::malformed(format!("Invalid genotype: '{}'", sub[5]), trimmed)
    })?;

    Ok(Record {
        chromosome: chromosome.to_string(),
        position,
        reference_allele: reference.to_string(),
        alternative_allele: alternative.to_string(),
        reference_count,
        alternative_count,
        genotype_likelihoods,
        genotype,
    })
}

/// Split `chrom:pos` on the last colon.
fn parse_location<'a>(field: &'a str, line: &str) -> Result<(&'a str, u64)> {
    let colon = memrchr(b':', field.as_bytes()).ok_or_else(|| {
        SnvmixError::malformed(format!("Expected chrom:pos, got '{}'", field), line)
    })?;
    let chromosome = &field[..colon];
    if chromosome.is_empty() {
        return Err(SnvmixError::malformed("Empty chromosome name", line));
    }
    let position = field[colon + 1..].parse().map_err(|_| {
        SnvmixError::malformed(
            format!("Invalid position: '{}'", &field[colon + 1..]),
            line,
        )
    })?;
    Ok((chromosome, position))
}

/// Parse an `allele:count` sub-field.
fn parse_count(field: &str, what: &str, line: &str) -> Result<u64> {
    let (_, count) = field.split_once(':').ok_or_else(|| {
        SnvmixError::malformed(format!("Expected allele:count for {}, got '{}'", what, field), line)
    })?;
    count.parse().map_err(|_| {
        SnvmixError::malformed(format!("Invalid {}: '{}'", what, count), line)
    })
}

fn parse_likelihood(field: &str, line: &str) -> Result<f64> {
    match field.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(SnvmixError::malformed(
            format!("Invalid genotype likelihood: '{}'", field),
            line,
        )),
    }
}

/// Serialize a record to its line form, newline included.
pub fn serialize_record(record: &Record) -> String {
    record.to_line()
}

/// A streaming SNVMix reader.
pub struct SnvmixReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: Vec<u8>,
}

impl SnvmixReader<File> {
    /// Open an SNVMix file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> SnvmixReader<R> {
    /// Create a new reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: Vec::with_capacity(256),
        }
    }

    /// Read the next record, skipping blank lines.
    ///
    /// A line that is not valid UTF-8 is reported as malformed at its line
    /// number.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_until(b'\n', &mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let text = match std::str::from_utf8(&self.buffer) {
                Ok(text) => text,
                Err(_) => {
                    let content = String::from_utf8_lossy(&self.buffer);
                    return Err(SnvmixError::malformed(
                        "Line is not valid UTF-8",
                        content.trim_end_matches(['\n', '\r']),
                    )
                    .at(self.line_number));
                }
            };

            if text.trim().is_empty() {
                continue;
            }

            let line = text.trim_end_matches(['\n', '\r']);
            return parse_record(line)
                .map(Some)
                .map_err(|e| e.at(self.line_number));
        }
    }

    /// Get an iterator over all records.
    pub fn records(self) -> RecordIter<R> {
        RecordIter {
            reader: self,
            failed: false,
        }
    }
}

/// Iterator over SNVMix records.
///
/// Stops after the first error.
pub struct RecordIter<R: Read> {
    reader: SnvmixReader<R>,
    failed: bool,
}

impl<R: Read> Iterator for RecordIter<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// A re-openable origin of SNVMix records.
///
/// Every call to `open` starts a fresh stream at the first line. Passes
/// that need to see the input twice (such as Bonferroni counting) take a
/// source rather than a reader.
pub trait RecordSource {
    type Reader: Read;

    fn open(&self) -> Result<SnvmixReader<Self::Reader>>;
}

impl RecordSource for Path {
    type Reader = File;

    fn open(&self) -> Result<SnvmixReader<File>> {
        SnvmixReader::from_path(self)
    }
}

impl RecordSource for PathBuf {
    type Reader = File;

    fn open(&self) -> Result<SnvmixReader<File>> {
        SnvmixReader::from_path(self)
    }
}

impl<'a> RecordSource for &'a [u8] {
    type Reader = &'a [u8];

    fn open(&self) -> Result<SnvmixReader<&'a [u8]>> {
        Ok(SnvmixReader::new(*self))
    }
}

impl<'a> RecordSource for &'a str {
    type Reader = &'a [u8];

    fn open(&self) -> Result<SnvmixReader<&'a [u8]>> {
        Ok(SnvmixReader::new((*self).as_bytes()))
    }
}

/// Read all records from a file.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let reader = SnvmixReader::from_path(path)?;
    reader.records().collect()
}

/// Parse records from a string (useful for testing).
pub fn parse_records(content: &str) -> Result<Vec<Record>> {
    let reader = SnvmixReader::new(content.as_bytes());
    reader.records().collect()
}

//! Streaming BED interval reader.
//!
//! Only the first three columns are used; anything after `end` is ignored.

use crate::interval::Interval;
use crate::snvmix::{Result, SnvmixError};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// A streaming BED file reader.
pub struct BedReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: String,
}

impl BedReader<File> {
    /// Open a BED file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> BedReader<R> {
    /// Create a new BED reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::with_capacity(1024),
        }
    }

    /// Read the next interval.
    pub fn read_interval(&mut self) -> Result<Option<Interval>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            // Skip empty lines and comments
            let line = self.buffer.trim();
            if should_skip_line(line) {
                continue;
            }

            return self.parse_line(line).map(Some);
        }
    }

    /// Parse a single BED line.
    fn parse_line(&self, line: &str) -> Result<Interval> {
        let mut fields = line.split('\t');

        let (chrom, start, end) = match (fields.next(), fields.next(), fields.next()) {
            (Some(c), Some(s), Some(e)) => (c, s, e),
            _ => {
                return Err(SnvmixError::Interval {
                    line: self.line_number,
                    message: format!(
                        "Expected at least 3 fields, got {}",
                        line.split('\t').count()
                    ),
                })
            }
        };

        if chrom.is_empty() {
            return Err(SnvmixError::Interval {
                line: self.line_number,
                message: "Empty chromosome name".to_string(),
            });
        }

        let start = self.parse_position(start, "start")?;
        let end = self.parse_position(end, "end")?;

        if start > end {
            return Err(SnvmixError::Interval {
                line: self.line_number,
                message: format!("Start ({}) > end ({})", start, end),
            });
        }

        Ok(Interval::new(chrom, start, end))
    }

    fn parse_position(&self, s: &str, field_name: &str) -> Result<u64> {
        s.trim().parse().map_err(|_| SnvmixError::Interval {
            line: self.line_number,
            message: format!("Invalid {} position: '{}'", field_name, s),
        })
    }

    /// Get an iterator over all intervals.
    pub fn intervals(self) -> BedIntervalIter<R> {
        BedIntervalIter { reader: self }
    }
}

/// Check if a BED line carries no interval (blank, comment, or header).
#[inline]
pub fn should_skip_line(line: &str) -> bool {
    line.is_empty()
        || line.starts_with('#')
        || line.starts_with("track")
        || line.starts_with("browser")
}

/// Iterator over BED intervals.
pub struct BedIntervalIter<R: Read> {
    reader: BedReader<R>,
}

impl<R: Read> Iterator for BedIntervalIter<R> {
    type Item = Result<Interval>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_interval() {
            Ok(Some(interval)) => Some(Ok(interval)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Read all intervals from a BED file.
pub fn read_intervals<P: AsRef<Path>>(path: P) -> Result<Vec<Interval>> {
    let reader = BedReader::from_path(path)?;
    reader.intervals().collect()
}

/// Parse intervals from a string (useful for testing).
pub fn parse_intervals(content: &str) -> Result<Vec<Interval>> {
    let reader = BedReader::new(content.as_bytes());
    reader.intervals().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bed3() {
        let content = "chr1\t100\t200\nchr1\t300\t400\n";
        let intervals = parse_intervals(content).unwrap();

        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].chrom, "chr1");
        assert_eq!(intervals[0].start, 100);
        assert_eq!(intervals[0].end, 200);
    }

    #[test]
    fn test_extra_columns_ignored() {
        let content = "chr1\t100\t200\tgene1\t500\t+\n";
        let intervals = parse_intervals(content).unwrap();
        assert_eq!(intervals, vec![Interval::new("chr1", 100, 200)]);
    }

    #[test]
    fn test_skip_comments_and_headers() {
        let content =
            "# comment\ntrack name=test\nbrowser position chr1:1-1000\n\nchr1\t100\t200\n";
        let intervals = parse_intervals(content).unwrap();

        assert_eq!(intervals.len(), 1);
    }

    #[test]
    fn test_invalid_bed() {
        assert!(parse_intervals("chr1\t100\n").is_err());
        assert!(parse_intervals("chr1\tx\t200\n").is_err());
        assert!(parse_intervals("chr1\t300\t200\n").is_err());
    }

    #[test]
    fn test_error_reports_line() {
        let err = parse_intervals("chr1\t1\t2\nchr1\t5\n").unwrap_err();
        match err {
            SnvmixError::Interval { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {}", other),
        }
    }
}

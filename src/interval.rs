//! Genomic interval type used to select records.

use std::fmt;

/// A genomic interval with chromosome, start, and end positions.
///
/// Coordinates are compared against record positions exactly as written;
/// a record lies in the interval when `start <= position <= end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Interval {
    /// Create a new interval.
    #[inline]
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    /// Check whether a position on a chromosome falls inside, bounds inclusive.
    #[inline]
    pub fn contains(&self, chrom: &str, position: u64) -> bool {
        self.chrom == chrom && self.start <= position && position <= self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.chrom, self.start, self.end)
    }
}

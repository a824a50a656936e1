//! Minor allele frequency summary.
//!
//! For every record accepted by the filter, the minor allele count is added
//! to a running total and the minor allele frequency is binned into a
//! fixed-width histogram over `[0, 0.5]`.

use crate::commands::track::Filter;
use crate::config::{FREQUENCY_BINS, FREQUENCY_MAX};
use crate::record::Record;
use crate::snvmix::{Result, SnvmixError};
use crate::streaming::output::write_count;
use std::fmt;
use std::io::{BufWriter, Write};

/// Fixed-bin histogram of minor allele frequencies plus the minor count total.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySummary {
    bins: Vec<u64>,
    max: f64,
    /// Sum of minor allele counts over accepted records
    pub total_minor: u64,
    /// Records accepted by the filter
    pub accepted: usize,
    /// Accepted records that could not be binned (depth 0)
    pub unbinned: usize,
}

impl FrequencySummary {
    pub fn new(bins: usize, max: f64) -> Self {
        Self {
            bins: vec![0; bins],
            max,
            total_minor: 0,
            accepted: 0,
            unbinned: 0,
        }
    }

    /// Add an accepted record.
    pub fn add(&mut self, record: &Record) {
        self.accepted += 1;
        self.total_minor = self.total_minor.saturating_add(record.minor_count());
        match record.minor_frequency() {
            Some(freq) => {
                let idx = self.bin_index(freq);
                self.bins[idx] += 1;
            }
            None => self.unbinned += 1,
        }
    }

    /// Bin for a frequency; the upper edge falls in the last bin.
    #[inline]
    fn bin_index(&self, freq: f64) -> usize {
        let n = self.bins.len();
        let scaled = (freq / self.max * n as f64) as usize;
        scaled.min(n - 1)
    }

    pub fn bins(&self) -> &[u64] {
        &self.bins
    }

    /// Lower and upper edge of bin `i`.
    pub fn bin_edges(&self, i: usize) -> (f64, f64) {
        let width = self.max / self.bins.len() as f64;
        (i as f64 * width, (i + 1) as f64 * width)
    }

    /// Write the histogram as `bin_start\tbin_end\tcount` rows.
    pub fn write_histogram<W: Write>(&self, output: W) -> Result<()> {
        let mut writer = BufWriter::new(output);
        let mut itoa_buf = itoa::Buffer::new();
        for (i, &count) in self.bins.iter().enumerate() {
            let (lo, hi) = self.bin_edges(i);
            write!(writer, "{:.4}\t{:.4}\t", lo, hi)?;
            writer.write_all(itoa_buf.format(count).as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Frequency summary command configuration.
#[derive(Debug)]
pub struct FreqsCommand {
    pub filter: Filter,
    pub bins: usize,
}

impl Default for FreqsCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl FreqsCommand {
    pub fn new() -> Self {
        Self {
            filter: Filter::default(),
            bins: FREQUENCY_BINS,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_threshold(self, threshold: u64) -> Self {
        self.with_filter(Filter::DepthAbove(threshold))
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.bins == 0 {
            return Err(SnvmixError::Configuration(
                "histogram needs at least one bin".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the summary from a record stream.
    pub fn summarize<I>(&self, records: I) -> Result<FrequencySummary>
    where
        I: IntoIterator<Item = Result<Record>>,
    {
        self.validate()?;
        let mut summary = FrequencySummary::new(self.bins, FREQUENCY_MAX);
        let mut rejected = 0usize;

        for result in records {
            let record = result?;
            if self
                .filter
                .accepts(record.reference_count, record.alternative_count)
            {
                summary.add(&record);
            } else {
                rejected += 1;
            }
        }

        if rejected > 0 {
            log::debug!("{} records rejected by the depth filter", rejected);
        }
        if summary.unbinned > 0 {
            log::debug!("{} zero-depth records not binned", summary.unbinned);
        }
        Ok(summary)
    }

    /// Summarize records, writing the histogram to `output` and the minor
    /// count total to `log`.
    pub fn run<I, W, L>(&self, records: I, output: W, log: &mut L) -> Result<FrequencySummary>
    where
        I: IntoIterator<Item = Result<Record>>,
        W: Write,
        L: Write,
    {
        let summary = self.summarize(records)?;
        summary.write_histogram(output)?;
        write_count(log, summary.total_minor)?;
        Ok(summary)
    }
}

impl fmt::Display for FrequencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Accepted: {}, Minor total: {}, Unbinned: {}",
            self.accepted, self.total_minor, self.unbinned
        )
    }
}

//! Variant calling by a one-tailed binomial test on the minor allele count.
//!
//! Under the null hypothesis every read supporting the minor allele is a
//! sequencing error, so the minor count `k` out of depth `n` follows
//! `Binomial(n, error_rate)`. A record is called when
//! `P(X >= k) < p_value / correction`.
//!
//! With Bonferroni correction, `correction` is the number of records in the
//! input. That takes a counting pass before the calling pass, so the input
//! must be a re-openable `RecordSource`.

use crate::config::{DEFAULT_ERROR_RATE, DEFAULT_P_VALUE};
use crate::record::Record;
use crate::snvmix::{RecordSource, Result, SnvmixError};
use crate::stats::binomial_sf;
use crate::streaming::output::RecordWriter;
use std::io::Write;

/// Variant calling command configuration.
#[derive(Debug, Clone)]
pub struct CallCommand {
    /// Significance level before correction
    pub p_value: f64,
    /// Per-read error probability under the null hypothesis
    pub error_rate: f64,
    /// Divide the significance level by the number of records
    pub bonferroni: bool,
}

impl Default for CallCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl CallCommand {
    pub fn new() -> Self {
        Self {
            p_value: DEFAULT_P_VALUE,
            error_rate: DEFAULT_ERROR_RATE,
            bonferroni: false,
        }
    }

    pub fn with_p_value(mut self, p_value: f64) -> Self {
        self.p_value = p_value;
        self
    }

    pub fn with_error_rate(mut self, error_rate: f64) -> Self {
        self.error_rate = error_rate;
        self
    }

    pub fn with_bonferroni(mut self, bonferroni: bool) -> Self {
        self.bonferroni = bonferroni;
        self
    }

    /// Check parameters before any input is read.
    pub fn validate(&self) -> Result<()> {
        if !(self.p_value > 0.0 && self.p_value <= 1.0) {
            return Err(SnvmixError::Configuration(format!(
                "p-value threshold must be in (0, 1], got {}",
                self.p_value
            )));
        }
        if !(self.error_rate > 0.0 && self.error_rate < 1.0) {
            return Err(SnvmixError::Configuration(format!(
                "error rate must be in (0, 1), got {}",
                self.error_rate
            )));
        }
        Ok(())
    }

    /// Survival probability of the record's minor allele count.
    #[inline]
    pub fn p_value_of(&self, record: &Record) -> f64 {
        binomial_sf(record.minor_count(), record.depth(), self.error_rate)
    }

    /// Decide whether a record is significant under the given correction.
    #[inline]
    pub fn is_variant(&self, record: &Record, correction: u64) -> bool {
        self.p_value_of(record) < self.p_value / correction.max(1) as f64
    }

    /// Lazily filter a record stream down to significant records.
    ///
    /// `correction` is applied as given; use [`CallCommand::run`] to have
    /// it computed from the input.
    pub fn call<I>(&self, records: I, correction: u64) -> Result<CallIter<I::IntoIter>>
    where
        I: IntoIterator<Item = Result<Record>>,
    {
        self.validate()?;
        Ok(CallIter {
            records: records.into_iter(),
            command: self.clone(),
            correction: correction.max(1),
        })
    }

    /// Count the records of a source (Bonferroni pre-pass).
    pub fn count_records<S: RecordSource + ?Sized>(source: &S) -> Result<u64> {
        let mut count = 0u64;
        for record in source.open()?.records() {
            record?;
            count += 1;
        }
        Ok(count)
    }

    /// Call variants from a re-openable source and write them out.
    pub fn run<S, W>(&self, source: &S, output: W) -> Result<CallStats>
    where
        S: RecordSource + ?Sized,
        W: Write,
    {
        self.validate()?;

        let correction = if self.bonferroni {
            Self::count_records(source)?.max(1)
        } else {
            1
        };
        log::info!(
            "calling with p < {} / {} at error rate {}",
            self.p_value,
            correction,
            self.error_rate
        );

        self.write_calls(source.open()?.records(), correction, output)
    }

    /// Call variants from a single-pass stream (no correction possible).
    pub fn run_stream<I, W>(&self, records: I, output: W) -> Result<CallStats>
    where
        I: IntoIterator<Item = Result<Record>>,
        W: Write,
    {
        if self.bonferroni {
            return Err(SnvmixError::Configuration(
                "Bonferroni correction needs a re-readable input, not a stream".to_string(),
            ));
        }
        self.validate()?;
        self.write_calls(records, 1, output)
    }

    fn write_calls<I, W>(&self, records: I, correction: u64, output: W) -> Result<CallStats>
    where
        I: IntoIterator<Item = Result<Record>>,
        W: Write,
    {
        let mut stats = CallStats {
            correction,
            ..Default::default()
        };
        let mut writer = RecordWriter::new(output);

        for result in records {
            let record = result?;
            stats.records_read += 1;
            if self.is_variant(&record, correction) {
                writer.write_record(&record)?;
                stats.variants += 1;
            }
        }
        writer.flush()?;

        Ok(stats)
    }
}

/// Iterator over the significant records of a stream.
pub struct CallIter<I> {
    records: I,
    command: CallCommand,
    correction: u64,
}

impl<I> Iterator for CallIter<I>
where
    I: Iterator<Item = Result<Record>>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        for result in self.records.by_ref() {
            match result {
                Ok(record) if self.command.is_variant(&record, self.correction) => {
                    return Some(Ok(record))
                }
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

/// Statistics from variant calling.
#[derive(Debug, Default, Clone)]
pub struct CallStats {
    pub records_read: usize,
    pub variants: usize,
    /// Divisor applied to the significance level
    pub correction: u64,
}

impl std::fmt::Display for CallStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Read: {}, Variants: {}, Correction: {}",
            self.records_read, self.variants, self.correction
        )
    }
}

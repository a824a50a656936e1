//! Projection of records onto a genome-browser track.
//!
//! Every record becomes one `(chromosome, position, value)` point. The value
//! is the score of the allele counts when the filter accepts them and `0.0`
//! otherwise. Both the score and the filter are strategies: a small set of
//! built-ins plus a `Custom` case carrying a closure.

use crate::record::Record;
use crate::snvmix::{Result, SnvmixError};
use crate::streaming::output::WiggleWriter;
use std::fmt;
use std::io::Write;

type CountFn<T> = Box<dyn Fn(u64, u64) -> T + Send + Sync>;

/// Score of a record's `(reference_count, alternative_count)`.
pub enum Scorer {
    /// Minor allele count
    Min,
    /// Minor allele count divided by depth (0.0 at depth 0)
    MinNorm,
    Custom(CountFn<f64>),
}

impl Scorer {
    /// Look up a built-in scorer by its command-line name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "min" => Ok(Self::Min),
            "min-norm" | "min_norm" => Ok(Self::MinNorm),
            other => Err(SnvmixError::Configuration(format!(
                "unknown score function '{}' (expected min or min-norm)",
                other
            ))),
        }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(u64, u64) -> f64 + Send + Sync + 'static,
    {
        Self::Custom(Box::new(f))
    }

    #[inline]
    pub fn score(&self, reference: u64, alternative: u64) -> f64 {
        match self {
            Self::Min => reference.min(alternative) as f64,
            Self::MinNorm => {
                let depth = reference.saturating_add(alternative);
                if depth == 0 {
                    0.0
                } else {
                    reference.min(alternative) as f64 / depth as f64
                }
            }
            Self::Custom(f) => f(reference, alternative),
        }
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::Min
    }
}

impl fmt::Debug for Scorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Min => write!(f, "Min"),
            Self::MinNorm => write!(f, "MinNorm"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Predicate over a record's `(reference_count, alternative_count)`.
pub enum Filter {
    /// Depth strictly greater than the threshold
    DepthAbove(u64),
    Custom(CountFn<bool>),
}

impl Filter {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(u64, u64) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Box::new(f))
    }

    #[inline]
    pub fn accepts(&self, reference: u64, alternative: u64) -> bool {
        match self {
            Self::DepthAbove(threshold) => reference.saturating_add(alternative) > *threshold,
            Self::Custom(f) => f(reference, alternative),
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::DepthAbove(0)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepthAbove(t) => write!(f, "DepthAbove({})", t),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// One track value.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub chromosome: String,
    pub position: u64,
    pub value: f64,
}

/// Track projection command.
#[derive(Debug, Default)]
pub struct TrackProjector {
    pub scorer: Scorer,
    pub filter: Filter,
    /// Track name written to the wiggle header
    pub name: Option<String>,
}

impl TrackProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scorer(mut self, scorer: Scorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Shorthand for `with_filter(Filter::DepthAbove(threshold))`.
    pub fn with_threshold(self, threshold: u64) -> Self {
        self.with_filter(Filter::DepthAbove(threshold))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Track value of a single record.
    #[inline]
    pub fn value(&self, record: &Record) -> f64 {
        let (r, a) = (record.reference_count, record.alternative_count);
        if self.filter.accepts(r, a) {
            self.scorer.score(r, a)
        } else {
            0.0
        }
    }

    /// Lazily map records to track points, one per record.
    pub fn project<'a, I>(&'a self, records: I) -> impl Iterator<Item = Result<TrackPoint>> + 'a
    where
        I: IntoIterator<Item = Result<Record>>,
        I::IntoIter: 'a,
    {
        records.into_iter().map(move |result| {
            result.map(|record| {
                let value = self.value(&record);
                TrackPoint {
                    chromosome: record.chromosome,
                    position: record.position,
                    value,
                }
            })
        })
    }

    /// Project records and write them as a wiggle track.
    pub fn run<I, W>(&self, records: I, output: W) -> Result<TrackStats>
    where
        I: IntoIterator<Item = Result<Record>>,
        W: Write,
    {
        let mut stats = TrackStats::default();
        let mut writer = WiggleWriter::new(output, self.name.as_deref())?;

        for point in self.project(records) {
            let point = point?;
            if point.value == 0.0 {
                stats.zero_points += 1;
            }
            writer.write_point(&point.chromosome, point.position, point.value)?;
            stats.points_written += 1;
        }
        writer.flush()?;

        Ok(stats)
    }
}

/// Statistics from track projection.
#[derive(Debug, Default, Clone)]
pub struct TrackStats {
    pub points_written: usize,
    /// Points whose value is zero (filtered out or zero score)
    pub zero_points: usize,
}

impl fmt::Display for TrackStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Points: {}, Zero-valued: {}",
            self.points_written, self.zero_points
        )
    }
}

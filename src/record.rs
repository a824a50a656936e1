//! Core record type for SNVMix genotype observations.

use std::fmt;
use std::str::FromStr;

use crate::config::LIKELIHOOD_PRECISION;
use crate::snvmix::{parse_record, SnvmixError};

/// One SNVMix observation: a position, its two alleles, the read support
/// for each allele, the three genotype likelihoods and the called genotype.
///
/// The position is kept exactly as written in the input; no coordinate
/// system conversion is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub chromosome: String,
    pub position: u64,
    pub reference_allele: String,
    pub alternative_allele: String,
    pub reference_count: u64,
    pub alternative_count: u64,
    /// Likelihoods for (ref/ref, ref/alt, alt/alt), all finite.
    pub genotype_likelihoods: [f64; 3],
    pub genotype: u32,
}

impl Record {
    /// Total read depth at this position.
    #[inline]
    pub fn depth(&self) -> u64 {
        self.reference_count.saturating_add(self.alternative_count)
    }

    /// Read support of the less supported allele.
    #[inline]
    pub fn minor_count(&self) -> u64 {
        self.reference_count.min(self.alternative_count)
    }

    /// Minor allele frequency, or `None` when the position has no reads.
    #[inline]
    pub fn minor_frequency(&self) -> Option<f64> {
        match self.depth() {
            0 => None,
            depth => Some(self.minor_count() as f64 / depth as f64),
        }
    }

    /// Serialize to a full output line, including the trailing newline.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

/// Serialized form without the trailing newline.
///
/// Columns are tab-separated; likelihoods carry exactly ten decimals so the
/// line parses back to the same record.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [l0, l1, l2] = self.genotype_likelihoods;
        write!(
            f,
            "{}:{}\t{}\t{}\t{}:{},{}:{},{:.p$},{:.p$},{:.p$},{}",
            self.chromosome,
            self.position,
            self.reference_allele,
            self.alternative_allele,
            self.reference_allele,
            self.reference_count,
            self.alternative_allele,
            self.alternative_count,
            l0,
            l1,
            l2,
            self.genotype,
            p = LIKELIHOOD_PRECISION
        )
    }
}

impl FromStr for Record {
    type Err = SnvmixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_record(s)
    }
}

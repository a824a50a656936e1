//! Generate synthetic SNVMix datasets for testing and benchmarking.
//!
//! Records are spread over a fixed set of chromosomes in their listed order
//! with strictly increasing positions, so the output is sorted and valid
//! input for every other command. Generation is deterministic for a seed.

use crate::record::Record;
use crate::snvmix::{Result, SnvmixError};
use crate::streaming::output::RecordWriter;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::io::Write;

/// Chromosomes records are drawn on, in output order.
const CHROMOSOMES: [&str; 5] = ["chr1", "chr2", "chr3", "chr4", "chr5"];

const BASES: [&str; 4] = ["A", "C", "G", "T"];

/// Configuration for the generate command.
#[derive(Debug, Clone)]
pub struct GenerateCommand {
    pub count: u64,
    pub seed: u64,
    /// Maximum read depth of a record
    pub max_depth: u64,
    /// Maximum gap between consecutive positions on a chromosome
    pub max_gap: u64,
}

impl Default for GenerateCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerateCommand {
    pub fn new() -> Self {
        Self {
            count: 1_000,
            seed: 42,
            max_depth: 100,
            max_gap: 500,
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u64) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_gap(mut self, max_gap: u64) -> Self {
        self.max_gap = max_gap;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_gap == 0 {
            return Err(SnvmixError::Configuration(
                "maximum position gap must be at least 1".to_string(),
            ));
        }
        if self.max_gap.checked_mul(self.count).is_none() {
            return Err(SnvmixError::Configuration(format!(
                "{} records with gaps up to {} exceed the 64-bit position range",
                self.count, self.max_gap
            )));
        }
        Ok(())
    }

    /// Lazily generate the records.
    pub fn records(&self) -> Result<RecordGenerator> {
        self.validate()?;
        Ok(RecordGenerator {
            rng: SmallRng::seed_from_u64(self.seed),
            config: self.clone(),
            emitted: 0,
            position: 0,
            chrom_idx: 0,
        })
    }

    /// Generate records into `output`.
    pub fn run<W: Write>(&self, output: W) -> Result<GenerateStats> {
        let records = self.records()?;
        let mut writer = RecordWriter::new(output);
        let mut stats = GenerateStats::default();
        let mut last_chrom: Option<String> = None;

        for record in records {
            if last_chrom.as_deref() != Some(record.chromosome.as_str()) {
                stats.chromosomes += 1;
                last_chrom = Some(record.chromosome.clone());
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        stats.records = writer.written() as u64;

        log::info!("generated {} records (seed {})", stats.records, self.seed);
        Ok(stats)
    }
}

/// Iterator producing sorted synthetic records.
pub struct RecordGenerator {
    rng: SmallRng,
    config: GenerateCommand,
    emitted: u64,
    position: u64,
    chrom_idx: usize,
}

impl RecordGenerator {
    fn random_record(&mut self, chromosome: &str, position: u64) -> Record {
        let depth = self.rng.gen_range(0..=self.config.max_depth);
        // Mostly reference, sometimes heterozygous or homozygous alternative
        let alt_fraction: f64 = match self.rng.gen_range(0..10) {
            0..=6 => self.rng.gen_range(0.0..0.05),
            7 | 8 => self.rng.gen_range(0.3..0.7),
            _ => self.rng.gen_range(0.9..=1.0),
        };
        let alternative_count = ((depth as f64 * alt_fraction).round() as u64).min(depth);

        let ref_idx = self.rng.gen_range(0..BASES.len());
        let alt_idx = (ref_idx + self.rng.gen_range(1..BASES.len())) % BASES.len();

        let mut likelihoods = [
            self.rng.gen_range(0.001..1.0),
            self.rng.gen_range(0.001..1.0),
            self.rng.gen_range(0.001..1.0),
        ];
        let sum: f64 = likelihoods.iter().sum();
        for l in &mut likelihoods {
            *l /= sum;
        }
        let genotype = likelihoods
            .iter()
            .enumerate()
            .fold(0, |best, (i, &l)| if l > likelihoods[best] { i } else { best });

        Record {
            chromosome: chromosome.to_string(),
            position,
            reference_allele: BASES[ref_idx].to_string(),
            alternative_allele: BASES[alt_idx].to_string(),
            reference_count: depth - alternative_count,
            alternative_count,
            genotype_likelihoods: likelihoods,
            genotype: genotype as u32,
        }
    }
}

impl Iterator for RecordGenerator {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.emitted >= self.config.count {
            return None;
        }
        // Even share of the records per chromosome, remainder on the last
        let per_chrom = (self.config.count / CHROMOSOMES.len() as u64).max(1);
        let target = ((self.emitted / per_chrom) as usize).min(CHROMOSOMES.len() - 1);
        if target != self.chrom_idx {
            self.chrom_idx = target;
            self.position = 0;
        }

        self.position += self.rng.gen_range(1..=self.config.max_gap);
        self.emitted += 1;
        let chromosome = CHROMOSOMES[self.chrom_idx];
        Some(self.random_record(chromosome, self.position))
    }
}

/// Statistics from generate operation.
#[derive(Debug, Default, Clone)]
pub struct GenerateStats {
    pub records: u64,
    pub chromosomes: usize,
}

impl fmt::Display for GenerateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Records: {}, Chromosomes: {}",
            self.records, self.chromosomes
        )
    }
}

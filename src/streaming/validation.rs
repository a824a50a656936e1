//! Sort validation for streaming operations.
//!
//! The merge-join walks records and intervals with forward-only cursors, so
//! both inputs must be grouped by chromosome and sorted by position. This
//! module checks that inline as items are consumed:
//! 1. All items for a chromosome are contiguous (no interleaving)
//! 2. Within a chromosome, positions are non-decreasing
//!
//! Any consistent chromosome ordering is accepted (lexicographic or genome
//! order). Agreement of the ordering *between* two streams cannot be checked
//! cheaply and remains the caller's responsibility.

use crate::config::is_assume_sorted;
use crate::snvmix::{Result, SnvmixError};
use rustc_hash::FxHashSet;

/// Inline sort validator for use within streaming loops.
#[derive(Debug)]
pub struct SortValidator {
    /// Stream name used in diagnostics ("records", "intervals", ...)
    label: &'static str,
    enabled: bool,
    prev_chrom: Option<String>,
    prev_pos: u64,
    seen_chroms: FxHashSet<String>,
    item_count: usize,
}

impl SortValidator {
    /// Create a validator; disabled when the global assume-sorted switch is on.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            enabled: !is_assume_sorted(),
            prev_chrom: None,
            prev_pos: 0,
            seen_chroms: FxHashSet::default(),
            item_count: 0,
        }
    }

    /// Validate that the next item maintains sort order.
    #[inline]
    pub fn validate(&mut self, chrom: &str, pos: u64) -> Result<()> {
        self.item_count += 1;
        if !self.enabled {
            return Ok(());
        }

        if let Some(ref pc) = self.prev_chrom {
            if chrom != pc {
                // Switching chromosomes - check we haven't seen this one before
                if self.seen_chroms.contains(chrom) {
                    return Err(SnvmixError::Configuration(format!(
                        "{} not sorted: chromosome '{}' at item {} was seen earlier (chromosomes must be contiguous)",
                        self.label, chrom, self.item_count
                    )));
                }
                self.seen_chroms.insert(pc.clone());
            } else if pos < self.prev_pos {
                return Err(SnvmixError::Configuration(format!(
                    "{} not sorted: position {} at item {} comes after {} on {}",
                    self.label, pos, self.item_count, self.prev_pos, chrom
                )));
            }
        }

        if self.prev_chrom.as_deref() != Some(chrom) {
            self.prev_chrom = Some(chrom.to_string());
        }
        self.prev_pos = pos;
        Ok(())
    }

    /// Get the number of items validated.
    pub fn item_count(&self) -> usize {
        self.item_count
    }
}

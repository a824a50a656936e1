//! Global configuration and shared defaults.
//!
//! The order-validation switch is process-wide: it is set once at startup
//! and read by every streaming stage without threading a flag through
//! each call.

use std::sync::atomic::{AtomicBool, Ordering};

/// Digits after the decimal point when writing genotype likelihoods.
pub const LIKELIHOOD_PRECISION: usize = 10;

/// Default per-read error probability for variant calling.
pub const DEFAULT_ERROR_RATE: f64 = 0.01;

/// Default significance level for variant calling.
pub const DEFAULT_P_VALUE: f64 = 0.05;

/// Number of bins in the minor allele frequency histogram.
pub const FREQUENCY_BINS: usize = 100;

/// Upper edge of the minor allele frequency histogram.
pub const FREQUENCY_MAX: f64 = 0.5;

/// Global flag disabling the inline sort-order checks.
static ASSUME_SORTED: AtomicBool = AtomicBool::new(false);

/// Skip chromosome/position order validation on all streams.
///
/// Only safe when the caller already knows every input is sorted; an
/// unsorted input then silently produces incomplete intersections.
///
/// # Example
///
/// ```
/// use snvmix_tools::config;
///
/// config::set_assume_sorted(true);
/// assert!(config::is_assume_sorted());
/// config::set_assume_sorted(false);
/// ```
#[inline]
pub fn set_assume_sorted(enabled: bool) {
    ASSUME_SORTED.store(enabled, Ordering::Release);
}

/// Check whether order validation is disabled.
#[inline]
pub fn is_assume_sorted() -> bool {
    ASSUME_SORTED.load(Ordering::Acquire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_assume_sorted_toggle() {
        set_assume_sorted(true);
        assert!(is_assume_sorted());
        set_assume_sorted(false);
        assert!(!is_assume_sorted());
    }
}

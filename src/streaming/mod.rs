//! Shared streaming components.
//!
//! - Sort validation applied inline while streams are consumed
//! - Buffered writers for records, wiggle tracks and log counts
//!
//! Every command consumes its input with forward-only cursors and keeps
//! O(1) state, apart from the merge-join replay window.

pub mod output;
pub mod validation;

pub use output::{write_count, RecordWriter, WiggleWriter};
pub use validation::SortValidator;

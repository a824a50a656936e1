//! snvmix-tools: processing of SNVMix genotype calls
//!
//! SNVMix records carry per-position allele counts and genotype
//! likelihoods. This library parses and writes them, and derives:
//!
//! - **Frequency summaries**: minor allele frequency histogram and count total
//! - **Tracks**: one scored `(chromosome, position, value)` point per record
//! - **Interval filters**: streaming merge-join against sorted BED regions
//! - **Variant calls**: binomial test on the minor allele count, with
//!   optional Bonferroni correction
//!
//! Every stage pulls records lazily from a single forward cursor.
//!
//! # Example
//!
//! ```rust,no_run
//! use snvmix_tools::{bed, commands::IntersectCommand, snvmix::SnvmixReader};
//!
//! let records = SnvmixReader::from_path("calls.snvmix").unwrap();
//! let regions = bed::BedReader::from_path("targets.bed").unwrap();
//!
//! for record in IntersectCommand::new().join(records.records(), regions.intervals()) {
//!     println!("{}", record.unwrap());
//! }
//! ```

pub mod bed;
pub mod commands;
pub mod config;
pub mod interval;
pub mod record;
pub mod snvmix;
pub mod stats;
pub mod streaming;

// Re-export commonly used types
pub use bed::{read_intervals, BedReader};
pub use interval::Interval;
pub use record::Record;
pub use snvmix::{parse_record, read_records, RecordSource, Result, SnvmixError, SnvmixReader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bed::{read_intervals, BedReader};
    pub use crate::commands::{
        CallCommand, Filter, FreqsCommand, GenerateCommand, IntersectCommand, Scorer,
        TrackProjector,
    };
    pub use crate::interval::Interval;
    pub use crate::record::Record;
    pub use crate::snvmix::{read_records, RecordSource, Result, SnvmixError, SnvmixReader};
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    const CALLS: &str = "\
chr1:100\tA\tG\tA:60,G:1,0.9,0.1,0.0,0
chr1:150\tC\tT\tC:20,T:20,0.0,1.0,0.0,1
chr1:300\tG\tA\tG:50,A:1,0.9,0.1,0.0,0
chr2:10\tT\tC\tT:3,C:30,0.0,0.1,0.9,2
";

    #[test]
    #[serial]
    fn test_intersect_then_call_workflow() {
        use crate::bed::parse_intervals;
        use crate::commands::{CallCommand, IntersectCommand};
        use crate::snvmix::SnvmixReader;

        let intervals = parse_intervals("chr1\t90\t200\nchr2\t1\t100\n").unwrap();
        let reader = SnvmixReader::new(CALLS.as_bytes());
        let joined = IntersectCommand::new().join(reader.records(), intervals.into_iter().map(Ok));

        let called: Vec<_> = CallCommand::new()
            .call(joined, 1)
            .unwrap()
            .collect::<crate::Result<_>>()
            .unwrap();

        let positions: Vec<u64> = called.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![150, 10]);
    }

    #[test]
    fn test_track_workflow() {
        use crate::commands::TrackProjector;
        use crate::snvmix::SnvmixReader;

        let reader = SnvmixReader::new(CALLS.as_bytes());
        let values: Vec<f64> = TrackProjector::new()
            .project(reader.records())
            .map(|p| p.unwrap().value)
            .collect();
        assert_eq!(values, vec![1.0, 20.0, 1.0, 3.0]);
    }
}

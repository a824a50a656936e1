//! Command implementations for snvmix-tools.

pub mod call;
pub mod freqs;
pub mod generate;
pub mod intersect;
pub mod track;

pub use call::{CallCommand, CallIter, CallStats};
pub use freqs::{FreqsCommand, FrequencySummary};
pub use generate::{GenerateCommand, GenerateStats, RecordGenerator};
pub use intersect::{IntersectCommand, IntersectStats, MergeJoin};
pub use track::{Filter, Scorer, TrackPoint, TrackProjector, TrackStats};

//! Streaming intersect of SNVMix records with sorted intervals.
//!
//! # Algorithm
//!
//! A co-sorted merge-join with a single forward cursor into the records:
//! 1. Take the next interval
//! 2. Advance the record cursor, discarding records, while the current
//!    record is on another chromosome or before the interval start
//! 3. Emit records while they are on the interval's chromosome and inside
//!    `[start, end]` (inclusive), advancing the cursor
//! 4. The record that stops step 3 stays current for the next interval
//!
//! Running out of records during step 2 simply ends the output.
//!
//! A record emitted for an interval is kept in a replay window when the next
//! interval already starts at or before it, so that the overlapping interval
//! emits it again. Non-overlapping intervals never buffer anything.
//!
//! # Requirements
//!
//! - Records and intervals MUST be grouped by chromosome, in the same
//!   chromosome order, and sorted by position / start
//! - Chromosome grouping and position order of each stream are validated
//!   inline (unless `--assume-sorted`); a shared chromosome order is not
//! - An interval on a chromosome absent from the records discards the rest
//!   of the record stream

use crate::interval::Interval;
use crate::record::Record;
use crate::snvmix::{Result, SnvmixReader};
use crate::streaming::output::RecordWriter;
use crate::streaming::validation::SortValidator;
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::iter::Peekable;

/// State of the record cursor after an attempt to fill it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Ready,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Fetch the next interval and trim the replay window.
    NextInterval,
    /// Re-emit window records that fall inside the current interval.
    Replay,
    /// Discard records until one is on the interval's chromosome at or
    /// after its start.
    Seek,
    /// Emit records while they stay inside the interval.
    Emit,
    Done,
}

/// Lazy merge-join over a record stream and an interval stream.
///
/// Owns both cursors; the record stream cannot be driven by anything else
/// while the join is alive.
pub struct MergeJoin<R, I: Iterator> {
    records: R,
    intervals: Peekable<I>,
    /// Current record (the cursor position), if already pulled.
    pending: Option<Record>,
    records_done: bool,
    /// Emitted records that may still match a later overlapping interval.
    window: VecDeque<Record>,
    replay_idx: usize,
    current: Option<Interval>,
    phase: Phase,
    record_order: SortValidator,
    interval_order: SortValidator,
    stats: IntersectStats,
}

impl<R, I> MergeJoin<R, I>
where
    R: Iterator<Item = Result<Record>>,
    I: Iterator<Item = Result<Interval>>,
{
    pub fn new(records: R, intervals: I) -> Self {
        Self {
            records,
            intervals: intervals.peekable(),
            pending: None,
            records_done: false,
            window: VecDeque::new(),
            replay_idx: 0,
            current: None,
            phase: Phase::NextInterval,
            record_order: SortValidator::new("records"),
            interval_order: SortValidator::new("intervals"),
            stats: IntersectStats::default(),
        }
    }

    /// Statistics accumulated so far.
    pub fn stats(&self) -> &IntersectStats {
        &self.stats
    }

    /// Make sure `pending` holds the current record.
    fn fill(&mut self) -> Result<Cursor> {
        if self.pending.is_some() {
            return Ok(Cursor::Ready);
        }
        if self.records_done {
            return Ok(Cursor::Exhausted);
        }
        match self.records.next() {
            Some(Ok(record)) => {
                self.record_order
                    .validate(&record.chromosome, record.position)?;
                self.stats.records_read += 1;
                self.pending = Some(record);
                Ok(Cursor::Ready)
            }
            Some(Err(e)) => {
                self.records_done = true;
                Err(e)
            }
            None => {
                self.records_done = true;
                Ok(Cursor::Exhausted)
            }
        }
    }

    /// Fetch the next interval and prepare the replay window for it.
    fn start_interval(&mut self, interval: Interval) -> Result<()> {
        self.interval_order
            .validate(&interval.chrom, interval.start)?;
        self.stats.intervals_read += 1;
        log::trace!("interval {}", interval);

        if self
            .window
            .front()
            .is_some_and(|r| r.chromosome != interval.chrom)
        {
            self.window.clear();
        }
        while self
            .window
            .front()
            .is_some_and(|r| r.position < interval.start)
        {
            self.window.pop_front();
        }
        self.stats.max_window = self.stats.max_window.max(self.window.len());

        self.current = Some(interval);
        self.replay_idx = 0;
        Ok(())
    }

    /// Whether the upcoming interval could contain this record again.
    fn next_interval_reaches(&mut self, record: &Record) -> bool {
        matches!(
            self.intervals.peek(),
            Some(Ok(next)) if next.chrom == record.chromosome && next.start <= record.position
        )
    }

    fn step(&mut self) -> Result<Option<Record>> {
        loop {
            match self.phase {
                Phase::Done => return Ok(None),

                Phase::NextInterval => {
                    if self.records_done && self.pending.is_none() && self.window.is_empty() {
                        if self.current.is_some() {
                            log::debug!(
                                "record stream exhausted after {} intervals",
                                self.stats.intervals_read
                            );
                        }
                        self.phase = Phase::Done;
                        continue;
                    }
                    match self.intervals.next() {
                        Some(Ok(interval)) => {
                            self.start_interval(interval)?;
                            self.phase = Phase::Replay;
                        }
                        Some(Err(e)) => {
                            self.phase = Phase::Done;
                            return Err(e);
                        }
                        None => self.phase = Phase::Done,
                    }
                }

                Phase::Replay => {
                    let end = match self.current {
                        Some(ref iv) => iv.end,
                        None => {
                            self.phase = Phase::NextInterval;
                            continue;
                        }
                    };
                    match self.window.get(self.replay_idx) {
                        Some(record) if record.position <= end => {
                            self.replay_idx += 1;
                            self.stats.records_written += 1;
                            return Ok(Some(record.clone()));
                        }
                        _ => self.phase = Phase::Seek,
                    }
                }

                Phase::Seek | Phase::Emit => {
                    if self.fill()? == Cursor::Exhausted {
                        // No more records: remaining intervals can only match
                        // what is left in the replay window.
                        self.phase = Phase::NextInterval;
                        continue;
                    }
                    let (Some(iv), Some(record)) = (self.current.as_ref(), self.pending.as_ref())
                    else {
                        self.phase = Phase::NextInterval;
                        continue;
                    };
                    let on_chrom = record.chromosome == iv.chrom;

                    if self.phase == Phase::Seek {
                        if !on_chrom || record.position < iv.start {
                            self.pending = None;
                            self.stats.records_skipped += 1;
                        } else {
                            self.phase = Phase::Emit;
                        }
                    } else if iv.contains(&record.chromosome, record.position) {
                        if let Some(record) = self.pending.take() {
                            if self.next_interval_reaches(&record) {
                                self.window.push_back(record.clone());
                            }
                            self.stats.records_written += 1;
                            return Ok(Some(record));
                        }
                    } else {
                        self.phase = Phase::NextInterval;
                    }
                }
            }
        }
    }
}

impl<R, I> Iterator for MergeJoin<R, I>
where
    R: Iterator<Item = Result<Record>>,
    I: Iterator<Item = Result<Interval>>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.phase = Phase::Done;
                Some(Err(e))
            }
        }
    }
}

/// Streaming intersect command configuration.
#[derive(Debug, Clone, Default)]
pub struct IntersectCommand;

impl IntersectCommand {
    pub fn new() -> Self {
        Self
    }

    /// Build the lazy merge-join over arbitrary record and interval streams.
    pub fn join<R, I>(&self, records: R, intervals: I) -> MergeJoin<R::IntoIter, I::IntoIter>
    where
        R: IntoIterator<Item = Result<Record>>,
        I: IntoIterator<Item = Result<Interval>>,
    {
        MergeJoin::new(records.into_iter(), intervals.into_iter())
    }

    /// Intersect a record stream with intervals, writing matching records.
    ///
    /// Memory usage: O(k) where k = records inside overlapping intervals.
    pub fn run<Rd, I, W>(
        &self,
        reader: SnvmixReader<Rd>,
        intervals: I,
        output: W,
    ) -> Result<IntersectStats>
    where
        Rd: Read,
        I: IntoIterator<Item = Result<Interval>>,
        W: Write,
    {
        let mut writer = RecordWriter::new(output);
        let mut join = self.join(reader.records(), intervals);

        for result in join.by_ref() {
            writer.write_record(&result?)?;
        }
        writer.flush()?;

        Ok(join.stats().clone())
    }
}

/// Statistics from a streaming intersect.
#[derive(Debug, Default, Clone)]
pub struct IntersectStats {
    /// Number of intervals consumed
    pub intervals_read: usize,
    /// Number of records pulled from the record stream
    pub records_read: usize,
    /// Records discarded while searching for an interval
    pub records_skipped: usize,
    /// Records emitted (replays included)
    pub records_written: usize,
    /// Largest replay window seen
    pub max_window: usize,
}

impl std::fmt::Display for IntersectStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Intervals: {}, Records read: {}, Skipped: {}, Written: {}, Max window: {}",
            self.intervals_read,
            self.records_read,
            self.records_skipped,
            self.records_written,
            self.max_window
        )
    }
}

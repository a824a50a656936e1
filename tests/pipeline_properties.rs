//! Library-level properties of the record pipeline.
//!
//! Tests touching the merge-join run serially since sort validation reads
//! the global assume-sorted switch.

use serial_test::serial;
use snvmix_tools::bed::{parse_intervals, BedReader};
use snvmix_tools::commands::{CallCommand, GenerateCommand, IntersectCommand};
use snvmix_tools::config;
use snvmix_tools::record::Record;
use snvmix_tools::snvmix::{parse_record, read_records, Result, SnvmixReader};
use std::io::Write;
use tempfile::NamedTempFile;

fn reset_config() {
    config::set_assume_sorted(false);
}

fn synthetic(count: u64, seed: u64) -> Vec<u8> {
    let mut out = Vec::new();
    GenerateCommand::new()
        .with_count(count)
        .with_seed(seed)
        .run(&mut out)
        .unwrap();
    out
}

// =============================================================================
// Record codec
// =============================================================================

#[test]
fn test_round_trip_preserves_fields() {
    let lines = [
        "chr1:100 A G A:8,G:2,.1,.8,.1,0",
        "  chrX:1\tT\tC\tT:0,C:0,0.3333333333,0.3333333333,0.3333333334,2   ",
        "scaffold_12:9:77 G A G:5,A:40,0,1e-3,0.999,2 extra columns",
    ];
    for line in lines {
        let first = parse_record(line).unwrap();
        let again = parse_record(&first.to_line()).unwrap();
        assert_eq!(first, again, "line: {}", line);
    }
}

#[test]
fn test_location_split_on_last_colon() {
    let rec = parse_record("scaffold_12:9:77 G A G:5,A:40,0,0.5,0.5,2").unwrap();
    assert_eq!(rec.chromosome, "scaffold_12:9");
    assert_eq!(rec.position, 77);
}

#[test]
fn test_malformed_inputs_rejected() {
    for line in [
        "chr1:100 A G",
        "chr1:abc A G A:1,G:1,0.1,0.8,0.1,0",
        "chr1:100 A G A:1,G:1,0.1,0.8,0",
        ":100 A G A:1,G:1,0.1,0.8,0.1,0",
        "chr1:100 A G A:1,G:1,0.1,inf,0.1,0",
    ] {
        let err = parse_record(line).unwrap_err();
        assert!(err.is_malformed(), "line: {}", line);
    }
}

// =============================================================================
// Merge-join
// =============================================================================

#[test]
#[serial]
fn test_emitted_records_lie_in_an_interval() {
    reset_config();
    let data = synthetic(2_000, 11);
    let intervals = parse_intervals(
        "chr1\t1000\t20000\nchr1\t15000\t40000\nchr2\t5000\t5600\nchr4\t1\t100000\n",
    )
    .unwrap();

    let reader = SnvmixReader::new(data.as_slice());
    let emitted: Vec<Record> = IntersectCommand::new()
        .join(reader.records(), intervals.iter().cloned().map(Ok))
        .collect::<Result<_>>()
        .unwrap();

    assert!(!emitted.is_empty());
    for r in &emitted {
        assert!(
            intervals
                .iter()
                .any(|iv| iv.contains(&r.chromosome, r.position)),
            "{}:{} outside every interval",
            r.chromosome,
            r.position
        );
    }
}

#[test]
#[serial]
fn test_emission_count_matches_brute_force() {
    reset_config();
    let data = synthetic(1_000, 3);
    let intervals =
        parse_intervals("chr1\t100\t30000\nchr1\t20000\t50000\nchr1\t25000\t26000\nchr3\t1\t40000\n")
            .unwrap();
    let records: Vec<Record> = SnvmixReader::new(data.as_slice())
        .records()
        .collect::<Result<_>>()
        .unwrap();

    let expected: usize = intervals
        .iter()
        .map(|iv| {
            records
                .iter()
                .filter(|r| iv.contains(&r.chromosome, r.position))
                .count()
        })
        .sum();

    let emitted = IntersectCommand::new()
        .join(records.iter().cloned().map(Ok), intervals.into_iter().map(Ok))
        .count();
    assert_eq!(emitted, expected);
}

#[test]
#[serial]
fn test_empty_records_with_intervals() {
    reset_config();
    let bed = BedReader::new("chr1\t1\t100\nchr2\t1\t100\n".as_bytes());
    let reader = SnvmixReader::new("".as_bytes());
    let mut out = Vec::new();
    let stats = IntersectCommand::new()
        .run(reader, bed.intervals(), &mut out)
        .unwrap();
    assert!(out.is_empty());
    assert_eq!(stats.records_written, 0);
}

#[test]
#[serial]
fn test_assume_sorted_accepts_unsorted_records() {
    reset_config();
    let content = "chr1:300 A G A:8,G:2,.1,.8,.1,0\nchr1:100 A G A:8,G:2,.1,.8,.1,0\n";
    let intervals = parse_intervals("chr1\t1\t1000\n").unwrap();

    let strict: Result<Vec<Record>> = IntersectCommand::new()
        .join(
            SnvmixReader::new(content.as_bytes()).records(),
            intervals.iter().cloned().map(Ok),
        )
        .collect();
    assert!(strict.is_err());

    config::set_assume_sorted(true);
    let relaxed: Result<Vec<Record>> = IntersectCommand::new()
        .join(
            SnvmixReader::new(content.as_bytes()).records(),
            intervals.into_iter().map(Ok),
        )
        .collect();
    reset_config();
    assert_eq!(relaxed.unwrap().len(), 2);
}

// =============================================================================
// Variant caller
// =============================================================================

#[test]
fn test_bonferroni_over_file_source() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&synthetic(300, 5)).unwrap();
    file.flush().unwrap();

    let n = read_records(file.path()).unwrap().len() as u64;
    assert_eq!(CallCommand::count_records(file.path()).unwrap(), n);

    let mut sink = Vec::new();
    let plain = CallCommand::new().run(file.path(), &mut sink).unwrap();
    let corrected = CallCommand::new()
        .with_bonferroni(true)
        .run(file.path(), &mut sink)
        .unwrap();

    assert_eq!(corrected.correction, n);
    assert_eq!(plain.correction, 1);
    assert!(corrected.variants <= plain.variants);
    assert_eq!(corrected.records_read as u64, n);
}

#[test]
fn test_called_records_pass_the_test() {
    let data = synthetic(300, 9);
    let cmd = CallCommand::new().with_p_value(0.01);
    let reader = SnvmixReader::new(data.as_slice());
    for record in cmd.call(reader.records(), 1).unwrap() {
        let record = record.unwrap();
        assert!(cmd.p_value_of(&record) < 0.01);
    }
}

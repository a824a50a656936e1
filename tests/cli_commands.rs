//! End-to-end tests for the snvmixtools binary.
//!
//! Covers:
//! 1. Each subcommand on a small file
//! 2. stdin input and stdout output via `-`
//! 3. Error reporting and exit status

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::{NamedTempFile, TempDir};

// =============================================================================
// Helper functions
// =============================================================================

const CALLS: &str = "\
chr1:100\tA\tG\tA:8,G:2,0.1,0.8,0.1,1
chr1:150\tC\tT\tC:20,T:20,0.0,1.0,0.0,1
chr1:300\tG\tA\tG:50,A:1,0.9,0.1,0.0,0
chr2:10\tT\tC\tT:0,C:0,0.3,0.3,0.4,2
";

fn create_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file.flush().unwrap();
    file
}

fn run_tool(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_snvmixtools"))
        .args(args)
        .output()
        .expect("Failed to run snvmixtools")
}

fn run_tool_with_stdin(args: &[&str], stdin_content: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_snvmixtools"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn snvmixtools");

    // The tool may exit before reading stdin (argument errors)
    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(stdin_content.as_bytes());
    }

    child.wait_with_output().expect("Failed to wait for snvmixtools")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// =============================================================================
// intersect
// =============================================================================

#[test]
fn test_intersect_writes_records_and_log() {
    let input = create_file(CALLS);
    let bed = create_file("# regions\nchr1\t90\t200\n");
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.snvmix");
    let log = dir.path().join("count.log");

    let output = run_tool(&[
        "intersect",
        path_str(input.path()),
        path_str(bed.path()),
        path_str(&out),
        "--log",
        path_str(&log),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let written = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("chr1:100\tA\tG\tA:8,G:2,0.1000000000,"));
    assert!(lines[1].starts_with("chr1:150\t"));
    assert_eq!(fs::read_to_string(&log).unwrap(), "2\n");
}

#[test]
fn test_intersect_unsorted_bed_fails() {
    let input = create_file(CALLS);
    let bed = create_file("chr1\t200\t300\nchr1\t90\t100\n");

    let output = run_tool(&["intersect", path_str(input.path()), path_str(bed.path()), "-"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("intervals not sorted"));
}

#[test]
fn test_intersect_assume_sorted_skips_check() {
    let input = create_file(CALLS);
    let bed = create_file("chr1\t200\t300\nchr1\t90\t100\n");

    let output = run_tool(&[
        "--assume-sorted",
        "intersect",
        path_str(input.path()),
        path_str(bed.path()),
        "-",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

// =============================================================================
// call
// =============================================================================

#[test]
fn test_call_to_stdout() {
    let input = create_file(CALLS);
    let output = run_tool(&["call", path_str(input.path()), "-"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    let positions: Vec<&str> = text
        .lines()
        .map(|l| l.split('\t').next().unwrap())
        .collect();
    assert_eq!(positions, vec!["chr1:100", "chr1:150"]);
}

#[test]
fn test_call_bonferroni_with_stats() {
    let input = create_file(CALLS);
    let output = run_tool(&[
        "--stats",
        "call",
        path_str(input.path()),
        "-",
        "--bonferroni",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("Correction: 4"));
}

#[test]
fn test_call_bonferroni_rejects_stdin() {
    let output = run_tool_with_stdin(&["call", "-", "-", "--bonferroni"], CALLS);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--bonferroni"));
}

#[test]
fn test_call_stdin_without_correction() {
    let output = run_tool_with_stdin(&["call", "-", "-"], CALLS);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).lines().count(), 2);
}

#[test]
fn test_call_invalid_error_rate() {
    let input = create_file(CALLS);
    let output = run_tool(&["call", path_str(input.path()), "-", "-e", "1.5"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error rate"));
}

// =============================================================================
// snvmix2wig / freqs
// =============================================================================

#[test]
fn test_snvmix2wig_default_score() {
    let output = run_tool_with_stdin(&["snvmix2wig", "-", "-"], CALLS);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "track type=wiggle_0\n\
         variableStep chrom=chr1\n100\t2.0\n150\t20.0\n300\t1.0\n\
         variableStep chrom=chr2\n10\t0.0\n"
    );
}

#[test]
fn test_snvmix2wig_unknown_score() {
    let input = create_file(CALLS);
    let output = run_tool(&["snvmix2wig", path_str(input.path()), "-", "-p", "max"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown score function"));
}

#[test]
fn test_freqs_outputs() {
    let input = create_file(CALLS);
    let dir = TempDir::new().unwrap();
    let hist = dir.path().join("hist.txt");
    let log = dir.path().join("total.log");

    let output = run_tool(&[
        "freqs",
        path_str(input.path()),
        path_str(&hist),
        path_str(&log),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    // Zero-depth record is filtered out: 2 + 20 + 1
    assert_eq!(fs::read_to_string(&log).unwrap(), "23\n");
    let rows = fs::read_to_string(&hist).unwrap();
    assert_eq!(rows.lines().count(), 100);
    let total: u64 = rows
        .lines()
        .map(|l| l.rsplit('\t').next().unwrap().parse::<u64>().unwrap())
        .sum();
    assert_eq!(total, 3);
}

// =============================================================================
// generate and errors
// =============================================================================

#[test]
fn test_generate_feeds_other_commands() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("synthetic.snvmix");

    let output = run_tool(&["generate", path_str(&data), "-n", "500", "--seed", "7"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(fs::read_to_string(&data).unwrap().lines().count(), 500);

    let bed = create_file("chr1\t1\t1000000000\nchr3\t1\t1000000000\n");
    let output = run_tool(&["intersect", path_str(&data), path_str(bed.path()), "-"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let kept = stdout(&output);
    assert!(kept.lines().count() > 0);
    assert!(kept
        .lines()
        .all(|l| l.starts_with("chr1:") || l.starts_with("chr3:")));
}

#[test]
fn test_malformed_record_reports_line() {
    let input = create_file("chr1:100\tA\tG\tA:8,G:2,0.1,0.8,0.1,1\n\nchr1:x\tA\tG\tA:1,G:1,0,0,0,0\n");
    let output = run_tool(&["call", path_str(input.path()), "-"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.starts_with("Error:"));
    assert!(err.contains("line 3"), "stderr: {}", err);
}

#[test]
fn test_missing_input_file() {
    let output = run_tool(&["call", "/nonexistent/calls.snvmix", "-"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("Error:"));
}

//! Integration tests for calibration loading
//!
//! These tests build calibration directories on disk and verify:
//! - Both channels must resolve for a load to succeed
//! - Malformed data rows abort the whole load
//! - A later file for the same channel replaces the earlier one
//! - Loaded curves drive the level adjuster end to end

use std::fs;
use std::path::Path;
use std::sync::Arc;

use spl_monitor::analysis::LevelAdjuster;
use spl_monitor::calibration::{CalibrationStore, Channel, Interpolation};
use spl_monitor::error::{CalibrationError, ErrorCode};

const LEFT_FILE: &str = "\"Sens Factor =-2.5dB, SERNO: 8000001\"\n\
* EARS LEFT ear\n\
20 70 0\n\
1000 94 0\n\
20000 80 0\n";

const RIGHT_FILE: &str = "\"Sens Factor =-1.0dB, SERNO: 8000002\"\n\
* EARS RIGHT ear\n\
20 60 1.5\n\
1000 90 -2.0\n\
20000 75 3.25\n";

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write calibration file");
}

#[test]
fn test_both_channels_load() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "left.txt", LEFT_FILE);
    write(dir.path(), "right.txt", RIGHT_FILE);
    // Ignored: wrong extension
    write(dir.path(), "notes.md", "not a calibration file");

    let store = CalibrationStore::load(dir.path(), 500.0).expect("load succeeds");

    assert_eq!(store.sensitivity(Channel::Left), -2.5);
    assert_eq!(store.sensitivity(Channel::Right), -1.0);
    assert_eq!(store.curve(Channel::Left).points().len(), 3);
    let expected = 70.0 + (94.0 - 70.0) * (500.0 - 20.0) / (1000.0 - 20.0);
    assert!((store.interpolated_spl(Channel::Left) - expected).abs() < 1e-9);
}

#[test]
fn test_left_only_directory_fails_with_channel_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "left.txt", LEFT_FILE);

    let err = CalibrationStore::load(dir.path(), 1000.0).unwrap_err();

    assert_eq!(
        err,
        CalibrationError::MissingChannel {
            channel: Channel::Right
        }
    );
    assert!(err.message().contains("RIGHT"));
}

#[test]
fn test_two_field_row_fails_load() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "left.txt", LEFT_FILE);
    write(
        dir.path(),
        "right.txt",
        "* RIGHT\n20 60 0\n1000 90\n20000 75 0\n",
    );

    let err = CalibrationStore::load(dir.path(), 1000.0).unwrap_err();

    match err {
        CalibrationError::MalformedRow { file, line, .. } => {
            assert_eq!(file, "right.txt");
            assert_eq!(line, 3);
        }
        other => panic!("expected MalformedRow, got {other}"),
    }
}

#[test]
fn test_last_file_wins_for_same_channel() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a_left.txt", LEFT_FILE);
    write(
        dir.path(),
        "b_left.txt",
        "\"Sens Factor =0.5dB\"\n* LEFT replacement\n100 50 0\n200 52 0\n",
    );
    write(dir.path(), "c_right.txt", RIGHT_FILE);

    let store = CalibrationStore::load(dir.path(), 150.0).unwrap();

    // Replaced, not merged
    assert_eq!(store.sensitivity(Channel::Left), 0.5);
    assert_eq!(store.curve(Channel::Left).points().len(), 2);
    assert_eq!(store.lookup(Channel::Left), Interpolation::Found(51.0));
}

#[test]
fn test_missing_directory_fails() {
    let err = CalibrationStore::load("/nonexistent/calfiles", 1000.0).unwrap_err();
    assert!(matches!(err, CalibrationError::DirectoryUnreadable { .. }));
}

#[test]
fn test_out_of_range_frequency_degrades_to_zero() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "left.txt", LEFT_FILE);
    write(dir.path(), "right.txt", RIGHT_FILE);

    let store = Arc::new(CalibrationStore::load(dir.path(), 25_000.0).unwrap());
    assert!(matches!(
        store.lookup(Channel::Right),
        Interpolation::OutOfRange { .. }
    ));
    assert_eq!(store.interpolated_spl(Channel::Right), 0.0);

    let adjuster = LevelAdjuster::new(store, 94.0);
    assert_eq!(adjuster.adjust(Channel::Right, -10.0), -10.0 + 94.0 - 1.0);
}

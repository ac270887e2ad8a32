use std::fs::File;
use std::io::Write;

use gassist_config::load_guide_log_csv;
use rstest::rstest;
use tempfile::tempdir;

#[rstest]
fn loads_rows_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("guide.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "time,ra,dec,snr,mass").unwrap();
    writeln!(f, "0.0,0.10,-0.20,24.0,1000").unwrap();
    writeln!(f, "2.0, 0.35, -0.10, 23.5, 990").unwrap();
    drop(f);

    let rows = load_guide_log_csv(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert!((rows[1].ra - 0.35).abs() < 1e-12);
    assert!((rows[1].snr - 23.5).abs() < 1e-12);
}

#[rstest]
fn rejects_bad_headers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("guide.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "t,x,y").unwrap();
    writeln!(f, "0.0,0.1,0.2").unwrap();
    drop(f);

    let err = load_guide_log_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("must have headers"));
}

#[rstest]
fn rejects_time_going_backwards() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("guide.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "time,ra,dec,snr,mass").unwrap();
    writeln!(f, "4.0,0.1,0.2,20,500").unwrap();
    writeln!(f, "2.0,0.1,0.2,20,500").unwrap();
    drop(f);

    let err = load_guide_log_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("non-decreasing"));
}

#[rstest]
fn rejects_malformed_row() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("guide.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "time,ra,dec,snr,mass").unwrap();
    writeln!(f, "0.0,abc,0.2,20,500").unwrap();
    drop(f);

    let err = load_guide_log_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("invalid CSV row 2"));
}

#[rstest]
fn rejects_empty_log() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("guide.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "time,ra,dec,snr,mass").unwrap();
    drop(f);

    let err = load_guide_log_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("no samples"));
}

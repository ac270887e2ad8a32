use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid TOML config; every section falls back to defaults.
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[assistant]
measure_backlash = true

[logging]
level = "info"
rotation = "never"
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_guide_log(dir: &tempfile::TempDir, header: &str) -> PathBuf {
    let path = dir.path().join("guide.csv");
    let mut f = fs::File::create(&path).unwrap();
    writeln!(f, "{header}").unwrap();
    for (i, (ra, dec)) in [(0.1, -0.2), (0.4, 0.1), (-0.3, 0.0), (0.2, 0.3), (0.0, -0.1)]
        .iter()
        .enumerate()
    {
        writeln!(f, "{},{ra},{dec},22.5,11800", 2.0 * i as f64).unwrap();
    }
    path
}

fn gassist() -> Command {
    let mut cmd = Command::cargo_bin("gassist_cli").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "self-check OK", "stdout")]
#[case(&["simulate", "--duration-s", "120"], 0, "Samples=60", "stdout")]
#[case(&["simulate", "--duration-s", "120"], 0, "Dec Backlash=", "stdout")]
#[case(&["simulate", "--duration-s", "120", "--apply"], 0, "Applied RA min-move", "stdout")]
#[case(&["simulate", "--duration-s", "0"], 1, "--duration-s", "stderr")]
#[case(&["replay"], 2, "--log", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = gassist();
    cmd.arg("--config").arg(&cfg).arg("--log-level").arg("error");
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn runs_without_a_config_file() {
    gassist()
        .args(["--log-level", "error", "self-check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("calibrated=true"));
}

#[test]
fn no_backlash_skips_the_test() {
    gassist()
        .args(["--log-level", "error", "simulate", "--duration-s", "20", "--no-backlash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Samples=10"))
        .stdout(predicate::str::contains("Dec Backlash=").not())
        .stdout(predicate::str::contains("Recommendations:"));
}

#[test]
fn replay_reports_recorded_session() {
    let dir = tempdir().unwrap();
    let log = write_guide_log(&dir, "time,ra,dec,snr,mass");

    gassist()
        .args(["--log-level", "error", "replay", "--log"])
        .arg(&log)
        .args(["--declination-deg", "-20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Samples=5"))
        .stdout(predicate::str::contains("Elapsed Time=8s"))
        .stdout(predicate::str::contains("Try setting RA min-move"));
}

#[test]
fn replay_rejects_bad_headers() {
    let dir = tempdir().unwrap();
    let log = write_guide_log(&dir, "t,x,y,snr,mass");

    gassist()
        .args(["--log-level", "error", "replay", "--log"])
        .arg(&log)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid headers"));
}

#[rstest]
#[case::out_of_range("[recommend]\nmin_move_unit = 0.0\n")]
#[case::wrong_type("[backlash]\nmax_clearing_steps = \"ten\"\n")]
#[case::bad_rotation("[logging]\nrotation = \"weekly\"\n")]
fn invalid_config_is_explained(#[case] toml: &str) {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    fs::write(&cfg, toml).unwrap();

    gassist()
        .arg("--config")
        .arg(&cfg)
        .args(["--log-level", "error", "self-check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration is invalid"));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = tempdir().unwrap();
    gassist()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config file could not be read"));
}

#[test]
fn log_file_receives_json_lines() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("gassist.log");
    let cfg = dir.path().join("cfg.toml");
    fs::write(
        &cfg,
        format!(
            "[logging]\nfile = {:?}\nlevel = \"info\"\n",
            log_path.display().to_string()
        ),
    )
    .unwrap();

    gassist()
        .arg("--config")
        .arg(&cfg)
        .args(["--log-level", "error", "simulate", "--duration-s", "10", "--no-backlash"])
        .assert()
        .success();

    let text = fs::read_to_string(&log_path).unwrap();
    let first = text.lines().next().expect("at least one log line");
    let v: serde_json::Value = serde_json::from_str(first).expect("JSON log line");
    assert!(v.get("level").is_some());
    assert!(text.contains("guiding assistant session started"));
}

/// Validate the JSON schema of a full simulated run.
#[test]
fn simulate_json_schema() {
    let out = gassist()
        .args(["--json", "--log-level", "off", "simulate", "--duration-s", "120"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).expect("valid JSON");

    assert_eq!(v["command"], "simulate");
    let session = &v["session"];
    assert_eq!(session["samples"].as_u64(), Some(60));
    assert!(session["ra"]["rms_px"].as_f64().is_some());
    assert!(session["started_at"].as_str().is_some());
    assert_eq!(session["pae_is_lower_bound"], false);

    let backlash = &v["backlash"];
    assert_eq!(backlash["state"], "Completed");
    assert!(backlash["error"].is_null());
    let distance = backlash["distance_px"].as_f64().expect("distance");
    assert!((10.5..14.0).contains(&distance), "distance {distance}");

    let recs = v["recommendations"].as_array().expect("array");
    let kinds: Vec<&str> = recs.iter().filter_map(|r| r["kind"].as_str()).collect();
    assert!(kinds.contains(&"ra_min_move"));
    assert!(kinds.contains(&"dec_min_move"));
    assert!(kinds.contains(&"dec_backlash"));
    for r in recs {
        assert!(r["severity"].as_str().is_some());
        assert!(r["message"].as_str().is_some());
    }
    assert!(v["applied"].as_array().expect("array").is_empty());
}

#[test]
fn json_errors_are_structured() {
    let dir = tempdir().unwrap();
    let out = gassist()
        .args(["--json", "--log-level", "off", "replay", "--log"])
        .arg(dir.path().join("missing.csv"))
        .assert()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&out);
    let line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
    let v: serde_json::Value = serde_json::from_str(line).expect("valid JSON error");
    assert_eq!(v["reason"], "Error");
    assert!(v["message"].as_str().unwrap_or("").contains("missing.csv"));
}

use gassist_config::load_toml;
use rstest::rstest;

#[test]
fn rejects_zero_clearing_budget() {
    let toml = r#"
[backlash]
min_accepted_moves = 3
max_clearing_steps = 2
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg
        .validate()
        .expect_err("should reject a budget smaller than the accepted-move count");
    assert!(
        format!("{err}")
            .to_lowercase()
            .contains("max_clearing_steps must be >= backlash.min_accepted_moves")
    );
}

#[test]
fn accepts_full_config() {
    let toml = r#"
[assistant]
measure_backlash = false
min_cutoff_s = 6.0
cutoff_exposures = 3.0

[backlash]
min_accepted_moves = 3
expected_distance_px = 4.0
max_clearing_steps = 10
north_pulse_count = 4
north_pulse_size_ms = 500
trial_tolerance_px = 2.0
clearing_bias = 1.25

[recommend]
ra_z = 1.28
dec_z = 1.64
snr_threshold = 10.0
pae_advisory_arcmin = 5.0
pae_warning_arcmin = 10.0

[logging]
level = "debug"
rotation = "daily"

[sim]
exposure_ms = 1000
pixel_scale = 2.1
dec_backlash_px = 0.0
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert!(!cfg.assistant.measure_backlash);
    assert_eq!(cfg.sim.exposure_ms, 1000);
    assert_eq!(cfg.sim.declination_deg, Some(60.0));
}

#[rstest]
#[case("[assistant]\nmin_cutoff_s = 0.0\n", "min_cutoff_s")]
#[case("[backlash]\nnorth_pulse_count = 0\n", "north_pulse_count")]
#[case("[backlash]\nexpected_distance_px = -1.0\n", "expected_distance_px")]
#[case("[backlash]\nclearing_bias = 0.5\n", "clearing_bias")]
#[case("[recommend]\ndec_z = 0.0\n", "dec_z")]
#[case("[recommend]\npae_advisory_arcmin = 12.0\n", "pae_advisory_arcmin")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
#[case("[sim]\ndec_rate_px_per_ms = 0.0\n", "guide rates")]
#[case("[sim]\ndeclination_deg = 95.0\n", "declination_deg")]
fn rejects_out_of_range_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "error {err} does not mention {needle}"
    );
}

#[test]
fn unknown_field_types_fail_to_parse() {
    assert!(load_toml("[backlash]\nnorth_pulse_count = \"four\"\n").is_err());
}

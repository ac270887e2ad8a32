#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and guide-log parsing for the guiding assistant.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//!   Every section is optional and falls back to the defaults below.
//! - The guide-log CSV loader enforces headers so that a recorded session
//!   can be replayed through the statistics engine.
use serde::Deserialize;

/// Guide log CSV schema.
///
/// Expected headers:
/// time,ra,dec,snr,mass
///
/// Example:
/// time,ra,dec,snr,mass
/// 0.0,0.12,-0.05,24.1,11800
/// 2.0,0.31,0.02,23.7,11650
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct GuideLogRow {
    pub time: f64,
    pub ra: f64,
    pub dec: f64,
    pub snr: f64,
    pub mass: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AssistantCfg {
    /// Run the declination backlash test after sampling stops.
    pub measure_backlash: bool,
    /// Lower bound of the high-pass cutoff period (seconds).
    pub min_cutoff_s: f64,
    /// Cutoff period as a multiple of the exposure time.
    pub cutoff_exposures: f64,
}

impl Default for AssistantCfg {
    fn default() -> Self {
        Self {
            measure_backlash: true,
            min_cutoff_s: 6.0,
            cutoff_exposures: 3.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BacklashCfg {
    /// Consecutive same-direction moves needed to call north backlash cleared.
    pub min_accepted_moves: u32,
    /// Minimum move (px) for a clearing pulse to count.
    pub expected_distance_px: f64,
    /// Clearing pulses allowed before giving up.
    pub max_clearing_steps: u32,
    /// Pulses issued in each of the north and south legs.
    pub north_pulse_count: u32,
    /// Upper bound of the north/south leg pulse width (ms).
    pub north_pulse_size_ms: u32,
    /// Residual (px) accepted without fine-tuning the trial correction.
    pub trial_tolerance_px: f64,
    /// Multiplier applied to the clearing pulse to avoid near misses.
    pub clearing_bias: f64,
}

impl Default for BacklashCfg {
    fn default() -> Self {
        Self {
            min_accepted_moves: 3,
            expected_distance_px: 4.0,
            max_clearing_steps: 10,
            north_pulse_count: 4,
            north_pulse_size_ms: 500,
            trial_tolerance_px: 2.0,
            clearing_bias: 1.25,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RecommendCfg {
    /// RA prediction-interval multiplier (80%).
    pub ra_z: f64,
    /// Dec prediction-interval multiplier (90%).
    pub dec_z: f64,
    pub min_move_unit: f64,
    pub min_move_floor: f64,
    /// Recommend a brighter star below this mean SNR.
    pub snr_threshold: f64,
    pub pae_advisory_arcmin: f64,
    pub pae_warning_arcmin: f64,
}

impl Default for RecommendCfg {
    fn default() -> Self {
        Self {
            ra_z: 1.28,
            dec_z: 1.64,
            min_move_unit: 0.05,
            min_move_floor: 0.10,
            snr_threshold: 10.0,
            pae_advisory_arcmin: 5.0,
            pae_warning_arcmin: 10.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Parameters of the simulated mount and guider used by the CLI.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimCfg {
    pub exposure_ms: u32,
    /// Arc-seconds per pixel.
    pub pixel_scale: f64,
    pub ra_rate_px_per_ms: f64,
    pub dec_rate_px_per_ms: f64,
    /// Declination gear slack in pixels.
    pub dec_backlash_px: f64,
    pub ra_drift_px_per_min: f64,
    pub dec_drift_px_per_min: f64,
    /// Amplitude of the RA worm periodic error.
    pub periodic_error_px: f64,
    pub periodic_period_s: f64,
    /// Amplitude of the deterministic seeing jitter.
    pub jitter_px: f64,
    pub max_move_px: f64,
    /// Pointing declination; absent means unknown.
    pub declination_deg: Option<f64>,
    /// Camera rotation relative to the mount axes.
    pub camera_angle_deg: f64,
    pub star_snr: f64,
    pub star_mass: f64,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            exposure_ms: 2000,
            pixel_scale: 1.5,
            ra_rate_px_per_ms: 0.01,
            dec_rate_px_per_ms: 0.01,
            dec_backlash_px: 12.0,
            ra_drift_px_per_min: 1.0,
            dec_drift_px_per_min: 0.6,
            periodic_error_px: 1.2,
            periodic_period_s: 480.0,
            jitter_px: 0.3,
            max_move_px: 50.0,
            declination_deg: Some(60.0),
            camera_angle_deg: 0.0,
            star_snr: 25.0,
            star_mass: 12_000.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub assistant: AssistantCfg,
    #[serde(default)]
    pub backlash: BacklashCfg,
    #[serde(default)]
    pub recommend: RecommendCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub sim: SimCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_guide_log_csv(path: &std::path::Path) -> eyre::Result<Vec<GuideLogRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open guide log CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["time", "ra", "dec", "snr", "mass"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "guide log CSV must have headers 'time,ra,dec,snr,mass', got: {}",
            actual.join(",")
        );
    }

    let mut rows: Vec<GuideLogRow> = Vec::new();
    for (idx, rec) in rdr.deserialize::<GuideLogRow>().enumerate() {
        match rec {
            Ok(row) => {
                if let Some(prev) = rows.last()
                    && row.time < prev.time
                {
                    eyre::bail!(
                        "guide log time must be non-decreasing (row {}: {} < {})",
                        idx + 2,
                        row.time,
                        prev.time
                    );
                }
                rows.push(row);
            }
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    if rows.is_empty() {
        eyre::bail!("guide log CSV {:?} contains no samples", path);
    }
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Assistant
        if !(self.assistant.min_cutoff_s > 0.0) {
            eyre::bail!("assistant.min_cutoff_s must be > 0");
        }
        if !(self.assistant.cutoff_exposures > 0.0) {
            eyre::bail!("assistant.cutoff_exposures must be > 0");
        }

        // Backlash
        let b = &self.backlash;
        if b.min_accepted_moves == 0 {
            eyre::bail!("backlash.min_accepted_moves must be >= 1");
        }
        if !(b.expected_distance_px > 0.0) {
            eyre::bail!("backlash.expected_distance_px must be > 0");
        }
        if b.max_clearing_steps < b.min_accepted_moves {
            eyre::bail!("backlash.max_clearing_steps must be >= backlash.min_accepted_moves");
        }
        if b.north_pulse_count == 0 {
            eyre::bail!("backlash.north_pulse_count must be >= 1");
        }
        if b.north_pulse_size_ms == 0 {
            eyre::bail!("backlash.north_pulse_size_ms must be >= 1");
        }
        if !(b.trial_tolerance_px >= 0.0) {
            eyre::bail!("backlash.trial_tolerance_px must be >= 0");
        }
        if !(b.clearing_bias >= 1.0) {
            eyre::bail!("backlash.clearing_bias must be >= 1.0");
        }

        // Recommendations
        let r = &self.recommend;
        if !(r.ra_z > 0.0) || !(r.dec_z > 0.0) {
            eyre::bail!("recommend.ra_z and recommend.dec_z must be > 0");
        }
        if !(r.min_move_unit > 0.0) {
            eyre::bail!("recommend.min_move_unit must be > 0");
        }
        if !(r.min_move_floor >= 0.0) {
            eyre::bail!("recommend.min_move_floor must be >= 0");
        }
        if !(r.snr_threshold >= 0.0) {
            eyre::bail!("recommend.snr_threshold must be >= 0");
        }
        if !(r.pae_advisory_arcmin < r.pae_warning_arcmin) {
            eyre::bail!("recommend.pae_advisory_arcmin must be < recommend.pae_warning_arcmin");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot}");
        }

        // Simulator
        let s = &self.sim;
        if s.exposure_ms == 0 {
            eyre::bail!("sim.exposure_ms must be >= 1");
        }
        if !(s.pixel_scale > 0.0) {
            eyre::bail!("sim.pixel_scale must be > 0");
        }
        if !(s.ra_rate_px_per_ms > 0.0) || !(s.dec_rate_px_per_ms > 0.0) {
            eyre::bail!("sim guide rates must be > 0");
        }
        if !(s.dec_backlash_px >= 0.0) {
            eyre::bail!("sim.dec_backlash_px must be >= 0");
        }
        if !(s.periodic_period_s > 0.0) {
            eyre::bail!("sim.periodic_period_s must be > 0");
        }
        if !(s.max_move_px > 0.0) {
            eyre::bail!("sim.max_move_px must be > 0");
        }
        if let Some(dec) = s.declination_deg
            && !(-90.0..=90.0).contains(&dec)
        {
            eyre::bail!("sim.declination_deg must be in [-90, 90]");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = load_toml("").expect("empty TOML parses");
        assert!(cfg.assistant.measure_backlash);
        assert_eq!(cfg.backlash.max_clearing_steps, 10);
        assert!((cfg.recommend.ra_z - 1.28).abs() < 1e-12);
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = load_toml("[backlash]\nnorth_pulse_count = 6\n").expect("parse");
        assert_eq!(cfg.backlash.north_pulse_count, 6);
        assert_eq!(cfg.backlash.north_pulse_size_ms, 500);
    }
}

//! Configuration types for the guiding assistant.
//!
//! These are the runtime configuration structs used by the state machines.
//! They are separate from the TOML-deserialized config in `gassist_config`.

/// Backlash measurement tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct BacklashCfg {
    /// Consecutive same-direction moves that prove north backlash is cleared.
    pub min_accepted_moves: u32,
    /// A clearing move counts only when it is at least this large (px).
    pub expected_distance_px: f64,
    /// Clearing pulses allowed before giving up.
    pub max_clearing_steps: u32,
    /// Pulses in each of the north and south legs.
    pub north_pulse_count: u32,
    /// Upper bound of the leg pulse width (ms).
    pub north_pulse_size_ms: u32,
    /// Residual after the trial correction that needs no fine-tuning (px).
    pub trial_tolerance_px: f64,
    /// Clearing pulses are sized for `expected_distance_px * clearing_bias`.
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

/// Thresholds for turning measurements into advice.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendCfg {
    /// RA prediction-interval multiplier (80%).
    pub ra_z: f64,
    /// Dec prediction-interval multiplier (90%).
    pub dec_z: f64,
    /// Min-move values are quantized to this step (px).
    pub min_move_unit: f64,
    pub min_move_floor: f64,
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

/// Assistant-level settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantCfg {
    pub measure_backlash: bool,
    /// Floor of the high-pass cutoff period (s).
    pub min_cutoff_s: f64,
    /// Cutoff period as a multiple of the exposure.
    pub cutoff_exposures: f64,
    pub backlash: BacklashCfg,
    pub recommend: RecommendCfg,
}

impl Default for AssistantCfg {
    fn default() -> Self {
        Self {
            measure_backlash: true,
            min_cutoff_s: 6.0,
            cutoff_exposures: 3.0,
            backlash: BacklashCfg::default(),
            recommend: RecommendCfg::default(),
        }
    }
}

impl AssistantCfg {
    /// High-pass cutoff period for a given exposure.
    pub fn cutoff_period(&self, exposure_s: f64) -> f64 {
        self.min_cutoff_s.max(self.cutoff_exposures * exposure_s)
    }
}

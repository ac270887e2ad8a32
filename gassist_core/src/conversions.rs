//! `From` implementations bridging `gassist_config` types to `gassist_core` types.

use crate::config::{AssistantCfg, BacklashCfg, RecommendCfg};

// ── BacklashCfg ──────────────────────────────────────────────────────────────

impl From<&gassist_config::BacklashCfg> for BacklashCfg {
    fn from(c: &gassist_config::BacklashCfg) -> Self {
        Self {
            min_accepted_moves: c.min_accepted_moves,
            expected_distance_px: c.expected_distance_px,
            max_clearing_steps: c.max_clearing_steps,
            north_pulse_count: c.north_pulse_count,
            north_pulse_size_ms: c.north_pulse_size_ms,
            trial_tolerance_px: c.trial_tolerance_px,
            clearing_bias: c.clearing_bias,
        }
    }
}

// ── RecommendCfg ─────────────────────────────────────────────────────────────

impl From<&gassist_config::RecommendCfg> for RecommendCfg {
    fn from(c: &gassist_config::RecommendCfg) -> Self {
        Self {
            ra_z: c.ra_z,
            dec_z: c.dec_z,
            min_move_unit: c.min_move_unit,
            min_move_floor: c.min_move_floor,
            snr_threshold: c.snr_threshold,
            pae_advisory_arcmin: c.pae_advisory_arcmin,
            pae_warning_arcmin: c.pae_warning_arcmin,
        }
    }
}

// ── AssistantCfg ─────────────────────────────────────────────────────────────

impl From<&gassist_config::Config> for AssistantCfg {
    fn from(c: &gassist_config::Config) -> Self {
        Self {
            measure_backlash: c.assistant.measure_backlash,
            min_cutoff_s: c.assistant.min_cutoff_s,
            cutoff_exposures: c.assistant.cutoff_exposures,
            backlash: (&c.backlash).into(),
            recommend: (&c.recommend).into(),
        }
    }
}

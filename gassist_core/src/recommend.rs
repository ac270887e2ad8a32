//! Turn session statistics and a backlash result into advice.

use gassist_traits::{Axis, Mount};

use crate::backlash::BacklashResult;
use crate::config::RecommendCfg;
use crate::session::SessionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Advisory,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Advisory => "advisory",
            Severity::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    /// Min-move value for the guide algorithm on an axis (px).
    MinMove { axis: Axis, value: f64 },
    PolarAlignment { error_arcmin: f64, severity: Severity },
    /// Mean star SNR is too low for reliable centroids.
    StarSnr { mean_snr: f64 },
    DecBacklash { distance_px: f64, duration_ms: u32 },
}

impl Recommendation {
    pub fn kind(&self) -> &'static str {
        match self {
            Recommendation::MinMove { axis: Axis::Ra, .. } => "ra_min_move",
            Recommendation::MinMove { axis: Axis::Dec, .. } => "dec_min_move",
            Recommendation::PolarAlignment { .. } => "polar_alignment",
            Recommendation::StarSnr { .. } => "star_snr",
            Recommendation::DecBacklash { .. } => "dec_backlash",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Recommendation::PolarAlignment { severity, .. } => *severity,
            Recommendation::StarSnr { .. } => Severity::Advisory,
            Recommendation::MinMove { .. } | Recommendation::DecBacklash { .. } => Severity::Info,
        }
    }

    /// Whether the assistant can apply this recommendation to the mount.
    pub fn is_applicable(&self) -> bool {
        matches!(self, Recommendation::MinMove { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Recommendation::MinMove { axis, value } => {
                format!("Try setting {} min-move to {value:.2}", axis.name())
            }
            Recommendation::PolarAlignment { severity, .. } if *severity == Severity::Warning => {
                "Your polar alignment is pretty far off. You are likely to see field rotation \
                 unless you keep your exposures very short."
                    .to_string()
            }
            Recommendation::PolarAlignment { .. } => {
                "You may want to improve your polar alignment to reduce field rotation near the pole."
                    .to_string()
            }
            Recommendation::StarSnr { .. } => {
                "Consider using a brighter star or increasing the exposure time".to_string()
            }
            Recommendation::DecBacklash { duration_ms, .. } => {
                format!("Try setting a Dec backlash value of {duration_ms} ms")
            }
        }
    }
}

/// Quantize `rms * z` to a multiple of `min_move_unit`, biased up by half a
/// unit and never below `min_move_floor`.
pub fn min_move(rms: f64, z: f64, cfg: &RecommendCfg) -> f64 {
    let unit = cfg.min_move_unit;
    ((rms * z / unit + 0.5).round() * unit).max(cfg.min_move_floor)
}

/// Recommendations for a live mount: min-move advice only for axes whose
/// guide algorithm has a min-move setting.
pub fn derive<M: Mount + ?Sized>(
    result: &SessionResult,
    backlash: Option<&BacklashResult>,
    mount: &M,
    cfg: &RecommendCfg,
) -> Vec<Recommendation> {
    let axes: Vec<Axis> = [Axis::Ra, Axis::Dec]
        .into_iter()
        .filter(|&axis| mount.min_move(axis).is_some())
        .collect();
    derive_for_axes(result, backlash, &axes, cfg)
}

/// Recommendations in display order: polar alignment, RA and Dec min-move,
/// star SNR, Dec backlash.
///
/// Min-move advice is given for `min_move_axes` only; backlash advice needs
/// a completed measurement that found some backlash.
pub fn derive_for_axes(
    result: &SessionResult,
    backlash: Option<&BacklashResult>,
    min_move_axes: &[Axis],
    cfg: &RecommendCfg,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    let pae = result.polar_alignment_error_arcmin;
    if pae > cfg.pae_advisory_arcmin {
        let severity = if pae < cfg.pae_warning_arcmin {
            Severity::Advisory
        } else {
            Severity::Warning
        };
        out.push(Recommendation::PolarAlignment {
            error_arcmin: pae,
            severity,
        });
    }

    for (axis, rms, z) in [
        (Axis::Ra, result.ra.rms, cfg.ra_z),
        (Axis::Dec, result.dec.rms, cfg.dec_z),
    ] {
        if min_move_axes.contains(&axis) {
            out.push(Recommendation::MinMove {
                axis,
                value: min_move(rms, z, cfg),
            });
        }
    }

    if result.samples > 0 && result.snr_avg < cfg.snr_threshold {
        out.push(Recommendation::StarSnr {
            mean_snr: result.snr_avg,
        });
    }

    if let Some(b) = backlash
        && b.distance_px > 0.0
    {
        out.push(Recommendation::DecBacklash {
            distance_px: b.distance_px,
            duration_ms: b.duration_ms,
        });
    }

    for r in &out {
        tracing::info!(kind = r.kind(), "Recommendation: {}", r.message());
    }
    out
}

//! Text and JSON rendering of assistant results.

use gassist_core::report;
use gassist_core::{BacklashMeasurement, BacklashState, Recommendation, SessionResult};
use serde_json::{Value, json};

pub fn session_json(r: &SessionResult) -> Value {
    let axis = |a: &gassist_core::AxisSummary| {
        json!({
            "rms_px": a.rms,
            "mean_px": a.mean,
            "peak_raw_delta_px": a.peak_raw_delta,
            "drift_px_per_min": a.drift_px_per_min,
        })
    };
    json!({
        "started_at": r.started_at.to_rfc3339(),
        "exposure_s": r.exposure_s,
        "samples": r.samples,
        "elapsed_s": r.elapsed_s,
        "snr_avg": r.snr_avg,
        "mass_avg": r.mass_avg,
        "ra": axis(&r.ra),
        "dec": axis(&r.dec),
        "combined_rms_px": r.combined_rms,
        "ra_peak_to_peak_px": r.ra_peak_to_peak,
        "ra_max_drift_px_per_s": r.ra_max_drift_px_per_s,
        "max_exposure_s": r.max_exposure_s,
        "pixel_scale": r.pixel_scale,
        "declination_rad": r.declination,
        "polar_alignment_error_arcmin": r.polar_alignment_error_arcmin,
        "pae_is_lower_bound": r.pae_is_lower_bound,
    })
}

/// `null` when the test never ran.
pub fn backlash_json(bm: &BacklashMeasurement, ran: bool) -> Value {
    if !ran {
        return Value::Null;
    }
    let result = if bm.state() == BacklashState::Completed {
        bm.result()
    } else {
        None
    };
    json!({
        "state": format!("{:?}", bm.state()),
        "status": bm.status(),
        "distance_px": result.map(|r| r.distance_px),
        "duration_ms": result.map(|r| r.duration_ms),
        "error": bm.last_error().map(|e| e.to_string()),
    })
}

pub fn recommendations_json(recs: &[Recommendation]) -> Value {
    Value::Array(
        recs.iter()
            .map(|r| {
                let mut obj = json!({
                    "kind": r.kind(),
                    "severity": r.severity().as_str(),
                    "applicable": r.is_applicable(),
                    "message": r.message(),
                });
                let value = match r {
                    Recommendation::MinMove { value, .. } => Some(*value),
                    Recommendation::PolarAlignment { error_arcmin, .. } => Some(*error_arcmin),
                    Recommendation::StarSnr { mean_snr } => Some(*mean_snr),
                    Recommendation::DecBacklash { duration_ms, .. } => Some(f64::from(*duration_ms)),
                };
                obj["value"] = json!(value);
                obj
            })
            .collect(),
    )
}

/// Report followed by one line per recommendation.
pub fn print_text(result: &SessionResult, bm: Option<&BacklashMeasurement>, recs: &[Recommendation]) {
    let completed = bm
        .filter(|b| b.state() == BacklashState::Completed)
        .and_then(BacklashMeasurement::result);
    print!("{}", report::render(result, completed));
    if let Some(b) = bm
        && let Some(e) = b.last_error()
    {
        println!("Backlash measurement aborted: {e}");
    }
    if recs.is_empty() {
        println!("Recommendations: none");
        return;
    }
    println!("Recommendations:");
    for r in recs {
        println!("  [{}] {}", r.severity().as_str(), r.message());
    }
}

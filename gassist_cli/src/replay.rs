//! `replay`: run a recorded guide log through the session statistics.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use eyre::{Result, WrapErr};
use gassist_config::{Config, GuideLogRow};
use gassist_core::{AssistantCfg, Session, recommend};
use gassist_traits::{Axis, GuideStep, ManualClock, Point};
use serde_json::json;

use crate::output;

pub struct ReplayOpts {
    pub exposure_s: Option<f64>,
    pub pixel_scale: Option<f64>,
    pub declination_deg: Option<f64>,
}

/// Mean frame spacing, or `fallback_s` for a single-frame log.
pub fn infer_exposure_s(rows: &[GuideLogRow], fallback_s: f64) -> f64 {
    match (rows.first(), rows.last()) {
        (Some(first), Some(last)) if rows.len() > 1 && last.time > first.time => {
            (last.time - first.time) / (rows.len() - 1) as f64
        }
        _ => fallback_s,
    }
}

pub fn run_replay(cfg: &Config, log: &Path, opts: &ReplayOpts, json_out: bool) -> Result<()> {
    let rows = gassist_config::load_guide_log_csv(log)
        .wrap_err_with(|| format!("load guide log {}", log.display()))?;

    let exposure_s = opts
        .exposure_s
        .unwrap_or_else(|| infer_exposure_s(&rows, f64::from(cfg.sim.exposure_ms) / 1000.0));
    if !(exposure_s > 0.0) {
        eyre::bail!("--exposure-s must be > 0, got {exposure_s}");
    }
    let pixel_scale = opts.pixel_scale.unwrap_or(cfg.sim.pixel_scale);
    if !(pixel_scale > 0.0) {
        eyre::bail!("--pixel-scale must be > 0, got {pixel_scale}");
    }

    let acfg = AssistantCfg::from(cfg);
    let clock = ManualClock::new();
    let mut session = Session::new(
        Arc::new(clock.clone()),
        exposure_s,
        acfg.cutoff_period(exposure_s),
    );

    let origin = rows.first().map_or(0.0, |r| r.time);
    for row in &rows {
        clock.set_offset(Duration::try_from_secs_f64(row.time - origin).unwrap_or_default());
        session.add_step(&GuideStep {
            time_s: row.time,
            mount_offset: Point::new(row.ra, row.dec),
            star_snr: row.snr,
            star_mass: row.mass,
        });
    }
    tracing::info!(samples = session.count(), exposure_s, "replayed guide log");

    let result = session.result(pixel_scale, opts.declination_deg.map(f64::to_radians));
    // A log carries no mount; advise min-move on both axes.
    let recs =
        recommend::derive_for_axes(&result, None, &[Axis::Ra, Axis::Dec], &acfg.recommend);

    if json_out {
        let obj = json!({
            "command": "replay",
            "log": log.display().to_string(),
            "session": output::session_json(&result),
            "recommendations": output::recommendations_json(&recs),
        });
        println!("{obj}");
    } else {
        output::print_text(&result, None, &recs);
    }
    Ok(())
}

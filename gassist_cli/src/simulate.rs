//! `simulate`: a full assistant session against the simulated rig.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::{Result, WrapErr, eyre};
use gassist_config::{Config, SimCfg};
use gassist_core::{AssistantCfg, AssistantState, GuidingAssistant, Recommendation};
use gassist_sim::{SimParams, simulated_pair};
use gassist_traits::{Axis, Guider, ManualClock};
use serde_json::json;

use crate::output;

pub struct SimulateOpts {
    pub duration_s: f64,
    pub no_backlash: bool,
    pub apply: bool,
    pub max_backlash_frames: u32,
}

pub fn sim_params(c: &SimCfg) -> SimParams {
    SimParams {
        exposure_ms: c.exposure_ms,
        pixel_scale: c.pixel_scale,
        ra_rate_px_per_ms: c.ra_rate_px_per_ms,
        dec_rate_px_per_ms: c.dec_rate_px_per_ms,
        dec_backlash_px: c.dec_backlash_px,
        ra_drift_px_per_min: c.ra_drift_px_per_min,
        dec_drift_px_per_min: c.dec_drift_px_per_min,
        periodic_error_px: c.periodic_error_px,
        periodic_period_s: c.periodic_period_s,
        jitter_px: c.jitter_px,
        max_move_px: c.max_move_px,
        declination_deg: c.declination_deg,
        camera_angle_deg: c.camera_angle_deg,
        star_snr: c.star_snr,
        star_mass: c.star_mass,
    }
}

pub fn run_simulate(
    cfg: &Config,
    opts: &SimulateOpts,
    json_out: bool,
    shutdown: &Arc<AtomicBool>,
) -> Result<()> {
    if !(opts.duration_s > 0.0) {
        eyre::bail!("--duration-s must be > 0, got {}", opts.duration_s);
    }

    let mut acfg = AssistantCfg::from(cfg);
    if opts.no_backlash {
        acfg.measure_backlash = false;
    }
    let measure_backlash = acfg.measure_backlash;

    let (mount, guider) = simulated_pair(sim_params(&cfg.sim));
    let clock = ManualClock::new();
    let mut ga = GuidingAssistant::new(mount, guider, acfg, Arc::new(clock.clone()));

    let dt_s = f64::from(cfg.sim.exposure_ms) / 1000.0;
    let tick = Duration::from_millis(u64::from(cfg.sim.exposure_ms));
    let frames = (opts.duration_s / dt_s).ceil() as u64;

    ga.start().wrap_err("start guiding assistant")?;
    tracing::info!(frames, exposure_s = dt_s, "sampling");
    for _ in 0..frames {
        if shutdown.load(Ordering::Relaxed) {
            tracing::warn!("interrupted; stopping early");
            break;
        }
        clock.advance(tick);
        let frame = ga.guider_mut().next_frame(dt_s);
        ga.on_guide_step(&frame);
    }
    ga.stop();

    let mut backlash_frames = 0u32;
    while ga.state() == AssistantState::MeasuringBacklash {
        if shutdown.load(Ordering::Relaxed) || backlash_frames >= opts.max_backlash_frames {
            tracing::warn!(backlash_frames, "cancelling backlash measurement");
            ga.stop();
            break;
        }
        clock.advance(tick);
        ga.guider_mut().next_frame(dt_s);
        let pos = ga.guider().current_position();
        ga.on_backlash_step(pos);
        backlash_frames += 1;
    }

    let mut applied = Vec::new();
    if opts.apply {
        for rec in ga.recommendations().to_vec() {
            if let Recommendation::MinMove { axis, .. } = rec {
                let value = match axis {
                    Axis::Ra => ga.apply_ra_min_move()?,
                    Axis::Dec => ga.apply_dec_min_move()?,
                };
                applied.push((axis, value));
            }
        }
    }

    let result = ga
        .result()
        .ok_or_else(|| eyre!("assistant stopped without a session result"))?;
    let backlash = measure_backlash.then(|| ga.backlash());

    if json_out {
        let obj = json!({
            "command": "simulate",
            "session": output::session_json(result),
            "backlash": output::backlash_json(ga.backlash(), measure_backlash),
            "recommendations": output::recommendations_json(ga.recommendations()),
            "applied": applied
                .iter()
                .map(|(axis, value)| json!({ "axis": axis.name(), "min_move": value }))
                .collect::<Vec<_>>(),
        });
        println!("{obj}");
    } else {
        output::print_text(result, backlash, ga.recommendations());
        for (axis, value) in &applied {
            println!("Applied {} min-move = {value:.2}", axis.name());
        }
    }
    Ok(())
}

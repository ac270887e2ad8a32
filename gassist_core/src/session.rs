//! One sampling run of the assistant.
//!
//! A `Session` accumulates per-frame statistics while guide output is
//! disabled and the star is free to wander; `result()` turns them into a
//! `SessionResult` snapshot at any time.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use gassist_traits::{Clock, GuideStep, Point};

use crate::stats::StatisticsTracker;

/// Arc-minutes of polar alignment error per (px/min of Dec drift * arc-sec/px).
const PAE_COEFFICIENT: f64 = 3.8197;

/// Minimum frame spacing (s) for the RA drift-rate estimate.
const MIN_RATE_DT_S: f64 = 0.0001;

/// Per-axis figures of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisSummary {
    pub rms: f64,
    pub mean: f64,
    /// Largest frame-to-frame raw move (px).
    pub peak_raw_delta: f64,
    /// Net drift over the session (px/min).
    pub drift_px_per_min: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub started_at: DateTime<Local>,
    pub exposure_s: f64,
    pub samples: u64,
    pub elapsed_s: f64,
    pub snr_avg: f64,
    pub mass_avg: f64,
    pub ra: AxisSummary,
    pub dec: AxisSummary,
    pub combined_rms: f64,
    pub ra_peak_to_peak: f64,
    /// Fastest low-pass RA drift seen between two frames (px/s).
    pub ra_max_drift_px_per_s: f64,
    /// Longest exposure that keeps RA drift within the RA RMS (s).
    pub max_exposure_s: f64,
    /// arc-sec per pixel
    pub pixel_scale: f64,
    /// Pointing declination in radians, when known.
    pub declination: Option<f64>,
    pub polar_alignment_error_arcmin: f64,
    /// Set when the declination was unknown and the error is a minimum.
    pub pae_is_lower_bound: bool,
}

impl SessionResult {
    /// Convert pixels to arc-seconds.
    pub fn arcsec(&self, px: f64) -> f64 {
        px * self.pixel_scale
    }
}

pub struct Session {
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    started_at: DateTime<Local>,
    exposure_s: f64,
    ra: StatisticsTracker,
    dec: StatisticsTracker,
    ra_min: f64,
    ra_max: f64,
    start_pos: Point,
    last_pos: Point,
    last_time: f64,
    max_ra_rate: f64,
    snr_sum: f64,
    mass_sum: f64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("started_at", &self.started_at)
            .field("exposure_s", &self.exposure_s)
            .field("samples", &self.ra.count())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start sampling now. Both trackers use `cutoff_period` and a sample
    /// period equal to the exposure.
    pub fn new(clock: Arc<dyn Clock + Send + Sync>, exposure_s: f64, cutoff_period: f64) -> Self {
        let epoch = clock.now();
        tracing::info!(exposure_s, cutoff_period, "guiding assistant session started");
        Self {
            clock,
            epoch,
            started_at: Local::now(),
            exposure_s,
            ra: StatisticsTracker::new(cutoff_period, exposure_s),
            dec: StatisticsTracker::new(cutoff_period, exposure_s),
            ra_min: 0.0,
            ra_max: 0.0,
            start_pos: Point::default(),
            last_pos: Point::default(),
            last_time: 0.0,
            max_ra_rate: 0.0,
            snr_sum: 0.0,
            mass_sum: 0.0,
        }
    }

    pub fn add_step(&mut self, step: &GuideStep) {
        let ra = step.mount_offset.x;
        let dec = step.mount_offset.y;
        let prev_ra_lpf = self.ra.low_pass();

        self.ra.add_sample(ra);
        self.dec.add_sample(dec);

        if self.ra.count() == 1 {
            self.ra_min = ra;
            self.ra_max = ra;
            self.start_pos = step.mount_offset;
            self.max_ra_rate = 0.0;
        } else {
            self.ra_min = self.ra_min.min(ra);
            self.ra_max = self.ra_max.max(ra);

            let dt = step.time_s - self.last_time;
            if dt > MIN_RATE_DT_S {
                let rate = (self.ra.low_pass() - prev_ra_lpf).abs() / dt;
                self.max_ra_rate = self.max_ra_rate.max(rate);
            }
        }

        self.last_pos = step.mount_offset;
        self.last_time = step.time_s;
        self.snr_sum += step.star_snr;
        self.mass_sum += step.star_mass;
    }

    pub fn count(&self) -> u64 {
        self.ra.count()
    }

    /// Seconds since the session started, per the injected clock.
    pub fn elapsed_s(&self) -> f64 {
        self.clock.elapsed_since(self.epoch).as_secs_f64()
    }

    pub fn result(&self, pixel_scale: f64, declination: Option<f64>) -> SessionResult {
        let n = self.count();
        let elapsed_s = self.elapsed_s();
        let (ra_mean, ra_rms) = self.ra.mean_and_stdev();
        let (dec_mean, dec_rms) = self.dec.mean_and_stdev();

        let drift = |last: f64, start: f64| {
            if n == 0 || elapsed_s <= 0.0 {
                0.0
            } else {
                (last - start) / elapsed_s * 60.0
            }
        };
        let ra_drift = drift(self.last_pos.x, self.start_pos.x);
        let dec_drift = drift(self.last_pos.y, self.start_pos.y);

        let (cos_dec, pae_is_lower_bound) = match declination {
            Some(d) if d != 0.0 => (d.cos(), false),
            _ => (1.0, true),
        };
        let pae = PAE_COEFFICIENT * dec_drift.abs() * pixel_scale / cos_dec;

        let per_sample = |sum: f64| if n == 0 { 0.0 } else { sum / n as f64 };

        SessionResult {
            started_at: self.started_at,
            exposure_s: self.exposure_s,
            samples: n,
            elapsed_s,
            snr_avg: per_sample(self.snr_sum),
            mass_avg: per_sample(self.mass_sum),
            ra: AxisSummary {
                rms: ra_rms,
                mean: ra_mean,
                peak_raw_delta: self.ra.peak_raw_delta(),
                drift_px_per_min: ra_drift,
            },
            dec: AxisSummary {
                rms: dec_rms,
                mean: dec_mean,
                peak_raw_delta: self.dec.peak_raw_delta(),
                drift_px_per_min: dec_drift,
            },
            combined_rms: ra_rms.hypot(dec_rms),
            ra_peak_to_peak: self.ra_max - self.ra_min,
            ra_max_drift_px_per_s: self.max_ra_rate,
            max_exposure_s: if self.max_ra_rate > 0.0 {
                ra_rms / self.max_ra_rate
            } else {
                0.0
            },
            pixel_scale,
            declination,
            polar_alignment_error_arcmin: pae,
            pae_is_lower_bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gassist_traits::ManualClock;
    use std::time::Duration;

    fn step(t: f64, ra: f64, dec: f64, snr: f64) -> GuideStep {
        GuideStep {
            time_s: t,
            mount_offset: Point::new(ra, dec),
            star_snr: snr,
            star_mass: 1000.0,
        }
    }

    #[test]
    fn empty_session_is_all_zero() {
        let clock = ManualClock::new();
        let s = Session::new(Arc::new(clock.clone()), 2.0, 6.0);
        clock.advance(Duration::from_secs(10));
        let r = s.result(1.5, Some(0.5));
        assert_eq!(r.samples, 0);
        assert_eq!(r.snr_avg, 0.0);
        assert_eq!(r.ra.drift_px_per_min, 0.0);
        assert_eq!(r.polar_alignment_error_arcmin, 0.0);
    }

    #[test]
    fn drift_is_zero_when_no_time_elapsed() {
        let clock = ManualClock::new();
        let mut s = Session::new(Arc::new(clock.clone()), 2.0, 6.0);
        s.add_step(&step(0.0, 0.0, 0.0, 20.0));
        s.add_step(&step(2.0, 1.0, 1.0, 20.0));
        let r = s.result(1.0, None);
        assert_eq!(r.dec.drift_px_per_min, 0.0);
        assert!(r.pae_is_lower_bound);
    }

    #[test]
    fn drift_and_polar_alignment_from_elapsed_time() {
        let clock = ManualClock::new();
        let mut s = Session::new(Arc::new(clock.clone()), 2.0, 6.0);
        s.add_step(&step(0.0, 0.0, 0.0, 20.0));
        s.add_step(&step(60.0, 3.0, 2.0, 30.0));
        clock.advance(Duration::from_secs(60));

        let dec = 60f64.to_radians();
        let r = s.result(1.5, Some(dec));
        assert!((r.ra.drift_px_per_min - 3.0).abs() < 1e-9);
        assert!((r.dec.drift_px_per_min - 2.0).abs() < 1e-9);
        let expected = 3.8197 * 2.0 * 1.5 / dec.cos();
        assert!((r.polar_alignment_error_arcmin - expected).abs() < 1e-9);
        assert!(!r.pae_is_lower_bound);
        assert!((r.snr_avg - 25.0).abs() < 1e-12);
        assert!((r.ra_peak_to_peak - 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_declination_is_a_lower_bound() {
        let clock = ManualClock::new();
        let mut s = Session::new(Arc::new(clock.clone()), 1.0, 6.0);
        s.add_step(&step(0.0, 0.0, 0.0, 20.0));
        s.add_step(&step(30.0, 0.0, 1.0, 20.0));
        clock.advance(Duration::from_secs(30));
        let r = s.result(2.0, Some(0.0));
        assert!(r.pae_is_lower_bound);
        assert!((r.polar_alignment_error_arcmin - 3.8197 * 2.0 * 2.0).abs() < 1e-9);
    }

    #[test]
    fn ra_rate_ignores_coincident_frames() {
        let clock = ManualClock::new();
        let mut s = Session::new(Arc::new(clock), 1.0, 6.0);
        s.add_step(&step(1.0, 0.0, 0.0, 20.0));
        s.add_step(&step(1.0, 5.0, 0.0, 20.0));
        assert_eq!(s.result(1.0, None).ra_max_drift_px_per_s, 0.0);

        s.add_step(&step(2.0, 10.0, 0.0, 20.0));
        let r = s.result(1.0, None);
        // alpha = 6/7, so each raw step moves the low-pass state by 1/7 of it.
        assert!((r.ra_max_drift_px_per_s - 5.0 / 7.0).abs() < 1e-9);
        assert!(r.max_exposure_s > 0.0);
    }
}

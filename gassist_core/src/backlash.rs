//! Declination backlash measurement.
//!
//! The machine is cooperative: the host calls [`BacklashMeasurement::step`]
//! once per guide frame with the star's camera position, and each call issues
//! at most one guide pulse. Phases run in order:
//!
//! 1. clear any north backlash until several same-direction moves are seen,
//! 2. step north a fixed number of pulses to measure the real north rate,
//! 3. step south the same number of pulses,
//! 4. pulse south once more by the estimated backlash and fine-tune the
//!    duration from the residual.
//!
//! The guider is held in measurement mode from the first step until the
//! machine reaches a terminal state, and released only if this run enabled it.

use gassist_traits::{Axis, Direction, Guider, Mount, Point};

use crate::config::BacklashCfg;
use crate::error::BacklashError;
use crate::hw_error::{HwOp, map_hw_error};
use crate::status::StepOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklashState {
    Initialize,
    ClearingNorth,
    SteppingNorth,
    SteppingSouth,
    TestingCorrection,
    Completed,
    Aborted,
}

impl BacklashState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BacklashState::Completed | BacklashState::Aborted)
    }
}

/// Outcome of a completed measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct BacklashResult {
    /// Estimated declination backlash in pixels.
    pub distance_px: f64,
    /// Pulse needed to take up the backlash, in milliseconds.
    pub duration_ms: u32,
    pub status: String,
}

#[derive(Debug)]
pub struct BacklashMeasurement {
    cfg: BacklashCfg,
    state: BacklashState,
    dec_rate: f64,
    pulse_width_ms: u32,
    step_count: u32,
    accepted_moves: u32,
    last_clear_delta: f64,
    marker: Point,
    south_end: Point,
    north_rate: f64,
    distance_px: f64,
    duration_ms: u32,
    result: Option<BacklashResult>,
    last_error: Option<BacklashError>,
    status: String,
    /// Measurement mode was enabled by this run and not yet released.
    mode_held: bool,
}

impl Default for BacklashMeasurement {
    fn default() -> Self {
        Self::new(BacklashCfg::default())
    }
}

impl BacklashMeasurement {
    pub fn new(cfg: BacklashCfg) -> Self {
        Self {
            cfg,
            state: BacklashState::Initialize,
            dec_rate: 0.0,
            pulse_width_ms: 0,
            step_count: 0,
            accepted_moves: 0,
            last_clear_delta: 0.0,
            marker: Point::default(),
            south_end: Point::default(),
            north_rate: 0.0,
            distance_px: 0.0,
            duration_ms: 0,
            result: None,
            last_error: None,
            status: String::new(),
            mode_held: false,
        }
    }

    /// Begin a measurement from the star's current camera position.
    ///
    /// Ignored while a run is in progress.
    pub fn start<M, G>(&mut self, mount: &mut M, guider: &mut G, camera_pos: Point) -> StepOutcome
    where
        M: Mount + ?Sized,
        G: Guider + ?Sized,
    {
        if self.mode_held {
            tracing::debug!(state = ?self.state, "backlash measurement already running");
            return StepOutcome::Continue;
        }
        match mount.last_calibration_rate(Axis::Dec) {
            Some(rate) if rate > 0.0 && rate.is_finite() => {
                self.dec_rate = rate;
                self.state = BacklashState::Initialize;
                self.north_rate = 0.0;
                self.last_error = None;
                tracing::info!(dec_rate = rate, "backlash measurement started");
                self.step(mount, guider, camera_pos)
            }
            _ => self.abort(guider, BacklashError::CalibrationUnavailable),
        }
    }

    /// Advance by one guide frame.
    pub fn step<M, G>(&mut self, mount: &mut M, guider: &mut G, camera_pos: Point) -> StepOutcome
    where
        M: Mount + ?Sized,
        G: Guider + ?Sized,
    {
        if self.state.is_terminal() {
            return self.terminal_outcome();
        }

        let current = match mount.transform_camera_to_mount(camera_pos) {
            Ok(p) => p,
            Err(e) => return self.abort(guider, map_hw_error(HwOp::Transform, e.as_ref())),
        };
        let dec_delta = if self.state == BacklashState::Initialize {
            0.0
        } else {
            current.y - self.marker.y
        };

        loop {
            tracing::debug!(
                state = ?self.state,
                step = self.step_count,
                dec_delta,
                "backlash step"
            );
            match self.state {
                BacklashState::Initialize => {
                    self.step_count = 0;
                    self.marker = current;
                    self.pulse_width_ms = (self.cfg.expected_distance_px * self.cfg.clearing_bias
                        / self.dec_rate) as u32;
                    self.accepted_moves = 0;
                    self.last_clear_delta = 0.0;
                    mount.set_guiding_enabled(true);
                    guider.enable_measurement_mode(true);
                    self.mode_held = true;
                    self.state = BacklashState::ClearingNorth;
                    self.status = "Clearing north backlash".to_string();
                    return StepOutcome::Continue;
                }
                BacklashState::ClearingNorth => {
                    if self.step_count == 0 {
                        if let Err(e) = self.pulse(mount, Direction::North, self.pulse_width_ms) {
                            return self.abort(guider, e);
                        }
                        self.step_count = 1;
                        self.status = "Clearing north backlash, step 1".to_string();
                        return StepOutcome::Continue;
                    }

                    if dec_delta.abs() >= self.cfg.expected_distance_px {
                        if self.accepted_moves == 0 || self.last_clear_delta * dec_delta > 0.0 {
                            self.accepted_moves += 1;
                        } else {
                            self.accepted_moves = 0;
                        }
                    }

                    if self.accepted_moves < self.cfg.min_accepted_moves {
                        if self.step_count < self.cfg.max_clearing_steps {
                            if let Err(e) =
                                self.pulse(mount, Direction::North, self.pulse_width_ms)
                            {
                                return self.abort(guider, e);
                            }
                            self.step_count += 1;
                            self.marker = current;
                            self.last_clear_delta = dec_delta;
                            self.status = format!(
                                "Clearing north backlash, step {} (up to limit of {})",
                                self.step_count, self.cfg.max_clearing_steps
                            );
                            return StepOutcome::Continue;
                        }
                        return self.abort(
                            guider,
                            BacklashError::ClearingTimeout {
                                steps: self.step_count,
                            },
                        );
                    }

                    tracing::debug!(
                        accepted = self.accepted_moves,
                        steps = self.step_count,
                        "north backlash cleared"
                    );
                    self.marker = current;
                    let max_width = (guider.max_move_px() / self.dec_rate).floor() as u32;
                    self.pulse_width_ms = self.cfg.north_pulse_size_ms.min(max_width);
                    self.step_count = 0;
                    self.state = BacklashState::SteppingNorth;
                }
                BacklashState::SteppingNorth => {
                    if self.step_count < self.cfg.north_pulse_count {
                        if let Err(e) = self.pulse(mount, Direction::North, self.pulse_width_ms) {
                            return self.abort(guider, e);
                        }
                        self.step_count += 1;
                        self.status = format!(
                            "Moving north for {} ms, step {} / {}",
                            self.pulse_width_ms, self.step_count, self.cfg.north_pulse_count
                        );
                        return StepOutcome::Continue;
                    }

                    let total_ms =
                        f64::from(self.cfg.north_pulse_count) * f64::from(self.pulse_width_ms);
                    self.north_rate = (dec_delta / total_ms).abs();
                    if !(self.north_rate > 0.0 && self.north_rate.is_finite()) {
                        return self.abort(guider, BacklashError::DegenerateRate);
                    }
                    tracing::debug!(north_rate = self.north_rate, "north rate measured");
                    self.step_count = 0;
                    self.state = BacklashState::SteppingSouth;
                }
                BacklashState::SteppingSouth => {
                    if self.step_count < self.cfg.north_pulse_count {
                        if let Err(e) = self.pulse(mount, Direction::South, self.pulse_width_ms) {
                            return self.abort(guider, e);
                        }
                        self.step_count += 1;
                        self.status = format!(
                            "Moving south for {} ms, step {} / {}",
                            self.pulse_width_ms, self.step_count, self.cfg.north_pulse_count
                        );
                        return StepOutcome::Continue;
                    }
                    self.south_end = current;
                    self.step_count = 0;
                    self.state = BacklashState::TestingCorrection;
                }
                BacklashState::TestingCorrection => {
                    if self.step_count == 0 {
                        self.distance_px = dec_delta.abs();
                        self.duration_ms = (self.distance_px / self.north_rate) as u32;
                        if let Err(e) = self.pulse(mount, Direction::South, self.duration_ms) {
                            return self.abort(guider, e);
                        }
                        self.step_count = 1;
                        self.status = format!(
                            "Testing backlash correction with {} ms south pulse",
                            self.duration_ms
                        );
                        return StepOutcome::Continue;
                    }

                    if dec_delta.abs() > self.cfg.trial_tolerance_px {
                        self.fine_tune(current, dec_delta);
                    }
                    return self.complete(guider);
                }
                BacklashState::Completed | BacklashState::Aborted => {
                    return self.terminal_outcome();
                }
            }
        }
    }

    /// Explicit user cancellation.
    pub fn stop<G: Guider + ?Sized>(&mut self, guider: &mut G) -> StepOutcome {
        if self.state.is_terminal() {
            return self.terminal_outcome();
        }
        self.abort(guider, BacklashError::UserAbort)
    }

    /// Scale the trial duration by how far the trial pulse actually moved.
    fn fine_tune(&mut self, current: Point, dec_delta: f64) {
        let pulse_delta = (current.y - self.south_end.y).abs().trunc();
        if pulse_delta == 0.0 {
            tracing::warn!(
                duration_ms = self.duration_ms,
                "trial correction produced no motion; keeping estimate"
            );
            return;
        }
        let duration = f64::from(self.duration_ms);
        let overshot = (self.south_end.y - self.marker.y) * dec_delta < 0.0;
        self.duration_ms = if overshot {
            (duration * self.distance_px / pulse_delta) as u32
        } else {
            (duration * ((self.distance_px / pulse_delta - 1.0) * 0.5 + 1.0)) as u32
        };
        tracing::debug!(
            overshot,
            pulse_delta,
            duration_ms = self.duration_ms,
            "trial correction adjusted"
        );
    }

    fn pulse<M: Mount + ?Sized>(
        &self,
        mount: &mut M,
        direction: Direction,
        duration_ms: u32,
    ) -> Result<(), BacklashError> {
        mount
            .guide_pulse(direction, duration_ms)
            .map_err(|e| map_hw_error(HwOp::Pulse, e.as_ref()))
    }

    fn complete<G: Guider + ?Sized>(&mut self, guider: &mut G) -> StepOutcome {
        self.state = BacklashState::Completed;
        self.release(guider);
        self.status = format!(
            "Measured backlash: {:.1} px, {} ms",
            self.distance_px, self.duration_ms
        );
        self.result = Some(BacklashResult {
            distance_px: self.distance_px,
            duration_ms: self.duration_ms,
            status: self.status.clone(),
        });
        tracing::info!(
            distance_px = self.distance_px,
            duration_ms = self.duration_ms,
            "backlash measurement completed"
        );
        StepOutcome::Completed
    }

    fn abort<G: Guider + ?Sized>(&mut self, guider: &mut G, err: BacklashError) -> StepOutcome {
        self.state = BacklashState::Aborted;
        self.status = format!("Backlash measurement stopped: {err}");
        self.last_error = Some(err.clone());
        self.release(guider);
        tracing::warn!(error = %err, "backlash measurement aborted");
        StepOutcome::Aborted(err)
    }

    fn release<G: Guider + ?Sized>(&mut self, guider: &mut G) {
        if self.mode_held {
            self.mode_held = false;
            guider.enable_measurement_mode(false);
        }
    }

    fn terminal_outcome(&self) -> StepOutcome {
        match (&self.state, &self.last_error) {
            (BacklashState::Aborted, Some(e)) => StepOutcome::Aborted(e.clone()),
            (BacklashState::Aborted, None) => StepOutcome::Aborted(BacklashError::UserAbort),
            (BacklashState::Completed, _) => StepOutcome::Completed,
            _ => StepOutcome::Continue,
        }
    }

    pub fn state(&self) -> BacklashState {
        self.state
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Result of the last completed run, if any.
    pub fn result(&self) -> Option<&BacklashResult> {
        self.result.as_ref()
    }

    /// Error that ended the last run, if it aborted.
    pub fn last_error(&self) -> Option<&BacklashError> {
        self.last_error.as_ref()
    }

    pub fn accepted_moves(&self) -> u32 {
        self.accepted_moves
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn pulse_width_ms(&self) -> u32 {
        self.pulse_width_ms
    }

    /// Measured north rate in px/ms; zero until north stepping finishes.
    pub fn north_rate(&self) -> f64 {
        self.north_rate
    }
}

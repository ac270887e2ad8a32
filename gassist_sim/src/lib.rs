//! Simulated mount and guider for exercising the guiding assistant without
//! a telescope.
//!
//! Both halves share one [`Sky`] model behind `Rc<RefCell<_>>`: the mount
//! moves the pointing when pulsed and the guider reports where the star
//! appears on the next frame.
pub mod error;

pub use error::SimError;

use gassist_traits::{Axis, Direction, GuideStep, Guider, HwResult, Mount, Point};
use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

/// Physical parameters of the simulated rig.
#[derive(Debug, Clone)]
pub struct SimParams {
    pub exposure_ms: u32,
    pub pixel_scale: f64,
    pub ra_rate_px_per_ms: f64,
    pub dec_rate_px_per_ms: f64,
    pub dec_backlash_px: f64,
    pub ra_drift_px_per_min: f64,
    pub dec_drift_px_per_min: f64,
    pub periodic_error_px: f64,
    pub periodic_period_s: f64,
    pub jitter_px: f64,
    pub max_move_px: f64,
    pub declination_deg: Option<f64>,
    pub camera_angle_deg: f64,
    pub star_snr: f64,
    pub star_mass: f64,
}

impl Default for SimParams {
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

impl SimParams {
    /// A rig with no drift, jitter or periodic error.
    pub fn quiet() -> Self {
        Self {
            ra_drift_px_per_min: 0.0,
            dec_drift_px_per_min: 0.0,
            periodic_error_px: 0.0,
            jitter_px: 0.0,
            ..Self::default()
        }
    }
}

/// Shared star/mount state.
#[derive(Debug)]
pub struct Sky {
    params: SimParams,
    t_s: f64,
    /// Accumulated mount motion from guide pulses (mount frame, px).
    pointing: Point,
    /// Last direction the declination gears were driven in.
    dec_dir: Option<Direction>,
    /// Slack still to be taken up before declination pulses move the star.
    dec_slack_left: f64,
    guiding: bool,
    guiding_enabled: bool,
    measurement_mode: bool,
    calibrated: bool,
    transform_fails: bool,
    reject_pulses: bool,
    min_move: [Option<f64>; 2],
    pulses: Vec<(Direction, u32)>,
}

impl Sky {
    fn new(params: SimParams) -> Self {
        let slack = params.dec_backlash_px;
        Self {
            params,
            t_s: 0.0,
            pointing: Point::default(),
            dec_dir: None,
            dec_slack_left: slack,
            guiding: true,
            guiding_enabled: true,
            measurement_mode: false,
            calibrated: true,
            transform_fails: false,
            reject_pulses: false,
            min_move: [Some(0.2), Some(0.2)],
            pulses: Vec::new(),
        }
    }

    /// Star offset from the lock position in the mount frame.
    fn star_mount(&self) -> Point {
        let p = &self.params;
        let t = self.t_s;
        let ra = self.pointing.x
            + p.ra_drift_px_per_min * t / 60.0
            + p.periodic_error_px * (TAU * t / p.periodic_period_s).sin()
            + p.jitter_px * noise(t, 1.0);
        let dec = self.pointing.y + p.dec_drift_px_per_min * t / 60.0 + p.jitter_px * noise(t, 2.0);
        Point::new(ra, dec)
    }

    fn star_camera(&self) -> Point {
        rotate(self.star_mount(), self.params.camera_angle_deg.to_radians())
    }

    fn apply_pulse(&mut self, direction: Direction, duration_ms: u32) {
        let ms = f64::from(duration_ms);
        match direction {
            Direction::East => self.pointing.x += ms * self.params.ra_rate_px_per_ms,
            Direction::West => self.pointing.x -= ms * self.params.ra_rate_px_per_ms,
            Direction::North | Direction::South => {
                if self.dec_dir != Some(direction) {
                    self.dec_dir = Some(direction);
                    self.dec_slack_left = self.params.dec_backlash_px;
                }
                let requested = ms * self.params.dec_rate_px_per_ms;
                let taken = requested.min(self.dec_slack_left);
                self.dec_slack_left -= taken;
                let moved = requested - taken;
                if direction == Direction::North {
                    self.pointing.y += moved;
                } else {
                    self.pointing.y -= moved;
                }
            }
        }
        self.pulses.push((direction, duration_ms));
    }
}

/// Deterministic pseudo-random value in (-1, 1) for time `t`.
fn noise(t: f64, seed: f64) -> f64 {
    ((t * 12.9898 + seed * 78.233).sin() * 43_758.545_3).fract()
}

fn rotate(p: Point, angle: f64) -> Point {
    let (s, c) = angle.sin_cos();
    Point::new(p.x * c - p.y * s, p.x * s + p.y * c)
}

/// Build a mount/guider pair sharing one sky.
pub fn simulated_pair(params: SimParams) -> (SimulatedMount, SimulatedGuider) {
    let sky = Rc::new(RefCell::new(Sky::new(params)));
    (
        SimulatedMount { sky: sky.clone() },
        SimulatedGuider { sky },
    )
}

/// Simulated mount implementation
pub struct SimulatedMount {
    sky: Rc<RefCell<Sky>>,
}

impl SimulatedMount {
    /// Forget the calibration, as if the user never calibrated.
    pub fn clear_calibration(&mut self) {
        self.sky.borrow_mut().calibrated = false;
    }

    /// Make every camera-to-mount transform fail, as after a lost calibration.
    pub fn fail_transforms(&mut self, fail: bool) {
        self.sky.borrow_mut().transform_fails = fail;
    }

    pub fn reject_pulses(&mut self, reject: bool) {
        self.sky.borrow_mut().reject_pulses = reject;
    }

    /// Remove the min-move setting from the guide algorithm on `axis`.
    pub fn remove_min_move(&mut self, axis: Axis) {
        self.sky.borrow_mut().min_move[axis_index(axis)] = None;
    }

    /// Pulses issued so far, oldest first.
    pub fn pulses(&self) -> Vec<(Direction, u32)> {
        self.sky.borrow().pulses.clone()
    }
}

fn axis_index(axis: Axis) -> usize {
    match axis {
        Axis::Ra => 0,
        Axis::Dec => 1,
    }
}

impl Mount for SimulatedMount {
    fn transform_camera_to_mount(&self, camera: Point) -> HwResult<Point> {
        let sky = self.sky.borrow();
        if sky.transform_fails || !sky.calibrated {
            return Err(Box::new(SimError::TransformUnavailable));
        }
        Ok(rotate(camera, -sky.params.camera_angle_deg.to_radians()))
    }

    fn guide_pulse(&mut self, direction: Direction, duration_ms: u32) -> HwResult<()> {
        let mut sky = self.sky.borrow_mut();
        if sky.reject_pulses {
            tracing::warn!(?direction, duration_ms, "simulated mount rejected pulse");
            return Err(Box::new(SimError::PulseRejected(format!(
                "{direction:?} {duration_ms} ms"
            ))));
        }
        tracing::debug!(?direction, duration_ms, "simulated guide pulse");
        sky.apply_pulse(direction, duration_ms);
        Ok(())
    }

    fn guiding_enabled(&self) -> bool {
        self.sky.borrow().guiding_enabled
    }

    fn set_guiding_enabled(&mut self, enabled: bool) {
        self.sky.borrow_mut().guiding_enabled = enabled;
    }

    fn last_calibration_rate(&self, axis: Axis) -> Option<f64> {
        let sky = self.sky.borrow();
        if !sky.calibrated {
            return None;
        }
        Some(match axis {
            Axis::Ra => sky.params.ra_rate_px_per_ms,
            Axis::Dec => sky.params.dec_rate_px_per_ms,
        })
    }

    fn guiding_declination(&self) -> Option<f64> {
        self.sky
            .borrow()
            .params
            .declination_deg
            .map(f64::to_radians)
    }

    fn min_move(&self, axis: Axis) -> Option<f64> {
        self.sky.borrow().min_move[axis_index(axis)]
    }

    fn set_min_move(&mut self, axis: Axis, value: f64) -> HwResult<()> {
        let mut sky = self.sky.borrow_mut();
        let slot = &mut sky.min_move[axis_index(axis)];
        if slot.is_none() {
            return Err(Box::new(SimError::NoMinMove(axis.name())));
        }
        if !(value >= 0.0) {
            return Err(Box::new(SimError::InvalidMinMove {
                axis: axis.name(),
                value,
            }));
        }
        *slot = Some(value);
        Ok(())
    }
}

/// Simulated guider implementation
pub struct SimulatedGuider {
    sky: Rc<RefCell<Sky>>,
}

impl SimulatedGuider {
    /// Advance the sky by `dt_s` seconds and report the resulting frame.
    pub fn next_frame(&mut self, dt_s: f64) -> GuideStep {
        let mut sky = self.sky.borrow_mut();
        sky.t_s += dt_s.max(0.0);
        let t = sky.t_s;
        let offset = sky.star_mount();
        let p = &sky.params;
        GuideStep {
            time_s: t,
            mount_offset: offset,
            star_snr: p.star_snr * (1.0 + 0.05 * noise(t, 3.0)),
            star_mass: p.star_mass * (1.0 + 0.02 * noise(t, 4.0)),
        }
    }

    /// Simulate the host losing (or regaining) the guide star.
    pub fn set_guiding(&mut self, guiding: bool) {
        self.sky.borrow_mut().guiding = guiding;
    }

    pub fn measurement_mode(&self) -> bool {
        self.sky.borrow().measurement_mode
    }
}

impl Guider for SimulatedGuider {
    fn is_guiding(&self) -> bool {
        self.sky.borrow().guiding
    }

    fn current_position(&self) -> Point {
        self.sky.borrow().star_camera()
    }

    fn enable_measurement_mode(&mut self, enabled: bool) {
        tracing::debug!(enabled, "simulated guider measurement mode");
        self.sky.borrow_mut().measurement_mode = enabled;
    }

    fn max_move_px(&self) -> f64 {
        self.sky.borrow().params.max_move_px
    }

    fn exposure_ms(&self) -> u32 {
        self.sky.borrow().params.exposure_ms
    }

    fn pixel_scale(&self) -> f64 {
        self.sky.borrow().params.pixel_scale
    }
}

//! Test and helper mocks for gassist_core
//!
//! Both fakes record every call so tests can assert on the exact sequence of
//! pulses and measurement-mode changes.

use gassist_traits::{Axis, Direction, Guider, HwResult, Mount, Point};

/// Mount whose camera and mount frames coincide.
#[derive(Debug, Clone)]
pub struct RecordingMount {
    pub dec_rate: Option<f64>,
    pub ra_rate: Option<f64>,
    pub declination: Option<f64>,
    pub guiding_enabled: bool,
    pub min_move: [Option<f64>; 2],
    pub fail_transform: bool,
    pub fail_pulses: bool,
    pub pulses: Vec<(Direction, u32)>,
    pub guiding_enabled_calls: Vec<bool>,
}

impl Default for RecordingMount {
    fn default() -> Self {
        Self {
            dec_rate: Some(0.01),
            ra_rate: Some(0.01),
            declination: None,
            guiding_enabled: true,
            min_move: [Some(0.2), Some(0.2)],
            fail_transform: false,
            fail_pulses: false,
            pulses: Vec::new(),
            guiding_enabled_calls: Vec::new(),
        }
    }
}

impl Mount for RecordingMount {
    fn transform_camera_to_mount(&self, camera: Point) -> HwResult<Point> {
        if self.fail_transform {
            return Err(Box::new(std::io::Error::other("no calibration transform")));
        }
        Ok(camera)
    }

    fn guide_pulse(&mut self, direction: Direction, duration_ms: u32) -> HwResult<()> {
        if self.fail_pulses {
            return Err(Box::new(std::io::Error::other("mount not responding")));
        }
        self.pulses.push((direction, duration_ms));
        Ok(())
    }

    fn guiding_enabled(&self) -> bool {
        self.guiding_enabled
    }

    fn set_guiding_enabled(&mut self, enabled: bool) {
        self.guiding_enabled = enabled;
        self.guiding_enabled_calls.push(enabled);
    }

    fn last_calibration_rate(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Ra => self.ra_rate,
            Axis::Dec => self.dec_rate,
        }
    }

    fn guiding_declination(&self) -> Option<f64> {
        self.declination
    }

    fn min_move(&self, axis: Axis) -> Option<f64> {
        self.min_move[axis as usize]
    }

    fn set_min_move(&mut self, axis: Axis, value: f64) -> HwResult<()> {
        match self.min_move[axis as usize].as_mut() {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Box::new(std::io::Error::other("algorithm has no min-move"))),
        }
    }
}

/// Guider whose star position is set directly by the test.
#[derive(Debug, Clone)]
pub struct RecordingGuider {
    pub guiding: bool,
    pub position: Point,
    pub max_move_px: f64,
    pub exposure_ms: u32,
    pub pixel_scale: f64,
    pub measurement_mode: bool,
    pub measurement_mode_calls: Vec<bool>,
}

impl Default for RecordingGuider {
    fn default() -> Self {
        Self {
            guiding: true,
            position: Point::default(),
            max_move_px: 50.0,
            exposure_ms: 2000,
            pixel_scale: 1.5,
            measurement_mode: false,
            measurement_mode_calls: Vec::new(),
        }
    }
}

impl RecordingGuider {
    /// Number of times measurement mode was released.
    pub fn releases(&self) -> usize {
        self.measurement_mode_calls.iter().filter(|on| !**on).count()
    }
}

impl Guider for RecordingGuider {
    fn is_guiding(&self) -> bool {
        self.guiding
    }

    fn current_position(&self) -> Point {
        self.position
    }

    fn enable_measurement_mode(&mut self, enabled: bool) {
        self.measurement_mode = enabled;
        self.measurement_mode_calls.push(enabled);
    }

    fn max_move_px(&self) -> f64 {
        self.max_move_px
    }

    fn exposure_ms(&self) -> u32 {
        self.exposure_ms
    }

    fn pixel_scale(&self) -> f64 {
        self.pixel_scale
    }
}

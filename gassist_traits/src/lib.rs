pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Error type used at the collaborator boundary.
pub type HwError = Box<dyn std::error::Error + Send + Sync>;
pub type HwResult<T> = Result<T, HwError>;

/// A point in either the camera frame or the mount frame, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Mount axis. X is right ascension, Y is declination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Ra,
    Dec,
}

impl Axis {
    pub fn name(self) -> &'static str {
        match self {
            Axis::Ra => "RA",
            Axis::Dec => "Dec",
        }
    }
}

/// Cardinal guide direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

/// One completed guide cycle as reported by the host guider.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GuideStep {
    /// Monotonic frame time in seconds.
    pub time_s: f64,
    /// Star offset from the lock position in the mount frame (pixels).
    pub mount_offset: Point,
    pub star_snr: f64,
    pub star_mass: f64,
}

/// The mount being guided.
pub trait Mount {
    /// Convert a camera-frame position into mount-frame coordinates.
    fn transform_camera_to_mount(&self, camera: Point) -> HwResult<Point>;

    /// Issue a timed guide pulse. Completion is observed through later frames.
    fn guide_pulse(&mut self, direction: Direction, duration_ms: u32) -> HwResult<()>;

    fn guiding_enabled(&self) -> bool;
    fn set_guiding_enabled(&mut self, enabled: bool);

    /// Guide rate from the last calibration, pixels per millisecond.
    fn last_calibration_rate(&self, axis: Axis) -> Option<f64>;

    /// Declination of the current pointing in radians, when known.
    fn guiding_declination(&self) -> Option<f64>;

    /// Min-move setting of the guide algorithm on `axis`, if it has one.
    fn min_move(&self, axis: Axis) -> Option<f64>;
    fn set_min_move(&mut self, axis: Axis, value: f64) -> HwResult<()>;
}

/// The guider (camera + star tracking loop).
pub trait Guider {
    fn is_guiding(&self) -> bool;

    /// Current star position in the camera frame.
    fn current_position(&self) -> Point;

    /// Route measurement results to the assistant instead of the guide algorithms.
    fn enable_measurement_mode(&mut self, enabled: bool);

    /// Largest move the tracking region tolerates, in pixels.
    fn max_move_px(&self) -> f64;

    /// Requested exposure duration in milliseconds.
    fn exposure_ms(&self) -> u32;

    /// Camera pixel scale in arc-seconds per pixel.
    fn pixel_scale(&self) -> f64;
}

impl<T: Mount + ?Sized> Mount for Box<T> {
    fn transform_camera_to_mount(&self, camera: Point) -> HwResult<Point> {
        (**self).transform_camera_to_mount(camera)
    }
    fn guide_pulse(&mut self, direction: Direction, duration_ms: u32) -> HwResult<()> {
        (**self).guide_pulse(direction, duration_ms)
    }
    fn guiding_enabled(&self) -> bool {
        (**self).guiding_enabled()
    }
    fn set_guiding_enabled(&mut self, enabled: bool) {
        (**self).set_guiding_enabled(enabled)
    }
    fn last_calibration_rate(&self, axis: Axis) -> Option<f64> {
        (**self).last_calibration_rate(axis)
    }
    fn guiding_declination(&self) -> Option<f64> {
        (**self).guiding_declination()
    }
    fn min_move(&self, axis: Axis) -> Option<f64> {
        (**self).min_move(axis)
    }
    fn set_min_move(&mut self, axis: Axis, value: f64) -> HwResult<()> {
        (**self).set_min_move(axis, value)
    }
}

impl<T: Guider + ?Sized> Guider for Box<T> {
    fn is_guiding(&self) -> bool {
        (**self).is_guiding()
    }
    fn current_position(&self) -> Point {
        (**self).current_position()
    }
    fn enable_measurement_mode(&mut self, enabled: bool) {
        (**self).enable_measurement_mode(enabled)
    }
    fn max_move_px(&self) -> f64 {
        (**self).max_move_px()
    }
    fn exposure_ms(&self) -> u32 {
        (**self).exposure_ms()
    }
    fn pixel_scale(&self) -> f64 {
        (**self).pixel_scale()
    }
}

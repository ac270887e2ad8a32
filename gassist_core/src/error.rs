use gassist_traits::Axis;
use thiserror::Error;

/// Why a backlash measurement ended in the Aborted state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BacklashError {
    #[error("no declination calibration rate is available")]
    CalibrationUnavailable,
    #[error("camera-to-mount transform failed: {0}")]
    TransformFailure(String),
    #[error("north backlash not cleared after {steps} pulses")]
    ClearingTimeout { steps: u32 },
    #[error("measurement cancelled by user")]
    UserAbort,
    #[error("mount rejected guide pulse: {0}")]
    MountFault(String),
    #[error("north stepping produced no measurable motion")]
    DegenerateRate,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssistantError {
    #[error("guider is not guiding")]
    NotGuiding,
    #[error("no {} min-move recommendation available", .0.name())]
    NoRecommendation(Axis),
    #[error("mount error: {0}")]
    Mount(String),
}

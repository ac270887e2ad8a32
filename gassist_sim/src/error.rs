use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("guide pulse rejected: {0}")]
    PulseRejected(String),
    #[error("camera-to-mount transform unavailable (mount not calibrated)")]
    TransformUnavailable,
    #[error("invalid min-move {value} for {axis}")]
    InvalidMinMove { axis: &'static str, value: f64 },
    #[error("guide algorithm on {0} has no min-move setting")]
    NoMinMove(&'static str),
}

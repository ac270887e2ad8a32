//! Outcome of a single backlash measurement step.

use crate::error::BacklashError;

/// Public status of a single step of the backlash state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Keep going; a pulse was issued or the machine is waiting for a frame.
    Continue,
    /// Measurement finished; the result is available.
    Completed,
    /// Aborted with a typed error; measurement mode has been released.
    Aborted(BacklashError),
}

impl StepOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepOutcome::Continue)
    }
}

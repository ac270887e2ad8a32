//! Dialog-level controller for the guiding assistant.
//!
//! `GuidingAssistant` owns the mount and guider handles for the duration of
//! a run. The host forwards guide frames, backlash frames and app-state
//! changes; the user drives `start` / `stop` / `apply_*`.

use std::sync::Arc;

use gassist_traits::{Axis, Clock, GuideStep, Guider, MonotonicClock, Mount, Point};

use crate::backlash::{BacklashMeasurement, BacklashResult, BacklashState};
use crate::config::AssistantCfg;
use crate::error::AssistantError;
use crate::recommend::{self, Recommendation};
use crate::report;
use crate::session::{Session, SessionResult};
use crate::status::StepOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantState {
    /// Not guiding; nothing to measure.
    NoStar,
    StartReady,
    /// Sampling with guide output disabled.
    Measuring,
    MeasuringBacklash,
    Stopped,
}

pub struct GuidingAssistant<M, G> {
    mount: M,
    guider: G,
    cfg: AssistantCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    state: AssistantState,
    session: Option<Session>,
    backlash: BacklashMeasurement,
    saved_guiding_enabled: bool,
    result: Option<SessionResult>,
    recommendations: Vec<Recommendation>,
    measurements_taken: bool,
}

impl<M: Mount, G: Guider> GuidingAssistant<M, G> {
    pub fn new(mount: M, guider: G, cfg: AssistantCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let state = if guider.is_guiding() {
            AssistantState::StartReady
        } else {
            AssistantState::NoStar
        };
        let backlash = BacklashMeasurement::new(cfg.backlash.clone());
        let saved_guiding_enabled = mount.guiding_enabled();
        Self {
            mount,
            guider,
            cfg,
            clock,
            state,
            session: None,
            backlash,
            saved_guiding_enabled,
            result: None,
            recommendations: Vec::new(),
            measurements_taken: false,
        }
    }

    /// Assistant timed by the system clock, for hosts delivering live frames.
    pub fn with_system_clock(mount: M, guider: G, cfg: AssistantCfg) -> Self {
        Self::new(mount, guider, cfg, Arc::new(MonotonicClock))
    }

    fn is_running(&self) -> bool {
        matches!(
            self.state,
            AssistantState::Measuring | AssistantState::MeasuringBacklash
        )
    }

    /// Begin sampling. Guide output is disabled until the run finishes.
    pub fn start(&mut self) -> Result<(), AssistantError> {
        if self.is_running() {
            tracing::debug!(state = ?self.state, "start ignored; already measuring");
            return Ok(());
        }
        if !self.guider.is_guiding() {
            return Err(AssistantError::NotGuiding);
        }

        let exposure_s = f64::from(self.guider.exposure_ms()) / 1000.0;
        let cutoff = self.cfg.cutoff_period(exposure_s);
        self.session = Some(Session::new(self.clock.clone(), exposure_s, cutoff));
        self.result = None;
        self.recommendations.clear();

        tracing::info!("GuidingAssistant: Disabling guide output");
        self.saved_guiding_enabled = self.mount.guiding_enabled();
        self.mount.set_guiding_enabled(false);
        self.state = AssistantState::Measuring;
        Ok(())
    }

    /// A guide cycle completed.
    pub fn on_guide_step(&mut self, step: &GuideStep) {
        if self.state != AssistantState::Measuring {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.add_step(step);
        }
    }

    /// The user pressed Stop.
    ///
    /// With backlash measurement enabled the first press ends sampling and
    /// starts the backlash test; a press during the test cancels it.
    pub fn stop(&mut self) {
        match self.state {
            AssistantState::Measuring if self.cfg.measure_backlash => {
                self.state = AssistantState::MeasuringBacklash;
                let pos = self.guider.current_position();
                let outcome = self.backlash.start(&mut self.mount, &mut self.guider, pos);
                self.handle_backlash_outcome(outcome);
            }
            AssistantState::Measuring => {
                self.make_recommendations();
                self.finish("measurement stopped");
            }
            AssistantState::MeasuringBacklash => {
                self.make_recommendations();
                self.backlash.stop(&mut self.guider);
                self.finish("backlash measurement cancelled");
            }
            _ => {}
        }
    }

    /// A guide frame arrived while the backlash test is running.
    pub fn on_backlash_step(&mut self, camera_pos: Point) {
        if self.state != AssistantState::MeasuringBacklash {
            return;
        }
        let outcome = self
            .backlash
            .step(&mut self.mount, &mut self.guider, camera_pos);
        self.handle_backlash_outcome(outcome);
    }

    /// The host reported a guider error during the backlash test.
    pub fn on_backlash_error(&mut self) {
        if self.state != AssistantState::MeasuringBacklash {
            return;
        }
        tracing::warn!("guider error during backlash measurement");
        self.backlash.stop(&mut self.guider);
        self.finish("guider error");
    }

    /// The host's guiding state changed.
    pub fn on_app_state_changed(&mut self) {
        if self.is_running() {
            if !self.guider.is_guiding() {
                if self.state == AssistantState::MeasuringBacklash {
                    self.backlash.stop(&mut self.guider);
                }
                self.finish("guiding stopped");
            }
        } else {
            self.state = if self.guider.is_guiding() {
                AssistantState::StartReady
            } else {
                AssistantState::NoStar
            };
        }
    }

    /// Window closed.
    pub fn close(&mut self) {
        if self.state == AssistantState::MeasuringBacklash {
            self.backlash.stop(&mut self.guider);
        }
        if self.is_running() {
            self.finish("assistant closed");
        }
    }

    fn handle_backlash_outcome(&mut self, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Continue => {}
            StepOutcome::Completed => {
                self.make_recommendations();
                self.finish("backlash measurement completed");
            }
            StepOutcome::Aborted(e) => {
                tracing::warn!(error = %e, "backlash test aborted; recommending from sampling data");
                self.make_recommendations();
                self.finish("backlash measurement aborted");
            }
        }
    }

    fn completed_backlash(&self) -> Option<&BacklashResult> {
        if self.backlash.state() == BacklashState::Completed {
            self.backlash.result()
        } else {
            None
        }
    }

    fn make_recommendations(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let result = session.result(self.guider.pixel_scale(), self.mount.guiding_declination());
        let backlash = self.completed_backlash().cloned();
        tracing::info!("{}", report::render(&result, backlash.as_ref()));
        self.recommendations =
            recommend::derive(&result, backlash.as_ref(), &self.mount, &self.cfg.recommend);
        self.result = Some(result);
        tracing::info!("End of Guiding Assistant output....");
    }

    fn finish(&mut self, reason: &str) {
        tracing::info!(reason, "GuidingAssistant: Re-enabling guide output");
        self.mount.set_guiding_enabled(self.saved_guiding_enabled);
        self.state = AssistantState::Stopped;
        self.measurements_taken = true;
    }

    fn recommended_min_move(&self, axis: Axis) -> Option<f64> {
        self.recommendations.iter().find_map(|r| match r {
            Recommendation::MinMove { axis: a, value } if *a == axis => Some(*value),
            _ => None,
        })
    }

    fn apply_min_move(&mut self, axis: Axis) -> Result<f64, AssistantError> {
        let value = self
            .recommended_min_move(axis)
            .ok_or(AssistantError::NoRecommendation(axis))?;
        self.mount
            .set_min_move(axis, value)
            .map_err(|e| AssistantError::Mount(e.to_string()))?;
        tracing::info!(axis = axis.name(), value, "GuidingAssistant changed min-move");
        Ok(value)
    }

    /// Write the recommended RA min-move into the mount's guide algorithm.
    pub fn apply_ra_min_move(&mut self) -> Result<f64, AssistantError> {
        self.apply_min_move(Axis::Ra)
    }

    pub fn apply_dec_min_move(&mut self) -> Result<f64, AssistantError> {
        self.apply_min_move(Axis::Dec)
    }

    pub fn state(&self) -> AssistantState {
        self.state
    }

    pub fn instructions(&self) -> String {
        match self.state {
            AssistantState::NoStar => {
                "Choose a non-saturated star with a good SNR (>10) and begin guiding".to_string()
            }
            AssistantState::StartReady if self.measurements_taken => {
                "Start to repeat the measurements, or close to continue guiding.".to_string()
            }
            AssistantState::StartReady => "Start to begin measurements. Guiding will be disabled \
                 during this time, so the star will move around."
                .to_string(),
            AssistantState::Measuring => "Guiding output is disabled and star movement is being \
                 measured. Stop when the RMS values have stabilized (at least 1 minute)."
                .to_string(),
            AssistantState::MeasuringBacklash => {
                format!("Backlash Measurement: {}", self.backlash.status())
            }
            AssistantState::Stopped => "Guiding has been resumed. Look at the recommendations \
                 and make any desired changes."
                .to_string(),
        }
    }

    /// Session figures captured when recommendations were last made.
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// Live figures of the current (or last) session.
    pub fn snapshot(&self) -> Option<SessionResult> {
        self.session
            .as_ref()
            .map(|s| s.result(self.guider.pixel_scale(), self.mount.guiding_declination()))
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    pub fn backlash(&self) -> &BacklashMeasurement {
        &self.backlash
    }

    pub fn report(&self) -> Option<String> {
        self.result
            .as_ref()
            .map(|r| report::render(r, self.completed_backlash()))
    }

    pub fn mount(&self) -> &M {
        &self.mount
    }

    pub fn mount_mut(&mut self) -> &mut M {
        &mut self.mount
    }

    pub fn guider(&self) -> &G {
        &self.guider
    }

    pub fn guider_mut(&mut self) -> &mut G {
        &mut self.guider
    }
}

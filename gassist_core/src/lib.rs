#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core guiding-assistant logic (mount-agnostic).
//!
//! This crate provides the hardware-independent measurement engine. All mount
//! and camera interactions go through the `gassist_traits::Mount` and
//! `gassist_traits::Guider` traits.
//!
//! ## Architecture
//!
//! - **Statistics**: high-pass filtered Welford mean/stdev per axis (`stats`)
//! - **Backlash**: cooperative declination backlash state machine (`backlash`)
//! - **Session**: per-frame aggregation and result snapshots (`session`)
//! - **Recommendations**: min-move, polar alignment, SNR and backlash advice (`recommend`)
//! - **Assistant**: the start/stop controller that ties it together (`assistant`)
//! - **Configuration**: runtime config structs (`config`)
//!
//! Everything is single-threaded and event driven: each call is a
//! non-blocking state update and at most one guide pulse.

pub mod assistant;
pub mod backlash;
pub mod config;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod recommend;
pub mod report;
pub mod session;
pub mod stats;
pub mod status;

pub use assistant::{AssistantState, GuidingAssistant};
pub use backlash::{BacklashMeasurement, BacklashResult, BacklashState};
pub use config::{AssistantCfg, BacklashCfg, RecommendCfg};
pub use error::{AssistantError, BacklashError};
pub use recommend::{Recommendation, Severity};
pub use session::{AxisSummary, Session, SessionResult};
pub use stats::StatisticsTracker;
pub use status::StepOutcome;

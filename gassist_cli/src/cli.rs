//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "gassist", version, about = "Guiding assistant CLI")]
pub struct Cli {
    /// Path to config TOML (typed); built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print results and errors as JSON instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full assistant session against the simulated rig
    Simulate {
        /// Seconds of unguided sampling before stopping
        #[arg(long, value_name = "SECS", default_value_t = 120.0)]
        duration_s: f64,
        /// Skip the declination backlash test
        #[arg(long, action = ArgAction::SetTrue)]
        no_backlash: bool,
        /// Write the recommended min-move values back to the mount
        #[arg(long, action = ArgAction::SetTrue)]
        apply: bool,
        /// Give up on the backlash test after this many frames
        #[arg(long, value_name = "N", default_value_t = 200)]
        max_backlash_frames: u32,
    },
    /// Feed a recorded guide log through the session statistics
    Replay {
        /// Guide log CSV with headers time,ra,dec,snr,mass
        #[arg(long, value_name = "FILE")]
        log: PathBuf,
        /// Exposure in seconds; inferred from the frame spacing when omitted
        #[arg(long, value_name = "SECS")]
        exposure_s: Option<f64>,
        /// Arc-seconds per pixel; defaults to sim.pixel_scale
        #[arg(long, value_name = "ARCSEC")]
        pixel_scale: Option<f64>,
        /// Pointing declination; polar alignment error is a lower bound without it
        #[arg(long, value_name = "DEG", allow_negative_numbers = true)]
        declination_deg: Option<f64>,
    },
    /// Load and validate the config, then probe the simulated rig
    SelfCheck,
}

mod cli;
mod error_fmt;
mod output;
mod replay;
mod simulate;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Result, WrapErr};
use gassist_traits::{Guider, Mount, Point};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::replay::ReplayOpts;
use crate::simulate::SimulateOpts;

fn main() {
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error hooks: {e}");
    }
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = run(cli) {
        tracing::error!(error = %format!("{err:#}"), "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn run(cli: Cli) -> Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    // Dropping the guard flushes the file log.
    let _file_guard = init_tracing(&cli.log_level, cli.json, &cfg.logging)?;
    cfg.validate()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    match cli.cmd {
        Commands::Simulate {
            duration_s,
            no_backlash,
            apply,
            max_backlash_frames,
        } => simulate::run_simulate(
            &cfg,
            &SimulateOpts {
                duration_s,
                no_backlash,
                apply,
                max_backlash_frames,
            },
            cli.json,
            &shutdown,
        ),
        Commands::Replay {
            log,
            exposure_s,
            pixel_scale,
            declination_deg,
        } => replay::run_replay(
            &cfg,
            &log,
            &ReplayOpts {
                exposure_s,
                pixel_scale,
                declination_deg,
            },
            cli.json,
        ),
        Commands::SelfCheck => self_check(&cfg, cli.json),
    }
}

fn load_config(path: Option<&Path>) -> Result<gassist_config::Config> {
    let Some(path) = path else {
        tracing::debug!("no --config given; using built-in defaults");
        return Ok(gassist_config::Config::default());
    };
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    gassist_config::load_toml(&text).wrap_err_with(|| format!("parse config {}", path.display()))
}

/// Console layer on stderr, plus an optional JSON-lines file layer.
fn init_tracing(
    level: &str,
    json: bool,
    logging: &gassist_config::Logging,
) -> Result<Option<WorkerGuard>> {
    let console_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    };
    let mut layers = vec![console];
    let mut file_guard = None;

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path.file_name().unwrap_or(path.as_os_str());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        file_guard = Some(guard);
        let file_filter = EnvFilter::try_new(logging.level.as_deref().unwrap_or("info"))?;
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(file_guard)
}

fn self_check(cfg: &gassist_config::Config, json: bool) -> Result<()> {
    let (mount, guider) = gassist_sim::simulated_pair(simulate::sim_params(&cfg.sim));
    if !guider.is_guiding() {
        eyre::bail!("simulated guider is not guiding");
    }
    mount
        .transform_camera_to_mount(Point::new(1.0, 0.0))
        .map_err(|e| eyre::eyre!("simulated transform failed: {e}"))?;
    let calibrated = mount
        .last_calibration_rate(gassist_traits::Axis::Dec)
        .is_some();

    if json {
        println!(
            "{}",
            serde_json::json!({ "status": "ok", "calibrated": calibrated, "exposure_ms": guider.exposure_ms() })
        );
    } else {
        println!("self-check OK (config valid, simulated rig calibrated={calibrated})");
    }
    Ok(())
}

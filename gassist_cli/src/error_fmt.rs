//! Human-readable error descriptions and structured JSON error formatting.

use gassist_core::AssistantError;

fn assistant_reason_name(e: &AssistantError) -> &'static str {
    match e {
        AssistantError::NotGuiding => "NotGuiding",
        AssistantError::NoRecommendation(_) => "NoRecommendation",
        AssistantError::Mount(_) => "MountFault",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(ae) = err.downcast_ref::<AssistantError>() {
        return match ae {
            AssistantError::NotGuiding => {
                "What happened: The guider is not guiding, so there is nothing to measure.\nLikely causes: No guide star selected, or the star was lost.\nHow to fix: Choose a non-saturated star with a good SNR (>10), start guiding, then run the assistant.".to_string()
            }
            AssistantError::NoRecommendation(axis) => format!(
                "What happened: There is no {} min-move recommendation to apply.\nLikely causes: The assistant has not completed a run, or the guide algorithm on that axis has no min-move setting.\nHow to fix: Complete a measurement first; only axes with a min-move setting can be changed.",
                axis.name()
            ),
            AssistantError::Mount(msg) => format!(
                "What happened: The mount rejected a settings change ({msg}).\nLikely causes: The value is out of the guide algorithm's range.\nHow to fix: Set the value by hand in the guide algorithm settings."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        let what = te.message();
        let at = te
            .span()
            .map(|r| format!(" at byte {}", r.start))
            .unwrap_or_default();
        return format!(
            "What happened: Configuration is invalid (TOML{at}: {what}).\nLikely causes: A typo in a key, or a value of the wrong type.\nHow to fix: Edit the TOML config and try again; run `gassist self-check` to verify."
        );
    }

    // String-based heuristics for errors coming from config or input files
    let msg = err.to_string();
    let chain = format!("{err:#}");
    let lower = chain.to_ascii_lowercase();

    if lower.contains("guide log csv must have headers") {
        return "Invalid headers in guide log CSV. Expected 'time,ra,dec,snr,mass'.".to_string();
    }

    if lower.contains("guide log time must be non-decreasing") || lower.contains("invalid csv row")
    {
        return format!(
            "What happened: The guide log could not be replayed ({chain}).\nLikely causes: Rows out of time order or non-numeric values.\nHow to fix: Sort the log by time and check the reported row."
        );
    }

    if msg.starts_with("--") {
        return format!(
            "What happened: A command-line value is out of range ({msg}).\nHow to fix: See `gassist --help` for the accepted values."
        );
    }

    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read ({chain}).\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass an existing TOML file, or omit --config to use the defaults."
        );
    }

    if lower.contains("parse config") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid ({chain}).\nLikely causes: Unknown keys, wrong value types, or out-of-range values.\nHow to fix: Edit the TOML config and try again; run `gassist self-check` to verify."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes for assistant errors; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<AssistantError>() {
        Some(AssistantError::NotGuiding) => 3,
        Some(AssistantError::NoRecommendation(_)) => 4,
        Some(AssistantError::Mount(_)) => 5,
        None => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = err
        .downcast_ref::<AssistantError>()
        .map_or("Error", assistant_reason_name);
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}

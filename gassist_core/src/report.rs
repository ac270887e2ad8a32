//! Plain-text dump of a session, as written to the log when the assistant
//! makes its recommendations.

use std::fmt;

use crate::backlash::BacklashResult;
use crate::session::SessionResult;

/// Borrowing view that renders a session (and optional backlash result).
pub struct Report<'a> {
    pub result: &'a SessionResult,
    pub backlash: Option<&'a BacklashResult>,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.result;
        writeln!(f, "Guiding Assistant results follow:")?;
        writeln!(
            f,
            "Start={}, Exposure={}s, SNR={:.1}, Star mass={:.1}, Samples={}, Elapsed Time={}s",
            r.started_at.format("%Y-%m-%d %H:%M:%S"),
            r.exposure_s,
            r.snr_avg,
            r.mass_avg,
            r.samples,
            r.elapsed_s as u64
        )?;
        writeln!(
            f,
            "RA RMS={:.2} px ({:.2} arc-sec), Dec RMS={:.2} px ({:.2} arc-sec), Total RMS={:.2} px ({:.2} arc-sec)",
            r.ra.rms,
            r.arcsec(r.ra.rms),
            r.dec.rms,
            r.arcsec(r.dec.rms),
            r.combined_rms,
            r.arcsec(r.combined_rms)
        )?;
        writeln!(
            f,
            "RA Peak={:.1} arc-sec, RA Peak-Peak={:.1} arc-sec, RA Drift Rate={:.1} arc-sec/min, \
             Max RA Drift Rate={:.1} arc-sec/sec (Max Exp: {:.1}s)",
            r.arcsec(r.ra.peak_raw_delta),
            r.arcsec(r.ra_peak_to_peak),
            r.arcsec(r.ra.drift_px_per_min),
            r.arcsec(r.ra_max_drift_px_per_s),
            r.max_exposure_s
        )?;
        writeln!(
            f,
            "Dec Drift Rate={:.1} arc-sec/min, Dec Peak={:.1} arc-sec, PA Error={}{:.1} arc-min",
            r.arcsec(r.dec.drift_px_per_min),
            r.arcsec(r.dec.peak_raw_delta),
            if r.pae_is_lower_bound { "> " } else { "" },
            r.polar_alignment_error_arcmin
        )?;
        if let Some(b) = self.backlash {
            writeln!(
                f,
                "Dec Backlash={:.1} px, {} ms",
                b.distance_px, b.duration_ms
            )?;
        }
        Ok(())
    }
}

/// Render the report to a `String`.
pub fn render(result: &SessionResult, backlash: Option<&BacklashResult>) -> String {
    Report { result, backlash }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::AxisSummary;
    use chrono::Local;

    fn sample() -> SessionResult {
        SessionResult {
            started_at: Local::now(),
            exposure_s: 2.0,
            samples: 30,
            elapsed_s: 60.4,
            snr_avg: 24.0,
            mass_avg: 11_000.0,
            ra: AxisSummary {
                rms: 0.4,
                mean: 0.0,
                peak_raw_delta: 1.0,
                drift_px_per_min: 1.0,
            },
            dec: AxisSummary {
                rms: 0.3,
                mean: 0.0,
                peak_raw_delta: 0.8,
                drift_px_per_min: 0.5,
            },
            combined_rms: 0.5,
            ra_peak_to_peak: 2.0,
            ra_max_drift_px_per_s: 0.1,
            max_exposure_s: 4.0,
            pixel_scale: 2.0,
            declination: None,
            polar_alignment_error_arcmin: 3.8,
            pae_is_lower_bound: true,
        }
    }

    #[test]
    fn report_lists_key_figures() {
        let text = render(&sample(), None);
        assert!(text.contains("Samples=30"));
        assert!(text.contains("Elapsed Time=60s"));
        assert!(text.contains("Total RMS=0.50 px (1.00 arc-sec)"));
        assert!(text.contains("PA Error=> 3.8 arc-min"));
        assert!(!text.contains("Backlash"));
    }

    #[test]
    fn report_includes_backlash_when_measured() {
        let b = BacklashResult {
            distance_px: 12.0,
            duration_ms: 1200,
            status: String::new(),
        };
        let text = render(&sample(), Some(&b));
        assert!(text.contains("Dec Backlash=12.0 px, 1200 ms"));
    }
}

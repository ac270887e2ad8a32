#![no_main]
use gassist_core::mocks::{RecordingGuider, RecordingMount};
use gassist_core::{BacklashCfg, BacklashMeasurement, StepOutcome};
use gassist_traits::Point;
use libfuzzer_sys::fuzz_target;

// Arbitrary Dec positions must drive the machine to a terminal state without
// panicking, releasing measurement mode at most once.
fuzz_target!(|ys: Vec<f64>| {
    let mut bm = BacklashMeasurement::new(BacklashCfg::default());
    let mut mount = RecordingMount::default();
    let mut guider = RecordingGuider::default();

    let mut outcome = bm.start(&mut mount, &mut guider, Point::new(0.0, 0.0));
    for y in ys {
        if outcome.is_terminal() {
            break;
        }
        outcome = bm.step(&mut mount, &mut guider, Point::new(0.0, y));
    }
    if !outcome.is_terminal() {
        outcome = bm.stop(&mut guider);
    }
    assert!(matches!(outcome, StepOutcome::Completed | StepOutcome::Aborted(_)));
    assert_eq!(guider.releases(), 1);
});

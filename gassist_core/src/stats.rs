//! Streaming statistics over one guide axis.
//!
//! Each raw sample passes through a first-order high-pass filter that strips
//! slow drift; mean and population variance of the filtered signal are kept
//! with Welford's update so the tracker never stores history. A matching
//! low-pass state follows the drift itself and feeds the RA drift-rate
//! estimate.

/// Incremental mean/stdev estimator over a high-pass filtered signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsTracker {
    alpha: f64,
    n: u64,
    sum: f64,
    mean: f64,
    q: f64,
    hpf: f64,
    lpf: f64,
    prev: f64,
    peak_raw_delta: f64,
}

impl StatisticsTracker {
    pub fn new(cutoff_period: f64, sample_period: f64) -> Self {
        let mut t = Self::default();
        t.initialize(cutoff_period, sample_period);
        t
    }

    /// Set the filter constant and clear all accumulators.
    ///
    /// `alpha = cutoff / (cutoff + sample_period)`; a longer cutoff keeps
    /// more of the slow signal.
    pub fn initialize(&mut self, cutoff_period: f64, sample_period: f64) {
        let denom = cutoff_period + sample_period;
        self.alpha = if denom > 0.0 { cutoff_period / denom } else { 0.0 };
        self.reset();
    }

    /// Clear accumulators; the filter constant is kept.
    pub fn reset(&mut self) {
        self.n = 0;
        self.sum = 0.0;
        self.mean = 0.0;
        self.q = 0.0;
        self.hpf = 0.0;
        self.lpf = 0.0;
        self.prev = 0.0;
        self.peak_raw_delta = 0.0;
    }

    pub fn add_sample(&mut self, raw: f64) {
        if self.n == 0 {
            self.hpf = raw;
            self.lpf = raw;
        } else {
            let delta = raw - self.prev;
            self.hpf = self.alpha * (self.hpf + delta);
            self.lpf += (1.0 - self.alpha) * delta;
            self.peak_raw_delta = self.peak_raw_delta.max(delta.abs());
        }
        self.prev = raw;

        let x = self.hpf;
        self.n += 1;
        self.sum += x;
        let prev_mean = self.mean;
        self.mean += (x - self.mean) / self.n as f64;
        self.q += (x - prev_mean) * (x - self.mean);
    }

    /// `(mean, population stdev)` of the filtered signal; `(0, 0)` when empty.
    pub fn mean_and_stdev(&self) -> (f64, f64) {
        if self.n == 0 {
            return (0.0, 0.0);
        }
        let n = self.n as f64;
        (self.sum / n, (self.q / n).max(0.0).sqrt())
    }

    pub fn count(&self) -> u64 {
        self.n
    }

    /// Largest absolute change between consecutive raw samples.
    pub fn peak_raw_delta(&self) -> f64 {
        self.peak_raw_delta
    }

    pub fn low_pass(&self) -> f64 {
        self.lpf
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

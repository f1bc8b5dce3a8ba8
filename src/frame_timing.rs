//! Per-frame timing for the gesture loop.
//!
//! Keeps rolling inference and pipeline times for processed frames and
//! counts frames that were skipped or overran the frame budget.

/// Rolling frame timing statistics over a window of samples.
#[derive(Debug)]
pub struct FrameTiming {
    /// Per-frame detector inference time (ms).
    pub inference_times: Vec<f64>,
    /// Per-frame pipeline + dispatch time (ms).
    pub pipeline_times: Vec<f64>,
    /// Per-frame total time (ms).
    pub total_times: Vec<f64>,
    /// Maximum number of samples to keep.
    pub window_size: usize,
    /// Frames that ran the full pipeline.
    pub processed_frames: u64,
    /// Frames dropped before the pipeline (duplicate, not ready, detector error).
    pub skipped_frames: u64,
    /// Processed frames that exceeded the budget.
    pub over_budget_frames: u64,
    /// Frame budget in milliseconds (e.g. 33.3 for 30 Hz).
    pub budget_ms: f64,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new(600, 1000.0 / 30.0)
    }
}

impl FrameTiming {
    pub fn new(window_size: usize, budget_ms: f64) -> Self {
        Self {
            inference_times: Vec::with_capacity(window_size),
            pipeline_times: Vec::with_capacity(window_size),
            total_times: Vec::with_capacity(window_size),
            window_size,
            processed_frames: 0,
            skipped_frames: 0,
            over_budget_frames: 0,
            budget_ms,
        }
    }

    /// Budget matching a target frame rate.
    pub fn for_fps(fps: u32) -> Self {
        Self::new(600, 1000.0 / f64::from(fps.max(1)))
    }

    /// Record a processed frame.
    pub fn record_frame(&mut self, inference_ms: f64, pipeline_ms: f64) {
        let total = inference_ms + pipeline_ms;

        Self::push_sample(&mut self.inference_times, inference_ms, self.window_size);
        Self::push_sample(&mut self.pipeline_times, pipeline_ms, self.window_size);
        Self::push_sample(&mut self.total_times, total, self.window_size);

        self.processed_frames += 1;
        if total > self.budget_ms {
            self.over_budget_frames += 1;
        }
    }

    /// Record a frame that never reached the pipeline.
    pub fn record_skip(&mut self) {
        self.skipped_frames += 1;
    }

    fn push_sample(samples: &mut Vec<f64>, value: f64, window_size: usize) {
        samples.push(value);
        if samples.len() > window_size {
            samples.remove(0);
        }
    }

    /// Percentile from a sorted slice.
    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }
        let idx = ((sorted.len() as f64 - 1.0) * p / 100.0).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    fn sorted(samples: &[f64]) -> Vec<f64> {
        let mut v = samples.to_vec();
        v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        v
    }

    pub fn stats(&self) -> FrameTimingStats {
        let inference = Self::sorted(&self.inference_times);
        let pipeline = Self::sorted(&self.pipeline_times);
        let total = Self::sorted(&self.total_times);

        FrameTimingStats {
            inference_p50: Self::percentile(&inference, 50.0),
            inference_p99: Self::percentile(&inference, 99.0),
            pipeline_p50: Self::percentile(&pipeline, 50.0),
            pipeline_p99: Self::percentile(&pipeline, 99.0),
            total_p50: Self::percentile(&total, 50.0),
            total_p99: Self::percentile(&total, 99.0),
            over_budget_pct: if self.processed_frames > 0 {
                (self.over_budget_frames as f64 / self.processed_frames as f64) * 100.0
            } else {
                0.0
            },
            processed_frames: self.processed_frames,
            skipped_frames: self.skipped_frames,
        }
    }

    /// Format stats as an s-expression.
    pub fn stats_sexp(&self) -> String {
        let s = self.stats();
        format!(
            "(:inference-p50 {:.2} :inference-p99 {:.2} :pipeline-p50 {:.3} :total-p99 {:.2} :over-budget-pct {:.1} :processed {} :skipped {})",
            s.inference_p50, s.inference_p99, s.pipeline_p50, s.total_p99,
            s.over_budget_pct, s.processed_frames, s.skipped_frames,
        )
    }
}

/// Computed frame timing statistics.
#[derive(Debug, Clone)]
pub struct FrameTimingStats {
    pub inference_p50: f64,
    pub inference_p99: f64,
    pub pipeline_p50: f64,
    pub pipeline_p99: f64,
    pub total_p50: f64,
    pub total_p99: f64,
    pub over_budget_pct: f64,
    pub processed_frames: u64,
    pub skipped_frames: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let ft = FrameTiming::new(100, 33.3);
        let stats = ft.stats();
        assert_eq!(stats.processed_frames, 0);
        assert_eq!(stats.total_p50, 0.0);
        assert_eq!(stats.over_budget_pct, 0.0);
    }

    #[test]
    fn test_record_frame() {
        let mut ft = FrameTiming::new(100, 33.3);
        ft.record_frame(12.0, 0.5);
        assert_eq!(ft.processed_frames, 1);
        assert!((ft.stats().total_p50 - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_over_budget() {
        let mut ft = FrameTiming::for_fps(30);
        ft.record_frame(40.0, 1.0);
        ft.record_frame(10.0, 1.0);
        assert_eq!(ft.over_budget_frames, 1);
        assert!((ft.stats().over_budget_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_skips_do_not_count_as_processed() {
        let mut ft = FrameTiming::default();
        ft.record_skip();
        ft.record_skip();
        assert_eq!(ft.skipped_frames, 2);
        assert_eq!(ft.processed_frames, 0);
    }

    #[test]
    fn test_window_trim() {
        let mut ft = FrameTiming::new(5, 33.3);
        for i in 0..10 {
            ft.record_frame(i as f64, 0.1);
        }
        assert_eq!(ft.inference_times.len(), 5);
        assert_eq!(ft.processed_frames, 10);
        assert_eq!(ft.stats().inference_p50, 7.0);
    }

    #[test]
    fn test_stats_sexp() {
        let mut ft = FrameTiming::default();
        ft.record_frame(2.0, 0.5);
        ft.record_skip();
        let sexp = ft.stats_sexp();
        assert!(sexp.starts_with("(:inference-p50"));
        assert!(sexp.contains(":processed 1"));
        assert!(sexp.contains(":skipped 1"));
        assert!(lexpr::from_str(&sexp).is_ok());
    }
}

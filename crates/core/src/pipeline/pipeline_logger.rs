use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for scheduler events: delivered frames, per-stage timings,
/// counters and status lines.
///
/// The scheduler only talks to this trait, so the CLI, tests and embedding
/// applications can each decide what to do with the numbers.
pub trait PipelineLogger: Send {
    /// Called after each delivered frame with the running total.
    fn progress(&mut self, frames_delivered: u64);

    /// How long a named stage ("read", "decode", "sink") took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Point-in-time value such as a frame size or error count.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-playback report. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _frames_delivered: u64) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running aggregate for one stage or metric. Fixed size regardless of how
/// long the stream plays.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aggregate {
    pub count: u64,
    pub total: f64,
    pub max: f64,
    pub last: f64,
}

impl Aggregate {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        self.last = value;
        if value > self.max {
            self.max = value;
        }
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Writes a progress line through `log` every `progress_interval` frames
/// and a per-stage summary at the end.
pub struct LogPipelineLogger {
    progress_interval: u64,
    timings: BTreeMap<String, Aggregate>,
    metrics: BTreeMap<String, Aggregate>,
    start_time: Instant,
    frames_delivered: u64,
}

impl LogPipelineLogger {
    pub fn new(progress_interval: u64) -> Self {
        Self {
            progress_interval: progress_interval.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            frames_delivered: 0,
        }
    }

    pub fn timings_for(&self, stage: &str) -> Option<&Aggregate> {
        self.timings.get(stage)
    }

    pub fn metrics_for(&self, name: &str) -> Option<&Aggregate> {
        self.metrics.get(name)
    }

    /// The line logged on progress ticks, built from the latest timings.
    pub fn progress_line(&self) -> String {
        let mut line = format!("Frame {}", self.frames_delivered);
        for (stage, agg) in &self.timings {
            line.push_str(&format!(", {stage}: {:.1} ms", agg.last));
        }
        line
    }

    /// Returns `None` until something was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let frames = self.frames_delivered;
        let mut lines = vec![format!(
            "Playback summary ({frames} frames, {elapsed_s:.1}s):"
        )];

        for (stage, agg) in &self.timings {
            lines.push(format!(
                "  {stage:8}: avg {:6.1}ms  max {:6.1}ms  total {:7.0}ms",
                agg.average(),
                agg.max,
                agg.total
            ));
        }
        for (name, agg) in &self.metrics {
            lines.push(format!("  {name}: avg {:.1}, last {:.0}", agg.average(), agg.last));
        }

        if frames > 0 && elapsed_s > 0.0 {
            lines.push(format!("  Delivered: {:.1} fps", frames as f64 / elapsed_s));
        }

        Some(lines.join("\n"))
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(crate::shared::constants::PROGRESS_INTERVAL)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, frames_delivered: u64) {
        self.frames_delivered = frames_delivered;
        if frames_delivered > 0 && frames_delivered % self.progress_interval == 0 {
            log::info!("{}", self.progress_line());
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings.entry(stage.to_string()).or_default().record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use rand::{rngs::StdRng, Rng};

use crate::{
    audio::ChannelSource,
    config::{ParameterHandle, SchedulerConfig},
    render::{LayerSet, RenderSink},
    Pipeline, Result, SampleFrame, VisualiserError,
};

/// Monotonic seconds since the clock was started.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    started: Instant,
}

impl PlaybackClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn seconds(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::start()
    }
}

/// Counters accumulated across ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub passes: u64,
    /// Passes that ran on an empty frame because the source failed.
    pub degraded_frames: u64,
    pub present_failures: u64,
    /// Ticks that overran their slot; the schedule restarts from now.
    pub late_ticks: u64,
}

/// Point counts of a single pass, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassSummary {
    pub time: f64,
    pub regular: usize,
    pub quantized: usize,
    pub audio_reaction: f64,
}

/// Drives one pipeline pass per display tick at a fixed rate.
#[derive(Debug)]
pub struct FrameScheduler<S, K, R = StdRng> {
    source: S,
    sink: K,
    parameters: ParameterHandle,
    pipeline: Pipeline<R>,
    clock: PlaybackClock,
    frame_interval: Duration,
    last_time: f64,
    stats: SchedulerStats,
    running: Arc<AtomicBool>,
}

impl<S, K, R> FrameScheduler<S, K, R>
where
    S: ChannelSource,
    K: RenderSink,
    R: Rng,
{
    pub fn new(
        config: &SchedulerConfig,
        source: S,
        sink: K,
        parameters: ParameterHandle,
        pipeline: Pipeline<R>,
    ) -> Result<Self> {
        if config.target_fps == 0 {
            return Err(VisualiserError::invalid("targetFps", "must be at least 1"));
        }

        Ok(Self {
            source,
            sink,
            parameters,
            pipeline,
            clock: PlaybackClock::start(),
            frame_interval: Duration::from_secs_f64(1.0 / f64::from(config.target_fps)),
            last_time: 0.0,
            stats: SchedulerStats::default(),
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Flag that stops [`FrameScheduler::run`] once cleared.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Runs a pass stamped with the scheduler's clock.
    pub fn tick(&mut self) -> PassSummary {
        let now = self.clock.seconds();
        self.tick_at(now)
    }

    /// Runs a pass stamped with `time`. Earlier stamps than the previous
    /// pass are raised so the background time never runs backwards.
    pub fn tick_at(&mut self, time: f64) -> PassSummary {
        let parameters = self.parameters.snapshot();
        let frame = match self.source.frame() {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(%err, "sample source unavailable, rendering empty frame");
                self.stats.degraded_frames += 1;
                SampleFrame::empty()
            }
        };

        let time = time.max(self.last_time);
        self.last_time = time;

        let output = self.pipeline.run_pass(&frame, &parameters, time);
        let layers = LayerSet::from_parameters(&parameters);
        if let Err(err) = self.sink.present(&output, &layers) {
            tracing::warn!(%err, "render sink rejected frame");
            self.stats.present_failures += 1;
        }
        self.stats.passes += 1;

        let summary = PassSummary {
            time,
            regular: output.regular.len(),
            quantized: output.quantized.len(),
            audio_reaction: output.background.audio_reaction,
        };
        tracing::debug!(
            pass = self.stats.passes,
            time,
            regular = summary.regular,
            quantized = summary.quantized,
            reaction = summary.audio_reaction,
            "pass complete"
        );
        summary
    }

    /// Ticks at the configured rate until `max_frames` passes have run or
    /// the stop handle is cleared. A late tick does not trigger catch-up
    /// passes.
    pub fn run(&mut self, max_frames: Option<u64>) -> SchedulerStats {
        tracing::info!(
            fps = 1.0 / self.frame_interval.as_secs_f64(),
            ?max_frames,
            "frame scheduler started"
        );

        let mut deadline = Instant::now();
        while self.running.load(Ordering::Relaxed) {
            if max_frames.is_some_and(|limit| self.stats.passes >= limit) {
                break;
            }

            self.tick();

            deadline += self.frame_interval;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                self.stats.late_ticks += 1;
                deadline = now;
            }
        }

        tracing::info!(stats = ?self.stats, "frame scheduler stopped");
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{render::RenderGraph, AppConfig, Parameters, PipelineOutput};

    struct FailingSource;

    impl ChannelSource for FailingSource {
        fn left_channel(&self) -> Result<Vec<u8>> {
            Err(VisualiserError::msg("no device"))
        }

        fn right_channel(&self) -> Result<Vec<u8>> {
            Err(VisualiserError::msg("no device"))
        }
    }

    struct FixedSource(SampleFrame);

    impl ChannelSource for FixedSource {
        fn left_channel(&self) -> Result<Vec<u8>> {
            Ok(self.0.left().to_vec())
        }

        fn right_channel(&self) -> Result<Vec<u8>> {
            Ok(self.0.right().to_vec())
        }
    }

    struct RejectingSink;

    impl RenderSink for RejectingSink {
        fn present(&mut self, _: &PipelineOutput, _: &LayerSet) -> Result<()> {
            Err(VisualiserError::msg("surface lost"))
        }
    }

    fn scheduler<S: ChannelSource, K: RenderSink>(source: S, sink: K) -> FrameScheduler<S, K> {
        let config = AppConfig::default();
        FrameScheduler::new(
            &config.scheduler,
            source,
            sink,
            ParameterHandle::default(),
            Pipeline::seeded(&config, 42),
        )
        .unwrap()
    }

    #[test]
    fn rejects_zero_fps() {
        let config = AppConfig::default();
        let result = FrameScheduler::new(
            &SchedulerConfig { target_fps: 0 },
            FailingSource,
            RenderGraph::new(),
            ParameterHandle::default(),
            Pipeline::seeded(&config, 0),
        );
        assert!(result.is_err());
    }

    #[test]
    fn failing_source_degrades_to_empty_pass() {
        let mut scheduler = scheduler(FailingSource, RenderGraph::new());
        let summary = scheduler.tick_at(1.0);

        assert_eq!(summary.regular + summary.quantized, 0);
        assert_eq!(summary.audio_reaction, 0.0);
        assert_eq!(scheduler.stats().degraded_frames, 1);
        assert_eq!(scheduler.sink().frames_presented(), 1);
    }

    #[test]
    fn sink_failures_are_counted_not_fatal() {
        let mut scheduler = scheduler(FixedSource(SampleFrame::silent(8)), RejectingSink);
        scheduler.tick_at(0.0);
        scheduler.tick_at(0.1);
        assert_eq!(scheduler.stats().present_failures, 2);
        assert_eq!(scheduler.stats().passes, 2);
    }

    #[test]
    fn time_never_runs_backwards() {
        let mut scheduler = scheduler(FixedSource(SampleFrame::silent(8)), RenderGraph::new());
        scheduler.tick_at(2.0);
        let summary = scheduler.tick_at(1.0);
        assert_eq!(summary.time, 2.0);
    }

    #[test]
    fn each_pass_sees_current_parameters() {
        let config = AppConfig::default();
        let parameters = ParameterHandle::default();
        let mut scheduler = FrameScheduler::new(
            &config.scheduler,
            FixedSource(SampleFrame::silent(64)),
            RenderGraph::new(),
            parameters.clone(),
            Pipeline::seeded(&config, 1),
        )
        .unwrap();

        parameters.modify(|p| p.quantize_probability = 0.0).unwrap();
        assert_eq!(scheduler.tick_at(0.0).regular, 64);

        parameters
            .update(Parameters {
                quantize_probability: 1.0,
                always_show_quantized: true,
                ..Default::default()
            })
            .unwrap();
        let summary = scheduler.tick_at(0.1);
        assert_eq!(summary.regular, 0);
        assert_eq!(summary.quantized, 64);
    }

    #[test]
    fn panicking_control_panel_does_not_stop_ticks() {
        let config = AppConfig::default();
        let parameters = ParameterHandle::default();
        let panel = parameters.clone();
        let mut scheduler = FrameScheduler::new(
            &config.scheduler,
            FixedSource(SampleFrame::silent(32)),
            RenderGraph::new(),
            parameters,
            Pipeline::seeded(&config, 8),
        )
        .unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            panel.modify(|_| panic!("slider callback failed"))
        }));
        assert!(outcome.is_err());

        panel.modify(|p| p.quantize_probability = 0.0).unwrap();
        let summary = scheduler.tick_at(0.0);
        assert_eq!(summary.regular, 32);
        assert_eq!(scheduler.stats().passes, 1);
        assert_eq!(scheduler.run(Some(3)).passes, 3);
    }

    #[test]
    fn run_stops_after_frame_limit() {
        let mut scheduler = scheduler(FixedSource(SampleFrame::silent(16)), RenderGraph::new());
        let stats = scheduler.run(Some(3));

        assert_eq!(stats.passes, 3);
        assert_eq!(scheduler.sink().frames_presented(), 3);
    }

    #[test]
    fn cleared_stop_handle_ends_run() {
        let mut scheduler = scheduler(FixedSource(SampleFrame::silent(16)), RenderGraph::new());
        scheduler.stop_handle().store(false, Ordering::Relaxed);

        assert_eq!(scheduler.run(None).passes, 0);
    }
}

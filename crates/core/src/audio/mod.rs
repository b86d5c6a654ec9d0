use std::{
    collections::VecDeque,
    f64::consts::TAU,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{frame::NEUTRAL_SAMPLE, Result, SampleFrame, VisualiserError};

/// Supplies the most recent analysis window of each channel.
///
/// Reads must not block on audio processing; an idle source reports
/// neutral samples.
pub trait ChannelSource {
    fn left_channel(&self) -> Result<Vec<u8>>;

    fn right_channel(&self) -> Result<Vec<u8>>;

    /// Both channels as one frame.
    fn frame(&self) -> Result<SampleFrame> {
        SampleFrame::new(self.left_channel()?, self.right_channel()?)
    }
}

/// High level audio engine façade.
///
/// Decoded or captured stereo blocks are pushed in as floats and kept as a
/// sliding byte window per channel, ready for [`ChannelSource`] reads.
#[derive(Debug)]
pub struct AudioEngine {
    frame_len: usize,
    window: Arc<Mutex<AnalysisWindow>>,
}

impl AudioEngine {
    /// Creates an engine whose windows hold `frame_len` samples per channel.
    pub fn new(frame_len: usize) -> Self {
        Self {
            frame_len,
            window: Arc::new(Mutex::new(AnalysisWindow::new(frame_len))),
        }
    }

    /// Returns a read handle onto the analysis window.
    pub fn handle(&self) -> AnalysisHandle {
        AnalysisHandle::new(self.window.clone())
    }

    /// Feeds one block of planar stereo samples in `[-1, 1]`.
    pub fn push_stereo(&self, left: &[f32], right: &[f32]) -> Result<()> {
        if left.len() != right.len() {
            return Err(VisualiserError::ChannelMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        if left.is_empty() {
            return Ok(());
        }

        let mut window = self.lock_window()?;
        for (&l, &r) in left.iter().zip(right) {
            window.push(to_byte(l), to_byte(r));
        }
        Ok(())
    }

    /// Feeds an interleaved block. Only the first two channels are used; a
    /// mono block is duplicated onto both sides. A block with a partial
    /// trailing frame is rejected whole.
    pub fn push_interleaved(&self, samples: &[f32], channels: usize) -> Result<()> {
        if channels == 0 {
            return Err(VisualiserError::msg("interleaved block needs at least one channel"));
        }
        if samples.len() % channels != 0 {
            tracing::warn!(samples = samples.len(), channels, "dropping uneven interleaved block");
            return Err(VisualiserError::UnevenBlock {
                samples: samples.len(),
                channels,
            });
        }

        let mut window = self.lock_window()?;
        for frame in samples.chunks_exact(channels) {
            let left = frame[0];
            let right = frame.get(1).copied().unwrap_or(left);
            window.push(to_byte(left), to_byte(right));
        }
        Ok(())
    }

    /// Drops everything pushed so far, returning the window to silence.
    pub fn reset(&self) -> Result<()> {
        let mut window = self.lock_window()?;
        *window = AnalysisWindow::new(self.frame_len);
        Ok(())
    }

    fn lock_window(&self) -> Result<MutexGuard<'_, AnalysisWindow>> {
        self.window
            .lock()
            .map_err(|_| VisualiserError::msg("analysis window has been poisoned"))
    }
}

/// Shared, thread-safe view over the window managed by [`AudioEngine`].
#[derive(Clone)]
pub struct AnalysisHandle {
    shared: Arc<Mutex<AnalysisWindow>>,
}

impl AnalysisHandle {
    pub(crate) fn new(shared: Arc<Mutex<AnalysisWindow>>) -> Self {
        Self { shared }
    }

    fn lock(&self) -> Result<MutexGuard<'_, AnalysisWindow>> {
        self.shared
            .lock()
            .map_err(|_| VisualiserError::msg("analysis window has been poisoned"))
    }
}

impl ChannelSource for AnalysisHandle {
    fn left_channel(&self) -> Result<Vec<u8>> {
        Ok(self.lock()?.left.iter().copied().collect())
    }

    fn right_channel(&self) -> Result<Vec<u8>> {
        Ok(self.lock()?.right.iter().copied().collect())
    }

    // Both channels are read under one lock so they describe the same window.
    fn frame(&self) -> Result<SampleFrame> {
        let window = self.lock()?;
        SampleFrame::new(
            window.left.iter().copied().collect(),
            window.right.iter().copied().collect(),
        )
    }
}

impl std::fmt::Debug for AnalysisHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisHandle").finish()
    }
}

#[derive(Debug)]
pub(crate) struct AnalysisWindow {
    len: usize,
    left: VecDeque<u8>,
    right: VecDeque<u8>,
}

impl AnalysisWindow {
    fn new(len: usize) -> Self {
        Self {
            len,
            left: VecDeque::from(vec![NEUTRAL_SAMPLE; len]),
            right: VecDeque::from(vec![NEUTRAL_SAMPLE; len]),
        }
    }

    fn push(&mut self, left: u8, right: u8) {
        if self.len == 0 {
            return;
        }
        if self.left.len() == self.len {
            self.left.pop_front();
            self.right.pop_front();
        }
        self.left.push_back(left);
        self.right.push_back(right);
    }
}

/// Maps a float sample onto the unsigned byte scale, 128 being silence.
fn to_byte(sample: f32) -> u8 {
    if !sample.is_finite() {
        return NEUTRAL_SAMPLE;
    }
    (128.0 * (1.0 + sample)).floor().clamp(0.0, 255.0) as u8
}

/// Deterministic stereo sine pair for demos and tests.
///
/// Different left and right frequencies trace a Lissajous figure once the
/// channels are plotted against each other.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    left_hz: f32,
    right_hz: f32,
    amplitude: f32,
    sample_rate: u32,
    // Phases in cycles, kept in [0, 1).
    left_phase: f64,
    right_phase: f64,
}

impl ToneGenerator {
    pub fn new(left_hz: f32, right_hz: f32, amplitude: f32, sample_rate: u32) -> Self {
        Self {
            left_hz,
            right_hz,
            amplitude: amplitude.clamp(0.0, 1.0),
            sample_rate: sample_rate.max(1),
            left_phase: 0.0,
            right_phase: 0.0,
        }
    }

    /// Renders the next `len` samples of both channels.
    pub fn next_block(&mut self, len: usize) -> (Vec<f32>, Vec<f32>) {
        let rate = f64::from(self.sample_rate);
        let left_step = f64::from(self.left_hz) / rate;
        let right_step = f64::from(self.right_hz) / rate;
        let mut left = Vec::with_capacity(len);
        let mut right = Vec::with_capacity(len);
        for _ in 0..len {
            left.push(self.amplitude * (TAU * self.left_phase).sin() as f32);
            right.push(self.amplitude * (TAU * self.right_phase).sin() as f32);
            self.left_phase = (self.left_phase + left_step).rem_euclid(1.0);
            self.right_phase = (self.right_phase + right_step).rem_euclid(1.0);
        }
        (left, right)
    }
}

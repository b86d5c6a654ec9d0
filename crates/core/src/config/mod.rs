use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::{background::MAX_DAMPING, frame::FRAME_LEN, Result, VisualiserError};

/// Tunable knobs read by the pipeline once per pass.
///
/// `size`, `quantized_size`, `color` and `shadow_blur_stop` only affect the
/// render layers; the classifier reads the quantisation fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Parameters {
    pub color: u32,
    pub size: f32,
    pub quantized_size: f32,
    /// Edge length of a grid cell in normalised coordinates.
    pub quantize_grid: f64,
    /// Chance that a sample is routed to the quantisation path.
    pub quantize_probability: f64,
    /// Chance that a routed sample is emitted when not always shown.
    pub grid_fill_probability: f64,
    pub always_show_quantized: bool,
    pub shadow_blur_stop: f32,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            color: 0xffffff,
            size: 0.01,
            quantized_size: 0.03,
            quantize_grid: 0.05,
            quantize_probability: 0.5,
            grid_fill_probability: 0.001,
            always_show_quantized: false,
            shadow_blur_stop: 0.7,
        }
    }
}

impl Parameters {
    /// Checks every field against the range the pipeline accepts.
    ///
    /// Out of range values are rejected rather than clamped so the control
    /// surface can keep its previous snapshot.
    pub fn validate(&self) -> Result<()> {
        if !self.quantize_grid.is_finite() || self.quantize_grid <= 0.0 {
            return Err(VisualiserError::invalid(
                "quantizeGrid",
                format!("must be a finite value > 0, got {}", self.quantize_grid),
            ));
        }
        unit_interval("quantizeProbability", self.quantize_probability)?;
        unit_interval("gridFillProbability", self.grid_fill_probability)?;
        positive("size", self.size)?;
        positive("quantizedSize", self.quantized_size)?;
        if !(0.1..=1.0).contains(&self.shadow_blur_stop) {
            return Err(VisualiserError::invalid(
                "shadowBlurStop",
                format!("must lie within [0.1, 1], got {}", self.shadow_blur_stop),
            ));
        }
        if self.color > 0xffffff {
            return Err(VisualiserError::invalid(
                "color",
                format!("must be a 24-bit RGB value, got {:#x}", self.color),
            ));
        }
        Ok(())
    }
}

fn unit_interval(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(VisualiserError::invalid(
            name,
            format!("must lie within [0, 1], got {value}"),
        ))
    }
}

fn positive(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(VisualiserError::invalid(
            name,
            format!("must be a finite value > 0, got {value}"),
        ))
    }
}

/// Shared control surface for [`Parameters`].
///
/// Clones point at the same snapshot. Writers may run on any thread; each
/// pass reads one consistent copy through [`ParameterHandle::snapshot`].
#[derive(Debug, Clone)]
pub struct ParameterHandle {
    shared: Arc<Mutex<Parameters>>,
}

impl ParameterHandle {
    /// Creates a handle seeded with validated parameters.
    pub fn new(parameters: Parameters) -> Result<Self> {
        parameters.validate()?;
        Ok(Self {
            shared: Arc::new(Mutex::new(parameters)),
        })
    }

    /// Returns a copy of the current parameters.
    pub fn snapshot(&self) -> Parameters {
        *self.lock()
    }

    /// Replaces the current parameters. Invalid values leave the previous
    /// snapshot in place.
    pub fn update(&self, parameters: Parameters) -> Result<()> {
        if let Err(err) = parameters.validate() {
            tracing::warn!(%err, "rejected parameter update");
            return Err(err);
        }
        *self.lock() = parameters;
        Ok(())
    }

    /// Applies `edit` to a copy of the current parameters and stores the
    /// result if it validates.
    ///
    /// `edit` runs without the lock held. A concurrent writer that stores
    /// in between is overwritten.
    pub fn modify<F>(&self, edit: F) -> Result<Parameters>
    where
        F: FnOnce(&mut Parameters),
    {
        let mut next = self.snapshot();
        edit(&mut next);
        self.update(next)?;
        Ok(next)
    }

    // The stored value is always a validated copy, so a writer that panicked
    // elsewhere cannot have left it half-written.
    fn lock(&self) -> MutexGuard<'_, Parameters> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ParameterHandle {
    fn default() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Parameters::default())),
        }
    }
}

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub parameters: Parameters,
    pub shadow: ShadowConfig,
    pub background: BackgroundConfig,
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    pub fn live_defaults() -> Self {
        Self::default()
    }

    /// Parses a JSON preset and validates it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON preset from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        tracing::info!(?path, "loaded preset");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.parameters.validate()?;
        if self.audio.frame_len == 0 {
            return Err(VisualiserError::invalid("frameLen", "must be at least 1"));
        }
        if self.scheduler.target_fps == 0 {
            return Err(VisualiserError::invalid("targetFps", "must be at least 1"));
        }
        if !self.shadow.floor_height.is_finite() || !self.shadow.depth_offset.is_finite() {
            return Err(VisualiserError::invalid(
                "shadow",
                "floor height and depth offset must be finite",
            ));
        }
        if !(0.0..=MAX_DAMPING).contains(&self.background.damping) {
            return Err(VisualiserError::invalid(
                "damping",
                format!(
                    "must lie within [0, {MAX_DAMPING}], got {}",
                    self.background.damping
                ),
            ));
        }
        Ok(())
    }
}

/// Configuration specific to the audio analysis window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioConfig {
    pub sample_rate: u32,
    /// Number of samples per channel in each analysis window.
    pub frame_len: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            frame_len: FRAME_LEN,
        }
    }
}

/// Floor plane used by the shadow projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShadowConfig {
    pub floor_height: f32,
    pub depth_offset: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            floor_height: -1.5,
            depth_offset: -2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackgroundConfig {
    pub damping: f64,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            damping: MAX_DAMPING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerConfig {
    pub target_fps: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { target_fps: 60 }
    }
}

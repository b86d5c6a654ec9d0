use serde::{Deserialize, Serialize};

use crate::{Parameters, PipelineOutput, Result};

/// Receives one [`PipelineOutput`] per pass and owns everything visual.
pub trait RenderSink {
    fn present(&mut self, output: &PipelineOutput, layers: &LayerSet) -> Result<()>;
}

/// Point sprite used by a layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sprite {
    /// Plain square point.
    Square,
    /// Radial gradient that stays opaque up to `stop` and fades to the rim.
    SoftDisc { stop: f32 },
}

/// Material settings for one of the four point layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStyle {
    pub color: u32,
    pub size: f32,
    pub opacity: f32,
    pub sprite: Sprite,
    /// Lower orders are drawn first.
    pub render_order: u8,
    pub depth_write: bool,
}

const SHADOW_COLOR: u32 = 0x000000;
const SHADOW_OPACITY: f32 = 0.4;

/// Styles for the regular, quantised and both shadow layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSet {
    pub regular: LayerStyle,
    pub quantized: LayerStyle,
    pub regular_shadow: LayerStyle,
    pub quantized_shadow: LayerStyle,
}

impl LayerSet {
    /// Derives layer materials from the render-only parameters.
    pub fn from_parameters(parameters: &Parameters) -> Self {
        let point = |size, render_order| LayerStyle {
            color: parameters.color,
            size,
            opacity: 1.0,
            sprite: Sprite::Square,
            render_order,
            depth_write: true,
        };
        let shadow = |size, sprite| LayerStyle {
            color: SHADOW_COLOR,
            size,
            opacity: SHADOW_OPACITY,
            sprite,
            render_order: 0,
            depth_write: false,
        };

        Self {
            regular: point(parameters.size, 1),
            quantized: point(parameters.quantized_size, 2),
            regular_shadow: shadow(
                parameters.size,
                Sprite::SoftDisc {
                    stop: parameters.shadow_blur_stop,
                },
            ),
            quantized_shadow: shadow(parameters.quantized_size, Sprite::Square),
        }
    }
}

impl Default for LayerSet {
    fn default() -> Self {
        Self::from_parameters(&Parameters::default())
    }
}

/// In-memory render target that keeps the latest delivered frame.
#[derive(Debug, Default)]
pub struct RenderGraph {
    frames_presented: u64,
    last_output: Option<PipelineOutput>,
    last_layers: Option<LayerSet>,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn last_output(&self) -> Option<&PipelineOutput> {
        self.last_output.as_ref()
    }

    pub fn last_layers(&self) -> Option<&LayerSet> {
        self.last_layers.as_ref()
    }
}

impl RenderSink for RenderGraph {
    fn present(&mut self, output: &PipelineOutput, layers: &LayerSet) -> Result<()> {
        self.frames_presented += 1;
        tracing::trace!(
            frame = self.frames_presented,
            regular = output.regular.len(),
            quantized = output.quantized.len(),
            reaction = output.background.audio_reaction,
            "presented frame"
        );
        self.last_output = Some(output.clone());
        self.last_layers = Some(*layers);
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

use crate::{config::BackgroundConfig, frame::NEUTRAL_SAMPLE};

/// Largest damping factor, and so the upper bound of the audio reaction.
pub const MAX_DAMPING: f64 = 0.25;

/// Inputs for the procedural background shader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundUniforms {
    /// Seconds since the clock started.
    pub time: f64,
    /// Damped distance of the left channel's mean from silence.
    pub audio_reaction: f64,
}

/// Derives the background's audio reaction from the left channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundDriver {
    damping: f64,
}

impl BackgroundDriver {
    /// Damping is clamped into `[0, MAX_DAMPING]`; NaN reacts with zero.
    pub fn new(damping: f64) -> Self {
        let damping = if damping.is_nan() {
            0.0
        } else {
            damping.clamp(0.0, MAX_DAMPING)
        };
        Self { damping }
    }

    /// `|mean(left) - 128| / 128`, scaled by the damping factor. An empty
    /// window reacts with zero.
    pub fn reaction(&self, left: &[u8]) -> f64 {
        if left.is_empty() {
            return 0.0;
        }
        let sum: u64 = left.iter().map(|&b| u64::from(b)).sum();
        let mean = sum as f64 / left.len() as f64;
        let neutral = f64::from(NEUTRAL_SAMPLE);
        (mean - neutral).abs() / neutral * self.damping
    }

    pub fn uniforms(&self, left: &[u8], time: f64) -> BackgroundUniforms {
        BackgroundUniforms {
            time,
            audio_reaction: self.reaction(left),
        }
    }
}

impl Default for BackgroundDriver {
    fn default() -> Self {
        BackgroundConfig::default().into()
    }
}

impl From<BackgroundConfig> for BackgroundDriver {
    fn from(config: BackgroundConfig) -> Self {
        Self::new(config.damping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_does_not_react() {
        let driver = BackgroundDriver::default();
        assert_eq!(driver.reaction(&[128; 2048]), 0.0);
        assert_eq!(driver.reaction(&[]), 0.0);
    }

    #[test]
    fn full_scale_offsets_hit_the_damping_bound() {
        let driver = BackgroundDriver::default();
        assert_eq!(driver.reaction(&[0; 64]), 0.25);
        assert!((driver.reaction(&[255; 64]) - 0.25 * 127.0 / 128.0).abs() < 1e-12);
    }

    #[test]
    fn symmetric_signal_cancels_out() {
        let driver = BackgroundDriver::default();
        let left: Vec<u8> = [64, 192].repeat(512);
        assert_eq!(driver.reaction(&left), 0.0);
    }

    #[test]
    fn damping_is_held_to_the_reaction_bound() {
        assert_eq!(BackgroundDriver::new(4.0).reaction(&[0; 16]), MAX_DAMPING);
        assert_eq!(BackgroundDriver::new(-1.0).reaction(&[0; 16]), 0.0);
        assert_eq!(BackgroundDriver::new(f64::NAN).reaction(&[0; 16]), 0.0);
    }

    #[test]
    fn uniforms_carry_time_through() {
        let uniforms = BackgroundDriver::default().uniforms(&[192; 4], 12.5);
        assert_eq!(uniforms.time, 12.5);
        assert_eq!(uniforms.audio_reaction, 0.125);
    }
}

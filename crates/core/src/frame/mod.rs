use serde::{Deserialize, Serialize};

use crate::{Result, VisualiserError};

/// Default number of samples per channel in an analysis window.
pub const FRAME_LEN: usize = 2048;

/// Byte value of a silent sample.
pub const NEUTRAL_SAMPLE: u8 = 128;

/// One analysis window of unsigned 8-bit time-domain samples per channel.
///
/// Index `i` of `left` and index `i` of `right` describe the same instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleFrame {
    left: Vec<u8>,
    right: Vec<u8>,
}

impl SampleFrame {
    /// Builds a frame from two channel windows of equal length.
    pub fn new(left: Vec<u8>, right: Vec<u8>) -> Result<Self> {
        if left.len() != right.len() {
            return Err(VisualiserError::ChannelMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        Ok(Self { left, right })
    }

    /// A window of `len` neutral samples, which is what an idle source reports.
    pub fn silent(len: usize) -> Self {
        Self {
            left: vec![NEUTRAL_SAMPLE; len],
            right: vec![NEUTRAL_SAMPLE; len],
        }
    }

    /// A frame with no samples at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn left(&self) -> &[u8] {
        &self.left
    }

    pub fn right(&self) -> &[u8] {
        &self.right
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Iterates the stereo pairs mapped into `[-1, 1]`.
    pub fn normalized(&self) -> impl Iterator<Item = NormalizedSample> + '_ {
        self.left
            .iter()
            .zip(&self.right)
            .map(|(&l, &r)| NormalizedSample::from_bytes(l, r))
    }
}

/// A stereo sample pair mapped from bytes into `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedSample {
    pub x: f64,
    pub y: f64,
}

impl NormalizedSample {
    pub fn from_bytes(left: u8, right: u8) -> Self {
        Self {
            x: normalize(left),
            y: normalize(right),
        }
    }
}

fn normalize(byte: u8) -> f64 {
    (f64::from(byte) - 128.0) / 128.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_channels() {
        let err = SampleFrame::new(vec![0; 4], vec![0; 3]).unwrap_err();
        assert!(matches!(
            err,
            VisualiserError::ChannelMismatch { left: 4, right: 3 }
        ));
    }

    #[test]
    fn normalises_byte_range() {
        assert_eq!(NormalizedSample::from_bytes(128, 128).x, 0.0);
        assert_eq!(NormalizedSample::from_bytes(0, 255).x, -1.0);
        assert_eq!(NormalizedSample::from_bytes(0, 255).y, 127.0 / 128.0);
        assert_eq!(NormalizedSample::from_bytes(192, 64).y, -0.5);
    }

    #[test]
    fn silent_frame_is_centred() {
        let frame = SampleFrame::silent(FRAME_LEN);
        assert_eq!(frame.len(), FRAME_LEN);
        assert!(frame.normalized().all(|s| s.x == 0.0 && s.y == 0.0));
    }
}

//! Routing of stereo samples into regular and quantised point lists.
//!
//! Each sample draws a uniform value to decide whether it is quantised. A
//! quantised sample snaps to the lower corner of its grid cell and, unless
//! `always_show_quantized` is set, survives a second draw against
//! `grid_fill_probability`. Samples that lose that draw are dropped, which
//! gives the grid its sparse, flickering look.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{frame::NormalizedSample, Parameters, SampleFrame};

/// A position in scene space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Ordered positions rebuilt from scratch every pass.
pub type PointList = Vec<Point3>;

/// Result of routing one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedPoints {
    pub regular: PointList,
    pub quantized: PointList,
}

/// Fate of a single sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Routing {
    Regular(Point3),
    Quantized(Point3),
    Dropped,
}

/// Routes every sample of `frame` into at most one of the two lists.
///
/// `parameters` must already be validated; a non-positive grid never
/// reaches this function through the public control surface.
pub fn classify<R>(frame: &SampleFrame, parameters: &Parameters, rng: &mut R) -> ClassifiedPoints
where
    R: Rng,
{
    debug_assert!(parameters.quantize_grid > 0.0, "unvalidated quantize grid");

    let mut points = ClassifiedPoints {
        regular: Vec::with_capacity(frame.len()),
        quantized: Vec::new(),
    };

    for sample in frame.normalized() {
        match route(sample, parameters, rng) {
            Routing::Regular(point) => points.regular.push(point),
            Routing::Quantized(point) => points.quantized.push(point),
            Routing::Dropped => {}
        }
    }

    points
}

/// Decides the fate of one sample. Draws once, plus a second time only
/// when the sample is quantised and not always shown.
pub fn route<R>(sample: NormalizedSample, parameters: &Parameters, rng: &mut R) -> Routing
where
    R: Rng,
{
    if rng.random::<f64>() < parameters.quantize_probability {
        let grid = parameters.quantize_grid;
        let point = Point3::new(snap(sample.x, grid), snap(sample.y, grid), 0.0);
        if parameters.always_show_quantized
            || rng.random::<f64>() < parameters.grid_fill_probability
        {
            Routing::Quantized(point)
        } else {
            Routing::Dropped
        }
    } else {
        Routing::Regular(Point3::new(sample.x as f32, sample.y as f32, 0.0))
    }
}

/// Lower corner of the grid cell containing `value`.
pub fn snap(value: f64, grid: f64) -> f32 {
    ((value / grid).floor() * grid) as f32
}

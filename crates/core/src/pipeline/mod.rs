use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    classify::{classify, ClassifiedPoints},
    AppConfig, BackgroundDriver, BackgroundUniforms, Parameters, PointList, SampleFrame,
    ShadowProjector,
};

/// Everything the render side needs for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    pub regular: PointList,
    pub quantized: PointList,
    pub regular_shadow: PointList,
    pub quantized_shadow: PointList,
    pub background: BackgroundUniforms,
}

impl PipelineOutput {
    pub fn point_count(&self) -> usize {
        self.regular.len() + self.quantized.len()
    }
}

/// One classify, project, react pass over `frame`.
///
/// Total over validated parameters: no state survives the call apart from
/// whatever `rng` advances.
pub fn run_pass<R>(
    frame: &SampleFrame,
    parameters: &Parameters,
    projector: &ShadowProjector,
    driver: &BackgroundDriver,
    time: f64,
    rng: &mut R,
) -> PipelineOutput
where
    R: Rng,
{
    let ClassifiedPoints { regular, quantized } = classify(frame, parameters, rng);
    let regular_shadow = projector.project(&regular);
    let quantized_shadow = projector.project(&quantized);
    let background = driver.uniforms(frame.left(), time);

    PipelineOutput {
        regular,
        quantized,
        regular_shadow,
        quantized_shadow,
        background,
    }
}

/// Fixed projection and reaction settings paired with a random source.
#[derive(Debug, Clone)]
pub struct Pipeline<R = StdRng> {
    projector: ShadowProjector,
    driver: BackgroundDriver,
    rng: R,
}

impl Pipeline<StdRng> {
    /// Builds a pipeline seeded from the operating system.
    pub fn new(config: &AppConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Builds a pipeline whose random draws repeat for the same seed.
    pub fn seeded(config: &AppConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Pipeline<R> {
    pub fn with_rng(config: &AppConfig, rng: R) -> Self {
        Self {
            projector: config.shadow.into(),
            driver: config.background.into(),
            rng,
        }
    }

    pub fn projector(&self) -> &ShadowProjector {
        &self.projector
    }

    pub fn run_pass(
        &mut self,
        frame: &SampleFrame,
        parameters: &Parameters,
        time: f64,
    ) -> PipelineOutput {
        run_pass(
            frame,
            parameters,
            &self.projector,
            &self.driver,
            time,
            &mut self.rng,
        )
    }
}

//! Core library for the Scatter Visualiser application.
//!
//! Each display refresh turns the latest stereo analysis window into two
//! point clouds plotted left channel against right: regular points at their
//! raw position and quantised points snapped to a coarse grid. Both clouds
//! get floor shadows, and the left channel's offset from silence drives the
//! procedural background. Window management, audio decoding and drawing
//! live outside this crate behind [`ChannelSource`] and [`RenderSink`].

pub mod audio;
pub mod background;
pub mod classify;
pub mod config;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod render;
pub mod shadow;
pub mod timeline;

pub use audio::{AnalysisHandle, AudioEngine, ChannelSource, ToneGenerator};
pub use background::{BackgroundDriver, BackgroundUniforms};
pub use classify::{classify, ClassifiedPoints, Point3, PointList};
pub use config::{
    AppConfig, AudioConfig, BackgroundConfig, ParameterHandle, Parameters, SchedulerConfig,
    ShadowConfig,
};
pub use error::{Result, VisualiserError};
pub use frame::{NormalizedSample, SampleFrame, FRAME_LEN};
pub use pipeline::{run_pass, Pipeline, PipelineOutput};
pub use render::{LayerSet, LayerStyle, RenderGraph, RenderSink, Sprite};
pub use shadow::ShadowProjector;
pub use timeline::{FrameScheduler, PassSummary, PlaybackClock, SchedulerStats};

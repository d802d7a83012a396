//! Etchwork renders seeded "etched line" sketches: bands of kinked lines packed across a canvas,
//! with glowing beads that drip down the lines as an animation loops.
//!
//! The flow for one frame is:
//!
//! - read and validate a [`SketchConfig`] (or start from [`presets::holiday_card`])
//! - prepare overlay assets once with [`AssetStore::prepare`]
//! - [`compile_frame`] into a [`FramePlan`], then execute it with a [`RenderBackend`]
//!
//! [`render_frame`] and [`export_png_sequence`] wrap those steps, including motion blur.
#![forbid(unsafe_code)]

pub mod assets;
pub mod compile;
pub mod config;
pub mod foundation;
pub mod render;
pub mod sketch;

pub use crate::assets::store::{AssetId, AssetStore, PreparedImage};
pub use crate::compile::compiler::{compile_frame, compile_frame_at};
pub use crate::compile::plan::{DrawOp, FramePlan};
pub use crate::config::model::{
    Background, BeadColors, BeadStyle, Glow, GradientStop, KinkCount, MotionBlur, Overlay,
    RowConfig, SketchConfig,
};
pub use crate::config::presets;
pub use crate::foundation::color::Color;
pub use crate::foundation::core::{Canvas, FrameIndex, FrameRange, Point, Rect, Rgba8Premul};
pub use crate::foundation::error::{EtchError, EtchResult};
pub use crate::render::backend::{
    BackendKind, FrameRGBA, RenderBackend, RenderSettings, create_backend,
};
pub use crate::render::cpu::CpuBackend;
pub use crate::render::pipeline::{
    ExportOpts, ExportStats, RenderThreading, export_png_sequence, render_frame, render_frames,
    write_png,
};
pub use crate::sketch::path::{Direction, EtchPath, Kink, Kinks};
pub use crate::sketch::stream::SeededStream;
pub use crate::sketch::stroke::{BeadPolicy, LineSpec, Sampling};

use crate::{
    assets::{decode::unpremultiply_rgba8_in_place, store::AssetStore},
    compile::plan::FramePlan,
    foundation::error::EtchResult,
};

/// A rendered frame as RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    /// Tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Straight-alpha copy suitable for PNG encoding.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut out);
        }
        out
    }
}

/// Executes a compiled [`FramePlan`] into pixels.
pub trait RenderBackend {
    fn render_plan(&mut self, plan: &FramePlan, assets: &AssetStore) -> EtchResult<FrameRGBA>;

    /// Settings needed to build an equivalent backend on a worker thread.
    fn worker_render_settings(&self) -> Option<RenderSettings> {
        None
    }
}

#[derive(Clone, Copy, Debug)]
pub enum BackendKind {
    /// CPU raster backend powered by `vello_cpu`.
    Cpu,
}

#[derive(Clone, Debug, Default)]
pub struct RenderSettings {
    /// Straight RGBA8 backdrop filled before the first op.
    pub clear_rgba: Option<[u8; 4]>,
}

pub fn create_backend(kind: BackendKind, settings: &RenderSettings) -> Box<dyn RenderBackend> {
    match kind {
        BackendKind::Cpu => Box::new(crate::render::cpu::CpuBackend::new(settings.clone())),
    }
}

use std::path::{Path, PathBuf};

use anyhow::Context;
use rayon::prelude::*;

use crate::{
    assets::store::AssetStore,
    compile::compiler::compile_frame,
    config::model::SketchConfig,
    foundation::{
        core::{FrameIndex, FrameRange},
        error::{EtchError, EtchResult},
    },
    render::{
        backend::{FrameRGBA, RenderBackend, RenderSettings},
        composite::FrameAccumulator,
        cpu::CpuBackend,
    },
    sketch::timing::subframe_times,
};

/// Compile and render a single frame.
///
/// With motion blur enabled the frame is rendered once per sub-frame time and the results are
/// averaged per channel; otherwise this is one compile and one render.
#[tracing::instrument(level = "debug", skip(config, backend, assets))]
pub fn render_frame(
    config: &SketchConfig,
    frame: FrameIndex,
    backend: &mut dyn RenderBackend,
    assets: &AssetStore,
) -> EtchResult<FrameRGBA> {
    let times = subframe_times(frame, config.motion_blur.samples, config.motion_blur.spread);
    if let [time] = times.as_slice() {
        let plan = compile_frame(config, *time, assets)?;
        return backend.render_plan(&plan, assets);
    }

    let mut acc: Option<(FrameAccumulator, FrameRGBA)> = None;
    for time in times {
        let plan = compile_frame(config, time, assets)?;
        let rendered = backend.render_plan(&plan, assets)?;
        match &mut acc {
            Some((sum, _)) => sum.add(&rendered.data)?,
            None => {
                let mut sum = FrameAccumulator::new(rendered.data.len());
                sum.add(&rendered.data)?;
                acc = Some((sum, rendered));
            }
        }
    }

    let (sum, mut first) =
        acc.ok_or_else(|| EtchError::render("motion blur produced no sub-frames"))?;
    first.data = sum.finish()?;
    Ok(first)
}

/// Render `[range.start, range.end)` sequentially.
pub fn render_frames(
    config: &SketchConfig,
    range: FrameRange,
    backend: &mut dyn RenderBackend,
    assets: &AssetStore,
) -> EtchResult<Vec<FrameRGBA>> {
    range
        .iter()
        .map(|f| render_frame(config, f, backend, assets))
        .collect()
}

#[derive(Clone, Debug, Default)]
pub struct RenderThreading {
    pub parallel: bool,
    /// Worker count; `None` uses rayon's default.
    pub threads: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct ExportOpts {
    pub range: FrameRange,
    /// File name prefix; frames are written as `<prefix>NNN.png`.
    pub prefix: String,
    /// Minimum digits in the frame number.
    pub pad: usize,
    pub threading: RenderThreading,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            range: FrameRange {
                start: FrameIndex(0),
                end: FrameIndex(200),
            },
            prefix: "frame".to_owned(),
            pad: 3,
            threading: RenderThreading::default(),
        }
    }
}

impl ExportOpts {
    /// One full animation loop of `config`.
    pub fn full_loop(config: &SketchConfig) -> Self {
        Self {
            range: FrameRange {
                start: FrameIndex(0),
                end: FrameIndex(config.total_steps),
            },
            ..Self::default()
        }
    }

    pub fn file_name(&self, frame: FrameIndex) -> String {
        format!("{}{:0pad$}.png", self.prefix, frame.0, pad = self.pad)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub frames_written: u64,
    pub files: Vec<PathBuf>,
}

/// Render a frame range and write each frame as a PNG into `out_dir` (created if missing).
///
/// With `opts.threading.parallel` frames are rendered on a rayon pool where every worker owns its
/// own [`CpuBackend`]; otherwise `backend` renders them in order.
#[tracing::instrument(
    skip(config, backend, assets, opts),
    fields(dir = %out_dir.display(), frames = opts.range.len_frames())
)]
pub fn export_png_sequence(
    config: &SketchConfig,
    out_dir: &Path,
    opts: &ExportOpts,
    backend: &mut dyn RenderBackend,
    assets: &AssetStore,
) -> EtchResult<ExportStats> {
    config.validate()?;
    if opts.range.is_empty() {
        return Err(EtchError::validation("export range must be non-empty"));
    }
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir '{}'", out_dir.display()))?;

    let write_one = |backend: &mut dyn RenderBackend, f: FrameIndex| -> EtchResult<PathBuf> {
        let frame = render_frame(config, f, backend, assets)?;
        let path = out_dir.join(opts.file_name(f));
        write_png(&path, &frame)?;
        tracing::debug!(frame = f.0, path = %path.display(), "frame written");
        Ok(path)
    };

    let files = if opts.threading.parallel {
        let settings = backend.worker_render_settings().ok_or_else(|| {
            EtchError::render("parallel export requires a backend with worker settings")
        })?;
        let pool = build_thread_pool(opts.threading.threads)?;
        let frames: Vec<FrameIndex> = opts.range.iter().collect();
        pool.install(|| {
            frames
                .par_iter()
                .map_init(
                    || CpuBackend::new(settings.clone()),
                    |worker, f| write_one(worker as &mut dyn RenderBackend, *f),
                )
                .collect::<EtchResult<Vec<_>>>()
        })?
    } else {
        opts.range
            .iter()
            .map(|f| write_one(backend, f))
            .collect::<EtchResult<Vec<_>>>()?
    };

    let stats = ExportStats {
        frames_written: files.len() as u64,
        files,
    };
    tracing::info!(frames = stats.frames_written, "export finished");
    Ok(stats)
}

/// Encode a frame as a straight-alpha PNG.
pub fn write_png(path: &Path, frame: &FrameRGBA) -> EtchResult<()> {
    image::save_buffer_with_format(
        path,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

fn build_thread_pool(threads: Option<usize>) -> EtchResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(EtchError::validation(
            "export threads must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| EtchError::render(format!("failed to build rayon thread pool: {e}")))
}

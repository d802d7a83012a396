use crate::{
    assets::store::AssetStore,
    compile::plan::{DrawOp, FramePlan},
    config::model::{Overlay, SketchConfig},
    foundation::{
        color::Color,
        core::{FrameIndex, Point},
        error::EtchResult,
    },
    sketch::{pack::pack_row, stream::SeededStream, stroke::sample_stroke, timing},
};

const GUIDE_MARGIN: f64 = 50.0;

/// Compile one frame at integer frame index `frame`.
pub fn compile_frame_at(
    config: &SketchConfig,
    frame: FrameIndex,
    assets: &AssetStore,
) -> EtchResult<FramePlan> {
    compile_frame(config, frame.0 as f64, assets)
}

/// Build the draw list for frame time `time`.
///
/// Every frame starts a fresh stream from `config.seed`, so line geometry is identical across
/// frames and only bead positions follow the loop progress. Beads are emitted after every stroke,
/// then overlays in config order, then debug guides.
#[tracing::instrument(level = "debug", skip(config, assets), fields(rows = config.rows.len()))]
pub fn compile_frame(
    config: &SketchConfig,
    time: f64,
    assets: &AssetStore,
) -> EtchResult<FramePlan> {
    let progress = timing::progress_at(time, config.total_steps);
    let mut stream = SeededStream::new(&config.seed);

    let mut ops = vec![DrawOp::Background(config.background.clone())];
    let mut beads = Vec::new();

    for (idx, row) in config.rows.iter().enumerate() {
        let stats = pack_row(row, progress, config.kink_count, &mut stream, |line| {
            let stroke = sample_stroke(&line, config.sampling, &config.bead_policy);
            if let (Some(center), Some(color)) = (stroke.bead, line.bead_color) {
                beads.push(DrawOp::FillEllipse {
                    center,
                    rx: config.bead.rx,
                    ry: config.bead.ry,
                    color,
                    glow: config.bead.glow,
                });
            }
            ops.push(DrawOp::StrokePolyline {
                points: stroke.points,
                color: line.stroke.color,
                width: line.stroke.width,
            });
        })?;
        tracing::debug!(row = idx, lines = stats.lines, draws = stats.draws, "row packed");
    }

    let bead_count = beads.len();
    ops.extend(beads);

    for (idx, overlay) in config.overlays.iter().enumerate() {
        let Some(asset) = assets.overlay_asset(idx) else {
            continue;
        };
        ops.push(match overlay {
            Overlay::Text(_) => DrawOp::Text { asset },
            Overlay::Image(img) => DrawOp::Image {
                asset,
                origin: Point::new(img.x, img.y),
            },
        });
    }

    if config.debug_guides {
        push_guides(&mut ops, config);
    }

    tracing::trace!(ops = ops.len(), beads = bead_count, progress, "frame compiled");
    Ok(FramePlan {
        canvas: config.canvas,
        time,
        progress,
        ops,
    })
}

fn push_guides(ops: &mut Vec<DrawOp>, config: &SketchConfig) {
    let w = f64::from(config.canvas.width);
    let h = f64::from(config.canvas.height);
    let color = Color::rgba8(0, 128, 0, 255);

    let horizontal = [h / 2.0, GUIDE_MARGIN, h - GUIDE_MARGIN];
    let vertical = [w / 2.0, GUIDE_MARGIN, w - GUIDE_MARGIN];
    for y in horizontal {
        ops.push(DrawOp::Line {
            from: Point::new(0.0, y),
            to: Point::new(w, y),
            color,
            width: 1.0,
        });
    }
    for x in vertical {
        ops.push(DrawOp::Line {
            from: Point::new(x, 0.0),
            to: Point::new(x, h),
            color,
            width: 1.0,
        });
    }
}

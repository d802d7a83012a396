use crate::{
    assets::store::AssetId,
    config::model::{Background, Glow},
    foundation::{color::Color, core::Canvas, core::Point},
};

#[derive(Clone, Debug)]
/// Backend-agnostic description of one frame.
///
/// Ops are executed in order. Consecutive [`DrawOp::FillEllipse`] ops that share a glow are
/// rendered as one blurred halo layer followed by the ellipses themselves.
pub struct FramePlan {
    pub canvas: Canvas,
    /// Frame time the plan was compiled for (fractional under motion blur).
    pub time: f64,
    /// Loop progress derived from `time`.
    pub progress: f64,
    pub ops: Vec<DrawOp>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Fill the whole canvas.
    Background(Background),
    /// Open poly-line with round caps and bevel joins.
    StrokePolyline {
        points: Vec<Point>,
        color: Color,
        width: f64,
    },
    FillEllipse {
        center: Point,
        rx: f64,
        ry: f64,
        color: Color,
        glow: Option<Glow>,
    },
    /// Prepared raster drawn with its top-left corner at `origin`.
    Image { asset: AssetId, origin: Point },
    /// Canvas-sized prepared text raster.
    Text { asset: AssetId },
    /// Thin straight line used by debug guides.
    Line {
        from: Point,
        to: Point,
        color: Color,
        width: f64,
    },
}

impl FramePlan {
    pub fn strokes(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::StrokePolyline { .. }))
    }

    pub fn beads(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::FillEllipse { .. }))
    }
}

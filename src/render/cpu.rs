use std::{collections::HashMap, sync::Arc};

use vello_cpu::kurbo::Shape as _;

use crate::{
    assets::store::{AssetId, AssetStore},
    compile::plan::{DrawOp, FramePlan},
    config::model::{Background, Glow},
    foundation::{
        color::Color,
        core::{Canvas, Point, Rgba8Premul},
        error::{EtchError, EtchResult},
    },
    render::{
        backend::{FrameRGBA, RenderBackend, RenderSettings},
        blur::blur_rgba8_premul,
        composite::over_in_place,
    },
};

/// Flattening tolerance for bead ellipses, in pixels.
const ELLIPSE_TOLERANCE: f64 = 0.1;

pub struct CpuBackend {
    settings: RenderSettings,
    image_cache: HashMap<AssetId, vello_cpu::Image>,
}

impl CpuBackend {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            image_cache: HashMap::new(),
        }
    }
}

/// Premultiplied frame buffer plus the dimensions vello_cpu wants.
struct Target {
    width: u16,
    height: u16,
    data: Vec<u8>,
}

impl Target {
    fn new(canvas: Canvas, clear: Option<[u8; 4]>) -> EtchResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| EtchError::render("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| EtchError::render("canvas height exceeds u16"))?;
        let mut data = vec![0u8; usize::from(width) * usize::from(height) * 4];
        if let Some([r, g, b, a]) = clear {
            let px = Rgba8Premul::from_straight_rgba(r, g, b, a).to_array();
            for dst in data.chunks_exact_mut(4) {
                dst.copy_from_slice(&px);
            }
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn context(&self) -> vello_cpu::RenderContext {
        vello_cpu::RenderContext::new(self.width, self.height)
    }

    /// Rasterize everything recorded in `ctx` and composite it over the frame.
    fn commit(&mut self, ctx: &mut vello_cpu::RenderContext) -> EtchResult<()> {
        let layer = self.rasterize(ctx);
        over_in_place(&mut self.data, layer.data_as_u8_slice())
    }

    fn rasterize(&self, ctx: &mut vello_cpu::RenderContext) -> vello_cpu::Pixmap {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        pixmap
    }
}

impl RenderBackend for CpuBackend {
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(time = plan.time, ops = plan.ops.len())
    )]
    fn render_plan(&mut self, plan: &FramePlan, assets: &AssetStore) -> EtchResult<FrameRGBA> {
        let mut target = Target::new(plan.canvas, self.settings.clear_rgba)?;
        let mut ctx = target.context();

        let mut i = 0;
        while i < plan.ops.len() {
            if let DrawOp::FillEllipse {
                glow: Some(glow), ..
            } = &plan.ops[i]
            {
                let run = glow_run_len(&plan.ops[i..], glow);
                let beads = &plan.ops[i..i + run];

                // The halo sits above everything drawn so far and below the beads.
                target.commit(&mut ctx)?;
                ctx = target.context();
                self.draw_glow(&mut target, beads, glow)?;
                for op in beads {
                    self.draw_op(&mut ctx, op, assets, target.size())?;
                }
                i += run;
                continue;
            }
            self.draw_op(&mut ctx, &plan.ops[i], assets, target.size())?;
            i += 1;
        }
        target.commit(&mut ctx)?;

        Ok(FrameRGBA {
            width: u32::from(target.width),
            height: u32::from(target.height),
            data: target.data,
            premultiplied: true,
        })
    }

    fn worker_render_settings(&self) -> Option<RenderSettings> {
        Some(self.settings.clone())
    }
}

fn glow_run_len(ops: &[DrawOp], glow: &Glow) -> usize {
    ops.iter()
        .take_while(|op| matches!(op, DrawOp::FillEllipse { glow: Some(g), .. } if g == glow))
        .count()
}

impl CpuBackend {
    fn draw_glow(&self, target: &mut Target, beads: &[DrawOp], glow: &Glow) -> EtchResult<()> {
        let mut ctx = target.context();
        ctx.set_paint(to_paint(glow.color));
        for op in beads {
            if let DrawOp::FillEllipse { center, rx, ry, .. } = op {
                ctx.fill_path(&ellipse_path(*center, *rx, *ry));
            }
        }
        let layer = target.rasterize(&mut ctx);

        let radius = glow.radius_px();
        let halo = if radius == 0 {
            layer.data_as_u8_slice().to_vec()
        } else {
            blur_rgba8_premul(
                layer.data_as_u8_slice(),
                u32::from(target.width),
                u32::from(target.height),
                radius,
                glow.sigma(),
            )?
        };
        over_in_place(&mut target.data, &halo)
    }

    fn draw_op(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        op: &DrawOp,
        assets: &AssetStore,
        size: (u16, u16),
    ) -> EtchResult<()> {
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        match op {
            DrawOp::Background(bg) => fill_background(ctx, bg, size),
            DrawOp::StrokePolyline {
                points,
                color,
                width,
            } => {
                let Some(path) = polyline_path(points) else {
                    return Ok(());
                };
                ctx.set_stroke(
                    vello_cpu::kurbo::Stroke::new(*width)
                        .with_caps(vello_cpu::kurbo::Cap::Round)
                        .with_join(vello_cpu::kurbo::Join::Bevel),
                );
                ctx.set_paint(to_paint(*color));
                ctx.stroke_path(&path);
            }
            DrawOp::FillEllipse {
                center,
                rx,
                ry,
                color,
                glow: _,
            } => {
                ctx.set_paint(to_paint(*color));
                ctx.fill_path(&ellipse_path(*center, *rx, *ry));
            }
            DrawOp::Image { asset, origin } => self.draw_image(ctx, *asset, *origin, assets)?,
            DrawOp::Text { asset } => self.draw_image(ctx, *asset, Point::ZERO, assets)?,
            DrawOp::Line {
                from,
                to,
                color,
                width,
            } => {
                let mut path = vello_cpu::kurbo::BezPath::new();
                path.move_to(to_cpu(*from));
                path.line_to(to_cpu(*to));
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(*width));
                ctx.set_paint(to_paint(*color));
                ctx.stroke_path(&path);
            }
        }
        Ok(())
    }

    fn draw_image(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        asset: AssetId,
        origin: Point,
        assets: &AssetStore,
    ) -> EtchResult<()> {
        let paint = self.image_paint_for(asset, assets)?;
        let (w, h) = match &paint.image {
            vello_cpu::ImageSource::Pixmap(p) => (f64::from(p.width()), f64::from(p.height())),
            vello_cpu::ImageSource::OpaqueId(_) => {
                return Err(EtchError::render(
                    "cpu backend does not support opaque image ids",
                ));
            }
        };

        let at = vello_cpu::kurbo::Affine::translate((origin.x, origin.y));
        ctx.set_transform(at);
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }

    fn image_paint_for(
        &mut self,
        id: AssetId,
        assets: &AssetStore,
    ) -> EtchResult<vello_cpu::Image> {
        if let Some(paint) = self.image_cache.get(&id) {
            return Ok(paint.clone());
        }

        let img = assets.get(id)?;
        let pixmap = pixmap_from_premul(img.rgba8_premul.as_slice(), img.width, img.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_cache.insert(id, paint.clone());
        Ok(paint)
    }
}

fn fill_background(
    ctx: &mut vello_cpu::RenderContext,
    bg: &Background,
    (width, height): (u16, u16),
) {
    let w = f64::from(width);
    let h = f64::from(height);
    match bg {
        Background::Solid { color } => {
            ctx.set_paint(to_paint(*color));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        }
        Background::VerticalGradient { .. } => {
            // One band per pixel row, sampled at the row center.
            for row in 0..height {
                let y = f64::from(row);
                ctx.set_paint(to_paint(bg.color_at((y + 0.5) / h)));
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, y, w, y + 1.0));
            }
        }
    }
}

fn polyline_path(points: &[Point]) -> Option<vello_cpu::kurbo::BezPath> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut path = vello_cpu::kurbo::BezPath::new();
    path.move_to(to_cpu(*first));
    for p in rest {
        path.line_to(to_cpu(*p));
    }
    Some(path)
}

fn ellipse_path(center: Point, rx: f64, ry: f64) -> vello_cpu::kurbo::BezPath {
    vello_cpu::kurbo::Ellipse::new(to_cpu(center), (rx, ry), 0.0).to_path(ELLIPSE_TOLERANCE)
}

fn to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn to_paint(c: Color) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = c.to_rgba8_straight();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn pixmap_from_premul(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> EtchResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| EtchError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| EtchError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(EtchError::render("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let pixels = rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assets::store::PreparedImage, config::model::GradientStop};

    fn canvas(width: u32, height: u32) -> Canvas {
        Canvas { width, height }
    }

    fn plan(c: Canvas, ops: Vec<DrawOp>) -> FramePlan {
        FramePlan {
            canvas: c,
            time: 0.0,
            progress: 0.0,
            ops,
        }
    }

    fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * frame.width + x) * 4) as usize;
        [
            frame.data[i],
            frame.data[i + 1],
            frame.data[i + 2],
            frame.data[i + 3],
        ]
    }

    fn render(p: &FramePlan, assets: &AssetStore) -> FrameRGBA {
        CpuBackend::new(RenderSettings::default())
            .render_plan(p, assets)
            .unwrap()
    }

    fn solid(color: Color) -> DrawOp {
        DrawOp::Background(Background::Solid { color })
    }

    #[test]
    fn solid_background_covers_canvas() {
        let f = render(
            &plan(canvas(8, 4), vec![solid(Color::rgba8(16, 16, 32, 255))]),
            &AssetStore::empty(),
        );
        assert_eq!((f.width, f.height), (8, 4));
        assert!(f.premultiplied);
        assert!(f.data.chunks_exact(4).all(|p| p == [16, 16, 32, 255]));
    }

    #[test]
    fn gradient_background_varies_by_row() {
        let bg = Background::VerticalGradient {
            stops: vec![
                GradientStop {
                    offset: 0.0,
                    color: Color::BLACK,
                },
                GradientStop {
                    offset: 1.0,
                    color: Color::WHITE,
                },
            ],
        };
        let f = render(
            &plan(canvas(4, 16), vec![DrawOp::Background(bg)]),
            &AssetStore::empty(),
        );
        let top = px(&f, 1, 0);
        let bottom = px(&f, 1, 15);
        assert!(top[0] < 20);
        assert!(bottom[0] > 235);
        assert_eq!(px(&f, 0, 7), px(&f, 3, 7));
    }

    #[test]
    fn polyline_is_stroked() {
        let ops = vec![
            solid(Color::BLACK),
            DrawOp::StrokePolyline {
                points: vec![Point::new(2.0, 8.0), Point::new(30.0, 8.0)],
                color: Color::WHITE,
                width: 3.0,
            },
        ];
        let f = render(&plan(canvas(32, 16), ops), &AssetStore::empty());
        assert!(px(&f, 16, 8)[0] > 200);
        assert_eq!(px(&f, 16, 1), [0, 0, 0, 255]);
    }

    #[test]
    fn single_point_polyline_draws_nothing() {
        let ops = vec![
            solid(Color::BLACK),
            DrawOp::StrokePolyline {
                points: vec![Point::new(4.0, 4.0)],
                color: Color::WHITE,
                width: 3.0,
            },
        ];
        let f = render(&plan(canvas(8, 8), ops), &AssetStore::empty());
        assert!(f.data.chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn glow_lights_pixels_around_bead() {
        let bead = |glow| DrawOp::FillEllipse {
            center: Point::new(20.0, 20.0),
            rx: 3.0,
            ry: 4.0,
            color: Color::WHITE,
            glow,
        };
        let plain = render(
            &plan(canvas(40, 40), vec![solid(Color::BLACK), bead(None)]),
            &AssetStore::empty(),
        );
        let glowing = render(
            &plan(
                canvas(40, 40),
                vec![
                    solid(Color::BLACK),
                    bead(Some(Glow {
                        color: Color::WHITE,
                        blur: 8.0,
                    })),
                ],
            ),
            &AssetStore::empty(),
        );

        assert!(px(&plain, 20, 20)[0] > 240);
        assert_eq!(px(&plain, 29, 20), [0, 0, 0, 255]);
        assert!(px(&glowing, 29, 20)[0] > 0);
        assert_eq!(px(&glowing, 20, 20), px(&plain, 20, 20));
    }

    #[test]
    fn image_op_draws_at_origin() {
        let mut assets = AssetStore::empty();
        let id = assets.insert(PreparedImage {
            width: 2,
            height: 2,
            rgba8_premul: Arc::new([255u8, 0, 0, 255].repeat(4)),
        });
        let ops = vec![
            solid(Color::BLACK),
            DrawOp::Image {
                asset: id,
                origin: Point::new(4.0, 2.0),
            },
        ];
        let f = render(&plan(canvas(8, 8), ops), &assets);
        assert_eq!(px(&f, 4, 2), [255, 0, 0, 255]);
        assert_eq!(px(&f, 5, 3), [255, 0, 0, 255]);
        assert_eq!(px(&f, 3, 2), [0, 0, 0, 255]);
        assert_eq!(px(&f, 6, 4), [0, 0, 0, 255]);
    }

    #[test]
    fn clear_color_shows_through_without_background() {
        let mut backend = CpuBackend::new(RenderSettings {
            clear_rgba: Some([10, 20, 30, 255]),
        });
        let f = backend
            .render_plan(&plan(canvas(2, 2), vec![]), &AssetStore::empty())
            .unwrap();
        assert!(f.data.chunks_exact(4).all(|p| p == [10, 20, 30, 255]));
    }

    #[test]
    fn unknown_asset_is_an_error() {
        let ops = vec![DrawOp::Text { asset: AssetId(9) }];
        let mut backend = CpuBackend::new(RenderSettings::default());
        assert!(
            backend
                .render_plan(&plan(canvas(2, 2), ops), &AssetStore::empty())
                .is_err()
        );
    }
}

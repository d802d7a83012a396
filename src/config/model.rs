use std::path::PathBuf;

use crate::{
    foundation::{
        color::Color,
        core::Canvas,
        error::{EtchError, EtchResult},
    },
    sketch::stroke::{BeadPolicy, Sampling},
};

/// Read-only description of a sketch. One snapshot drives every frame.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SketchConfig {
    /// Seed string for the per-frame random stream.
    pub seed: String,
    pub canvas: Canvas,
    /// Frames per animation loop; bead progress is `(frame mod total_steps) / total_steps`.
    #[serde(default = "default_total_steps")]
    pub total_steps: u64,
    #[serde(default)]
    pub sampling: Sampling,
    #[serde(default)]
    pub kink_count: KinkCount,
    #[serde(default)]
    pub bead_policy: BeadPolicy,
    #[serde(default)]
    pub bead: BeadStyle,
    #[serde(default)]
    pub motion_blur: MotionBlur,
    pub background: Background,
    pub rows: Vec<RowConfig>,
    #[serde(default)]
    pub overlays: Vec<Overlay>,
    #[serde(default)]
    pub debug_guides: bool,
}

fn default_total_steps() -> u64 {
    200
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KinkCount {
    One,
    #[default]
    Two,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BeadStyle {
    pub rx: f64,
    pub ry: f64,
    pub glow: Option<Glow>,
}

impl Default for BeadStyle {
    fn default() -> Self {
        Self {
            rx: 6.0,
            ry: 9.0,
            glow: None,
        }
    }
}

/// Soft halo behind beads, sized like a canvas `shadowBlur`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Glow {
    pub color: Color,
    pub blur: f64,
}

impl Glow {
    /// Gaussian sigma equivalent to the blur size (half of it).
    pub fn sigma(&self) -> f32 {
        (self.blur / 2.0) as f32
    }

    pub fn radius_px(&self) -> u32 {
        (f64::from(self.sigma()) * 3.0).ceil().max(0.0) as u32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MotionBlur {
    /// Sub-frame samples averaged into one frame; `0` disables motion blur.
    pub samples: u32,
    /// Time covered by the sub-samples, in frames.
    pub spread: f64,
}

impl Default for MotionBlur {
    fn default() -> Self {
        Self {
            samples: 0,
            spread: 1.0,
        }
    }
}

pub const MAX_MOTION_BLUR_SAMPLES: u32 = 64;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Background {
    Solid { color: Color },
    VerticalGradient { stops: Vec<GradientStop> },
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Color,
}

impl Background {
    /// Color at normalized height `t`, clamped to the first/last stop.
    pub fn color_at(&self, t: f64) -> Color {
        let stops = match self {
            Self::Solid { color } => return *color,
            Self::VerticalGradient { stops } => stops,
        };
        let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
            return Color::TRANSPARENT;
        };
        if t <= first.offset {
            return first.color;
        }
        if t >= last.offset {
            return last.color;
        }
        for pair in stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t >= a.offset && t <= b.offset {
                let span = b.offset - a.offset;
                let u = if span <= 0.0 {
                    1.0
                } else {
                    (t - a.offset) / span
                };
                let lerp = |x: f64, y: f64| x + (y - x) * u;
                return Color::rgba(
                    lerp(a.color.r, b.color.r),
                    lerp(a.color.g, b.color.g),
                    lerp(a.color.b, b.color.b),
                    lerp(a.color.a, b.color.a),
                );
            }
        }
        last.color
    }

    fn validate(&self) -> EtchResult<()> {
        let Self::VerticalGradient { stops } = self else {
            return Ok(());
        };
        if stops.is_empty() {
            return Err(EtchError::validation("gradient needs at least one stop"));
        }
        let mut prev = f64::NEG_INFINITY;
        for s in stops {
            if !(0.0..=1.0).contains(&s.offset) {
                return Err(EtchError::validation(format!(
                    "gradient stop offset {} outside [0, 1]",
                    s.offset
                )));
            }
            if s.offset < prev {
                return Err(EtchError::validation(
                    "gradient stop offsets must be ascending",
                ));
            }
            prev = s.offset;
        }
        Ok(())
    }
}

/// One horizontal band of etched lines.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RowConfig {
    pub x0: f64,
    pub y0: f64,
    pub length: f64,
    /// Base lateral width; each line draws `width * (2 + r)`.
    pub width: f64,
    pub stop_x: f64,
    pub line_color: Color,
    #[serde(default = "default_line_width")]
    pub line_width: f64,
    #[serde(default)]
    pub bead: Option<BeadColors>,
}

fn default_line_width() -> f64 {
    2.5
}

/// Upper bound on the lines a single row may place.
pub const MAX_ROW_LINES: f64 = 100_000.0;

impl RowConfig {
    /// Lines placed if every advance takes its minimum, `min(2w, 0.2) * 2w`.
    pub fn worst_case_lines(&self) -> f64 {
        let span = (self.stop_x - self.x0).max(0.0);
        let scaled = 2.0 * self.width;
        span / (scaled.min(0.2) * scaled)
    }

    /// Preconditions that keep row packing finite.
    pub fn validate(&self) -> EtchResult<()> {
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(EtchError::config(format!(
                "row width must be finite and > 0 (got {})",
                self.width
            )));
        }
        for (name, v) in [
            ("x0", self.x0),
            ("y0", self.y0),
            ("length", self.length),
            ("stop_x", self.stop_x),
        ] {
            if !v.is_finite() {
                return Err(EtchError::config(format!("row {name} must be finite")));
            }
        }
        if !self.line_width.is_finite() || self.line_width <= 0.0 {
            return Err(EtchError::config("row line_width must be finite and > 0"));
        }
        let worst = self.worst_case_lines();
        if worst > MAX_ROW_LINES {
            return Err(EtchError::config(format!(
                "row would place up to {worst:.0} lines (limit {MAX_ROW_LINES}); \
                 widen the lines or shorten the span"
            )));
        }
        if let Some(BeadColors::Palette { colors }) = &self.bead
            && colors.is_empty()
        {
            return Err(EtchError::config("bead palette must not be empty"));
        }
        Ok(())
    }
}

/// How a row picks each line's bead color from one stream draw.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BeadColors {
    /// `colors[floor(r * len)]`.
    Palette { colors: Vec<Color> },
    /// `light` when `r > 0.5`, else `dark`.
    LightDark { light: Color, dark: Color },
}

impl BeadColors {
    pub fn pick(&self, r: f64) -> Color {
        match self {
            Self::Palette { colors } => {
                let idx = ((r * colors.len() as f64) as usize).min(colors.len().saturating_sub(1));
                colors.get(idx).copied().unwrap_or(Color::TRANSPARENT)
            }
            Self::LightDark { light, dark } => {
                if r > 0.5 {
                    *light
                } else {
                    *dark
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    Text(TextOverlay),
    Image(ImageOverlay),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextOverlay {
    pub text: String,
    /// Baseline start, like a canvas `fillText`.
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub bold: bool,
    pub color: Color,
}

fn default_font_family() -> String {
    "Arial".to_owned()
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageOverlay {
    /// Path relative to the assets root.
    pub source: PathBuf,
    pub x: f64,
    pub y: f64,
}

impl SketchConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(s: &str) -> EtchResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json_pretty(&self) -> EtchResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> EtchResult<()> {
        self.canvas.validate()?;
        if self.total_steps == 0 {
            return Err(EtchError::validation("total_steps must be > 0"));
        }
        let step = self.sampling.step;
        if !step.is_finite() || step <= 0.0 || step > 1.0 {
            return Err(EtchError::validation(format!(
                "sampling step must be in (0, 1] (got {step})"
            )));
        }
        let b = &self.bead;
        if !(b.rx.is_finite() && b.ry.is_finite() && b.rx > 0.0 && b.ry > 0.0) {
            return Err(EtchError::validation("bead radii must be finite and > 0"));
        }
        if let Some(glow) = &b.glow
            && (!glow.blur.is_finite() || glow.blur < 0.0)
        {
            return Err(EtchError::validation("glow blur must be finite and >= 0"));
        }
        if self.motion_blur.samples > MAX_MOTION_BLUR_SAMPLES {
            return Err(EtchError::validation(format!(
                "motion_blur samples must be <= {MAX_MOTION_BLUR_SAMPLES}"
            )));
        }
        if !self.motion_blur.spread.is_finite() || self.motion_blur.spread < 0.0 {
            return Err(EtchError::validation(
                "motion_blur spread must be finite and >= 0",
            ));
        }
        self.background.validate()?;
        for row in &self.rows {
            row.validate()?;
        }
        for overlay in &self.overlays {
            match overlay {
                Overlay::Text(t) => {
                    if !t.font_size.is_finite() || t.font_size <= 0.0 {
                        return Err(EtchError::validation(format!(
                            "text overlay \"{}\" needs a font_size > 0",
                            t.text
                        )));
                    }
                }
                Overlay::Image(i) => {
                    if i.source.as_os_str().is_empty() {
                        return Err(EtchError::validation("image overlay source is empty"));
                    }
                }
            }
        }
        Ok(())
    }
}

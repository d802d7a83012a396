use std::path::PathBuf;

use crate::{
    config::model::{
        Background, BeadColors, BeadStyle, Glow, GradientStop, ImageOverlay, KinkCount,
        MotionBlur, Overlay, RowConfig, SketchConfig, TextOverlay,
    },
    foundation::{color::Color, core::Canvas, core::Rect},
    sketch::stroke::{BeadPolicy, Sampling},
};

/// Title/logo area the exclusion-zone bead policy keeps clear on the holiday card.
pub const CARD_TITLE_ZONE: Rect = Rect::new(400.0, 475.0, 765.0, 615.0);

const SILVER: Color = Color::rgba8(192, 192, 192, 255);
const DUSK: Color = Color::rgba8(0x30, 0x30, 0x60, 255);
const NIGHT: Color = Color::rgba8(0x10, 0x10, 0x20, 255);
/// `hsl(341, 90%, 35%)`
const CRIMSON: Color = Color::rgba8(170, 9, 60, 255);
/// `hsl(210, 90%, 35%)`
const COBALT: Color = Color::rgba8(9, 89, 170, 255);
const SLATE_GRAY: Color = Color::rgba8(112, 128, 144, 255);
const GRAPHITE: Color = Color::rgba8(0x40, 0x40, 0x40, 255);
const PAPER: Color = Color::rgba8(0xED, 0xED, 0xED, 255);
const FROST: Color = Color::rgba8(255, 255, 255, 0xA0);

/// The 1200x1050 etched-glass holiday card: three bands of lines over a silver/navy gradient,
/// beads dripping down the middle band, and title/year/signature text.
pub fn holiday_card() -> SketchConfig {
    let band = |y0: f64, length: f64, width: f64, line_color: Color, bead: Option<BeadColors>| {
        RowConfig {
            x0: 55.0,
            y0,
            length,
            width,
            stop_x: 1150.0,
            line_color,
            line_width: 2.5,
            bead,
        }
    };

    SketchConfig {
        seed: "Penn Engineering".to_owned(),
        canvas: Canvas {
            width: 1200,
            height: 1050,
        },
        total_steps: 200,
        sampling: Sampling::default(),
        kink_count: KinkCount::Two,
        bead_policy: BeadPolicy::Drip,
        bead: BeadStyle {
            rx: 6.0,
            ry: 9.0,
            glow: Some(Glow {
                color: Color::WHITE,
                blur: 30.0,
            }),
        },
        motion_blur: MotionBlur::default(),
        background: Background::VerticalGradient {
            stops: vec![
                GradientStop {
                    offset: 0.0,
                    color: SILVER,
                },
                GradientStop {
                    offset: 0.2,
                    color: DUSK,
                },
                GradientStop {
                    offset: 0.5,
                    color: NIGHT,
                },
                GradientStop {
                    offset: 0.8,
                    color: DUSK,
                },
                GradientStop {
                    offset: 1.0,
                    color: SILVER,
                },
            ],
        },
        rows: vec![
            band(50.0, 250.0, 2.5, CRIMSON, None),
            band(
                350.0,
                400.0,
                5.0,
                SLATE_GRAY,
                Some(BeadColors::Palette {
                    colors: vec![GRAPHITE, SILVER, Color::WHITE],
                }),
            ),
            band(800.0, 200.0, 2.5, COBALT, None),
        ],
        overlays: vec![
            Overlay::Text(TextOverlay {
                text: "Etching peace into your days".to_owned(),
                x: 265.0,
                y: 180.0,
                font_size: 48.0,
                font_family: "Arial".to_owned(),
                bold: true,
                color: PAPER,
            }),
            Overlay::Text(TextOverlay {
                text: "2024".to_owned(),
                x: 430.0,
                y: 600.0,
                font_size: 150.0,
                font_family: "Arial".to_owned(),
                bold: true,
                color: FROST,
            }),
            Overlay::Text(TextOverlay {
                text: "With warm wishes for the new year".to_owned(),
                x: 650.0,
                y: 960.0,
                font_size: 24.0,
                font_family: "Arial".to_owned(),
                bold: true,
                color: PAPER,
            }),
            Overlay::Image(ImageOverlay {
                source: PathBuf::from("logo.png"),
                x: 100.0,
                y: 910.0,
            }),
        ],
        debug_guides: false,
    }
}

/// [`holiday_card`] with beads kept out of the "2024" title area instead of dripping.
pub fn holiday_card_exclusion_zone() -> SketchConfig {
    SketchConfig {
        bead_policy: BeadPolicy::ExclusionZone {
            zone: CARD_TITLE_ZONE,
        },
        ..holiday_card()
    }
}

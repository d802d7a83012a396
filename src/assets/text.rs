use std::{path::Path, sync::Arc};

use anyhow::Context;

use crate::{
    config::model::TextOverlay,
    foundation::{
        core::Canvas,
        error::{EtchError, EtchResult},
    },
};

/// System fonts plus any `.ttf`/`.otf`/`.ttc` files found in `<root>/fonts` and `<root>`.
pub fn build_fontdb(root: &Path) -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    load_fonts_from_dir(&mut db, &root.join("fonts"));
    load_fonts_from_dir(&mut db, root);
    tracing::debug!(faces = db.faces().count(), "font database ready");
    Arc::new(db)
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        if !matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc") {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable font");
        }
    }
}

/// A one-element SVG document placing `overlay` on a canvas-sized page.
///
/// `x`/`y` is the start of the alphabetic baseline, matching canvas `fillText`.
pub fn text_overlay_svg(overlay: &TextOverlay, canvas: Canvas) -> String {
    let (fill, opacity) = overlay.color.to_svg_fill();
    let weight = if overlay.bold { "bold" } else { "normal" };
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<text x="{x}" y="{y}" font-family="{family}, sans-serif" font-size="{size}" "#,
            r#"font-weight="{weight}" fill="{fill}" fill-opacity="{opacity}">{text}</text></svg>"#
        ),
        w = canvas.width,
        h = canvas.height,
        x = overlay.x,
        y = overlay.y,
        family = xml_escape(&overlay.font_family),
        size = overlay.font_size,
        weight = weight,
        fill = fill,
        opacity = opacity,
        text = xml_escape(&overlay.text),
    )
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Rasterize a text overlay into a canvas-sized premultiplied RGBA8 buffer.
///
/// Text whose font cannot be resolved is dropped by `usvg`, leaving the buffer transparent.
pub fn rasterize_text_overlay(
    overlay: &TextOverlay,
    canvas: Canvas,
    fontdb: Arc<usvg::fontdb::Database>,
) -> EtchResult<Vec<u8>> {
    let svg = text_overlay_svg(overlay, canvas);
    let opts = usvg::Options {
        fontdb,
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(&svg, &opts).context("parse text overlay svg")?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(canvas.width, canvas.height)
        .ok_or_else(|| EtchError::render("failed to allocate text pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );
    Ok(pixmap.take())
}

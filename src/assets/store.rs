use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;

use crate::{
    assets::{decode::decode_image, text},
    config::model::{Overlay, SketchConfig},
    foundation::error::{EtchError, EtchResult},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub(crate) u32);

#[derive(Clone, Debug)]
/// Prepared raster in premultiplied RGBA8 form.
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Overlay rasters decoded once before the first frame.
///
/// Each config overlay maps to at most one prepared image; overlays whose source could not be read
/// or decoded map to `None` and are skipped when compiling frames.
#[derive(Clone, Debug, Default)]
pub struct AssetStore {
    root: PathBuf,
    images: Vec<PreparedImage>,
    overlay_assets: Vec<Option<AssetId>>,
    font_faces: usize,
}

impl AssetStore {
    /// A store with no assets; every overlay is skipped.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode image overlays (relative to `root`) and rasterize text overlays.
    ///
    /// Missing or undecodable images are logged and skipped. Returns once every overlay has been
    /// resolved, so rendering never waits on assets.
    #[tracing::instrument(
        skip_all,
        fields(root = %root.display(), overlays = config.overlays.len())
    )]
    pub fn prepare(config: &SketchConfig, root: &Path) -> EtchResult<Self> {
        let mut store = Self {
            root: root.to_path_buf(),
            ..Self::default()
        };

        let fontdb = config
            .overlays
            .iter()
            .any(|o| matches!(o, Overlay::Text(_)))
            .then(|| text::build_fontdb(root));
        store.font_faces = fontdb.as_ref().map_or(0, |db| db.faces().count());

        for (idx, overlay) in config.overlays.iter().enumerate() {
            let prepared = match overlay {
                Overlay::Image(img) => store.load_image(&img.source),
                Overlay::Text(t) => match &fontdb {
                    Some(db) => text::rasterize_text_overlay(t, config.canvas, db.clone()).map(
                        |rgba8_premul| PreparedImage {
                            width: config.canvas.width,
                            height: config.canvas.height,
                            rgba8_premul: Arc::new(rgba8_premul),
                        },
                    ),
                    None => Err(EtchError::render("font database unavailable")),
                },
            };

            let id = match prepared {
                Ok(img) => Some(store.insert(img)),
                Err(err) => {
                    tracing::warn!(overlay = idx, error = %err, "skipping overlay");
                    None
                }
            };
            store.overlay_assets.push(id);
        }

        tracing::debug!(
            prepared = store.images.len(),
            skipped = store.overlay_assets.iter().filter(|id| id.is_none()).count(),
            "assets ready"
        );
        Ok(store)
    }

    fn load_image(&self, source: &Path) -> EtchResult<PreparedImage> {
        let path = self.root.join(source);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read image '{}'", path.display()))?;
        decode_image(&bytes)
    }

    /// Add an already prepared raster, e.g. one generated in memory.
    pub fn insert(&mut self, img: PreparedImage) -> AssetId {
        let id = AssetId(self.images.len() as u32);
        self.images.push(img);
        id
    }

    pub fn get(&self, id: AssetId) -> EtchResult<&PreparedImage> {
        self.images
            .get(id.0 as usize)
            .ok_or_else(|| EtchError::render(format!("unknown asset id {}", id.0)))
    }

    /// Prepared asset for the overlay at `index` in the config, if it loaded.
    pub fn overlay_asset(&self, index: usize) -> Option<AssetId> {
        self.overlay_assets.get(index).copied().flatten()
    }

    pub fn font_faces(&self) -> usize {
        self.font_faces
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::config::model::ImageOverlay;
    use crate::config::presets::holiday_card;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("target")
            .join("etchwork-tests")
            .join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn image_only(source: &str) -> SketchConfig {
        SketchConfig {
            overlays: vec![Overlay::Image(ImageOverlay {
                source: PathBuf::from(source),
                x: 1.0,
                y: 2.0,
            })],
            ..holiday_card()
        }
    }

    #[test]
    fn missing_image_is_skipped_not_fatal() {
        let dir = scratch_dir("missing_image");
        let store = AssetStore::prepare(&image_only("nope.png"), &dir).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.overlay_asset(0), None);
        assert_eq!(store.overlay_asset(7), None);
    }

    #[test]
    fn image_overlay_decodes_from_root() {
        let dir = scratch_dir("logo_image");
        let img = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 0]).unwrap();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        std::fs::write(dir.join("logo.png"), buf).unwrap();

        let store = AssetStore::prepare(&image_only("logo.png"), &dir).unwrap();
        let id = store.overlay_asset(0).unwrap();
        let prepared = store.get(id).unwrap();
        assert_eq!((prepared.width, prepared.height), (2, 1));
        assert_eq!(
            prepared.rgba8_premul.as_slice(),
            &[255, 0, 0, 255, 0, 0, 0, 0]
        );
    }

    #[test]
    fn unknown_id_is_an_error() {
        assert!(AssetStore::empty().get(AssetId(3)).is_err());
    }
}

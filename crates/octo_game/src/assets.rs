//! Asset manifest loading and image decoding.
//!
//! `assets/manifest.json` is the declarative surface for art: it names the
//! backdrop image and the per-facing character frame images. Everything is
//! decoded to RGBA8 up front, so sprite dimensions are known before the
//! window exists (the window is sized to the backdrop). Any failure here is
//! fatal at startup; nothing loads lazily during play.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize, Clone)]
pub struct ManifestFile {
    pub version: String,
    pub background: String,
    pub character: CharacterImages,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CharacterImages {
    pub left: Vec<String>,
    pub right: Vec<String>,
}

/// One decoded image. The `key` is the manifest path string and doubles as
/// the texture key at render time.
#[derive(Debug)]
pub struct ImageAsset {
    pub key: Arc<str>,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug)]
pub struct AssetStore {
    pub background: Arc<str>,
    pub left_frames: Vec<Arc<str>>,
    pub right_frames: Vec<Arc<str>>,
    images: HashMap<Arc<str>, ImageAsset>,
}

impl AssetStore {
    pub fn image(&self, key: &str) -> Option<&ImageAsset> {
        self.images.get(key)
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageAsset> {
        self.images.values()
    }

    pub fn background_size(&self) -> (u32, u32) {
        // The background is validated and decoded at load, so it is present.
        self.images
            .get(&self.background)
            .map(|img| (img.width, img.height))
            .unwrap_or((0, 0))
    }
}

pub fn load_manifest_from_path(path: &Path) -> Result<ManifestFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read asset manifest {}: {e}", path.display()))?;
    let manifest: ManifestFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse asset manifest {}: {e}", path.display()))?;
    validate_manifest(&manifest)?;
    Ok(manifest)
}

fn validate_manifest(manifest: &ManifestFile) -> Result<(), String> {
    if manifest.version != "0.1" {
        return Err(format!(
            "Manifest validation failed: unsupported version '{}'",
            manifest.version
        ));
    }
    if manifest.background.is_empty() {
        return Err("Manifest validation failed: background path is empty".to_string());
    }
    for (facing, frames) in [
        ("left", &manifest.character.left),
        ("right", &manifest.character.right),
    ] {
        if frames.is_empty() {
            return Err(format!(
                "Manifest validation failed: character.{facing} has no frames"
            ));
        }
        for (i, frame) in frames.iter().enumerate() {
            if frame.is_empty() {
                return Err(format!(
                    "Manifest validation failed: character.{facing} frame {i} has an empty path"
                ));
            }
        }
    }
    Ok(())
}

/// Load the manifest and decode every image it names.
pub fn load_assets(manifest_path: &Path) -> Result<AssetStore, String> {
    let manifest = load_manifest_from_path(manifest_path)?;

    let mut images = HashMap::new();
    let mut decode = |path: &str| -> Result<Arc<str>, String> {
        let key: Arc<str> = Arc::from(path);
        if images.contains_key(&key) {
            return Ok(key);
        }
        let decoded = image::open(path).map_err(|e| format!("Failed to load image '{path}': {e}"))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::info!("Loaded image '{}' ({}x{})", path, width, height);
        images.insert(
            key.clone(),
            ImageAsset {
                key: key.clone(),
                width,
                height,
                rgba: rgba.into_raw(),
            },
        );
        Ok(key)
    };

    let background = decode(&manifest.background)?;
    let mut left_frames = Vec::new();
    for path in &manifest.character.left {
        left_frames.push(decode(path)?);
    }
    let mut right_frames = Vec::new();
    for path in &manifest.character.right {
        right_frames.push(decode(path)?);
    }

    Ok(AssetStore {
        background,
        left_frames,
        right_frames,
        images,
    })
}

//! Photo export: JPEG encoding and file save.
//!
//! Hosts offer one of two save primitives. A blob saver takes the encoded
//! bytes directly; hosts without one get a JPEG data URL through a
//! download-anchor style primitive instead. [`export_photo`] picks the path
//! from [`PhotoSaver::supports_blob_save`].

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

use crate::surface::RasterSurface;

/// Default name of the saved photo.
pub const DEFAULT_FILENAME: &str = "myPhoto.jpg";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to encode: the photo surface is empty")]
    EmptySurface,
    #[error("Failed to encode JPEG: {0}")]
    Encode(String),
    #[error("Unsupported download link: {0}")]
    UnsupportedHref(String),
    #[error("Malformed data URL: {0}")]
    MalformedDataUrl(String),
    #[error("Invalid file name '{0}': must be a plain name without directories")]
    InvalidFilename(String),
    #[error("Failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// How a saver writes photos to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaveMethod {
    /// Use the blob primitive when available
    #[default]
    Auto,
    /// Always go through a data URL and the download primitive
    DataUrl,
}

impl FromStr for SaveMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" | "blob" => Ok(SaveMethod::Auto),
            "data-url" | "dataurl" => Ok(SaveMethod::DataUrl),
            _ => Err(format!(
                "Unknown save method '{}'. Available: auto, data-url",
                s
            )),
        }
    }
}

/// Host file-save primitives.
pub trait PhotoSaver {
    /// Whether [`PhotoSaver::save_blob`] is available.
    fn supports_blob_save(&self) -> bool;

    /// Save raw encoded bytes under `filename`.
    fn save_blob(&mut self, bytes: &[u8], filename: &str) -> Result<PathBuf, ExportError>;

    /// Download `href` under `filename`, the way a clicked download link would.
    fn click_download(&mut self, href: &str, filename: &str) -> Result<PathBuf, ExportError>;
}

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPhoto {
    pub path: PathBuf,
    pub via_data_url: bool,
}

/// Encode `raster` and hand it to `saver` under `filename`.
pub fn export_photo<S: PhotoSaver + ?Sized>(
    raster: &RasterSurface,
    saver: &mut S,
    filename: &str,
    quality: u8,
) -> Result<SavedPhoto, ExportError> {
    if saver.supports_blob_save() {
        let jpeg = raster.encode_jpeg(quality)?;
        let path = saver.save_blob(&jpeg, filename)?;
        log::info!("saved {} bytes to {}", jpeg.len(), path.display());
        Ok(SavedPhoto {
            path,
            via_data_url: false,
        })
    } else {
        let href = raster.to_data_url(quality)?;
        let path = saver.click_download(&href, filename)?;
        log::info!("downloaded data URL to {}", path.display());
        Ok(SavedPhoto {
            path,
            via_data_url: true,
        })
    }
}

/// Saves photos into a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DiskSaver {
    output_dir: PathBuf,
    method: SaveMethod,
}

impl DiskSaver {
    pub fn new(output_dir: impl Into<PathBuf>, method: SaveMethod) -> Self {
        Self {
            output_dir: output_dir.into(),
            method,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, ExportError> {
        if !is_plain_filename(filename) {
            return Err(ExportError::InvalidFilename(filename.to_string()));
        }
        fs::create_dir_all(&self.output_dir).map_err(|source| ExportError::Io {
            path: self.output_dir.clone(),
            source,
        })?;
        let path = unique_path(&self.output_dir, filename);
        fs::write(&path, bytes).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

impl PhotoSaver for DiskSaver {
    fn supports_blob_save(&self) -> bool {
        self.method == SaveMethod::Auto
    }

    fn save_blob(&mut self, bytes: &[u8], filename: &str) -> Result<PathBuf, ExportError> {
        self.write(bytes, filename)
    }

    fn click_download(&mut self, href: &str, filename: &str) -> Result<PathBuf, ExportError> {
        let bytes = decode_data_url(href)?;
        self.write(&bytes, filename)
    }
}

/// Decode the payload of a base64 `data:` URL.
pub fn decode_data_url(href: &str) -> Result<Vec<u8>, ExportError> {
    let rest = href
        .strip_prefix("data:")
        .ok_or_else(|| ExportError::UnsupportedHref(truncate(href)))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ExportError::MalformedDataUrl("missing ','".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(ExportError::MalformedDataUrl(format!(
            "expected base64 payload, got '{}'",
            meta
        )));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ExportError::MalformedDataUrl(e.to_string()))
}

/// `dir/filename`, or `dir/stem (n).ext` with the first free `n` when the
/// name is taken.
pub fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(filename);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    let ext = name.extension().map(|e| e.to_string_lossy().into_owned());

    (1u32..)
        .map(|n| match &ext {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// A single normal path component, so a save stays inside the output dir.
pub fn is_plain_filename(filename: &str) -> bool {
    let mut components = Path::new(filename).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn truncate(s: &str) -> String {
    s.chars().take(32).collect()
}

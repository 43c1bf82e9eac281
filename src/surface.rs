//! Preview and raster surfaces.
//!
//! [`PreviewSurface`] is where the live stream is bound; whoever owns the
//! preview owns the stream. [`RasterSurface`] is the still-image buffer a
//! captured frame is drawn into and encoded from.

use std::io::Cursor;

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::camera::{Frame, Resolution};
use crate::export::ExportError;
use crate::media::MediaStream;

/// Size of a raster surface that has never been resized.
pub const DEFAULT_RASTER_SIZE: Resolution = Resolution::new(300, 150);

/// The live view. Holds at most one stream.
#[derive(Debug)]
pub struct PreviewSurface<S> {
    stream: Option<S>,
}

impl<S> Default for PreviewSurface<S> {
    fn default() -> Self {
        Self { stream: None }
    }
}

impl<S: MediaStream> PreviewSurface<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `stream`, returning whatever was bound before.
    pub fn bind(&mut self, stream: S) -> Option<S> {
        self.stream.replace(stream)
    }

    /// Unbind and hand back the current stream.
    pub fn clear(&mut self) -> Option<S> {
        self.stream.take()
    }

    pub fn stream(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.stream.is_some()
    }

    /// Frame currently shown, if a stream is bound and has produced one.
    pub fn current_frame(&self) -> Option<Frame> {
        self.stream.as_ref()?.latest_frame()
    }
}

/// An RGB pixel buffer that frames are drawn into and encoded from.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    /// Number of times the backing buffer was reallocated by a resize
    reallocations: u32,
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new(DEFAULT_RASTER_SIZE)
    }
}

impl RasterSurface {
    /// A black surface of the given size.
    pub fn new(size: Resolution) -> Self {
        Self {
            width: size.width,
            height: size.height,
            pixels: vec![0; buffer_len(size)],
            reallocations: 0,
        }
    }

    pub fn size(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn reallocations(&self) -> u32 {
        self.reallocations
    }

    /// Resize to `size`, clearing the contents. Returns `false` and leaves the
    /// surface untouched when it already has that size.
    pub fn resize_to(&mut self, size: Resolution) -> bool {
        if self.size() == size {
            return false;
        }
        self.width = size.width;
        self.height = size.height;
        self.pixels = vec![0; buffer_len(size)];
        self.reallocations += 1;
        true
    }

    /// Draw `frame` at the origin. Parts outside the surface are clipped, as
    /// are rows missing from a short data buffer.
    pub fn draw_frame(&mut self, frame: &Frame) {
        let bpp = frame.bytes_per_pixel();
        let copy_w = frame.width.min(self.width) as usize * bpp;
        let src_stride = frame.width as usize * bpp;
        let dst_stride = self.width as usize * 3;
        if copy_w == 0 || dst_stride == 0 {
            return;
        }

        let rows = frame
            .data
            .chunks(src_stride)
            .zip(self.pixels.chunks_exact_mut(dst_stride))
            .take(frame.height as usize);
        for (src, dst) in rows {
            let Some(src) = src.get(..copy_w) else {
                break;
            };
            dst[..copy_w].copy_from_slice(src);
        }
    }

    /// Encode the surface as a baseline JPEG.
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, ExportError> {
        if self.size().is_empty() {
            return Err(ExportError::EmptySurface);
        }
        let mut out = Cursor::new(Vec::new());
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
            encoder
                .encode(&self.pixels, self.width, self.height, ExtendedColorType::Rgb8)
                .map_err(|e| ExportError::Encode(e.to_string()))?;
        }
        Ok(out.into_inner())
    }

    /// Encode the surface as a `data:image/jpeg;base64,` URL.
    pub fn to_data_url(&self, quality: u8) -> Result<String, ExportError> {
        let jpeg = self.encode_jpeg(quality)?;
        Ok(format!(
            "{}{}",
            JPEG_DATA_URL_PREFIX,
            base64::engine::general_purpose::STANDARD.encode(jpeg)
        ))
    }
}

/// Prefix of every JPEG data URL produced by [`RasterSurface::to_data_url`].
pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

fn buffer_len(size: Resolution) -> usize {
    size.width as usize * size.height as usize * 3
}

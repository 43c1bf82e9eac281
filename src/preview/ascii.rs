//! Frame to ASCII conversion for the live preview.
//!
//! Pipeline: BT.601 grayscale, area-average downsampling to the character
//! grid, then a brightness ramp lookup.

use serde::Deserialize;
use std::str::FromStr;

use crate::camera::Frame;

/// Terminal cells are roughly twice as tall as they are wide.
pub const CHAR_ASPECT_RATIO: f32 = 2.0;

/// Brightness ramps, darkest first.
pub const STANDARD_CHARSET: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];
pub const BLOCKS_CHARSET: &[char] = &[' ', '░', '▒', '▓', '█'];
pub const MINIMAL_CHARSET: &[char] = &[' ', '.', ':', '#'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharSet {
    #[default]
    Standard,
    Blocks,
    Minimal,
}

impl CharSet {
    pub fn chars(&self) -> &'static [char] {
        match self {
            CharSet::Standard => STANDARD_CHARSET,
            CharSet::Blocks => BLOCKS_CHARSET,
            CharSet::Minimal => MINIMAL_CHARSET,
        }
    }
}

impl FromStr for CharSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(CharSet::Standard),
            "blocks" => Ok(CharSet::Blocks),
            "minimal" => Ok(CharSet::Minimal),
            _ => Err(format!(
                "Unknown charset '{}'. Available: standard, blocks, minimal",
                s
            )),
        }
    }
}

/// A grid of characters ready to print, row-major.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsciiFrame {
    pub cols: u16,
    pub rows: u16,
    pub chars: Vec<char>,
}

impl AsciiFrame {
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.chars
            .chunks(self.cols.max(1) as usize)
            .map(|row| row.iter().collect())
    }
}

/// Scratch buffers reused across preview frames.
#[derive(Debug, Default)]
pub struct AsciiRenderer {
    gray: Vec<u8>,
    cells: Vec<u8>,
}

impl AsciiRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `frame` into at most `max_cols` x `max_rows` characters,
    /// keeping the frame's aspect ratio.
    pub fn render(
        &mut self,
        frame: &Frame,
        max_cols: u16,
        max_rows: u16,
        charset: CharSet,
    ) -> AsciiFrame {
        let (cols, rows) = fit_dimensions(frame.width, frame.height, max_cols, max_rows);
        if cols == 0 || rows == 0 {
            return AsciiFrame::default();
        }

        to_grayscale_into(frame, &mut self.gray);
        downsample_into(&self.gray, frame.width, frame.height, cols, rows, &mut self.cells);
        AsciiFrame {
            cols,
            rows,
            chars: map_to_chars(&self.cells, charset.chars()),
        }
    }
}

/// Largest grid within `max_cols` x `max_rows` that shows an image of the
/// given pixel size without distortion.
pub fn fit_dimensions(img_width: u32, img_height: u32, max_cols: u16, max_rows: u16) -> (u16, u16) {
    if img_width == 0 || img_height == 0 || max_cols == 0 || max_rows == 0 {
        return (0, 0);
    }

    let target = img_width as f32 / img_height as f32 * CHAR_ASPECT_RATIO;
    let rows = (max_cols as f32 / target).round() as u16;
    if rows > 0 && rows <= max_rows {
        (max_cols, rows)
    } else {
        let cols = ((max_rows as f32 * target).round() as u16).min(max_cols);
        (cols.max(1), max_rows)
    }
}

/// BT.601 luma, integer math.
pub fn to_grayscale_into(frame: &Frame, out: &mut Vec<u8>) {
    out.clear();
    out.extend(frame.data.chunks_exact(3).map(|rgb| {
        let (r, g, b) = (rgb[0] as u32, rgb[1] as u32, rgb[2] as u32);
        ((299 * r + 587 * g + 114 * b) / 1000) as u8
    }));
}

/// Average the pixels covered by each character cell.
pub fn downsample_into(
    gray: &[u8],
    img_width: u32,
    img_height: u32,
    cols: u16,
    rows: u16,
    out: &mut Vec<u8>,
) {
    out.clear();
    if cols == 0 || rows == 0 || img_width == 0 || img_height == 0 || gray.is_empty() {
        return;
    }

    let cell_w = img_width as f32 / cols as f32;
    let cell_h = img_height as f32 / rows as f32;

    for cy in 0..rows as u32 {
        let y0 = (cy as f32 * cell_h) as u32;
        let y1 = (((cy + 1) as f32 * cell_h) as u32).max(y0 + 1).min(img_height);
        for cx in 0..cols as u32 {
            let x0 = (cx as f32 * cell_w) as u32;
            let x1 = (((cx + 1) as f32 * cell_w) as u32).max(x0 + 1).min(img_width);

            let mut sum = 0u32;
            let mut count = 0u32;
            for py in y0..y1 {
                let row = (py * img_width) as usize;
                for px in x0..x1 {
                    if let Some(&v) = gray.get(row + px as usize) {
                        sum += v as u32;
                        count += 1;
                    }
                }
            }
            out.push(if count > 0 { (sum / count) as u8 } else { 0 });
        }
    }
}

/// Map brightness (0-255) onto `charset`, darkest first.
pub fn map_to_chars(brightness: &[u8], charset: &[char]) -> Vec<char> {
    if charset.is_empty() {
        return vec![' '; brightness.len()];
    }
    let levels = charset.len() - 1;
    brightness
        .iter()
        .map(|&b| charset[b as usize * levels / 255])
        .collect()
}

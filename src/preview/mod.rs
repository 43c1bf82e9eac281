//! Terminal preview: ASCII rendering of the live stream plus the status
//! area.

mod ascii;
mod render;

pub use ascii::{
    fit_dimensions, AsciiFrame, AsciiRenderer, CharSet, BLOCKS_CHARSET, CHAR_ASPECT_RATIO,
    MINIMAL_CHARSET, STANDARD_CHARSET,
};
pub use render::{draw_screen, preview_rows, status_lines, LineKind, StatusLine};

//! Drawing the session screen with crossterm.
//!
//! Layout, top to bottom: ASCII preview (if any), then the status lines
//! built by [`status_lines`].

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;

use super::ascii::AsciiFrame;
use crate::export::PhotoSaver;
use crate::media::MediaDevices;
use crate::session::CameraSession;

/// One line of status text and how to colour it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub kind: LineKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Title,
    Hint,
    Tooltip,
    Error,
    Help,
}

impl LineKind {
    fn color(self) -> Color {
        match self {
            LineKind::Title => Color::White,
            LineKind::Hint => Color::Green,
            LineKind::Tooltip => Color::Yellow,
            LineKind::Error => Color::Red,
            LineKind::Help => Color::DarkGrey,
        }
    }
}

impl StatusLine {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Status text for the current session state.
pub fn status_lines<H: MediaDevices, P: PhotoSaver>(
    session: &CameraSession<H, P>,
) -> Vec<StatusLine> {
    let mut lines = Vec::new();

    let camera = match (session.current_index(), session.current_device()) {
        (Some(index), Some(device)) => format!(
            " | camera {}/{}: {}",
            index + 1,
            session.devices().len(),
            device.label
        ),
        _ => String::new(),
    };
    lines.push(StatusLine::new(
        LineKind::Title,
        format!("camsnap | {}{}", session.state(), camera),
    ));

    let status = session.status();
    if !status.hint().is_empty() {
        lines.push(StatusLine::new(LineKind::Hint, status.hint()));
    }
    if let Some(saved) = session.last_saved() {
        lines.push(StatusLine::new(
            LineKind::Hint,
            format!("Saved {}", saved.path.display()),
        ));
    }
    if !status.tooltip().is_empty() {
        lines.push(StatusLine::new(LineKind::Tooltip, status.tooltip()));
    }
    for error in status.errors() {
        lines.push(StatusLine::new(LineKind::Error, error));
    }

    let switch = if status.switch_enabled() {
        "[n] switch camera"
    } else {
        "[n] switch camera (off)"
    };
    let save = if session.save_armed() {
        "[s] save"
    } else {
        "[s] save (nothing captured)"
    };
    lines.push(StatusLine::new(
        LineKind::Help,
        format!("[space] capture  {}  {}  [q] quit", save, switch),
    ));

    lines
}

/// Rows left for the preview once the status lines are placed.
pub fn preview_rows(term_rows: u16, status_count: usize) -> u16 {
    term_rows.saturating_sub(status_count as u16 + 1)
}

/// Redraw the whole screen.
pub fn draw_screen<W: Write>(
    out: &mut W,
    preview: Option<&AsciiFrame>,
    lines: &[StatusLine],
    term_cols: u16,
) -> io::Result<()> {
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;

    let mut row = 0u16;
    if let Some(frame) = preview {
        for line in frame.lines() {
            queue!(out, MoveTo(0, row), Print(line))?;
            row += 1;
        }
    }
    row += 1;

    for line in lines {
        let text: String = line.text.chars().take(term_cols as usize).collect();
        queue!(
            out,
            MoveTo(0, row),
            SetForegroundColor(line.kind.color()),
            Print(text),
            ResetColor
        )?;
        row += 1;
    }

    out.flush()
}

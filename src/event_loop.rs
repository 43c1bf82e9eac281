//! Async event loop driving an interactive session.
//!
//! One task owns the session and handles, one at a time:
//! 1. Terminal events (keys, resize) via crossterm's EventStream
//! 2. Device-change notifications from the host
//! 3. A redraw tick for the live preview (~10 FPS)
//! 4. Ctrl+C delivered as a signal

use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use std::io::{self, Write};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::export::PhotoSaver;
use crate::input::{handle_key_event, KeyAction};
use crate::media::{DeviceChange, MediaDevices};
use crate::preview::{draw_screen, preview_rows, status_lines, AsciiRenderer, CharSet};
use crate::session::CameraSession;

const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

/// How the screen is drawn.
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    pub charset: CharSet,
    /// Render the live ASCII preview
    pub preview: bool,
}

struct Screen<W: Write> {
    out: W,
    renderer: AsciiRenderer,
    view: ViewOptions,
    cols: u16,
    rows: u16,
}

impl<W: Write> Screen<W> {
    fn draw<H: MediaDevices, P: PhotoSaver>(
        &mut self,
        session: &CameraSession<H, P>,
    ) -> io::Result<()> {
        let lines = status_lines(session);
        let ascii = if self.view.preview {
            session.preview().current_frame().map(|frame| {
                let rows = preview_rows(self.rows, lines.len());
                self.renderer.render(&frame, self.cols, rows, self.view.charset)
            })
        } else {
            None
        };
        draw_screen(&mut self.out, ascii.as_ref(), &lines, self.cols)
    }
}

/// Run until the user quits. The session must already be initialised; it is
/// left open for the caller to shut down.
pub async fn run<H: MediaDevices, P: PhotoSaver>(
    session: &mut CameraSession<H, P>,
    mut changes: UnboundedReceiver<DeviceChange>,
    view: ViewOptions,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut event_stream = EventStream::new();

    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
    redraw.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
    let mut screen = Screen {
        out: io::stdout(),
        renderer: AsciiRenderer::new(),
        view,
        cols,
        rows,
    };
    screen.draw(session)?;

    loop {
        tokio::select! {
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => match handle_key_event(key_event) {
                        KeyAction::Session(action) => {
                            log::debug!("key action: {:?}", action);
                            session.dispatch(action).await;
                            screen.draw(session)?;
                        }
                        KeyAction::Quit => break,
                        KeyAction::None => {}
                    },
                    Some(Ok(Event::Resize(cols, rows))) => {
                        screen.cols = cols;
                        screen.rows = rows;
                        screen.draw(session)?;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(Box::new(e)),
                    None => break,
                }
            }

            Some(change) = changes.recv() => {
                log::info!("camera list changed, re-enumerating");
                session.on_device_change(change).await;
                screen.draw(session)?;
            }

            _ = redraw.tick() => {
                screen.draw(session)?;
            }

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

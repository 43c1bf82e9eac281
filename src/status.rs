//! User-visible session state: hint label, tooltip, error region and the
//! switch-camera control.

use std::collections::VecDeque;

/// Default cap on retained error lines.
pub const DEFAULT_MAX_ERROR_LINES: usize = 5;

#[derive(Debug, Clone)]
pub struct StatusBoard {
    hint: String,
    tooltip: String,
    errors: VecDeque<String>,
    max_errors: usize,
    switch_enabled: bool,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ERROR_LINES)
    }
}

impl StatusBoard {
    /// An empty board keeping at most `max_errors` error lines (at least one).
    pub fn new(max_errors: usize) -> Self {
        Self {
            hint: String::new(),
            tooltip: String::new(),
            errors: VecDeque::new(),
            max_errors: max_errors.max(1),
            switch_enabled: false,
        }
    }

    /// Append `ERROR: <message>`, dropping the oldest line past the cap.
    pub fn append_error(&mut self, message: &str) {
        log::warn!("{}", message);
        if self.errors.len() == self.max_errors {
            self.errors.pop_front();
        }
        self.errors.push_back(format!("ERROR: {}", message));
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(String::as_str)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn set_hint(&mut self, hint: impl Into<String>) {
        self.hint = hint.into();
    }

    pub fn clear_hint(&mut self) {
        self.hint.clear();
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }

    pub fn set_tooltip(&mut self, tooltip: impl Into<String>) {
        self.tooltip = tooltip.into();
    }

    pub fn tooltip(&self) -> &str {
        &self.tooltip
    }

    pub fn set_switch_enabled(&mut self, enabled: bool) {
        self.switch_enabled = enabled;
    }

    pub fn switch_enabled(&self) -> bool {
        self.switch_enabled
    }
}

//! Single-line, two-toned progress bar.

use std::io::{self, Write};

/// Bar width in characters.
pub const BAR_WIDTH: usize = 75;

const CLEAR_LINE: &str = "\x1b[2K\r";
const DONE_STYLE: &str = "\x1b[1;30;102m";
const TODO_STYLE: &str = "\x1b[1;30;106m";
const RESET: &str = "\x1b[0m";

/// Render one bar frame. The first `fraction * width` characters of the
/// space-padded label get the "done" treatment, the rest of the width the
/// "todo" treatment; label text beyond `width` is appended unstyled.
#[must_use]
pub fn render_bar(fraction: f64, label: &str, width: usize) -> String {
    let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
    let chars: Vec<char> = label.chars().collect();
    let padded_len = chars.len().max(width);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let done = ((fraction * width as f64).floor() as usize).min(width);

    let text: String = chars
        .iter()
        .copied()
        .chain(std::iter::repeat(' '))
        .take(padded_len)
        .collect();
    let done_part: String = text.chars().take(done).collect();
    let todo_part: String = text.chars().skip(done).take(width - done).collect();
    let overflow: String = text.chars().skip(width).collect();

    format!("{CLEAR_LINE}{DONE_STYLE}{done_part}{TODO_STYLE}{todo_part}{RESET}{overflow}")
}

/// Writes progress frames to a terminal-like stream.
pub struct ProgressReporter {
    out: Option<Box<dyn Write + Send>>,
}

impl ProgressReporter {
    /// Reporter writing to `out`.
    #[must_use]
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out: Some(out) }
    }

    /// Reporter writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Reporter that renders nothing.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { out: None }
    }

    /// Overwrite the current line with a new frame.
    pub fn update(&mut self, fraction: f64, label: &str) {
        let frame = render_bar(fraction, label, BAR_WIDTH);
        self.emit(&frame);
    }

    /// Print a final line that stays on screen.
    pub fn finish(&mut self, text: &str) {
        self.emit(&format!("{CLEAR_LINE}{text}\n"));
    }

    fn emit(&mut self, text: &str) {
        let Some(out) = self.out.as_mut() else {
            return;
        };
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            tracing::debug!(error = %e, "Progress output failed; disabling reporter");
            self.out = None;
        }
    }
}

//! Terminal overlay: rewrites one line in place.

use std::io::{self, Write};

use tracing::debug;

use crate::application::overlay_context::OverlaySink;

/// Carriage return plus "erase entire line".
const ERASE_LINE: &str = "\r\x1b[2K";

/// Shows the current key combination on a single, continuously rewritten line.
pub struct ConsoleOverlay<W: Write + Send + 'static> {
    out: W,
}

impl ConsoleOverlay<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send + 'static> ConsoleOverlay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, text: &str) {
        let result = write!(self.out, "{ERASE_LINE}{text}").and_then(|()| self.out.flush());
        if let Err(e) = result {
            debug!("console overlay write failed: {e}");
        }
    }
}

impl<W: Write + Send + 'static> OverlaySink for ConsoleOverlay<W> {
    fn show(&mut self, text: &str) {
        self.write_line(text);
    }

    fn clear(&mut self) {
        self.write_line("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_rewrites_the_line() {
        let mut overlay = ConsoleOverlay::new(Vec::new());

        overlay.show("CTRL + C");
        overlay.show("ESC");

        let out = String::from_utf8(overlay.into_inner()).unwrap();
        assert_eq!(out, "\r\x1b[2KCTRL + C\r\x1b[2KESC");
    }

    #[test]
    fn test_clear_erases_the_line() {
        let mut overlay = ConsoleOverlay::new(Vec::new());

        overlay.show("A");
        overlay.clear();

        let out = String::from_utf8(overlay.into_inner()).unwrap();
        assert!(out.ends_with(ERASE_LINE));
    }
}

use std::fmt;
use std::io::{IsTerminal, Write};

/// The UI regions the interaction controller drives.
pub trait Surface {
    fn set_action(&mut self, label: &str, enabled: bool);

    /// Choose-image and record controls
    fn show_controls(&mut self, visible: bool);

    /// Waiting message, spinner, and reload disclaimer
    fn show_waiting(&mut self, visible: bool);

    fn show_player(&mut self, visible: bool);

    fn show_notice(&mut self, message: &str);

    /// Best effort; callers ignore failures
    fn request_fullscreen(&mut self) -> Result<(), FullscreenError>;

    /// Restore the initial layout
    fn reset(&mut self);
}

pub const START_LABEL: &str = "Start Recording";

#[derive(Debug, Clone, PartialEq)]
pub struct FullscreenError(pub String);

impl fmt::Display for FullscreenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Full-screen unavailable: {}", self.0)
    }
}

impl std::error::Error for FullscreenError {}

const ENTER_ALTERNATE_SCREEN: &str = "\x1b[?1049h\x1b[2J\x1b[H";
const LEAVE_ALTERNATE_SCREEN: &str = "\x1b[?1049l";

/// Renders the page as status lines on stdout
pub struct TerminalSurface<W: Write> {
    out: W,
    is_terminal: bool,
    fullscreen: bool,
}

impl TerminalSurface<std::io::Stdout> {
    pub fn stdout() -> Self {
        let out = std::io::stdout();
        let is_terminal = out.is_terminal();
        Self::new(out, is_terminal)
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, is_terminal: bool) -> Self {
        Self {
            out,
            is_terminal,
            fullscreen: false,
        }
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            tracing::debug!("Failed to write to terminal: {}", e);
        }
    }

    fn leave_fullscreen(&mut self) {
        if !self.fullscreen {
            return;
        }
        self.fullscreen = false;
        if let Err(e) = write!(self.out, "{}", LEAVE_ALTERNATE_SCREEN) {
            tracing::debug!("Failed to leave alternate screen: {}", e);
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn set_action(&mut self, label: &str, enabled: bool) {
        if enabled {
            self.line(&format!("[ {} ]  (press Enter)", label));
        } else {
            self.line(&format!("[ {} ]", label));
        }
    }

    fn show_controls(&mut self, visible: bool) {
        if visible {
            self.line("Type an image path and press Enter to choose an image.");
        } else {
            self.line("Image choice closed until the page resets.");
        }
    }

    fn show_waiting(&mut self, visible: bool) {
        if visible {
            self.line("Waiting for a response...");
            self.line("If nothing happens, the page resets on its own.");
        } else {
            self.line("Response received.");
        }
    }

    fn show_player(&mut self, visible: bool) {
        if visible {
            self.line("Playing response");
        }
    }

    fn show_notice(&mut self, message: &str) {
        self.line(&format!("! {}", message));
    }

    fn request_fullscreen(&mut self) -> Result<(), FullscreenError> {
        if !self.is_terminal {
            return Err(FullscreenError("output is not a terminal".to_string()));
        }

        write!(self.out, "{}", ENTER_ALTERNATE_SCREEN)
            .and_then(|_| self.out.flush())
            .map_err(|e| FullscreenError(e.to_string()))?;
        self.fullscreen = true;
        Ok(())
    }

    fn reset(&mut self) {
        self.leave_fullscreen();
        self.show_controls(true);
        self.set_action(START_LABEL, true);
    }
}

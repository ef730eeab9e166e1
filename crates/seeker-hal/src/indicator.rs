//! Status indicator (tri-color LED) and two-line status display sinks.
//!
//! Neither sink feeds anything back into the core.

use seeker_types::{IndicatorColor, SeekerError};

/// Width of one status-display line in characters.
pub const DISPLAY_WIDTH: usize = 16;

/// The tri-color status LED.
pub trait Indicator: Send {
    /// Light `color`, turning every other color off first.
    ///
    /// # Errors
    ///
    /// Returns [`SeekerError::HardwareFault`] if the output cannot be driven.
    fn show(&mut self, color: IndicatorColor) -> Result<(), SeekerError>;
}

/// A two-line character display.
pub trait StatusDisplay: Send {
    /// Clear the display and print `first` and `second` on lines one and two.
    fn print(&mut self, first: &str, second: &str) -> Result<(), SeekerError>;
}

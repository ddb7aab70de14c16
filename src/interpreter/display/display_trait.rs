//! Output collaborator
//!
//! The engine never writes to a screen directly; everything the game says
//! goes through this trait so terminals and test harnesses can plug in.

use std::fmt;

pub trait GameDisplay {
    /// Print text at the current position. Text may contain newlines.
    fn print(&mut self, text: &str) -> Result<(), DisplayError>;

    fn print_char(&mut self, ch: char) -> Result<(), DisplayError> {
        let mut buf = [0u8; 4];
        self.print(ch.encode_utf8(&mut buf))
    }

    fn new_line(&mut self) -> Result<(), DisplayError> {
        self.print_char('\n')
    }

    /// Show the prompt before reading a command
    fn show_prompt(&mut self, prompt: &str) -> Result<(), DisplayError> {
        self.print(prompt)?;
        self.force_refresh()
    }

    /// Echo of a line typed by the player (scripted input shows it)
    fn print_input_echo(&mut self, text: &str) -> Result<(), DisplayError> {
        self.print(text)?;
        self.new_line()
    }

    /// Push buffered output to the device
    fn force_refresh(&mut self) -> Result<(), DisplayError>;
}

/// Display error type
#[derive(Debug, Clone)]
pub struct DisplayError {
    pub message: String,
}

impl DisplayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Display error: {}", self.message)
    }
}

impl std::error::Error for DisplayError {}

impl From<std::io::Error> for DisplayError {
    fn from(error: std::io::Error) -> Self {
        Self::new(format!("I/O error: {}", error))
    }
}

impl From<DisplayError> for String {
    fn from(error: DisplayError) -> String {
        error.message
    }
}

//! Plain terminal output with word wrapping

use crate::interpreter::display::display_trait::{DisplayError, GameDisplay};
use std::io::{self, Write};

pub struct TerminalDisplay {
    out: io::Stdout,
    width: usize,
    column: usize,
    /// A space held back until we know whether the next word fits
    pending_space: bool,
}

impl TerminalDisplay {
    pub fn new(width: usize) -> Self {
        TerminalDisplay {
            out: io::stdout(),
            width: width.max(20),
            column: 0,
            pending_space: false,
        }
    }

    fn write_word(&mut self, word: &str) -> Result<(), DisplayError> {
        let len = word.chars().count();
        if self.pending_space {
            if self.column + 1 + len > self.width && self.column > 0 {
                self.out.write_all(b"\n")?;
                self.column = 0;
            } else {
                self.out.write_all(b" ")?;
                self.column += 1;
            }
            self.pending_space = false;
        } else if self.column + len > self.width && self.column > 0 {
            self.out.write_all(b"\n")?;
            self.column = 0;
        }
        self.out.write_all(word.as_bytes())?;
        self.column += len;
        Ok(())
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        TerminalDisplay::new(79)
    }
}

impl GameDisplay for TerminalDisplay {
    fn print(&mut self, text: &str) -> Result<(), DisplayError> {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.out.write_all(b"\n")?;
                self.column = 0;
                self.pending_space = false;
            }
            let mut word = String::new();
            for ch in line.chars() {
                if ch == ' ' {
                    if !word.is_empty() {
                        self.write_word(&word)?;
                        word.clear();
                    }
                    self.pending_space = true;
                } else {
                    word.push(ch);
                }
            }
            if !word.is_empty() {
                self.write_word(&word)?;
            }
        }
        Ok(())
    }

    fn show_prompt(&mut self, prompt: &str) -> Result<(), DisplayError> {
        self.print(prompt)?;
        if self.pending_space {
            self.out.write_all(b" ")?;
            self.pending_space = false;
        }
        self.force_refresh()
    }

    /// The terminal already echoes what the player typed
    fn print_input_echo(&mut self, _text: &str) -> Result<(), DisplayError> {
        self.column = 0;
        self.pending_space = false;
        Ok(())
    }

    fn force_refresh(&mut self) -> Result<(), DisplayError> {
        self.out.flush()?;
        Ok(())
    }
}

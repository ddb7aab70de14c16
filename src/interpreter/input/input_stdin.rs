//! Line input from standard input

use crate::interpreter::input::input_trait::LineInput;
use log::debug;
use std::io;

pub struct StdinInput {
    /// Input buffer for building lines
    buffer: String,
}

impl StdinInput {
    pub fn new() -> Self {
        StdinInput {
            buffer: String::new(),
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

impl LineInput for StdinInput {
    /// A closed stdin (pipe exhausted or Ctrl-D) reads as zero bytes and is
    /// reported as end of input so the game ends instead of spinning.
    fn read_line(&mut self) -> Result<Option<String>, String> {
        self.buffer.clear();
        let bytes_read = io::stdin()
            .read_line(&mut self.buffer)
            .map_err(|e| format!("Failed to read line: {e}"))?;

        if bytes_read == 0 {
            debug!("stdin input: EOF detected");
            return Ok(None);
        }

        let line = self.buffer.trim_end_matches(['\n', '\r']);
        debug!("stdin input received: '{}'", line);
        Ok(Some(line.to_string()))
    }
}

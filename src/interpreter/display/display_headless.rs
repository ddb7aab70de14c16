//! Headless display implementation for testing and CI environments
//!
//! Collects all output in a transcript shared between clones, so a test
//! can hand one clone to the interpreter and read the other afterwards.

use crate::interpreter::display::display_trait::{DisplayError, GameDisplay};
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct HeadlessDisplay {
    transcript: Rc<RefCell<String>>,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all output as a single string
    pub fn get_output(&self) -> String {
        self.transcript.borrow().clone()
    }

    /// Output lines, without the trailing empty line
    pub fn get_lines(&self) -> Vec<String> {
        self.transcript.borrow().lines().map(str::to_string).collect()
    }

    /// Return the output so far and start a fresh transcript
    pub fn take_output(&self) -> String {
        std::mem::take(&mut *self.transcript.borrow_mut())
    }

    pub fn count(&self, needle: &str) -> usize {
        self.transcript.borrow().matches(needle).count()
    }
}

impl GameDisplay for HeadlessDisplay {
    fn print(&mut self, text: &str) -> Result<(), DisplayError> {
        self.transcript.borrow_mut().push_str(text);
        Ok(())
    }

    fn force_refresh(&mut self) -> Result<(), DisplayError> {
        debug!("Headless: refresh ({} bytes)", self.transcript.borrow().len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn clones_share_the_transcript() {
        let reader = HeadlessDisplay::new();
        let mut writer = reader.clone();
        writer.print("Hello").unwrap();
        writer.new_line().unwrap();
        writer.print("world").unwrap();
        assert_eq!(reader.get_lines(), vec!["Hello", "world"]);
        assert_eq!(reader.take_output(), "Hello\nworld");
        assert_eq!(reader.get_output(), "");
    }
}

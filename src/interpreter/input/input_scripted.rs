//! Canned input for tests and walkthrough replays

use crate::interpreter::input::input_trait::LineInput;
use log::debug;
use std::collections::VecDeque;

#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedInput {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineInput for ScriptedInput {
    fn read_line(&mut self) -> Result<Option<String>, String> {
        let line = self.lines.pop_front();
        debug!("scripted input: {:?}", line);
        Ok(line)
    }

    fn echoes(&self) -> bool {
        true
    }
}

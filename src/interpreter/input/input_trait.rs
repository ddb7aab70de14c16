//! Line-input collaborator

/// Source of player input lines. `Ok(None)` means input is exhausted.
pub trait LineInput {
    fn read_line(&mut self) -> Result<Option<String>, String>;

    /// Whether the display should echo lines read from this source
    fn echoes(&self) -> bool {
        false
    }
}

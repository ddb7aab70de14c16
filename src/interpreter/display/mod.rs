pub mod display_headless;
pub mod display_terminal;
pub mod display_trait;

pub use self::display_headless::*;
pub use self::display_terminal::*;
pub use self::display_trait::*;

pub mod input_scripted;
pub mod input_stdin;
pub mod input_trait;

pub use self::input_scripted::*;
pub use self::input_stdin::*;
pub use self::input_trait::*;

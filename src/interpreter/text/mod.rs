pub mod dictionary;
pub mod messages;
pub mod parser;

pub use self::dictionary::*;
pub use self::messages::*;
pub use self::parser::*;

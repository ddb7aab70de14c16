pub mod core;
pub mod display;
pub mod input;
pub mod objects;
pub mod opcodes;
pub mod savegame;
pub mod text;
pub mod utils;

pub use self::core::*;
pub use self::display::*;
pub use self::input::*;
pub use self::objects::*;
pub use self::savegame::*;
pub use self::text::*;
pub use self::utils::*;

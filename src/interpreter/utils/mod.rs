pub mod config;
pub mod disassembler;
pub mod game_rand;
pub mod storage;

pub use self::config::*;
pub use self::disassembler::*;
pub use self::game_rand::*;
pub use self::storage::*;

pub mod builder;
pub mod control_flow;
pub mod game;
pub mod header;
pub mod instruction;
pub mod interpreter;
pub mod turn;
pub mod vm;

pub use self::builder::*;
pub use self::game::*;
pub use self::header::*;
pub use self::instruction::*;
pub use self::interpreter::*;
pub use self::vm::*;

pub mod container;
pub mod entity;
pub mod events;
pub mod strings;
pub mod world;

pub use self::entity::*;
pub use self::events::*;
pub use self::strings::*;
pub use self::world::*;

//! Save file format and the game image container
//!
//! Both the compiled game and save files are sequences of big-endian
//! words. The game image is wrapped in IFF chunks; a save file is a flat
//! record stream starting with the game's version tag and name.
pub mod iff;
pub mod restore;
pub mod save;
pub mod save_bytes;

pub use self::iff::*;
pub use self::restore::{restore_state, RestoreError};
pub use self::save::save_state;
pub use self::save_bytes::*;

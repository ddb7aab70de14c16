use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use crate::interpreter::core::instruction::Aword;
use crate::interpreter::objects::entity::EntityRanges;
use crate::interpreter::savegame::save_bytes::{WordReader, WordWriter};

/// Version tag written by this engine: major, minor, fix, state
pub const ACODE_VERSION: [u8; 4] = [2, 8, 0, 0];

/// Game identity and table sizes from the HEAD chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: [u8; 4],
    pub name: String,
    pub object_count: usize,
    pub location_count: usize,
    pub actor_count: usize,
    pub literal_count: usize,
    /// Block run once at start and on restart
    pub start: Aword,
    pub max_score: Aword,
}

impl Header {
    pub fn new(name: &str) -> Header {
        Header {
            version: ACODE_VERSION,
            name: name.to_string(),
            object_count: 0,
            location_count: 0,
            actor_count: 1,
            literal_count: 10,
            start: 0,
            max_score: 0,
        }
    }

    /// Entity ids: objects, then locations, then actors (HERO first), then
    /// literals
    pub fn ranges(&self) -> EntityRanges {
        EntityRanges::contiguous(
            self.object_count,
            self.location_count,
            self.actor_count,
            self.literal_count,
        )
    }

    /// The version tag packed into one word
    pub fn version_word(&self) -> Aword {
        Aword::from_be_bytes(self.version)
    }

    pub fn write(&self, w: &mut WordWriter) {
        w.word(self.version_word())
            .word(self.object_count as Aword)
            .word(self.location_count as Aword)
            .word(self.actor_count as Aword)
            .word(self.literal_count as Aword)
            .word(self.start)
            .word(self.max_score)
            .string(&self.name);
    }

    pub fn read(r: &mut WordReader) -> Result<Header, String> {
        let version = r.word()?.to_be_bytes();
        if version[0] != ACODE_VERSION[0] {
            return Err(format!(
                "Game was compiled for version {}.{}, this engine runs {}.x",
                version[0], version[1], ACODE_VERSION[0]
            ));
        }
        let object_count = r.word()? as usize;
        let location_count = r.word()? as usize;
        let actor_count = r.word()? as usize;
        let literal_count = r.word()? as usize;
        let start = r.word()?;
        let max_score = r.word()?;
        let name = r.string()?;
        if actor_count == 0 {
            return Err("Game has no actors; the hero is missing".to_string());
        }
        Ok(Header {
            version,
            name,
            object_count,
            location_count,
            actor_count,
            literal_count,
            start,
            max_score,
        })
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(
            f,
            "
Game:                     {}
Acode version:            {}.{}({})
Objects:                  {}
Locations:                {}
Actors:                   {}
Literal slots:            {}
Start block:              {}
Maximum score:            {}
",
            self.name,
            self.version[0],
            self.version[1],
            self.version[2],
            self.object_count,
            self.location_count,
            self.actor_count,
            self.literal_count,
            self.start,
            self.max_score
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn header_round_trip() {
        let mut header = Header::new("cellar");
        header.object_count = 3;
        header.location_count = 2;
        header.start = 40;
        let mut w = WordWriter::new();
        header.write(&mut w);
        let bytes = w.into_bytes();
        let back = Header::read(&mut WordReader::new(&bytes)).unwrap();
        assert_eq!(back, header);
        assert_eq!(back.ranges().hero(), 6);
    }

    #[test]
    fn foreign_major_version_is_rejected() {
        let mut header = Header::new("x");
        header.version = [3, 0, 0, 0];
        let mut w = WordWriter::new();
        header.write(&mut w);
        let bytes = w.into_bytes();
        assert!(Header::read(&mut WordReader::new(&bytes)).is_err());
    }
}

//! Entity identity and classification
//!
//! Objects, locations, actors and literals share one numeric id space,
//! split into contiguous ranges fixed when the game is compiled. Every
//! raw id coming out of bytecode is classified exactly once into an
//! [`EntityRef`] and the rest of the engine works on that.
use crate::interpreter::core::instruction::Aword;
use std::fmt;

/// Class bits reported by the CLASS opcode and used by syntax restrictions
pub const CLASS_OBJECT: Aword = 1;
pub const CLASS_LOCATION: Aword = 2;
pub const CLASS_ACTOR: Aword = 4;
pub const CLASS_CONTAINER: Aword = 8;
pub const CLASS_NUMBER: Aword = 16;
pub const CLASS_STRING: Aword = 32;

/// A classified entity id: kind plus zero-based index into its table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Object(usize),
    Location(usize),
    Actor(usize),
    Literal(usize),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Object(i) => write!(f, "object #{i}"),
            EntityRef::Location(i) => write!(f, "location #{i}"),
            EntityRef::Actor(i) => write!(f, "actor #{i}"),
            EntityRef::Literal(i) => write!(f, "literal #{i}"),
        }
    }
}

/// Inclusive id range; empty when `max < min`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    pub min: Aword,
    pub max: Aword,
}

impl IdRange {
    pub fn new(min: Aword, count: usize) -> Self {
        IdRange {
            min,
            max: min + count as Aword - 1,
        }
    }

    pub fn contains(&self, id: Aword) -> bool {
        id >= self.min && id <= self.max && self.min != 0
    }

    pub fn len(&self) -> usize {
        if self.max < self.min || self.min == 0 {
            0
        } else {
            (self.max - self.min + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> impl Iterator<Item = Aword> {
        let (min, len) = (self.min, self.len() as Aword);
        (0..len).map(move |i| min + i)
    }
}

/// The id ranges of a compiled game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRanges {
    pub objects: IdRange,
    pub locations: IdRange,
    pub actors: IdRange,
    pub literals: IdRange,
}

impl EntityRanges {
    /// Lay the ranges out back to back starting at id 1: objects,
    /// locations, actors, then the literal slots used by the parser.
    pub fn contiguous(objects: usize, locations: usize, actors: usize, literals: usize) -> Self {
        let objects = IdRange::new(1, objects);
        let locations = IdRange::new(objects.min + objects.len() as Aword, locations);
        let actors = IdRange::new(locations.min + locations.len() as Aword, actors);
        let literals = IdRange::new(actors.min + actors.len() as Aword, literals);
        EntityRanges {
            objects,
            locations,
            actors,
            literals,
        }
    }

    pub fn classify(&self, id: Aword) -> Option<EntityRef> {
        if self.objects.contains(id) {
            Some(EntityRef::Object((id - self.objects.min) as usize))
        } else if self.locations.contains(id) {
            Some(EntityRef::Location((id - self.locations.min) as usize))
        } else if self.actors.contains(id) {
            Some(EntityRef::Actor((id - self.actors.min) as usize))
        } else if self.literals.contains(id) {
            Some(EntityRef::Literal((id - self.literals.min) as usize))
        } else {
            None
        }
    }

    /// Classify an id that must be valid; anything else is corrupt game data
    pub fn entity(&self, id: Aword) -> Result<EntityRef, String> {
        self.classify(id)
            .ok_or_else(|| format!("Entity id {id} is outside every known range"))
    }

    pub fn id_of(&self, entity: EntityRef) -> Aword {
        match entity {
            EntityRef::Object(i) => self.objects.min + i as Aword,
            EntityRef::Location(i) => self.locations.min + i as Aword,
            EntityRef::Actor(i) => self.actors.min + i as Aword,
            EntityRef::Literal(i) => self.literals.min + i as Aword,
        }
    }

    /// The player-controlled actor is always the first actor
    pub fn hero(&self) -> Aword {
        self.actors.min
    }

    pub fn is_object(&self, id: Aword) -> bool {
        self.objects.contains(id)
    }

    pub fn is_location(&self, id: Aword) -> bool {
        self.locations.contains(id)
    }

    pub fn is_actor(&self, id: Aword) -> bool {
        self.actors.contains(id)
    }

    pub fn is_literal(&self, id: Aword) -> bool {
        self.literals.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn contiguous_ranges_classify_every_id_once() {
        let ranges = EntityRanges::contiguous(3, 2, 2, 4);
        assert_eq!(ranges.classify(0), None);
        assert_eq!(ranges.classify(1), Some(EntityRef::Object(0)));
        assert_eq!(ranges.classify(3), Some(EntityRef::Object(2)));
        assert_eq!(ranges.classify(4), Some(EntityRef::Location(0)));
        assert_eq!(ranges.classify(6), Some(EntityRef::Actor(0)));
        assert_eq!(ranges.hero(), 6);
        assert_eq!(ranges.classify(8), Some(EntityRef::Literal(0)));
        assert_eq!(ranges.classify(12), None);
        assert!(ranges.entity(99).is_err());
        for id in 1..=11 {
            let e = ranges.classify(id).unwrap();
            assert_eq!(ranges.id_of(e), id);
        }
    }

    #[test]
    fn empty_kind_has_no_ids() {
        let ranges = EntityRanges::contiguous(0, 1, 1, 0);
        assert!(ranges.objects.is_empty());
        assert_eq!(ranges.classify(1), Some(EntityRef::Location(0)));
        assert_eq!(ranges.objects.ids().count(), 0);
    }
}

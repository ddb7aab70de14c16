//! World store
//!
//! Fixed tables of locations, objects, actors, containers and literals,
//! allocated once from the game image. Only attribute values, parent
//! pointers, describe state, scripts, the event queue, the string heap and
//! the score table change during play.
use crate::interpreter::core::instruction::Aword;
use crate::interpreter::objects::entity::{
    EntityRanges, EntityRef, IdRange, CLASS_ACTOR, CLASS_CONTAINER, CLASS_LOCATION, CLASS_NUMBER,
    CLASS_OBJECT, CLASS_STRING,
};
use crate::interpreter::objects::events::EventQueue;
use crate::interpreter::objects::strings::StringHeap;
use bitvec::prelude::*;
use log::{debug, trace};

/// Where an attribute id lives in every entity's attribute vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrSlot {
    pub slot: usize,
    pub is_string: bool,
}

/// Global attribute id to slot indirection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    by_id: Vec<Option<AttrSlot>>,
    slot_count: usize,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: Aword, slot: usize, is_string: bool) {
        let index = id as usize;
        if index >= self.by_id.len() {
            self.by_id.resize(index + 1, None);
        }
        self.by_id[index] = Some(AttrSlot { slot, is_string });
        self.slot_count = self.slot_count.max(slot + 1);
    }

    pub fn lookup(&self, id: Aword) -> Result<AttrSlot, String> {
        self.by_id
            .get(id as usize)
            .copied()
            .flatten()
            .ok_or_else(|| format!("Unknown attribute {id}"))
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn is_string_slot(&self, slot: usize) -> bool {
        self.by_id.iter().flatten().any(|s| s.slot == slot && s.is_string)
    }

    /// (id, slot) pairs in id order
    pub fn entries(&self) -> impl Iterator<Item = (Aword, AttrSlot)> + '_ {
        self.by_id
            .iter()
            .enumerate()
            .filter_map(|(id, s)| s.map(|s| (id as Aword, s)))
    }
}

/// A check guarding a verb alternative or an exit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    /// Block leaving a boolean on the stack
    pub condition: Aword,
    /// Block run when the condition is false; the command then fails
    pub failure: Aword,
}

/// When an alternative's action runs relative to the other alternatives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    Default,
    After,
    Before,
    Only,
}

impl Qualifier {
    pub fn from_word(word: Aword) -> Result<Qualifier, String> {
        match word {
            0 => Ok(Qualifier::Default),
            1 => Ok(Qualifier::After),
            2 => Ok(Qualifier::Before),
            3 => Ok(Qualifier::Only),
            _ => Err(format!("Unknown verb qualifier {word}")),
        }
    }

    pub fn word(self) -> Aword {
        self as Aword
    }
}

/// One verb implementation attached to the game, a location or an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    pub verb: Aword,
    pub qualifier: Qualifier,
    pub checks: Vec<Check>,
    pub action: Aword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exit {
    /// Code of the direction word
    pub direction: Aword,
    pub checks: Vec<Check>,
    pub action: Aword,
    /// Destination location id, 0 for an exit that only runs its action
    pub target: Aword,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub name: Aword,
    pub description: Aword,
    /// Run whenever an actor enters
    pub does: Aword,
    pub exits: Vec<Exit>,
    pub verbs: Vec<Alternative>,
    pub attributes: Vec<Aword>,
    /// Visit counter cycling modulo `visits + 1`; 0 means the next entry
    /// shows the full description
    pub describe: Aword,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Object {
    /// Parent id: a location, an actor, a container object, or 0 for nowhere
    pub location: Aword,
    pub article: Aword,
    pub name: Aword,
    /// Description used in room listings; 0 means the generic sentence
    pub description: Aword,
    pub container: Option<usize>,
    pub verbs: Vec<Alternative>,
    pub attributes: Vec<Aword>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Turns to wait before the step may run
    pub after: Aword,
    pub condition: Aword,
    pub statements: Aword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub code: Aword,
    /// Overrides the actor's description while the script is active
    pub description: Aword,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor {
    pub location: Aword,
    pub name: Aword,
    pub description: Aword,
    pub container: Option<usize>,
    pub verbs: Vec<Alternative>,
    pub scripts: Vec<Script>,
    /// Active script code, 0 when idle
    pub script: Aword,
    pub step: Aword,
    pub count: Aword,
    pub attributes: Vec<Aword>,
}

/// Capacity rule of a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit {
    /// Attribute summed over the contents, or 0 to limit the number of items
    pub attribute: Aword,
    pub bound: Aword,
    /// Block printing the rejection
    pub statements: Aword,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    /// Object or actor carrying these container properties
    pub owner: Aword,
    pub limits: Vec<Limit>,
    /// Replaces "The <name> contains" in listings
    pub header: Aword,
    /// Replaces "The <name> is empty."
    pub empty: Aword,
    /// Replaces the owner's name in listings
    pub name: Aword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub condition: Aword,
    pub statements: Aword,
    /// Set while the condition stays true so the rule fires once per change
    pub run: bool,
}

/// A literal parameter from player input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Number(Aword),
    /// String heap handle
    Text(Aword),
}

/// The current-values record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurVars {
    pub vrb: Aword,
    pub loc: Aword,
    pub act: Aword,
    pub tick: Aword,
    pub score: Aword,
    pub visits: Aword,
}

#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub ranges: EntityRanges,
    pub attributes: AttributeMap,
    pub locations: Vec<Location>,
    pub objects: Vec<Object>,
    pub actors: Vec<Actor>,
    pub containers: Vec<Container>,
    pub literals: Vec<Literal>,
    /// Code block per event id (event ids are 1-based)
    pub events: Vec<Aword>,
    pub queue: EventQueue,
    pub rules: Vec<Rule>,
    /// Points per score entry; an entry drops to 0 once awarded
    pub scores: Vec<Aword>,
    pub max_score: Aword,
    pub cur: CurVars,
    pub strings: StringHeap,
    object_describe: BitVec,
    actor_describe: BitVec,
}

impl World {
    /// Allocate tables sized from the id ranges, attributes zeroed
    pub fn new(ranges: EntityRanges, attributes: AttributeMap, max_events: usize) -> World {
        let slots = attributes.slot_count();
        let locations = (0..ranges.locations.len())
            .map(|_| Location {
                attributes: vec![0; slots],
                ..Default::default()
            })
            .collect();
        let objects = (0..ranges.objects.len())
            .map(|_| Object {
                attributes: vec![0; slots],
                ..Default::default()
            })
            .collect();
        let actors = (0..ranges.actors.len())
            .map(|_| Actor {
                attributes: vec![0; slots],
                ..Default::default()
            })
            .collect();
        World {
            object_describe: bitvec![1; ranges.objects.len()],
            actor_describe: bitvec![1; ranges.actors.len()],
            ranges,
            attributes,
            locations,
            objects,
            actors,
            containers: Vec::new(),
            literals: Vec::new(),
            events: Vec::new(),
            queue: EventQueue::new(max_events),
            rules: Vec::new(),
            scores: Vec::new(),
            max_score: 0,
            cur: CurVars::default(),
            strings: StringHeap::new(),
        }
    }

    /// Apply engine limits to a freshly loaded world. The literal range
    /// shrinks to `max_literals`; no other ids move.
    pub fn apply_limits(&mut self, max_events: usize, max_literals: usize) {
        self.queue.set_capacity(max_events);
        let literals = self.ranges.literals;
        self.ranges.literals = IdRange::new(literals.min, literals.len().min(max_literals));
    }

    pub fn hero(&self) -> Aword {
        self.ranges.hero()
    }

    pub fn entity(&self, id: Aword) -> Result<EntityRef, String> {
        self.ranges.entity(id)
    }

    fn literal(&self, index: usize) -> Result<Literal, String> {
        self.literals
            .get(index)
            .copied()
            .ok_or_else(|| format!("Literal #{index} is not in use"))
    }

    fn attributes_mut(&mut self, id: Aword) -> Result<&mut Vec<Aword>, String> {
        match self.entity(id)? {
            EntityRef::Object(i) => Ok(&mut self.objects[i].attributes),
            EntityRef::Location(i) => Ok(&mut self.locations[i].attributes),
            EntityRef::Actor(i) => Ok(&mut self.actors[i].attributes),
            EntityRef::Literal(_) => Err(format!("Can't change attributes of literal {id}")),
        }
    }

    /// Read attribute `attr` of entity `id`. A literal has a single
    /// attribute 1 holding its value (a heap handle for string literals).
    pub fn attribute(&self, id: Aword, attr: Aword) -> Result<Aword, String> {
        let attrs = match self.entity(id)? {
            EntityRef::Object(i) => &self.objects[i].attributes,
            EntityRef::Location(i) => &self.locations[i].attributes,
            EntityRef::Actor(i) => &self.actors[i].attributes,
            EntityRef::Literal(i) => {
                if attr != 1 {
                    return Err(format!("Literals only have attribute 1, not {attr}"));
                }
                return match self.literal(i)? {
                    Literal::Number(v) | Literal::Text(v) => Ok(v),
                };
            }
        };
        let slot = self.attributes.lookup(attr)?.slot;
        attrs
            .get(slot)
            .copied()
            .ok_or_else(|| format!("Attribute slot {slot} missing on entity {id}"))
    }

    /// Write attribute `attr` of entity `id`. Changing a location attribute
    /// resets its visit counter so the next entry describes it in full.
    pub fn set_attribute(&mut self, id: Aword, attr: Aword, value: Aword) -> Result<(), String> {
        let slot = self.attributes.lookup(attr)?.slot;
        trace!("set attribute {attr} of {id} to {value}");
        let attrs = self.attributes_mut(id)?;
        let cell = attrs
            .get_mut(slot)
            .ok_or_else(|| format!("Attribute slot {slot} missing on entity {id}"))?;
        *cell = value;
        if let EntityRef::Location(i) = self.entity(id)? {
            self.locations[i].describe = 0;
        }
        Ok(())
    }

    /// Store a string handle, releasing the string it replaces
    pub fn set_string_attribute(
        &mut self,
        id: Aword,
        attr: Aword,
        handle: Aword,
    ) -> Result<(), String> {
        let spec = self.attributes.lookup(attr)?;
        if !spec.is_string {
            return Err(format!("Attribute {attr} does not hold a string"));
        }
        let old = self.attribute(id, attr)?;
        self.set_attribute(id, attr, handle)?;
        if old != handle {
            self.strings.free(old);
        }
        Ok(())
    }

    pub fn increment(&mut self, id: Aword, attr: Aword, step: Aword) -> Result<(), String> {
        let value = self.attribute(id, attr)?;
        self.set_attribute(id, attr, value.wrapping_add(step))
    }

    pub fn decrement(&mut self, id: Aword, attr: Aword, step: Aword) -> Result<(), String> {
        let value = self.attribute(id, attr)?;
        self.set_attribute(id, attr, value.wrapping_sub(step))
    }

    /// Direct parent of an object or actor
    pub fn parent(&self, id: Aword) -> Result<Aword, String> {
        match self.entity(id)? {
            EntityRef::Object(i) => Ok(self.objects[i].location),
            EntityRef::Actor(i) => Ok(self.actors[i].location),
            other => Err(format!("{other} has no location")),
        }
    }

    /// Container properties index of an object or actor
    pub fn container_index(&self, id: Aword) -> Option<usize> {
        match self.ranges.classify(id)? {
            EntityRef::Object(i) => self.objects[i].container,
            EntityRef::Actor(i) => self.actors[i].container,
            _ => None,
        }
    }

    pub fn is_container(&self, id: Aword) -> bool {
        self.container_index(id).is_some()
    }

    pub fn container(&self, id: Aword) -> Result<&Container, String> {
        self.container_index(id)
            .and_then(|c| self.containers.get(c))
            .ok_or_else(|| format!("Entity {id} is not a container"))
    }

    /// The location an object or actor is at, following containers outward.
    /// Contents of a container that is nowhere are wherever the hero is.
    pub fn where_is(&self, id: Aword) -> Result<Aword, String> {
        let mut parent = match self.entity(id)? {
            EntityRef::Location(_) => return Ok(id),
            EntityRef::Actor(i) => return Ok(self.actors[i].location),
            EntityRef::Object(i) => self.objects[i].location,
            EntityRef::Literal(_) => return Err(format!("WHERE on literal {id}")),
        };
        for _ in 0..=self.objects.len() {
            if parent == 0 || self.ranges.is_location(parent) {
                return Ok(parent);
            }
            match self.entity(parent)? {
                EntityRef::Actor(i) => return Ok(self.actors[i].location),
                EntityRef::Object(i) => {
                    let next = self.objects[i].location;
                    if next == 0 {
                        return Ok(self.actors.first().map_or(0, |hero| hero.location));
                    }
                    parent = next;
                }
                other => return Err(format!("{id} is inside {other}")),
            }
        }
        Err(format!("Containment cycle while locating {id}"))
    }

    /// Whether `id` is at the current location. Locations are here when
    /// they are the current location; literals are always here.
    pub fn is_here(&self, id: Aword) -> Result<bool, String> {
        match self.entity(id)? {
            EntityRef::Location(_) => Ok(id == self.cur.loc),
            EntityRef::Literal(_) => Ok(true),
            _ => Ok(self.where_is(id)? == self.cur.loc),
        }
    }

    /// Whether `id` is in a location one exit away from the current one
    pub fn is_near(&self, id: Aword) -> Result<bool, String> {
        let place = match self.entity(id)? {
            EntityRef::Location(_) => id,
            EntityRef::Literal(_) => return Ok(false),
            _ => self.where_is(id)?,
        };
        if place == 0 {
            return Ok(false);
        }
        let here = match self.entity(self.cur.loc)? {
            EntityRef::Location(i) => &self.locations[i],
            _ => return Err(format!("Current location {} is not a location", self.cur.loc)),
        };
        Ok(here.exits.iter().any(|e| e.target == place))
    }

    /// Whether `obj` is directly inside container `cnt`
    pub fn is_in(&self, obj: Aword, cnt: Aword) -> Result<bool, String> {
        if !self.is_container(cnt) {
            return Err(format!("IN on {cnt}, which is not a container"));
        }
        Ok(self.ranges.is_object(obj) && self.parent(obj)? == cnt)
    }

    /// Class bits of an entity
    pub fn class_of(&self, id: Aword) -> Result<Aword, String> {
        let container = if self.is_container(id) {
            CLASS_CONTAINER
        } else {
            0
        };
        Ok(match self.entity(id)? {
            EntityRef::Object(_) => CLASS_OBJECT | container,
            EntityRef::Location(_) => CLASS_LOCATION,
            EntityRef::Actor(_) => CLASS_ACTOR | container,
            EntityRef::Literal(i) => match self.literal(i)? {
                Literal::Number(_) => CLASS_NUMBER,
                Literal::Text(_) => CLASS_STRING,
            },
        })
    }

    /// Change the parent pointer of an object or actor. Refuses to put
    /// something inside itself.
    pub fn set_parent(&mut self, id: Aword, dest: Aword) -> Result<(), String> {
        let mut current = dest;
        while current != 0 && !self.ranges.is_location(current) {
            if current == id {
                return Err(format!("Trying to locate {id} inside itself"));
            }
            current = self.parent(current)?;
        }
        debug!("parent of {id} becomes {dest}");
        match self.entity(id)? {
            EntityRef::Object(i) => self.objects[i].location = dest,
            EntityRef::Actor(i) => self.actors[i].location = dest,
            other => return Err(format!("Can't LOCATE {other}")),
        }
        Ok(())
    }

    /// Flag every object and actor as not yet described
    pub fn mark_all_undescribed(&mut self) {
        self.object_describe.fill(true);
        self.actor_describe.fill(true);
    }

    pub fn needs_describe(&self, id: Aword) -> bool {
        match self.ranges.classify(id) {
            Some(EntityRef::Object(i)) => self.object_describe[i],
            Some(EntityRef::Actor(i)) => self.actor_describe[i],
            _ => false,
        }
    }

    pub fn set_described(&mut self, id: Aword) {
        match self.ranges.classify(id) {
            Some(EntityRef::Object(i)) => self.object_describe.set(i, false),
            Some(EntityRef::Actor(i)) => self.actor_describe.set(i, false),
            _ => {}
        }
    }

    /// Forget this command's literals, releasing their strings
    pub fn clear_literals(&mut self) {
        for literal in self.literals.drain(..) {
            if let Literal::Text(handle) = literal {
                self.strings.free(handle);
            }
        }
    }

    /// Store a literal and return its entity id
    pub fn add_literal(&mut self, literal: Literal) -> Result<Aword, String> {
        let index = self.literals.len();
        if index >= self.ranges.literals.len() {
            return Err(format!(
                "Too many literals in one command (at most {})",
                self.ranges.literals.len()
            ));
        }
        self.literals.push(literal);
        Ok(self.ranges.id_of(EntityRef::Literal(index)))
    }

    /// Award score entry `n` (1-based) once
    pub fn award_score(&mut self, n: Aword) -> Result<(), String> {
        let entry = self
            .scores
            .get_mut((n as usize).wrapping_sub(1))
            .ok_or_else(|| format!("Score entry {n} does not exist"))?;
        self.cur.score = self.cur.score.wrapping_add(*entry);
        *entry = 0;
        Ok(())
    }
}

#[cfg(test)]
#[path = "world_tests.rs"]
mod world_tests;

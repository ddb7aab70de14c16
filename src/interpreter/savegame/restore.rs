//! Restoring a saved world
//!
//! The whole file is parsed and checked before anything is applied, so a
//! failed restore leaves the running game untouched.

use crate::interpreter::core::header::Header;
use crate::interpreter::core::instruction::{Aword, EOF_WORD};
use crate::interpreter::core::interpreter::{Interpreter, Interrupt};
use crate::interpreter::objects::events::ScheduledEvent;
use crate::interpreter::objects::strings::StringHeap;
use crate::interpreter::objects::world::{CurVars, World};
use crate::interpreter::savegame::save_bytes::WordReader;
use crate::interpreter::text::messages::Message;
use log::{debug, info, warn};
use std::fmt;

/// Why a saved game could not be restored. None of these end the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreError {
    VersionMismatch,
    NameMismatch,
    Missing,
    Corrupt(String),
}

impl RestoreError {
    pub fn message(&self) -> Message {
        match self {
            RestoreError::VersionMismatch => Message::RestoreVersion,
            RestoreError::NameMismatch => Message::RestoreName,
            RestoreError::Missing => Message::RestoreMissing,
            RestoreError::Corrupt(_) => Message::RestoreCorrupt,
        }
    }
}

impl fmt::Display for RestoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreError::Corrupt(detail) => write!(f, "{} ({detail})", self.message()),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for RestoreError {}

impl From<String> for RestoreError {
    fn from(detail: String) -> Self {
        RestoreError::Corrupt(detail)
    }
}

struct SavedActor {
    location: Aword,
    script: Aword,
    step: Aword,
    count: Aword,
    attributes: Vec<Aword>,
}

struct SavedState {
    cur: CurVars,
    actors: Vec<SavedActor>,
    locations: Vec<(Aword, Vec<Aword>)>,
    objects: Vec<(Aword, Vec<Aword>)>,
    events: Vec<ScheduledEvent>,
    strings: StringHeap,
    scores: Vec<Aword>,
}

fn parent_is_valid(world: &World, parent: Aword) -> bool {
    parent == 0 || world.ranges.classify(parent).is_some()
}

fn read_state(world: &World, header: &Header, data: &[u8]) -> Result<SavedState, RestoreError> {
    let mut r = WordReader::new(data);
    if r.word()? != header.version_word() {
        return Err(RestoreError::VersionMismatch);
    }
    if r.c_string()? != header.name {
        return Err(RestoreError::NameMismatch);
    }

    let v = r.words(6)?;
    let cur = CurVars {
        vrb: v[0],
        loc: v[1],
        act: v[2],
        tick: v[3],
        score: v[4],
        visits: v[5],
    };
    if !world.ranges.is_location(cur.loc) || !world.ranges.is_actor(cur.act) {
        return Err(format!("Current location {} or actor {} is invalid", cur.loc, cur.act).into());
    }

    let mut actors = Vec::with_capacity(world.actors.len());
    for actor in &world.actors {
        let fixed = r.words(4)?;
        let saved = SavedActor {
            location: fixed[0],
            script: fixed[1],
            step: fixed[2],
            count: fixed[3],
            attributes: r.words(actor.attributes.len())?,
        };
        if !parent_is_valid(world, saved.location) {
            return Err(format!("Actor located at unknown entity {}", saved.location).into());
        }
        if saved.script != 0 && !actor.scripts.iter().any(|s| s.code == saved.script) {
            return Err(format!("Actor runs unknown script {}", saved.script).into());
        }
        actors.push(saved);
    }

    let mut locations = Vec::with_capacity(world.locations.len());
    for location in &world.locations {
        let describe = r.word()?;
        locations.push((describe, r.words(location.attributes.len())?));
    }

    let mut objects = Vec::with_capacity(world.objects.len());
    for object in &world.objects {
        let parent = r.word()?;
        if !parent_is_valid(world, parent) {
            return Err(format!("Object located at unknown entity {parent}").into());
        }
        objects.push((parent, r.words(object.attributes.len())?));
    }

    let mut events = Vec::new();
    loop {
        let time = r.word()?;
        if time == 0 {
            break;
        }
        let event = r.word()?;
        let target = r.word()?;
        if event == 0 || event as usize > world.events.len() {
            return Err(format!("Unknown event {event} in the queue").into());
        }
        if events.len() >= world.queue.capacity() {
            return Err("Too many pending events".to_string().into());
        }
        events.push(ScheduledEvent {
            event,
            target,
            time,
        });
    }

    let count = r.count(8)?;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let handle = r.word()?;
        entries.push((handle, r.string()?));
    }
    let strings = StringHeap::from_entries(entries)?;

    let scores = r.words(world.scores.len())?;
    if r.word()? != EOF_WORD || !r.is_at_end() {
        return Err("Score table is not terminated".to_string().into());
    }

    Ok(SavedState {
        cur,
        actors,
        locations,
        objects,
        events,
        strings,
        scores,
    })
}

/// Replace the mutable world state with a saved one. Either everything is
/// restored or, on error, nothing changes.
pub fn restore_state(world: &mut World, header: &Header, data: &[u8]) -> Result<(), RestoreError> {
    let saved = read_state(world, header, data)?;
    world.queue.replace(saved.events)?;
    world.cur = saved.cur;
    for (actor, s) in world.actors.iter_mut().zip(saved.actors) {
        actor.location = s.location;
        actor.script = s.script;
        actor.step = s.step;
        actor.count = s.count;
        actor.attributes = s.attributes;
    }
    for (location, (describe, attributes)) in world.locations.iter_mut().zip(saved.locations) {
        location.describe = describe;
        location.attributes = attributes;
    }
    for (object, (parent, attributes)) in world.objects.iter_mut().zip(saved.objects) {
        object.location = parent;
        object.attributes = attributes;
    }
    // literal handles belong to the heap being replaced
    world.literals.clear();
    world.strings = saved.strings;
    world.scores = saved.scores;
    world.mark_all_undescribed();
    debug!("restored world at tick {}", world.cur.tick);
    Ok(())
}

impl Interpreter {
    /// Ask for a file name and restore from it. Returns whether the world
    /// was replaced; failures are reported to the player.
    pub(crate) fn restore_game(&mut self) -> Result<bool, Interrupt> {
        let answer = match self.prompt(Message::RestoreFrom.text())? {
            Some(answer) => answer.trim().to_string(),
            None => return Ok(false),
        };
        let name = if answer.is_empty() {
            self.vm.game.header.name.clone()
        } else {
            answer
        };
        let result = match self.storage.read(&name) {
            Ok(Some(data)) => restore_state(&mut self.vm.world, &self.vm.game.header, &data),
            Ok(None) => Err(RestoreError::Missing),
            Err(e) => Err(RestoreError::Corrupt(e)),
        };
        match result {
            Ok(()) => {
                info!("Restored game from {name}");
                self.params.clear();
                self.it = None;
                Ok(true)
            }
            Err(e) => {
                warn!("Restore from {name} failed: {e}");
                self.reply(e.message().text())?;
                Ok(false)
            }
        }
    }
}

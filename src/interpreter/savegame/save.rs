//! Saving the mutable part of the world
//!
//! Layout, all words big-endian:
//! version tag, game name (NUL terminated), the current values (verb,
//! location, actor, tick, score, visits), per actor (location, script,
//! step, count, attributes), per location (describe counter, attributes),
//! per object (location, attributes), pending events (time, event, target)
//! ended by a time of 0, the string heap (count, then handle and string),
//! and the score table ended by an EOF word.

use crate::interpreter::core::header::Header;
use crate::interpreter::core::instruction::{Aword, EOF_WORD};
use crate::interpreter::core::interpreter::{Interpreter, Interrupt};
use crate::interpreter::objects::world::{Literal, World};
use crate::interpreter::savegame::save_bytes::WordWriter;
use crate::interpreter::text::messages::Message;
use log::{info, warn};

/// Serialize the mutable world state
pub fn save_state(world: &World, header: &Header) -> Vec<u8> {
    let mut w = WordWriter::new();
    w.word(header.version_word()).c_string(&header.name);

    let cur = &world.cur;
    w.words(&[cur.vrb, cur.loc, cur.act, cur.tick, cur.score, cur.visits]);

    for actor in &world.actors {
        w.words(&[actor.location, actor.script, actor.step, actor.count])
            .words(&actor.attributes);
    }
    for location in &world.locations {
        w.word(location.describe).words(&location.attributes);
    }
    for object in &world.objects {
        w.word(object.location).words(&object.attributes);
    }

    for entry in world.queue.entries() {
        w.words(&[entry.time, entry.event, entry.target]);
    }
    w.word(0);

    // strings owned by this command's literals die with the command
    let transient: Vec<Aword> = world
        .literals
        .iter()
        .filter_map(|l| match l {
            Literal::Text(handle) => Some(*handle),
            Literal::Number(_) => None,
        })
        .collect();
    let strings: Vec<(Aword, &str)> = world
        .strings
        .entries()
        .filter(|(handle, _)| !transient.contains(handle))
        .collect();
    w.word(strings.len() as Aword);
    for (handle, text) in strings {
        w.word(handle).string(text);
    }

    w.words(&world.scores).word(EOF_WORD);
    w.into_bytes()
}

impl Interpreter {
    /// Ask for a file name and save the game there. An empty answer uses
    /// the game's name. Storage failures are reported to the player.
    pub(crate) fn save_game(&mut self) -> Result<(), Interrupt> {
        let answer = match self.prompt(Message::SaveWhere.text())? {
            Some(answer) => answer.trim().to_string(),
            None => return Ok(()),
        };
        let name = if answer.is_empty() {
            self.vm.game.header.name.clone()
        } else {
            answer
        };
        let data = save_state(&self.vm.world, &self.vm.game.header);
        match self.storage.write(&name, &data) {
            Ok(()) => info!("Saved {} bytes as {}", data.len(), name),
            Err(e) => {
                warn!("Save failed: {e}");
                self.reply(Message::SaveFailed.text())?;
            }
        }
        Ok(())
    }
}

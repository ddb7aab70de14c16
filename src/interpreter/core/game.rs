//! Loaded game: code, text, vocabulary and the initial world
//!
//! A compiled game is an IFF form of type `ACOD`. Every chunk except TEXT
//! is a sequence of big-endian words.
use crate::interpreter::core::header::Header;
use crate::interpreter::core::instruction::Aword;
use crate::interpreter::objects::strings::StringHeap;
use crate::interpreter::objects::world::{
    Actor, Alternative, AttributeMap, Check, Container, Exit, Limit, Location, Object, Qualifier,
    Rule, Script, Step, World,
};
use crate::interpreter::savegame::iff::{IffFile, GAME_FORM};
use crate::interpreter::savegame::save_bytes::{WordReader, WordWriter};
use crate::interpreter::text::dictionary::{Dictionary, VerbPhrase, WordEntry};
use crate::interpreter::text::parser::{Restriction, SyntaxRule};
use log::{debug, info};

/// Default capacity of the event queue until engine limits are applied
const DEFAULT_MAX_EVENTS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub header: Header,
    /// Code memory; address 0 is never a block
    pub memory: Vec<Aword>,
    /// Text region addressed by PRINT and GETSTR
    pub text: Vec<u8>,
    pub dictionary: Dictionary,
    pub syntaxes: Vec<SyntaxRule>,
    /// Verb alternatives that apply everywhere
    pub verbs: Vec<Alternative>,
    /// The world as loaded; RESTART goes back to it
    pub world: World,
}

impl Game {
    /// Read a compiled game image
    pub fn from_image(data: &[u8]) -> Result<Game, String> {
        let iff = IffFile::from_bytes(data)?;
        if iff.form_type != GAME_FORM {
            return Err(format!(
                "Not a game image (form type {})",
                String::from_utf8_lossy(&iff.form_type)
            ));
        }
        let chunk = |id: &[u8; 4]| iff.require_chunk(id).map(WordReader::new);

        let header = Header::read(&mut chunk(b"HEAD")?)?;
        info!("Loading \"{}\"", header.name);

        let attributes = read_attributes(&mut chunk(b"ATTR")?)?;
        let mut world = World::new(header.ranges(), attributes, DEFAULT_MAX_EVENTS);
        world.max_score = header.max_score;

        let mut r = chunk(b"LOCS")?;
        expect_count(&mut r, world.locations.len(), "locations")?;
        for location in world.locations.iter_mut() {
            *location = read_location(&mut r)?;
        }
        let mut r = chunk(b"OBJS")?;
        expect_count(&mut r, world.objects.len(), "objects")?;
        for object in world.objects.iter_mut() {
            *object = read_object(&mut r)?;
        }
        let mut r = chunk(b"ACTS")?;
        expect_count(&mut r, world.actors.len(), "actors")?;
        for actor in world.actors.iter_mut() {
            *actor = read_actor(&mut r)?;
        }
        let mut r = chunk(b"CNTS")?;
        let count = r.count(20)?;
        world.containers = (0..count)
            .map(|_| read_container(&mut r))
            .collect::<Result<_, _>>()?;

        world.events = chunk(b"EVTS")?.counted()?;
        let mut r = chunk(b"RULS")?;
        let count = r.count(8)?;
        world.rules = (0..count)
            .map(|_| {
                Ok(Rule {
                    condition: r.word()?,
                    statements: r.word()?,
                    run: false,
                })
            })
            .collect::<Result<_, String>>()?;
        world.scores = chunk(b"SCOR")?.counted()?;

        let dictionary = read_dictionary(&mut chunk(b"DICT")?, &mut chunk(b"VPHR")?)?;
        let mut r = chunk(b"STXS")?;
        let count = r.count(28)?;
        let syntaxes = (0..count)
            .map(|_| read_syntax(&mut r))
            .collect::<Result<_, _>>()?;
        let verbs = read_alternatives(&mut chunk(b"VRBS")?)?;

        let memory = chunk(b"CODE")?.counted()?;
        let text = iff.require_chunk(b"TEXT")?.to_vec();

        if let Some(strs) = iff.find_chunk(b"STRS") {
            let mut r = WordReader::new(&strs.data);
            let count = r.count(8)?;
            let entries = (0..count)
                .map(|_| Ok((r.word()?, r.string()?)))
                .collect::<Result<Vec<_>, String>>()?;
            world.strings = StringHeap::from_entries(entries)?;
        }

        let game = Game {
            header,
            memory,
            text,
            dictionary,
            syntaxes,
            verbs,
            world,
        };
        game.validate()?;
        debug!(
            "Loaded {} code words, {} text bytes, {} words",
            game.memory.len(),
            game.text.len(),
            game.dictionary.len()
        );
        Ok(game)
    }

    /// Write the game as an image `from_image` reads back
    pub fn to_image(&self) -> Vec<u8> {
        let world = &self.world;
        let mut iff = IffFile::new(GAME_FORM);

        let mut w = WordWriter::new();
        self.header.write(&mut w);
        iff.add_chunk(*b"HEAD", w.into_bytes());

        let mut w = WordWriter::new();
        let entries: Vec<_> = world.attributes.entries().collect();
        w.word(entries.len() as Aword);
        for (id, slot) in entries {
            w.word(id).word(slot.slot as Aword).flag(slot.is_string);
        }
        iff.add_chunk(*b"ATTR", w.into_bytes());

        let mut w = WordWriter::new();
        w.word(world.locations.len() as Aword);
        for location in &world.locations {
            write_location(&mut w, location);
        }
        iff.add_chunk(*b"LOCS", w.into_bytes());

        let mut w = WordWriter::new();
        w.word(world.objects.len() as Aword);
        for object in &world.objects {
            w.word(object.location)
                .word(object.article)
                .word(object.name)
                .word(object.description)
                .word(container_word(object.container));
            write_alternatives(&mut w, &object.verbs);
            w.counted(&object.attributes);
        }
        iff.add_chunk(*b"OBJS", w.into_bytes());

        let mut w = WordWriter::new();
        w.word(world.actors.len() as Aword);
        for actor in &world.actors {
            write_actor(&mut w, actor);
        }
        iff.add_chunk(*b"ACTS", w.into_bytes());

        let mut w = WordWriter::new();
        w.word(world.containers.len() as Aword);
        for container in &world.containers {
            w.word(container.owner)
                .word(container.header)
                .word(container.empty)
                .word(container.name)
                .word(container.limits.len() as Aword);
            for limit in &container.limits {
                w.word(limit.attribute).word(limit.bound).word(limit.statements);
            }
        }
        iff.add_chunk(*b"CNTS", w.into_bytes());

        let mut w = WordWriter::new();
        w.counted(&world.events);
        iff.add_chunk(*b"EVTS", w.into_bytes());

        let mut w = WordWriter::new();
        w.word(world.rules.len() as Aword);
        for rule in &world.rules {
            w.word(rule.condition).word(rule.statements);
        }
        iff.add_chunk(*b"RULS", w.into_bytes());

        let mut w = WordWriter::new();
        w.counted(&world.scores);
        iff.add_chunk(*b"SCOR", w.into_bytes());

        let mut w = WordWriter::new();
        w.word(self.dictionary.len() as Aword);
        for (text, entry) in self.dictionary.iter() {
            w.string(text).word(entry.class).word(entry.code);
            w.counted(&entry.nouns).counted(&entry.adjectives);
        }
        iff.add_chunk(*b"DICT", w.into_bytes());

        let mut w = WordWriter::new();
        w.word(self.dictionary.phrases.len() as Aword);
        for phrase in &self.dictionary.phrases {
            let words: Vec<Aword> = phrase.words.iter().map(|&i| i as Aword).collect();
            w.counted(&words).word(phrase.verb).flag(phrase.motion);
        }
        iff.add_chunk(*b"VPHR", w.into_bytes());

        let mut w = WordWriter::new();
        w.word(self.syntaxes.len() as Aword);
        for rule in &self.syntaxes {
            w.word(rule.verb)
                .word(rule.preposition)
                .flag(rule.direct)
                .flag(rule.indirect)
                .flag(rule.actor)
                .flag(rule.multiple)
                .word(rule.restrictions.len() as Aword);
            for restriction in &rule.restrictions {
                w.word(restriction.parameter as Aword)
                    .word(restriction.classes)
                    .word(restriction.failure);
            }
        }
        iff.add_chunk(*b"STXS", w.into_bytes());

        let mut w = WordWriter::new();
        write_alternatives(&mut w, &self.verbs);
        iff.add_chunk(*b"VRBS", w.into_bytes());

        let mut w = WordWriter::new();
        w.counted(&self.memory);
        iff.add_chunk(*b"CODE", w.into_bytes());
        iff.add_chunk(*b"TEXT", self.text.clone());

        if world.strings.live_count() > 0 {
            let mut w = WordWriter::new();
            w.word(world.strings.live_count() as Aword);
            for (handle, text) in world.strings.entries() {
                w.word(handle).string(text);
            }
            iff.add_chunk(*b"STRS", w.into_bytes());
        }
        iff.to_bytes()
    }

    /// Cross-table references that must hold before anything runs
    fn validate(&self) -> Result<(), String> {
        let world = &self.world;
        for (i, object) in world.objects.iter().enumerate() {
            if let Some(c) = object.container {
                if c >= world.containers.len() {
                    return Err(format!("Object #{i} refers to missing container {c}"));
                }
            }
        }
        for (i, actor) in world.actors.iter().enumerate() {
            if let Some(c) = actor.container {
                if c >= world.containers.len() {
                    return Err(format!("Actor #{i} refers to missing container {c}"));
                }
            }
        }
        let slots = world.attributes.slot_count();
        let short = world
            .objects
            .iter()
            .map(|o| o.attributes.len())
            .chain(world.locations.iter().map(|l| l.attributes.len()))
            .chain(world.actors.iter().map(|a| a.attributes.len()))
            .any(|len| len < slots);
        if short {
            return Err(format!("Entity attribute lists shorter than {slots} slots"));
        }
        if self.header.start as usize >= self.memory.len() && self.header.start != 0 {
            return Err(format!("Start block {} outside code memory", self.header.start));
        }
        Ok(())
    }

    /// Text region bytes as a string
    pub fn text_at(&self, fpos: Aword, len: Aword) -> Result<String, String> {
        let start = fpos as usize;
        let bytes = start
            .checked_add(len as usize)
            .and_then(|end| self.text.get(start..end))
            .ok_or_else(|| format!("Text {fpos}+{len} outside the text region"))?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

fn expect_count(r: &mut WordReader, expected: usize, what: &str) -> Result<(), String> {
    let count = r.word()? as usize;
    if count != expected {
        return Err(format!("Header declares {expected} {what}, table has {count}"));
    }
    Ok(())
}

fn container_word(container: Option<usize>) -> Aword {
    container.map_or(0, |c| c as Aword + 1)
}

fn read_container_word(r: &mut WordReader) -> Result<Option<usize>, String> {
    Ok(match r.word()? {
        0 => None,
        c => Some(c as usize - 1),
    })
}

fn read_attributes(r: &mut WordReader) -> Result<AttributeMap, String> {
    let mut map = AttributeMap::new();
    let count = r.count(12)?;
    for _ in 0..count {
        let id = r.word()?;
        let slot = r.word()? as usize;
        let is_string = r.flag()?;
        map.insert(id, slot, is_string);
    }
    Ok(map)
}

fn read_checks(r: &mut WordReader) -> Result<Vec<Check>, String> {
    let count = r.count(8)?;
    (0..count)
        .map(|_| {
            Ok(Check {
                condition: r.word()?,
                failure: r.word()?,
            })
        })
        .collect()
}

fn write_checks(w: &mut WordWriter, checks: &[Check]) {
    w.word(checks.len() as Aword);
    for check in checks {
        w.word(check.condition).word(check.failure);
    }
}

fn read_alternatives(r: &mut WordReader) -> Result<Vec<Alternative>, String> {
    let count = r.count(16)?;
    (0..count)
        .map(|_| {
            let verb = r.word()?;
            let qualifier = Qualifier::from_word(r.word()?)?;
            let checks = read_checks(r)?;
            let action = r.word()?;
            Ok(Alternative {
                verb,
                qualifier,
                checks,
                action,
            })
        })
        .collect()
}

fn write_alternatives(w: &mut WordWriter, alternatives: &[Alternative]) {
    w.word(alternatives.len() as Aword);
    for alt in alternatives {
        w.word(alt.verb).word(alt.qualifier.word());
        write_checks(w, &alt.checks);
        w.word(alt.action);
    }
}

fn read_location(r: &mut WordReader) -> Result<Location, String> {
    let name = r.word()?;
    let description = r.word()?;
    let does = r.word()?;
    let count = r.count(16)?;
    let exits = (0..count)
        .map(|_| {
            let direction = r.word()?;
            let target = r.word()?;
            let action = r.word()?;
            let checks = read_checks(r)?;
            Ok(Exit {
                direction,
                checks,
                action,
                target,
            })
        })
        .collect::<Result<_, String>>()?;
    let verbs = read_alternatives(r)?;
    let attributes = r.counted()?;
    Ok(Location {
        name,
        description,
        does,
        exits,
        verbs,
        attributes,
        describe: 0,
    })
}

fn write_location(w: &mut WordWriter, location: &Location) {
    w.word(location.name)
        .word(location.description)
        .word(location.does)
        .word(location.exits.len() as Aword);
    for exit in &location.exits {
        w.word(exit.direction).word(exit.target).word(exit.action);
        write_checks(w, &exit.checks);
    }
    write_alternatives(w, &location.verbs);
    w.counted(&location.attributes);
}

fn read_object(r: &mut WordReader) -> Result<Object, String> {
    Ok(Object {
        location: r.word()?,
        article: r.word()?,
        name: r.word()?,
        description: r.word()?,
        container: read_container_word(r)?,
        verbs: read_alternatives(r)?,
        attributes: r.counted()?,
    })
}

fn read_actor(r: &mut WordReader) -> Result<Actor, String> {
    let location = r.word()?;
    let name = r.word()?;
    let description = r.word()?;
    let container = read_container_word(r)?;
    let script = r.word()?;
    let count = r.count(12)?;
    let scripts = (0..count)
        .map(|_| {
            let code = r.word()?;
            let description = r.word()?;
            let steps = r.count(12)?;
            let steps = (0..steps)
                .map(|_| {
                    Ok(Step {
                        after: r.word()?,
                        condition: r.word()?,
                        statements: r.word()?,
                    })
                })
                .collect::<Result<_, String>>()?;
            Ok(Script {
                code,
                description,
                steps,
            })
        })
        .collect::<Result<_, String>>()?;
    Ok(Actor {
        location,
        name,
        description,
        container,
        verbs: read_alternatives(r)?,
        scripts,
        script,
        step: 0,
        count: 0,
        attributes: r.counted()?,
    })
}

fn write_actor(w: &mut WordWriter, actor: &Actor) {
    w.word(actor.location)
        .word(actor.name)
        .word(actor.description)
        .word(container_word(actor.container))
        .word(actor.script)
        .word(actor.scripts.len() as Aword);
    for script in &actor.scripts {
        w.word(script.code)
            .word(script.description)
            .word(script.steps.len() as Aword);
        for step in &script.steps {
            w.word(step.after).word(step.condition).word(step.statements);
        }
    }
    write_alternatives(w, &actor.verbs);
    w.counted(&actor.attributes);
}

fn read_container(r: &mut WordReader) -> Result<Container, String> {
    let owner = r.word()?;
    let header = r.word()?;
    let empty = r.word()?;
    let name = r.word()?;
    let count = r.count(12)?;
    let limits = (0..count)
        .map(|_| {
            Ok(Limit {
                attribute: r.word()?,
                bound: r.word()?,
                statements: r.word()?,
            })
        })
        .collect::<Result<_, String>>()?;
    Ok(Container {
        owner,
        limits,
        header,
        empty,
        name,
    })
}

fn read_dictionary(words: &mut WordReader, phrases: &mut WordReader) -> Result<Dictionary, String> {
    let count = words.count(20)?;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let text = words.string()?;
        let entry = WordEntry {
            class: words.word()?,
            code: words.word()?,
            nouns: words.counted()?,
            adjectives: words.counted()?,
        };
        entries.push((text, entry));
    }
    let count = phrases.count(12)?;
    let mut verb_phrases = Vec::with_capacity(count);
    for _ in 0..count {
        let indices = phrases.counted()?;
        if indices.is_empty() || indices.iter().any(|&i| i as usize >= entries.len()) {
            return Err(format!("Verb phrase refers to unknown words {indices:?}"));
        }
        verb_phrases.push(VerbPhrase {
            words: indices.into_iter().map(|i| i as usize).collect(),
            verb: phrases.word()?,
            motion: phrases.flag()?,
        });
    }
    Ok(Dictionary::from_entries(entries, verb_phrases))
}

fn read_syntax(r: &mut WordReader) -> Result<SyntaxRule, String> {
    let verb = r.word()?;
    let preposition = r.word()?;
    let direct = r.flag()?;
    let indirect = r.flag()?;
    let actor = r.flag()?;
    let multiple = r.flag()?;
    let count = r.count(12)?;
    let restrictions = (0..count)
        .map(|_| {
            let parameter = r.word()?;
            if parameter != 1 && parameter != 2 {
                return Err(format!("Restriction on parameter {parameter}"));
            }
            Ok(Restriction {
                parameter: parameter as u8,
                classes: r.word()?,
                failure: r.word()?,
            })
        })
        .collect::<Result<_, String>>()?;
    Ok(SyntaxRule {
        verb,
        preposition,
        direct,
        indirect,
        actor,
        multiple,
        restrictions,
    })
}

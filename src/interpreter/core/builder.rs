//! Programmatic game construction
//!
//! [`GameBuilder`] collects entities, vocabulary and code blocks by handle
//! and lays everything out at [`GameBuilder::build`]: entity ids are
//! assigned contiguously, blocks are emitted into code memory with a
//! trailing RETURN, and printed text goes into the text region.
//!
//! ```ignore
//! let mut b = GameBuilder::new("demo");
//! let hall = b.location("Hall");
//! b.set_start_location(hall);
//! let mut asm = Assembler::new();
//! asm.text("Welcome.").newline();
//! b.start(asm);
//! let game = b.build()?;
//! ```
use crate::interpreter::core::game::Game;
use crate::interpreter::core::header::Header;
use crate::interpreter::core::instruction::{Aword, CurVar, Instruction, Opcode};
use crate::interpreter::objects::entity::{EntityRanges, EntityRef};
use crate::interpreter::objects::world::{
    Actor, Alternative, AttributeMap, Check, Container, Exit, Limit, Location, Object, Qualifier,
    Rule, Script, Step, World,
};
use crate::interpreter::text::dictionary::{
    Dictionary, WORD_ADJECTIVE, WORD_ALL, WORD_ARTICLE, WORD_BUT, WORD_CONJUNCTION,
    WORD_DIRECTION, WORD_IT, WORD_NOUN, WORD_PREPOSITION,
};
use crate::interpreter::text::parser::{Restriction, SyntaxRule};
use log::debug;

/// An entity declared in a builder, resolved to an id at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Object(usize),
    Location(usize),
    Actor(usize),
}

/// A named block added with [`GameBuilder::block`], for CALL targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRef(usize);

#[derive(Debug, Clone, PartialEq)]
enum Item {
    Word(Aword),
    Constant(i32),
    Entity(Handle),
    Print(String),
    GetStr(String),
    Block(BlockRef),
    /// Dictionary index of a word, for MATCH
    WordIndex(String),
}

/// Code for one block, written as a list of instructions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembler {
    items: Vec<Item>,
    errors: Vec<String>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a block in one expression
    pub fn with(f: impl FnOnce(&mut Assembler)) -> Assembler {
        let mut asm = Assembler::new();
        f(&mut asm);
        asm
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn op(&mut self, op: Opcode) -> &mut Self {
        self.items.push(Item::Word(op.word()));
        self
    }

    /// An operation by mnemonic; an unknown name fails the build
    pub fn op_named(&mut self, mnemonic: &str) -> &mut Self {
        match Opcode::from_mnemonic(mnemonic) {
            Some(op) => self.op(op),
            None => {
                self.errors.push(format!("Unknown mnemonic {mnemonic}"));
                self
            }
        }
    }

    pub fn constant(&mut self, value: i32) -> &mut Self {
        self.items.push(Item::Constant(value));
        self
    }

    pub fn boolean(&mut self, value: bool) -> &mut Self {
        self.constant(value as i32)
    }

    /// Push the id of an entity
    pub fn entity(&mut self, handle: Handle) -> &mut Self {
        self.items.push(Item::Entity(handle));
        self
    }

    pub fn read(&mut self, var: CurVar) -> &mut Self {
        self.items
            .push(Item::Word(Instruction::ReadVar { var, index: 0 }.encode()));
        self
    }

    pub fn write(&mut self, var: CurVar) -> &mut Self {
        self.items
            .push(Item::Word(Instruction::WriteVar { var, index: 0 }.encode()));
        self
    }

    /// Push command parameter `n` (1-based)
    pub fn param(&mut self, n: u8) -> &mut Self {
        self.items.push(Item::Word(
            Instruction::ReadVar {
                var: CurVar::Param,
                index: n,
            }
            .encode(),
        ));
        self
    }

    /// PRINT a piece of text
    pub fn text(&mut self, text: &str) -> &mut Self {
        self.items.push(Item::Print(text.to_string()));
        self
    }

    /// Push a fresh string holding `text` (GETSTR)
    pub fn string(&mut self, text: &str) -> &mut Self {
        self.items.push(Item::GetStr(text.to_string()));
        self
    }

    pub fn say(&mut self, handle: Handle) -> &mut Self {
        self.entity(handle).op(Opcode::Say)
    }

    pub fn newline(&mut self) -> &mut Self {
        self.op(Opcode::Newline)
    }

    /// Push the address of a named block
    pub fn block(&mut self, block: BlockRef) -> &mut Self {
        self.items.push(Item::Block(block));
        self
    }

    /// Push the dictionary index of `word`
    pub fn word(&mut self, word: &str) -> &mut Self {
        self.items.push(Item::WordIndex(word.to_lowercase()));
        self
    }

    /// Push `id attr` followed by the attribute operation, e.g. ATTRIBUTE
    pub fn attribute(&mut self, handle: Handle, attr: Aword) -> &mut Self {
        self.entity(handle).constant(attr as i32).op(Opcode::Attribute)
    }

    /// SET of a constant value
    pub fn set(&mut self, handle: Handle, attr: Aword, value: i32) -> &mut Self {
        self.entity(handle)
            .constant(attr as i32)
            .constant(value)
            .op(Opcode::Set)
    }

    /// LOCATE `what` at `dest`
    pub fn locate(&mut self, what: Handle, dest: Handle) -> &mut Self {
        self.entity(what).entity(dest).op(Opcode::Locate)
    }
}

/// A check: the condition block must leave true, otherwise the failure
/// block runs and the command stops
#[derive(Debug, Clone, PartialEq)]
pub struct CheckSpec {
    pub condition: Assembler,
    pub failure: Assembler,
}

/// One verb alternative
#[derive(Debug, Clone, PartialEq)]
pub struct AltSpec {
    verb: Aword,
    qualifier: Qualifier,
    checks: Vec<CheckSpec>,
    action: Assembler,
}

impl AltSpec {
    pub fn new(verb: Aword) -> Self {
        AltSpec {
            verb,
            qualifier: Qualifier::Default,
            checks: Vec::new(),
            action: Assembler::new(),
        }
    }

    pub fn qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = qualifier;
        self
    }

    pub fn check(mut self, condition: Assembler, failure: Assembler) -> Self {
        self.checks.push(CheckSpec { condition, failure });
        self
    }

    pub fn action(mut self, action: Assembler) -> Self {
        self.action = action;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitSpec {
    direction: Aword,
    target: Option<Handle>,
    checks: Vec<CheckSpec>,
    action: Assembler,
}

impl ExitSpec {
    /// An exit leading to `target`; `None` for one that only runs its action
    pub fn new(direction: Aword, target: Option<Handle>) -> Self {
        ExitSpec {
            direction,
            target,
            checks: Vec::new(),
            action: Assembler::new(),
        }
    }

    pub fn check(mut self, condition: Assembler, failure: Assembler) -> Self {
        self.checks.push(CheckSpec { condition, failure });
        self
    }

    pub fn action(mut self, action: Assembler) -> Self {
        self.action = action;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerSpec {
    limits: Vec<(Aword, Aword, Assembler)>,
    header: Assembler,
    empty: Assembler,
    name: Assembler,
}

impl ContainerSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit on `attribute` (0 counts items) with the rejection block
    pub fn limit(mut self, attribute: Aword, bound: Aword, statements: Assembler) -> Self {
        self.limits.push((attribute, bound, statements));
        self
    }

    pub fn header(mut self, header: Assembler) -> Self {
        self.header = header;
        self
    }

    pub fn empty(mut self, empty: Assembler) -> Self {
        self.empty = empty;
        self
    }

    pub fn name(mut self, name: Assembler) -> Self {
        self.name = name;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptSpec {
    code: Aword,
    description: Assembler,
    steps: Vec<(Aword, Assembler, Assembler)>,
}

impl ScriptSpec {
    pub fn new(code: Aword) -> Self {
        ScriptSpec {
            code,
            description: Assembler::new(),
            steps: Vec::new(),
        }
    }

    pub fn description(mut self, description: Assembler) -> Self {
        self.description = description;
        self
    }

    /// A step waiting `after` turns, guarded by `condition` when non-empty
    pub fn step(mut self, after: Aword, condition: Assembler, statements: Assembler) -> Self {
        self.steps.push((after, condition, statements));
        self
    }
}

#[derive(Debug, Clone, Default)]
struct EntitySpec {
    name: String,
    parent: Option<Handle>,
    article: Assembler,
    description: Assembler,
    does: Assembler,
    exits: Vec<ExitSpec>,
    verbs: Vec<AltSpec>,
    container: Option<ContainerSpec>,
    scripts: Vec<ScriptSpec>,
    attributes: Vec<(Aword, Aword)>,
    strings: Vec<(Aword, String)>,
}

struct AttributeSpec {
    id: Aword,
    default: Aword,
    is_string: bool,
}

pub struct GameBuilder {
    name: String,
    objects: Vec<EntitySpec>,
    locations: Vec<EntitySpec>,
    actors: Vec<EntitySpec>,
    attributes: Vec<AttributeSpec>,
    dictionary: Dictionary,
    nouns: Vec<(String, Handle)>,
    adjectives: Vec<(String, Handle)>,
    syntaxes: Vec<(SyntaxRule, Vec<(u8, Aword, Assembler)>)>,
    verbs: Vec<AltSpec>,
    events: Vec<Assembler>,
    rules: Vec<(Assembler, Assembler)>,
    scores: Vec<Aword>,
    blocks: Vec<Assembler>,
    start: Assembler,
    literal_slots: usize,
    errors: Vec<String>,
}

impl GameBuilder {
    /// A builder with the hero as actor 0
    pub fn new(name: &str) -> Self {
        GameBuilder {
            name: name.to_string(),
            objects: Vec::new(),
            locations: Vec::new(),
            actors: vec![EntitySpec {
                name: "you".to_string(),
                ..Default::default()
            }],
            attributes: Vec::new(),
            dictionary: Dictionary::new(),
            nouns: Vec::new(),
            adjectives: Vec::new(),
            syntaxes: Vec::new(),
            verbs: Vec::new(),
            events: Vec::new(),
            rules: Vec::new(),
            scores: Vec::new(),
            blocks: Vec::new(),
            start: Assembler::new(),
            literal_slots: 10,
            errors: Vec::new(),
        }
    }

    pub fn hero(&self) -> Handle {
        Handle::Actor(0)
    }

    pub fn location(&mut self, name: &str) -> Handle {
        self.locations.push(EntitySpec {
            name: name.to_string(),
            ..Default::default()
        });
        Handle::Location(self.locations.len() - 1)
    }

    pub fn object(&mut self, name: &str, parent: Handle) -> Handle {
        self.objects.push(EntitySpec {
            name: name.to_string(),
            parent: Some(parent),
            ..Default::default()
        });
        Handle::Object(self.objects.len() - 1)
    }

    pub fn actor(&mut self, name: &str, location: Handle) -> Handle {
        self.actors.push(EntitySpec {
            name: name.to_string(),
            parent: Some(location),
            ..Default::default()
        });
        Handle::Actor(self.actors.len() - 1)
    }

    fn spec(&mut self, handle: Handle) -> &mut EntitySpec {
        match handle {
            Handle::Object(i) => &mut self.objects[i],
            Handle::Location(i) => &mut self.locations[i],
            Handle::Actor(i) => &mut self.actors[i],
        }
    }

    /// Where the hero starts; the first location unless set
    pub fn set_start_location(&mut self, location: Handle) {
        self.actors[0].parent = Some(location);
    }

    pub fn set_parent(&mut self, handle: Handle, parent: Handle) {
        self.spec(handle).parent = Some(parent);
    }

    pub fn describe(&mut self, handle: Handle, description: Assembler) {
        self.spec(handle).description = description;
    }

    pub fn article(&mut self, handle: Handle, article: Assembler) {
        self.spec(handle).article = article;
    }

    /// Block run whenever an actor enters the location
    pub fn does(&mut self, location: Handle, does: Assembler) {
        self.spec(location).does = does;
    }

    pub fn exit(&mut self, location: Handle, exit: ExitSpec) {
        self.spec(location).exits.push(exit);
    }

    pub fn alternative(&mut self, handle: Handle, alt: AltSpec) {
        self.spec(handle).verbs.push(alt);
    }

    /// A plain DEFAULT alternative of `verb` on an entity
    pub fn object_verb(&mut self, handle: Handle, verb: Aword, action: Assembler) {
        self.alternative(handle, AltSpec::new(verb).action(action));
    }

    pub fn global_verb(&mut self, alt: AltSpec) {
        self.verbs.push(alt);
    }

    pub fn container(&mut self, handle: Handle, container: ContainerSpec) {
        if matches!(handle, Handle::Location(_)) {
            self.errors
                .push(format!("Location {handle:?} cannot be a container"));
            return;
        }
        self.spec(handle).container = Some(container);
    }

    pub fn script(&mut self, actor: Handle, script: ScriptSpec) {
        self.spec(actor).scripts.push(script);
    }

    /// Declare attribute `id` with a default for every entity
    pub fn attribute(&mut self, id: Aword, default: Aword) {
        self.attributes.push(AttributeSpec {
            id,
            default,
            is_string: false,
        });
    }

    pub fn string_attribute(&mut self, id: Aword) {
        self.attributes.push(AttributeSpec {
            id,
            default: 0,
            is_string: true,
        });
    }

    pub fn set_attribute(&mut self, handle: Handle, id: Aword, value: Aword) {
        self.spec(handle).attributes.push((id, value));
    }

    pub fn set_string(&mut self, handle: Handle, id: Aword, text: &str) {
        self.spec(handle).strings.push((id, text.to_string()));
    }

    /// Articles, conjunctions, `all`, `but` and `it`
    pub fn standard_words(&mut self) {
        for article in ["the", "a", "an"] {
            self.dictionary.insert(article, WORD_ARTICLE, 0);
        }
        self.dictionary.insert("and", WORD_CONJUNCTION, 0);
        self.dictionary.insert("but", WORD_BUT, 0);
        self.dictionary.insert("except", WORD_BUT, 0);
        self.dictionary.insert("all", WORD_ALL, 0);
        self.dictionary.insert("everything", WORD_ALL, 0);
        self.dictionary.insert("it", WORD_IT, 0);
    }

    pub fn noun(&mut self, word: &str, handle: Handle) {
        self.dictionary.insert(word, WORD_NOUN, 0);
        self.nouns.push((word.to_string(), handle));
    }

    pub fn adjective(&mut self, word: &str, handle: Handle) {
        self.dictionary.insert(word, WORD_ADJECTIVE, 0);
        self.adjectives.push((word.to_string(), handle));
    }

    pub fn direction(&mut self, word: &str, code: Aword) {
        self.dictionary.insert(word, WORD_DIRECTION, code);
    }

    pub fn preposition(&mut self, word: &str, code: Aword) {
        self.dictionary.insert(word, WORD_PREPOSITION, code);
    }

    pub fn verb(&mut self, phrase: &str, code: Aword) {
        if let Err(e) = self.dictionary.add_phrase(phrase, code, false) {
            self.errors.push(e);
        }
    }

    /// A verb that means "go" when followed by a direction
    pub fn motion_verb(&mut self, phrase: &str, code: Aword) {
        if let Err(e) = self.dictionary.add_phrase(phrase, code, true) {
            self.errors.push(e);
        }
    }

    /// Simplest syntax: the verb alone or with one direct object
    pub fn syntax(&mut self, verb: Aword, direct: bool) -> usize {
        self.add_syntax(SyntaxRule {
            verb,
            preposition: 0,
            direct,
            indirect: false,
            actor: false,
            multiple: direct,
            restrictions: Vec::new(),
        })
    }

    pub fn add_syntax(&mut self, rule: SyntaxRule) -> usize {
        self.syntaxes.push((rule, Vec::new()));
        self.syntaxes.len() - 1
    }

    /// Restrict a syntax parameter to `classes`, optionally with the block
    /// that answers a refusal
    pub fn restrict(&mut self, syntax: usize, parameter: u8, classes: Aword, failure: Assembler) {
        match self.syntaxes.get_mut(syntax) {
            Some((_, restrictions)) => restrictions.push((parameter, classes, failure)),
            None => self.errors.push(format!("No syntax #{syntax} to restrict")),
        }
    }

    /// Returns the 1-based event id
    pub fn event(&mut self, code: Assembler) -> Aword {
        self.events.push(code);
        self.events.len() as Aword
    }

    pub fn rule(&mut self, condition: Assembler, statements: Assembler) {
        self.rules.push((condition, statements));
    }

    /// Returns the 1-based score entry
    pub fn score(&mut self, points: Aword) -> Aword {
        self.scores.push(points);
        self.scores.len() as Aword
    }

    /// A block callable with CALL
    pub fn block(&mut self, code: Assembler) -> BlockRef {
        self.blocks.push(code);
        BlockRef(self.blocks.len() - 1)
    }

    pub fn start(&mut self, code: Assembler) {
        self.start = code;
    }

    pub fn literal_slots(&mut self, slots: usize) {
        self.literal_slots = slots;
    }

    pub fn build(mut self) -> Result<Game, String> {
        let mut errors = self.errors.clone();
        if self.locations.is_empty() {
            errors.push("A game needs at least one location".to_string());
        }
        if !errors.is_empty() {
            return Err(errors.join("; "));
        }
        if self.actors[0].parent.is_none() {
            self.actors[0].parent = Some(Handle::Location(0));
        }

        let ranges = EntityRanges::contiguous(
            self.objects.len(),
            self.locations.len(),
            self.actors.len(),
            self.literal_slots,
        );
        let mut attributes = AttributeMap::new();
        for (slot, attr) in self.attributes.iter().enumerate() {
            attributes.insert(attr.id, slot, attr.is_string);
        }
        let mut world = World::new(ranges.clone(), attributes, 100);

        let mut dictionary = self.dictionary.clone();
        for (word, handle) in &self.nouns {
            dictionary.add_noun(word, resolve(&ranges, *handle));
        }
        for (word, handle) in &self.adjectives {
            dictionary.add_adjective(word, resolve(&ranges, *handle));
        }

        let mut e = Emitter {
            memory: vec![0],
            text: Vec::new(),
            patches: Vec::new(),
            ranges: &ranges,
            dictionary: &dictionary,
        };
        let block_addresses = self
            .blocks
            .iter()
            .map(|b| e.emit(b))
            .collect::<Result<Vec<_>, _>>()?;

        let mut containers = Vec::new();
        for (i, spec) in self.locations.iter().enumerate() {
            let location = Location {
                name: e.emit_name(&spec.name)?,
                description: e.emit(&spec.description)?,
                does: e.emit(&spec.does)?,
                exits: spec
                    .exits
                    .iter()
                    .map(|x| {
                        Ok(Exit {
                            direction: x.direction,
                            checks: e.emit_checks(&x.checks)?,
                            action: e.emit(&x.action)?,
                            target: x.target.map_or(0, |t| resolve(&ranges, t)),
                        })
                    })
                    .collect::<Result<_, String>>()?,
                verbs: e.emit_alternatives(&spec.verbs)?,
                attributes: world.locations[i].attributes.clone(),
                describe: 0,
            };
            world.locations[i] = location;
        }
        for (i, spec) in self.objects.iter().enumerate() {
            let container = match &spec.container {
                Some(c) => {
                    let owner = ranges.id_of(EntityRef::Object(i));
                    containers.push(e.emit_container(owner, c)?);
                    Some(containers.len() - 1)
                }
                None => None,
            };
            world.objects[i] = Object {
                location: spec.parent.map_or(0, |p| resolve(&ranges, p)),
                article: e.emit(&spec.article)?,
                name: e.emit_name(&spec.name)?,
                description: e.emit(&spec.description)?,
                container,
                verbs: e.emit_alternatives(&spec.verbs)?,
                attributes: world.objects[i].attributes.clone(),
            };
        }
        for (i, spec) in self.actors.iter().enumerate() {
            let container = match &spec.container {
                Some(c) => {
                    let owner = ranges.id_of(EntityRef::Actor(i));
                    containers.push(e.emit_container(owner, c)?);
                    Some(containers.len() - 1)
                }
                None => None,
            };
            let scripts = spec
                .scripts
                .iter()
                .map(|s| {
                    Ok(Script {
                        code: s.code,
                        description: e.emit(&s.description)?,
                        steps: s
                            .steps
                            .iter()
                            .map(|(after, condition, statements)| {
                                Ok(Step {
                                    after: *after,
                                    condition: e.emit(condition)?,
                                    statements: e.emit(statements)?,
                                })
                            })
                            .collect::<Result<_, String>>()?,
                    })
                })
                .collect::<Result<_, String>>()?;
            world.actors[i] = Actor {
                location: spec.parent.map_or(0, |p| resolve(&ranges, p)),
                name: e.emit_name(&spec.name)?,
                description: e.emit(&spec.description)?,
                container,
                verbs: e.emit_alternatives(&spec.verbs)?,
                scripts,
                script: 0,
                step: 0,
                count: 0,
                attributes: world.actors[i].attributes.clone(),
            };
        }
        world.containers = containers;

        world.events = self
            .events
            .iter()
            .map(|b| e.emit(b))
            .collect::<Result<_, _>>()?;
        world.rules = self
            .rules
            .iter()
            .map(|(condition, statements)| {
                Ok(Rule {
                    condition: e.emit(condition)?,
                    statements: e.emit(statements)?,
                    run: false,
                })
            })
            .collect::<Result<_, String>>()?;
        world.scores = self.scores.clone();
        world.max_score = self.scores.iter().sum();

        let syntaxes = self
            .syntaxes
            .iter()
            .map(|(rule, restrictions)| {
                let mut rule = rule.clone();
                for (parameter, classes, failure) in restrictions {
                    rule.restrictions.push(Restriction {
                        parameter: *parameter,
                        classes: *classes,
                        failure: e.emit(failure)?,
                    });
                }
                Ok(rule)
            })
            .collect::<Result<_, String>>()?;
        let verbs = e.emit_alternatives(&self.verbs)?;
        let start = e.emit(&self.start)?;

        for (block, at) in std::mem::take(&mut e.patches) {
            let address = block_addresses
                .get(block)
                .ok_or_else(|| format!("Unknown block #{block}"))?;
            e.memory[at] = constant(*address as i32)?;
        }

        let Emitter { memory, text, .. } = e;
        self.apply_attributes(&mut world)?;

        let mut header = Header::new(&self.name);
        header.object_count = self.objects.len();
        header.location_count = self.locations.len();
        header.actor_count = self.actors.len();
        header.literal_count = self.literal_slots;
        header.start = start;
        header.max_score = world.max_score;

        debug!(
            "Built \"{}\": {} code words, {} text bytes",
            self.name,
            memory.len(),
            text.len()
        );
        Ok(Game {
            header,
            memory,
            text,
            dictionary,
            syntaxes,
            verbs,
            world,
        })
    }

    fn apply_attributes(&self, world: &mut World) -> Result<(), String> {
        for attr in &self.attributes {
            let slot = world.attributes.lookup(attr.id)?.slot;
            for values in world
                .objects
                .iter_mut()
                .map(|o| &mut o.attributes)
                .chain(world.locations.iter_mut().map(|l| &mut l.attributes))
                .chain(world.actors.iter_mut().map(|a| &mut a.attributes))
            {
                values[slot] = attr.default;
            }
        }
        let specs = self
            .objects
            .iter()
            .enumerate()
            .map(|(i, s)| (Handle::Object(i), s))
            .chain(
                self.locations
                    .iter()
                    .enumerate()
                    .map(|(i, s)| (Handle::Location(i), s)),
            )
            .chain(self.actors.iter().enumerate().map(|(i, s)| (Handle::Actor(i), s)));
        for (handle, spec) in specs {
            let id = resolve(&world.ranges, handle);
            for &(attr, value) in &spec.attributes {
                world.set_attribute(id, attr, value)?;
            }
            for (attr, text) in &spec.strings {
                let handle = world.strings.alloc(text.clone());
                world.set_string_attribute(id, *attr, handle)?;
            }
        }
        for location in world.locations.iter_mut() {
            location.describe = 0;
        }
        Ok(())
    }
}

fn resolve(ranges: &EntityRanges, handle: Handle) -> Aword {
    ranges.id_of(match handle {
        Handle::Object(i) => EntityRef::Object(i),
        Handle::Location(i) => EntityRef::Location(i),
        Handle::Actor(i) => EntityRef::Actor(i),
    })
}

fn constant(value: i32) -> Result<Aword, String> {
    if !Instruction::constant_fits(value) {
        return Err(format!("Constant {value} does not fit in 28 bits"));
    }
    Ok(Instruction::Constant(value as Aword).encode())
}

struct Emitter<'a> {
    memory: Vec<Aword>,
    text: Vec<u8>,
    /// (block index, code address) pairs to fill with block addresses
    patches: Vec<(usize, usize)>,
    ranges: &'a EntityRanges,
    dictionary: &'a Dictionary,
}

impl<'a> Emitter<'a> {
    /// Emit a block and return its address; an empty block is address 0
    fn emit(&mut self, asm: &Assembler) -> Result<Aword, String> {
        if let Some(error) = asm.errors.first() {
            return Err(error.clone());
        }
        if asm.is_empty() {
            return Ok(0);
        }
        let address = self.memory.len() as Aword;
        for item in &asm.items {
            match item {
                Item::Word(word) => self.memory.push(*word),
                Item::Constant(value) => self.memory.push(constant(*value)?),
                Item::Entity(handle) => {
                    self.memory.push(constant(resolve(self.ranges, *handle) as i32)?)
                }
                Item::Print(text) | Item::GetStr(text) => {
                    let fpos = self.text.len();
                    self.text.extend_from_slice(text.as_bytes());
                    self.memory.push(constant(fpos as i32)?);
                    self.memory.push(constant(text.len() as i32)?);
                    let op = if matches!(item, Item::Print(_)) {
                        Opcode::Print
                    } else {
                        Opcode::GetStr
                    };
                    self.memory.push(op.word());
                }
                Item::Block(BlockRef(block)) => {
                    self.patches.push((*block, self.memory.len()));
                    self.memory.push(0);
                }
                Item::WordIndex(word) => {
                    let index = self
                        .dictionary
                        .lookup(word)
                        .ok_or_else(|| format!("Word '{word}' is not in the dictionary"))?;
                    self.memory.push(constant(index as i32)?);
                }
            }
        }
        self.memory.push(Opcode::Return.word());
        Ok(address)
    }

    fn emit_name(&mut self, name: &str) -> Result<Aword, String> {
        let mut asm = Assembler::new();
        asm.text(name);
        self.emit(&asm)
    }

    fn emit_checks(&mut self, checks: &[CheckSpec]) -> Result<Vec<Check>, String> {
        checks
            .iter()
            .map(|c| {
                Ok(Check {
                    condition: self.emit(&c.condition)?,
                    failure: self.emit(&c.failure)?,
                })
            })
            .collect()
    }

    fn emit_alternatives(&mut self, alts: &[AltSpec]) -> Result<Vec<Alternative>, String> {
        alts.iter()
            .map(|a| {
                Ok(Alternative {
                    verb: a.verb,
                    qualifier: a.qualifier,
                    checks: self.emit_checks(&a.checks)?,
                    action: self.emit(&a.action)?,
                })
            })
            .collect()
    }

    fn emit_container(&mut self, owner: Aword, spec: &ContainerSpec) -> Result<Container, String> {
        Ok(Container {
            owner,
            limits: spec
                .limits
                .iter()
                .map(|(attribute, bound, statements)| {
                    Ok(Limit {
                        attribute: *attribute,
                        bound: *bound,
                        statements: self.emit(statements)?,
                    })
                })
                .collect::<Result<_, String>>()?,
            header: self.emit(&spec.header)?,
            empty: self.emit(&spec.empty)?,
            name: self.emit(&spec.name)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::core::instruction::Instruction;
    use test_log::test;

    #[test]
    fn blocks_end_in_return_and_text_lands_in_the_text_region() {
        let mut b = GameBuilder::new("t");
        let hall = b.location("Hall");
        b.set_start_location(hall);
        let mut asm = Assembler::new();
        asm.text("Hi").newline();
        b.start(asm);
        let game = b.build().unwrap();
        let start = game.header.start as usize;
        let code: Vec<_> = game.memory[start..]
            .iter()
            .map(|&w| Instruction::decode(w).unwrap())
            .collect();
        assert_eq!(code.last(), Some(&Instruction::Statement(Opcode::Return)));
        assert!(code.contains(&Instruction::Statement(Opcode::Print)));
        assert!(game.text_at(0, 4).unwrap().starts_with("Hall"));
        assert_eq!(game.world.actors[0].location, 1);
    }

    #[test]
    fn entity_ids_are_contiguous() {
        let mut b = GameBuilder::new("t");
        let hall = b.location("Hall");
        let lamp = b.object("lamp", hall);
        let dog = b.actor("dog", hall);
        let game = b.build().unwrap();
        let ranges = &game.world.ranges;
        assert_eq!(resolve(ranges, lamp), 1);
        assert_eq!(resolve(ranges, hall), 2);
        assert_eq!(resolve(ranges, dog), 4);
        assert_eq!(game.world.objects[0].location, 2);
        // the hero defaults to the first location
        assert_eq!(game.world.actors[0].location, 2);
    }

    #[test]
    fn build_errors_are_reported() {
        let mut b = GameBuilder::new("t");
        b.location("Hall");
        let mut asm = Assembler::new();
        asm.op_named("JUMP");
        b.start(asm);
        assert!(b.build().unwrap_err().contains("JUMP"));

        let mut b = GameBuilder::new("t");
        b.location("Hall");
        let mut asm = Assembler::new();
        asm.word("xyzzy");
        b.start(asm);
        assert!(b.build().is_err());
    }

    #[test]
    fn attributes_get_defaults_and_overrides() {
        let mut b = GameBuilder::new("t");
        let hall = b.location("Hall");
        let lamp = b.object("lamp", hall);
        b.attribute(1, 5);
        b.string_attribute(2);
        b.set_attribute(lamp, 1, 9);
        b.set_string(lamp, 2, "brass");
        let game = b.build().unwrap();
        let w = &game.world;
        assert_eq!(w.attribute(1, 1).unwrap(), 9);
        assert_eq!(w.attribute(2, 1).unwrap(), 5);
        assert_eq!(w.strings.get(w.attribute(1, 2).unwrap()).unwrap(), "brass");
    }
}

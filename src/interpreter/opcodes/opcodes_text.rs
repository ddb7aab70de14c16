/// Text output and description operations
///
/// This module handles everything the game says:
/// - Printing compiled text with its `$` formatting codes (PRINT)
/// - Naming entities and literals (SAY, SAYINT, SAYSTR)
/// - Room and entity descriptions (LOOK, DESCRIBE, LIST)
/// - Runtime strings (GETSTR, STREQ, STREXACT, CONTAINS)
///
/// All text goes through the spacing-aware output path, which drops it
/// unless the current location is where the hero is.
use crate::interpreter::core::instruction::{Aword, Opcode};
use crate::interpreter::core::interpreter::{ExecutionResult, Interpreter, Interrupt};
use crate::interpreter::objects::entity::EntityRef;
use crate::interpreter::objects::world::Literal;
use crate::interpreter::text::messages::Message;
use log::debug;

impl Interpreter {
    /// Handle text and string opcodes
    pub fn execute_text_op(&mut self, op: Opcode) -> Result<ExecutionResult, Interrupt> {
        match op {
            Opcode::Print => {
                let len = self.vm.pop()?;
                let fpos = self.vm.pop()?;
                let text = self.vm.game.text_at(fpos, len)?;
                self.print_text(&text)?;
            }
            Opcode::Say => {
                let id = self.vm.pop()?;
                self.say(id)?;
            }
            Opcode::SayInt => {
                let value = self.vm.pop_signed()?;
                self.output(&value.to_string())?;
            }
            Opcode::SayStr => {
                let handle = self.vm.pop()?;
                let text = self.vm.world.strings.take(handle)?;
                self.output(&text)?;
            }
            Opcode::Newline => self.new_line()?,
            Opcode::GetStr => {
                let len = self.vm.pop()?;
                let fpos = self.vm.pop()?;
                let text = self.vm.game.text_at(fpos, len)?;
                let handle = self.vm.world.strings.alloc(text);
                self.vm.push(handle)?;
            }
            Opcode::StrEq | Opcode::StrExact | Opcode::Contains => {
                let rh = self.vm.pop()?;
                let lh = self.vm.pop()?;
                let rh = self.vm.world.strings.take(rh)?;
                let lh = self.vm.world.strings.take(lh)?;
                let result = match op {
                    Opcode::StrEq => lh.eq_ignore_ascii_case(&rh),
                    Opcode::StrExact => lh == rh,
                    _ => lh.to_lowercase().contains(&rh.to_lowercase()),
                };
                self.vm.push_bool(result)?;
            }
            Opcode::Describe => {
                let id = self.vm.pop()?;
                self.describe(id)?;
            }
            Opcode::Look => self.look()?,
            Opcode::List => {
                let cnt = self.vm.pop()?;
                self.list(cnt)?;
            }
            _ => return Err(format!("Unhandled text opcode {op}").into()),
        }
        Ok(ExecutionResult::Continue)
    }

    /// Check if an opcode is a text operation
    pub fn is_text_opcode(op: Opcode) -> bool {
        matches!(
            op,
            Opcode::Print
                | Opcode::Say
                | Opcode::SayInt
                | Opcode::SayStr
                | Opcode::Newline
                | Opcode::GetStr
                | Opcode::StrEq
                | Opcode::StrExact
                | Opcode::Contains
                | Opcode::Describe
                | Opcode::Look
                | Opcode::List
        )
    }

    /// Print compiled text, expanding formatting codes: `$n` new line,
    /// `$p` blank line, `$1`..`$9` command parameters, `$a` the current
    /// actor, `$l` the current location, `$v` the verb and `$$` a dollar.
    fn print_text(&mut self, text: &str) -> Result<(), Interrupt> {
        let mut pending = String::new();
        let mut chars = text.chars();
        while let Some(ch) = chars.next() {
            if ch != '$' {
                pending.push(ch);
                continue;
            }
            let code = match chars.next() {
                Some(code) => code,
                None => {
                    pending.push('$');
                    break;
                }
            };
            if code == '$' {
                pending.push('$');
                continue;
            }
            self.output(&pending)?;
            pending.clear();
            match code {
                'n' => self.new_line()?,
                'p' => {
                    self.new_line()?;
                    self.new_line()?;
                }
                'a' => self.say(self.vm.world.cur.act)?,
                'l' => self.say(self.vm.world.cur.loc)?,
                'v' => {
                    let word = self
                        .vm
                        .game
                        .dictionary
                        .verb_word(self.vm.world.cur.vrb)
                        .to_string();
                    self.output(&word)?;
                }
                '1'..='9' => {
                    let n = code as usize - '0' as usize;
                    let param = self
                        .params
                        .get(n - 1)
                        .map(|p| p.code)
                        .ok_or_else(|| {
                            format!("Text refers to ${n}, command has {}", self.params.len())
                        })?;
                    self.say(param)?;
                }
                other => {
                    pending.push('$');
                    pending.push(other);
                }
            }
        }
        self.output(&pending)
    }

    /// Print the name of an entity, or the value of a literal
    pub(crate) fn say(&mut self, id: Aword) -> Result<(), Interrupt> {
        let world = &self.vm.world;
        let name = match world.entity(id)? {
            EntityRef::Object(i) => world.objects[i].name,
            EntityRef::Location(i) => world.locations[i].name,
            EntityRef::Actor(i) => world.actors[i].name,
            EntityRef::Literal(i) => {
                let text = match world.literals.get(i) {
                    Some(Literal::Number(v)) => (*v as i32).to_string(),
                    Some(Literal::Text(handle)) => world.strings.get(*handle)?.to_string(),
                    None => return Err(format!("Literal #{i} is not in use").into()),
                };
                return self.output(&text);
            }
        };
        self.interpret(name)
    }

    fn say_article(&mut self, id: Aword) -> Result<(), Interrupt> {
        let article = match self.vm.world.ranges.classify(id) {
            Some(EntityRef::Object(i)) => self.vm.world.objects[i].article,
            _ => 0,
        };
        if article != 0 {
            self.interpret(article)
        } else {
            self.message(Message::Article)
        }
    }

    /// "a X, a Y and a Z"
    fn say_items(
        &mut self,
        items: &[Aword],
        comma: Message,
        and: Message,
    ) -> Result<(), Interrupt> {
        for (n, &id) in items.iter().enumerate() {
            if n > 0 {
                self.message(if n + 1 == items.len() { and } else { comma })?;
            }
            self.say_article(id)?;
            self.say(id)?;
        }
        Ok(())
    }

    /// Describe an entity. Describing something already being described,
    /// or nesting deeper than the configured limit, is fatal.
    pub(crate) fn describe(&mut self, id: Aword) -> Result<(), Interrupt> {
        if self.describing.contains(&id) {
            return Err(format!("Recursive DESCRIBE of {id}").into());
        }
        if self.describing.len() >= self.config.max_describe_depth {
            return Err(format!(
                "DESCRIBE nested deeper than {}",
                self.config.max_describe_depth
            )
            .into());
        }
        self.describing.push(id);
        let result = self.describe_entity(id);
        self.describing.pop();
        result
    }

    fn describe_entity(&mut self, id: Aword) -> Result<(), Interrupt> {
        match self.vm.world.entity(id)? {
            EntityRef::Location(i) => {
                let description = self.vm.world.locations[i].description;
                self.interpret(description)
            }
            EntityRef::Object(i) => {
                self.vm.world.set_described(id);
                let description = self.vm.world.objects[i].description;
                if description != 0 {
                    return self.interpret(description);
                }
                self.message(Message::SeeObjectStart)?;
                self.say_article(id)?;
                self.say(id)?;
                self.message(Message::SeeObjectEnd)?;
                if self.vm.world.is_container(id) {
                    self.list(id)?;
                }
                Ok(())
            }
            EntityRef::Actor(i) => {
                self.vm.world.set_described(id);
                let actor = &self.vm.world.actors[i];
                let scripted = actor
                    .scripts
                    .iter()
                    .find(|s| s.code == actor.script && actor.script != 0)
                    .map_or(0, |s| s.description);
                let description = if scripted != 0 {
                    scripted
                } else {
                    actor.description
                };
                if description != 0 {
                    return self.interpret(description);
                }
                self.say(id)?;
                self.message(Message::ActorHere)
            }
            EntityRef::Literal(_) => self.say(id),
        }
    }

    /// Full description of the current location
    pub(crate) fn look(&mut self) -> Result<(), Interrupt> {
        if self.looking {
            return Err("Recursive LOOK".to_string().into());
        }
        self.looking = true;
        let result = self.look_here();
        self.looking = false;
        result
    }

    fn look_here(&mut self) -> Result<(), Interrupt> {
        let loc = self.vm.world.cur.loc;
        debug!("look at {loc}");
        self.vm.world.mark_all_undescribed();
        self.say(loc)?;
        self.output(".")?;
        self.new_line()?;
        self.describe(loc)?;
        self.describe_objects()?;
        self.describe_actors()
    }

    /// Objects directly at the current location: those with their own
    /// description first, then one sentence listing the rest.
    pub(crate) fn describe_objects(&mut self) -> Result<(), Interrupt> {
        let here = self.vm.world.contents(self.vm.world.cur.loc);
        for &id in &here {
            let own = match self.vm.world.ranges.classify(id) {
                Some(EntityRef::Object(i)) => self.vm.world.objects[i].description != 0,
                _ => false,
            };
            if own && self.vm.world.needs_describe(id) {
                self.describe(id)?;
            }
        }
        let rest: Vec<Aword> = here
            .into_iter()
            .filter(|&id| self.vm.world.needs_describe(id))
            .collect();
        if !rest.is_empty() {
            self.message(Message::SeeObjectStart)?;
            self.say_items(&rest, Message::SeeObjectComma, Message::SeeObjectAnd)?;
            self.message(Message::SeeObjectEnd)?;
            for &id in &rest {
                if self.vm.world.is_container(id) {
                    self.list(id)?;
                }
            }
        }
        self.vm.world.mark_all_undescribed();
        Ok(())
    }

    /// Actors other than the hero at the current location
    pub(crate) fn describe_actors(&mut self) -> Result<(), Interrupt> {
        let loc = self.vm.world.cur.loc;
        let hero = self.vm.world.hero();
        let actors: Vec<Aword> = self
            .vm
            .world
            .ranges
            .actors
            .ids()
            .zip(self.vm.world.actors.iter())
            .filter(|(id, a)| *id != hero && a.location == loc)
            .map(|(id, _)| id)
            .collect();
        for id in actors {
            if self.vm.world.needs_describe(id) {
                self.describe(id)?;
            }
        }
        self.vm.world.mark_all_undescribed();
        Ok(())
    }

    /// List the contents of a container
    pub(crate) fn list(&mut self, cnt: Aword) -> Result<(), Interrupt> {
        let container = self.vm.world.container(cnt)?.clone();
        let contents = self.vm.world.contents(cnt);
        if contents.is_empty() {
            if container.empty != 0 {
                return self.interpret(container.empty);
            }
            self.message(Message::EmptyStart)?;
            self.container_name(container.name, container.owner)?;
            return self.message(Message::EmptyEnd);
        }
        if container.header != 0 {
            self.interpret(container.header)?;
        } else {
            self.message(Message::ContainsStart)?;
            self.container_name(container.name, container.owner)?;
            self.message(Message::Contains)?;
        }
        self.say_items(&contents, Message::ContainsComma, Message::ContainsAnd)?;
        self.message(Message::ContainsEnd)
    }

    fn container_name(&mut self, name: Aword, owner: Aword) -> Result<(), Interrupt> {
        if name != 0 {
            self.interpret(name)
        } else {
            self.say(owner)
        }
    }
}

/// World manipulation and query operations
///
/// This module handles the opcodes that read or change the world store:
/// - Attribute access (MAKE, SET, STRSET, INCR, DECR, ATTRIBUTE, STRATTR)
/// - Movement (LOCATE, EMPTY) with container limits and room entry
/// - Position queries (IN, HERE, NEAR, WHERE, CLASS)
/// - Aggregates over object populations (SUM, MAX, COUNT)
/// - Events and actor scripts (SCHEDULE, CANCEL, USE)
use crate::interpreter::core::instruction::{Aword, Opcode};
use crate::interpreter::core::interpreter::{ExecutionResult, Interpreter, Interrupt};
use crate::interpreter::objects::entity::EntityRef;
use crate::interpreter::text::messages::Message;
use log::debug;

impl Interpreter {
    /// Handle world opcodes
    pub fn execute_world_op(&mut self, op: Opcode) -> Result<ExecutionResult, Interrupt> {
        match op {
            Opcode::Make | Opcode::Set | Opcode::StrSet | Opcode::Incr | Opcode::Decr => {
                let value = self.vm.pop()?;
                let attr = self.vm.pop()?;
                let id = self.vm.pop()?;
                let world = &mut self.vm.world;
                match op {
                    Opcode::Make => world.set_attribute(id, attr, (value != 0) as Aword)?,
                    Opcode::Set => world.set_attribute(id, attr, value)?,
                    Opcode::StrSet => world.set_string_attribute(id, attr, value)?,
                    Opcode::Incr => world.increment(id, attr, value)?,
                    _ => world.decrement(id, attr, value)?,
                }
            }
            Opcode::Attribute => {
                let attr = self.vm.pop()?;
                let id = self.vm.pop()?;
                let value = self.vm.world.attribute(id, attr)?;
                self.vm.push(value)?;
            }
            Opcode::StrAttr => {
                let attr = self.vm.pop()?;
                let id = self.vm.pop()?;
                let handle = self.vm.world.attribute(id, attr)?;
                let copy = self.vm.world.strings.copy(handle)?;
                self.vm.push(copy)?;
            }
            Opcode::Locate => {
                let dest = self.vm.pop()?;
                let id = self.vm.pop()?;
                self.locate(id, dest)?;
            }
            Opcode::Empty => {
                let dest = self.vm.pop()?;
                let cnt = self.vm.pop()?;
                self.empty(cnt, dest)?;
            }
            Opcode::In => {
                let cnt = self.vm.pop()?;
                let obj = self.vm.pop()?;
                let inside = self.vm.world.is_in(obj, cnt)?;
                self.vm.push_bool(inside)?;
            }
            Opcode::Here => {
                let id = self.vm.pop()?;
                let here = self.vm.world.is_here(id)?;
                self.vm.push_bool(here)?;
            }
            Opcode::Near => {
                let id = self.vm.pop()?;
                let near = self.vm.world.is_near(id)?;
                self.vm.push_bool(near)?;
            }
            Opcode::Where => {
                let id = self.vm.pop()?;
                let place = self.vm.world.where_is(id)?;
                self.vm.push(place)?;
            }
            Opcode::Class => {
                let id = self.vm.pop()?;
                let class = self.vm.world.class_of(id)?;
                self.vm.push(class)?;
            }
            Opcode::Sum | Opcode::Max => {
                let whr = self.vm.pop()?;
                let attr = self.vm.pop()?;
                let value = if op == Opcode::Sum {
                    self.vm.world.aggregate_sum(attr, whr)?
                } else {
                    self.vm.world.aggregate_max(attr, whr)?
                };
                self.vm.push(value)?;
            }
            Opcode::Count => {
                let whr = self.vm.pop()?;
                let count = self.vm.world.aggregate_count(whr)?;
                self.vm.push(count)?;
            }
            Opcode::Schedule => {
                let delay = self.vm.pop_signed()?;
                let whr = self.vm.pop()?;
                let event = self.vm.pop()?;
                self.schedule(event, whr, delay)?;
            }
            Opcode::Cancel => {
                let event = self.vm.pop()?;
                self.vm.world.queue.cancel(event);
            }
            Opcode::Use => {
                let script = self.vm.pop()?;
                let actor = self.vm.pop()?;
                self.use_script(actor, script)?;
            }
            _ => return Err(format!("Unhandled world opcode {op}").into()),
        }
        Ok(ExecutionResult::Continue)
    }

    /// Check if an opcode is a world operation
    pub fn is_world_opcode(op: Opcode) -> bool {
        matches!(
            op,
            Opcode::Empty
                | Opcode::Schedule
                | Opcode::Cancel
                | Opcode::Make
                | Opcode::Set
                | Opcode::StrSet
                | Opcode::Incr
                | Opcode::Decr
                | Opcode::Locate
                | Opcode::Use
                | Opcode::In
                | Opcode::Attribute
                | Opcode::StrAttr
                | Opcode::Here
                | Opcode::Near
                | Opcode::Where
                | Opcode::Sum
                | Opcode::Max
                | Opcode::Count
                | Opcode::Class
        )
    }

    /// Schedule an event `delay` turns from now. A negative delay fires
    /// on the next event check.
    pub(crate) fn schedule(&mut self, event: Aword, whr: Aword, delay: i32) -> Result<(), String> {
        let world = &mut self.vm.world;
        if event == 0 || event as usize > world.events.len() {
            return Err(format!("SCHEDULE of unknown event {event}"));
        }
        let time = world.cur.tick.wrapping_add(delay.max(0) as Aword);
        world.queue.schedule(event, whr, time)
    }

    fn use_script(&mut self, actor: Aword, script: Aword) -> Result<(), String> {
        let world = &mut self.vm.world;
        let index = match world.entity(actor)? {
            EntityRef::Actor(i) => i,
            other => return Err(format!("USE on {other}, which is not an actor")),
        };
        let actor = &mut world.actors[index];
        if !actor.scripts.iter().any(|s| s.code == script) {
            return Err(format!("Actor has no script {script}"));
        }
        debug!("actor #{index} starts script {script}");
        actor.script = script;
        actor.step = 0;
        actor.count = 0;
        Ok(())
    }

    /// Move an object or actor. Moving an object into a container checks
    /// its limits first; a broken limit runs its statements and aborts.
    pub(crate) fn locate(&mut self, id: Aword, dest: Aword) -> Result<(), Interrupt> {
        match self.vm.world.entity(id)? {
            EntityRef::Object(_) => self.locate_object(id, dest),
            EntityRef::Actor(_) => self.locate_actor(id, dest),
            other => Err(format!("Can't LOCATE {other}").into()),
        }
    }

    fn locate_object(&mut self, obj: Aword, dest: Aword) -> Result<(), Interrupt> {
        let world = &self.vm.world;
        if world.is_container(dest) {
            if world.parent(obj)? == dest {
                return Ok(());
            }
            if let Some(statements) = world.violated_limit(dest, obj)? {
                debug!("{obj} does not fit in {dest}");
                self.interpret(statements)?;
                return Err(Interrupt::Abort);
            }
            self.vm.world.set_parent(obj, dest)?;
        } else if dest == 0 || world.ranges.is_location(dest) {
            self.vm.world.set_parent(obj, dest)?;
        } else {
            let place = world.where_is(dest)?;
            self.vm.world.set_parent(obj, place)?;
        }
        Ok(())
    }

    /// Move an actor to a location. The hero entering a location sees it
    /// described: in full every `visits + 1` entries, briefly otherwise.
    /// The location's entry block then runs with the actor as the actor.
    fn locate_actor(&mut self, act: Aword, dest: Aword) -> Result<(), Interrupt> {
        let whr = if self.vm.world.ranges.is_location(dest) {
            dest
        } else {
            self.vm.world.where_is(dest)?
        };
        let index = match self.vm.world.entity(whr) {
            Ok(EntityRef::Location(i)) => i,
            _ => return Err(format!("Actor {act} can't be located at {dest}").into()),
        };
        let prev_act = self.vm.world.cur.act;
        let prev_loc = self.vm.world.cur.loc;
        self.vm.world.cur.loc = whr;
        self.vm.world.set_parent(act, whr)?;

        if act == self.vm.world.hero() {
            let cycle = self.vm.world.cur.visits.saturating_add(1);
            if self.vm.world.locations[index].describe % cycle == 0 {
                self.look()?;
            } else {
                self.say(whr)?;
                self.message(Message::Again)?;
                self.new_line()?;
                self.describe_objects()?;
                self.describe_actors()?;
            }
            let location = &mut self.vm.world.locations[index];
            location.describe = location.describe.wrapping_add(1) % cycle;
        } else {
            self.vm.world.locations[index].describe = 0;
        }

        let does = self.vm.world.locations[index].does;
        if does != 0 {
            self.vm.world.cur.act = act;
            let result = self.interpret(does);
            self.vm.world.cur.act = prev_act;
            result?;
        }
        if self.vm.world.cur.act != act {
            self.vm.world.cur.loc = prev_loc;
        }
        Ok(())
    }

    /// Move everything directly inside `cnt` to `dest`
    pub(crate) fn empty(&mut self, cnt: Aword, dest: Aword) -> Result<(), Interrupt> {
        for obj in self.vm.world.contents(cnt) {
            self.locate(obj, dest)?;
        }
        Ok(())
    }
}

//! The turn loop
//!
//! A turn fires the events due now, advances the clock, then lets every
//! actor move in id order: the hero reads and executes a command, other
//! actors advance their scripts. When-rules are checked after each move.
use crate::interpreter::core::instruction::Aword;
use crate::interpreter::core::interpreter::{Interpreter, Interrupt};
use crate::interpreter::objects::entity::EntityRef;
use crate::interpreter::objects::world::{Alternative, Check, Qualifier};
use crate::interpreter::text::messages::Message;
use crate::interpreter::text::parser::{parse, Action, Command, ParseError};
use log::{debug, info};

/// Treat a failed command, event, step or rule as finished
fn absorb(result: Result<(), Interrupt>) -> Result<(), Interrupt> {
    match result {
        Err(Interrupt::Abort) => Ok(()),
        other => other,
    }
}

impl Interpreter {
    /// Play until the player quits or input runs out. A fatal error ends
    /// the session with its diagnostic.
    pub fn run(&mut self) -> Result<(), String> {
        let mut outcome = self.start();
        loop {
            match outcome {
                Ok(()) | Err(Interrupt::Abort) | Err(Interrupt::Resumed) => {}
                Err(Interrupt::Restart) => {
                    outcome = self.restart();
                    continue;
                }
                Err(Interrupt::Quit) => {
                    self.display.force_refresh()?;
                    return Ok(());
                }
                Err(Interrupt::Fatal(message)) => {
                    self.display.force_refresh()?;
                    return Err(message);
                }
            }
            outcome = self.play_turn();
        }
    }

    /// Run the start block and bring the hero into the starting location
    pub fn start(&mut self) -> Result<(), Interrupt> {
        let hero = self.vm.world.hero();
        let world = &mut self.vm.world;
        world.cur.act = hero;
        world.cur.loc = world.where_is(hero)?;
        world.cur.tick = 0;
        let start = self.vm.game.header.start;
        absorb(self.interpret(start))?;

        let loc = self.vm.world.where_is(hero)?;
        if loc == 0 {
            return Err(Interrupt::Fatal("The hero starts nowhere".to_string()));
        }
        info!("Starting {} at location {loc}", self.vm.game.header.name);
        self.vm.world.set_parent(hero, 0)?;
        absorb(self.locate(hero, loc))
    }

    /// Back to the world as loaded, then start over
    pub fn restart(&mut self) -> Result<(), Interrupt> {
        info!("Restarting");
        self.vm.reset();
        self.params.clear();
        self.it = None;
        self.describing.clear();
        self.looking = false;
        self.start()
    }

    /// One full turn
    pub fn play_turn(&mut self) -> Result<(), Interrupt> {
        self.check_events()?;
        let world = &mut self.vm.world;
        world.cur.tick = world.cur.tick.wrapping_add(1);
        let hero = world.hero();
        let actors: Vec<Aword> = world.ranges.actors.ids().collect();
        for act in actors {
            if act == hero {
                self.hero_turn()?;
            } else {
                self.actor_turn(act)?;
            }
            self.run_rules()?;
        }
        Ok(())
    }

    /// Fire every event due at the current tick, each at its own location
    pub fn check_events(&mut self) -> Result<(), Interrupt> {
        loop {
            let tick = self.vm.world.cur.tick;
            let entry = match self.vm.world.queue.pop_due(tick) {
                Some(entry) => entry,
                None => return Ok(()),
            };
            let world = &mut self.vm.world;
            world.cur.loc = if world.ranges.is_location(entry.target) {
                entry.target
            } else if entry.target == 0 {
                world.where_is(world.hero())?
            } else {
                world.where_is(entry.target)?
            };
            let code = world
                .events
                .get((entry.event as usize).wrapping_sub(1))
                .copied()
                .ok_or_else(|| format!("Event {} has no code", entry.event))?;
            debug!("event {} fires at {}", entry.event, world.cur.loc);
            absorb(self.interpret(code))?;
        }
    }

    fn hero_turn(&mut self) -> Result<(), Interrupt> {
        let hero = self.vm.world.hero();
        loop {
            self.vm.world.cur.act = hero;
            self.vm.world.cur.loc = self.vm.world.where_is(hero)?;
            let line = match self.prompt(Message::Prompt.text())? {
                Some(line) => line,
                None => return Err(Interrupt::Quit),
            };
            let vm = &mut self.vm;
            let parsed = parse(
                &line,
                &vm.game.dictionary,
                &vm.game.syntaxes,
                &mut vm.world,
                self.it,
            );
            match parsed {
                Ok(command) => {
                    if self.execute_command(command)? {
                        return Ok(());
                    }
                }
                Err(ParseError::Empty) => {}
                Err(ParseError::RestrictionBlock(block)) => absorb(self.interpret(block))?,
                Err(error) => {
                    debug!("parse error: {error:?}");
                    self.reply(&error.to_string())?;
                }
            }
        }
    }

    /// Execute a parsed command. Returns whether it used up the turn;
    /// a command nothing responds to does not.
    pub fn execute_command(&mut self, mut command: Command) -> Result<bool, Interrupt> {
        let hero = self.vm.world.hero();
        let world = &mut self.vm.world;
        world.cur.act = command.actor.unwrap_or(hero);
        world.cur.vrb = command.verb();
        // literals are freed by the next parse
        if let [only] = command.directs.as_slice() {
            if !world.ranges.literals.contains(only.code) {
                self.it = Some(only.code);
            }
        }

        let verb = match command.action {
            Action::Go { direction, .. } => {
                self.params.clear();
                return match self.go(direction) {
                    Err(Interrupt::Abort) => Ok(true),
                    other => other,
                };
            }
            Action::Verb(verb) => verb,
        };

        let multiple = command.is_multiple();
        let mut consumed = false;
        while let Some(params) = command.next_command() {
            self.params = params;
            if multiple {
                if let Some(first) = self.params.first().map(|p| p.code) {
                    self.say(first)?;
                    self.output(":")?;
                }
            }
            match self.execute_verb(verb) {
                Ok(done) => consumed |= done,
                Err(Interrupt::Abort) => consumed = true,
                Err(other) => return Err(other),
            }
        }
        Ok(consumed)
    }

    /// Alternatives of `verb` from the outermost (the game) to the
    /// innermost (the last parameter)
    fn alternatives(&self, verb: Aword) -> Result<Vec<Alternative>, String> {
        let world = &self.vm.world;
        let mut found: Vec<Alternative> = Vec::new();
        let mut collect = |verbs: &[Alternative]| {
            found.extend(verbs.iter().filter(|a| a.verb == verb).cloned());
        };
        collect(&self.vm.game.verbs);
        if let EntityRef::Location(i) = world.entity(world.cur.loc)? {
            collect(&world.locations[i].verbs);
        }
        for param in &self.params {
            match world.entity(param.code)? {
                EntityRef::Object(i) => collect(&world.objects[i].verbs),
                EntityRef::Actor(i) => collect(&world.actors[i].verbs),
                EntityRef::Location(i) => collect(&world.locations[i].verbs),
                EntityRef::Literal(_) => {}
            }
        }
        Ok(found)
    }

    /// Run every check; the first one that fails runs its failure block
    /// and aborts the command.
    fn run_checks(&mut self, checks: &[Check]) -> Result<(), Interrupt> {
        for check in checks {
            if !self.evaluate(check.condition)? {
                self.interpret(check.failure)?;
                return Err(Interrupt::Abort);
            }
        }
        Ok(())
    }

    /// Returns false when nothing implements the verb here
    fn execute_verb(&mut self, verb: Aword) -> Result<bool, Interrupt> {
        let alternatives = self.alternatives(verb)?;
        if !alternatives.iter().any(|a| a.action != 0) {
            self.reply(Message::CantDoThat.text())?;
            return Ok(false);
        }
        for alt in &alternatives {
            self.run_checks(&alt.checks)?;
        }
        for alt in alternatives.iter().rev() {
            match alt.qualifier {
                Qualifier::Before => self.interpret(alt.action)?,
                Qualifier::Only => {
                    self.interpret(alt.action)?;
                    return Ok(true);
                }
                _ => {}
            }
        }
        for alt in alternatives.iter().filter(|a| a.qualifier == Qualifier::Default) {
            self.interpret(alt.action)?;
        }
        for alt in alternatives.iter().rev().filter(|a| a.qualifier == Qualifier::After) {
            self.interpret(alt.action)?;
        }
        Ok(true)
    }

    /// Leave the current location through the exit for `direction`.
    /// Returns false when there is no such exit.
    pub fn go(&mut self, direction: Aword) -> Result<bool, Interrupt> {
        let world = &self.vm.world;
        let exit = match world.entity(world.cur.loc)? {
            EntityRef::Location(i) => world.locations[i]
                .exits
                .iter()
                .find(|e| e.direction == direction)
                .cloned(),
            other => return Err(format!("Current location is {other}").into()),
        };
        let exit = match exit {
            Some(exit) => exit,
            None => {
                self.reply(Message::NoWay.text())?;
                return Ok(false);
            }
        };
        self.run_checks(&exit.checks)?;
        self.interpret(exit.action)?;
        if exit.target != 0 {
            let act = self.vm.world.cur.act;
            self.locate(act, exit.target)?;
        }
        Ok(true)
    }

    /// Advance a non-hero actor's script by at most one step
    fn actor_turn(&mut self, act: Aword) -> Result<(), Interrupt> {
        let index = match self.vm.world.entity(act)? {
            EntityRef::Actor(i) => i,
            other => return Err(format!("{other} is not an actor").into()),
        };
        let actor = &self.vm.world.actors[index];
        if actor.script == 0 {
            return Ok(());
        }
        let code = actor.script;
        let script = actor
            .scripts
            .iter()
            .find(|s| s.code == code)
            .cloned()
            .ok_or_else(|| format!("Actor {act} has no script {code}"))?;
        let step_index = actor.step as usize;
        let step = match script.steps.get(step_index) {
            Some(step) => step.clone(),
            None => {
                self.vm.world.actors[index].script = 0;
                return Ok(());
            }
        };
        if step.after > actor.count {
            self.vm.world.actors[index].count += 1;
            return Ok(());
        }
        self.vm.world.actors[index].count = 0;

        self.vm.world.cur.act = act;
        self.vm.world.cur.loc = self.vm.world.where_is(act)?;
        if !self.evaluate(step.condition)? {
            return Ok(());
        }
        let actor = &mut self.vm.world.actors[index];
        actor.step += 1;
        if script.steps.get(step_index + 1).map_or(false, |next| next.after != 0) {
            actor.count = 1;
        }
        debug!("actor {act} runs step {step_index} of script {code}");
        absorb(self.interpret(step.statements))?;

        let actor = &mut self.vm.world.actors[index];
        if actor.script == code && actor.step as usize >= script.steps.len() {
            actor.script = 0;
        }
        Ok(())
    }

    /// Fire when-rules until none fires. A rule fires once when its
    /// condition becomes true and re-arms when it turns false.
    pub fn run_rules(&mut self) -> Result<(), Interrupt> {
        let hero = self.vm.world.hero();
        loop {
            let mut fired = false;
            for i in 0..self.vm.world.rules.len() {
                self.vm.world.cur.act = hero;
                self.vm.world.cur.loc = self.vm.world.where_is(hero)?;
                let rule = self.vm.world.rules[i].clone();
                let holds = match self.evaluate(rule.condition) {
                    Err(Interrupt::Abort) => false,
                    other => other?,
                };
                if holds && !rule.run {
                    debug!("rule {i} fires");
                    self.vm.world.rules[i].run = true;
                    absorb(self.interpret(rule.statements))?;
                    fired = true;
                } else if !holds {
                    self.vm.world.rules[i].run = false;
                }
            }
            if !fired {
                return Ok(());
            }
        }
    }
}

use crate::interpreter::core::game::Game;
use crate::interpreter::core::instruction::{Aword, CurVar, Instruction};
use crate::interpreter::core::vm::VM;
use crate::interpreter::display::display_trait::{DisplayError, GameDisplay};
use crate::interpreter::input::input_trait::LineInput;
use crate::interpreter::text::messages::Message;
use crate::interpreter::text::parser::Param;
use crate::interpreter::utils::config::EngineConfig;
use crate::interpreter::utils::disassembler::disassemble;
use crate::interpreter::utils::game_rand::GameRand;
use crate::interpreter::utils::storage::{FileStorage, SaveStorage};
use log::{debug, trace};
use std::fmt;

/// Why execution of a block stopped early
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    /// The current command, event, script step or rule failed; the turn
    /// loop carries on with the next one
    Abort,
    /// The player chose to quit
    Quit,
    /// The player chose to restart
    Restart,
    /// A saved game was restored; the turn loop starts a fresh turn
    Resumed,
    /// Corrupt game data or an engine limit; the session ends
    Fatal(String),
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::Abort => write!(f, "aborted"),
            Interrupt::Quit => write!(f, "quit"),
            Interrupt::Restart => write!(f, "restart"),
            Interrupt::Resumed => write!(f, "restored"),
            Interrupt::Fatal(message) => write!(f, "fatal error: {message}"),
        }
    }
}

impl From<String> for Interrupt {
    fn from(message: String) -> Self {
        Interrupt::Fatal(message)
    }
}

impl From<DisplayError> for Interrupt {
    fn from(error: DisplayError) -> Self {
        Interrupt::Fatal(error.to_string())
    }
}

/// Result of executing a single instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Continue execution normally
    Continue,
    /// The block that `interpret` entered has returned
    Returned,
}

/// The acode interpreter: VM state plus the collaborators it talks to
pub struct Interpreter {
    /// The VM state
    pub vm: VM,
    pub config: EngineConfig,
    pub(crate) display: Box<dyn GameDisplay>,
    pub(crate) input: Box<dyn LineInput>,
    pub(crate) storage: Box<dyn SaveStorage>,
    pub(crate) rng: GameRand,
    /// Parameters of the command being executed
    pub(crate) params: Vec<Param>,
    /// The last single direct object, for "it"
    pub(crate) it: Option<Aword>,
    /// Entities being described, to catch descriptions that describe themselves
    pub(crate) describing: Vec<Aword>,
    pub(crate) looking: bool,
    /// Whether the next printed word needs a separating space
    needs_space: bool,
    /// Instruction count for debugging
    instruction_count: u64,
}

impl Interpreter {
    /// Create an interpreter. Save files go to the configured directory
    /// until [`Interpreter::set_storage`] says otherwise.
    pub fn new(
        game: Game,
        config: EngineConfig,
        display: Box<dyn GameDisplay>,
        input: Box<dyn LineInput>,
    ) -> Self {
        let storage = FileStorage::new(&config.save_directory, config.save_extension.clone());
        let rng = GameRand::from_seed(config.random_seed);
        Interpreter {
            vm: VM::new(game, &config),
            config,
            display,
            input,
            storage: Box::new(storage),
            rng,
            params: Vec::new(),
            it: None,
            describing: Vec::new(),
            looking: false,
            needs_space: false,
            instruction_count: 0,
        }
    }

    pub fn set_storage(&mut self, storage: Box<dyn SaveStorage>) {
        self.storage = storage;
    }

    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    /// Run the block at `addr` until its RETURN. Address 0 is no code.
    /// On any interrupt the stacks are unwound to where they were.
    pub fn interpret(&mut self, addr: Aword) -> Result<(), Interrupt> {
        if addr == 0 {
            return Ok(());
        }
        let saved_pc = self.vm.pc;
        let base_depth = self.vm.call_stack.len();
        let base_stack = self.vm.stack.len();
        self.vm.pc = addr as usize;
        let result = self.run_block(base_depth);
        self.vm.pc = saved_pc;
        if result.is_err() {
            self.vm.call_stack.truncate(base_depth);
            self.vm.stack.truncate(base_stack);
        }
        result
    }

    /// Run a block that leaves a boolean and return it. No block means
    /// no condition, which holds.
    pub fn evaluate(&mut self, addr: Aword) -> Result<bool, Interrupt> {
        if addr == 0 {
            return Ok(true);
        }
        self.interpret(addr)?;
        Ok(self.vm.pop_bool()?)
    }

    fn run_block(&mut self, base_depth: usize) -> Result<(), Interrupt> {
        loop {
            let pc = self.vm.pc;
            let word = self.vm.fetch()?;
            let inst = Instruction::decode(word).map_err(|e| format!("{e} at address {pc}"))?;
            if self.config.trace {
                debug!("{}", disassemble(&self.vm.game.memory, pc as Aword));
            }
            self.instruction_count += 1;
            if self.execute_instruction(inst, base_depth)? == ExecutionResult::Returned {
                return Ok(());
            }
        }
    }

    pub fn execute_instruction(
        &mut self,
        inst: Instruction,
        base_depth: usize,
    ) -> Result<ExecutionResult, Interrupt> {
        match inst {
            Instruction::Constant(value) => {
                self.vm.push(value)?;
                Ok(ExecutionResult::Continue)
            }
            Instruction::ReadVar { var, index } => {
                let value = self.read_current(var, index)?;
                self.vm.push(value)?;
                Ok(ExecutionResult::Continue)
            }
            Instruction::WriteVar { var, index } => {
                let value = self.vm.pop()?;
                self.write_current(var, index, value)?;
                Ok(ExecutionResult::Continue)
            }
            Instruction::Statement(op) => {
                if Interpreter::is_stack_opcode(op) {
                    self.execute_stack_op(op, base_depth)
                } else if Interpreter::is_math_opcode(op) {
                    self.execute_math_op(op)
                } else if Interpreter::is_text_opcode(op) {
                    self.execute_text_op(op)
                } else if Interpreter::is_world_opcode(op) {
                    self.execute_world_op(op)
                } else {
                    self.execute_meta_op(op)
                }
            }
        }
    }

    fn read_current(&self, var: CurVar, index: u8) -> Result<Aword, String> {
        let cur = &self.vm.world.cur;
        Ok(match var {
            CurVar::Param => self
                .params
                .get((index as usize).wrapping_sub(1))
                .map(|p| p.code)
                .ok_or_else(|| {
                    format!(
                        "Parameter {index} requested, command has {}",
                        self.params.len()
                    )
                })?,
            CurVar::CurLoc => cur.loc,
            CurVar::CurAct => cur.act,
            CurVar::CurVrb => cur.vrb,
            CurVar::Score => cur.score,
            CurVar::Tick => cur.tick,
        })
    }

    fn write_current(&mut self, var: CurVar, index: u8, value: Aword) -> Result<(), String> {
        trace!("store {} = {}", var.name(), value);
        let cur = &mut self.vm.world.cur;
        match var {
            CurVar::CurLoc => cur.loc = value,
            CurVar::CurAct => cur.act = value,
            CurVar::CurVrb => cur.vrb = value,
            CurVar::Score => cur.score = value,
            CurVar::Tick => return Err("TICK is read-only".to_string()),
            CurVar::Param => {
                let param = self
                    .params
                    .get_mut((index as usize).wrapping_sub(1))
                    .ok_or_else(|| format!("Parameter {index} does not exist"))?;
                param.code = value;
                param.words.clear();
            }
        }
        Ok(())
    }

    /// Text reaches the player only from where the hero is
    pub(crate) fn should_print(&self) -> bool {
        let world = &self.vm.world;
        world
            .where_is(world.hero())
            .map_or(false, |loc| loc == world.cur.loc)
    }

    /// Print a piece of text, separated from the previous piece by a space
    /// unless it starts with punctuation
    pub(crate) fn output(&mut self, text: &str) -> Result<(), Interrupt> {
        if text.is_empty() || !self.should_print() {
            return Ok(());
        }
        let joins = text.starts_with(['.', ',', ':', ';', '!', '?', ')', '\'', ' ', '\n']);
        if self.needs_space && !joins {
            self.display.print(" ")?;
        }
        self.display.print(text)?;
        self.needs_space = !text.ends_with(['\n', ' ']);
        Ok(())
    }

    pub(crate) fn message(&mut self, message: Message) -> Result<(), Interrupt> {
        self.output(message.text())
    }

    pub(crate) fn new_line(&mut self) -> Result<(), Interrupt> {
        if !self.should_print() {
            return Ok(());
        }
        self.display.new_line()?;
        self.needs_space = false;
        Ok(())
    }

    /// Messages answering the player, printed whatever the location context
    pub(crate) fn reply(&mut self, text: &str) -> Result<(), Interrupt> {
        if self.needs_space {
            self.display.print(" ")?;
        }
        self.display.print(text)?;
        self.display.new_line()?;
        self.needs_space = false;
        Ok(())
    }

    /// Read a line for the game; `None` at end of input
    pub(crate) fn read_line(&mut self) -> Result<Option<String>, Interrupt> {
        self.display.force_refresh()?;
        let line = self.input.read_line()?;
        if let Some(text) = &line {
            if self.input.echoes() {
                self.display.print_input_echo(text)?;
            }
        }
        self.needs_space = false;
        Ok(line)
    }

    /// Show the prompt and read the player's answer
    pub(crate) fn prompt(&mut self, prompt: &str) -> Result<Option<String>, Interrupt> {
        if self.needs_space {
            self.display.new_line()?;
            self.needs_space = false;
        }
        self.display.show_prompt(&format!("{prompt} "))?;
        self.read_line()
    }

    /// Address of the next instruction, for diagnostics
    pub fn pc(&self) -> usize {
        self.vm.pc
    }
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod interpreter_tests;

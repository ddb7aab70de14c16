use crate::interpreter::core::game::Game;
use crate::interpreter::core::instruction::Aword;
use crate::interpreter::objects::world::World;
use crate::interpreter::utils::config::EngineConfig;
use log::{debug, trace};

/// Represents a call frame on the VM call stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallFrame {
    /// Return address (PC to return to)
    pub return_pc: usize,
    /// Stack index of the first argument
    pub frame_pointer: usize,
    /// Number of arguments passed
    pub argc: usize,
}

/// The acode virtual machine state
pub struct VM {
    /// The game being executed
    pub game: Game,
    /// The live world
    pub world: World,
    /// Program counter - word address of the next instruction
    pub pc: usize,
    /// Operand stack
    pub stack: Vec<Aword>,
    /// Frames of CALLs in progress
    pub call_stack: Vec<CallFrame>,
    stack_size: usize,
    max_call_depth: usize,
}

impl VM {
    /// Create a VM for `game`, applying the engine limits to its world
    pub fn new(mut game: Game, config: &EngineConfig) -> Self {
        game.world.apply_limits(config.max_events, config.max_literals);
        let world = game.world.clone();
        VM {
            game,
            world,
            pc: 0,
            stack: Vec::with_capacity(config.stack_size),
            call_stack: Vec::new(),
            stack_size: config.stack_size,
            max_call_depth: config.max_call_depth,
        }
    }

    /// Back to the world as loaded
    pub fn reset(&mut self) {
        debug!("VM reset to the initial world");
        self.world = self.game.world.clone();
        self.pc = 0;
        self.stack.clear();
        self.call_stack.clear();
    }

    /// Push a value onto the operand stack
    pub fn push(&mut self, value: Aword) -> Result<(), String> {
        if self.stack.len() >= self.stack_size {
            return Err(format!("Stack overflow (more than {} values)", self.stack_size));
        }
        trace!("push {} depth={}", value as i32, self.stack.len() + 1);
        self.stack.push(value);
        Ok(())
    }

    /// Pop a value from the operand stack
    pub fn pop(&mut self) -> Result<Aword, String> {
        self.stack
            .pop()
            .ok_or_else(|| format!("Stack underflow at pc {}", self.pc))
    }

    /// Pop a value as a signed number
    pub fn pop_signed(&mut self) -> Result<i32, String> {
        Ok(self.pop()? as i32)
    }

    pub fn pop_bool(&mut self) -> Result<bool, String> {
        Ok(self.pop()? != 0)
    }

    pub fn push_bool(&mut self, value: bool) -> Result<(), String> {
        self.push(value as Aword)
    }

    /// Peek at the top of the stack without popping
    pub fn peek(&self) -> Result<Aword, String> {
        self.stack
            .last()
            .copied()
            .ok_or_else(|| "Stack underflow on peek".to_string())
    }

    /// Read a word of code memory
    pub fn read_word(&self, addr: usize) -> Result<Aword, String> {
        self.game
            .memory
            .get(addr)
            .copied()
            .ok_or_else(|| format!("Address {addr} outside code memory"))
    }

    /// Read the word at PC and advance
    pub fn fetch(&mut self) -> Result<Aword, String> {
        let word = self.read_word(self.pc)?;
        self.pc += 1;
        Ok(word)
    }

    /// Enter a called block. The arguments are already on the stack.
    pub fn call(&mut self, address: usize, argc: usize) -> Result<(), String> {
        if self.call_stack.len() >= self.max_call_depth {
            return Err(format!("Call depth exceeds {}", self.max_call_depth));
        }
        if argc > self.stack.len() {
            return Err(format!(
                "CALL with {argc} arguments but only {} values on the stack",
                self.stack.len()
            ));
        }
        if address == 0 || address >= self.game.memory.len() {
            return Err(format!("CALL to invalid address {address}"));
        }
        self.call_stack.push(CallFrame {
            return_pc: self.pc,
            frame_pointer: self.stack.len() - argc,
            argc,
        });
        self.pc = address;
        Ok(())
    }

    /// Leave the innermost called block. A value left above the arguments
    /// becomes the result.
    pub fn return_from_call(&mut self) -> Result<(), String> {
        let frame = self
            .call_stack
            .pop()
            .ok_or_else(|| "RETURN without a call frame".to_string())?;
        let result = if self.stack.len() > frame.frame_pointer + frame.argc {
            self.stack.last().copied()
        } else {
            None
        };
        self.stack.truncate(frame.frame_pointer);
        if let Some(value) = result {
            self.stack.push(value);
        }
        self.pc = frame.return_pc;
        Ok(())
    }

    /// Argument `n` (1-based) of the innermost call
    pub fn argument(&self, n: Aword) -> Result<Aword, String> {
        let frame = self
            .call_stack
            .last()
            .ok_or_else(|| "ARG outside a called block".to_string())?;
        if n == 0 || n as usize > frame.argc {
            return Err(format!("ARG {n} but the block has {} arguments", frame.argc));
        }
        self.stack
            .get(frame.frame_pointer + n as usize - 1)
            .copied()
            .ok_or_else(|| format!("Argument {n} was popped"))
    }
}

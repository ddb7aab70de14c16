/// Game session operations
///
/// QUIT, SAVE, RESTORE and RESTART talk to the player and the storage
/// collaborator; SCORE, VISITS, YORN and MATCH cover the rest of the
/// session state. Leaving the current turn is signalled with an
/// [`Interrupt`] that the turn loop acts on.
use crate::interpreter::core::instruction::Opcode;
use crate::interpreter::core::interpreter::{ExecutionResult, Interpreter, Interrupt};
use crate::interpreter::text::messages::Message;
use log::{debug, info};

impl Interpreter {
    /// Handle session opcodes
    pub fn execute_meta_op(&mut self, op: Opcode) -> Result<ExecutionResult, Interrupt> {
        match op {
            Opcode::Quit => return Err(self.confirm_quit()?),
            Opcode::Save => self.save_game()?,
            Opcode::Restore => {
                if self.restore_game()? {
                    return Err(Interrupt::Resumed);
                }
            }
            Opcode::Restart => return Err(Interrupt::Restart),
            Opcode::Score => {
                let n = self.vm.pop()?;
                if n == 0 {
                    self.print_score()?;
                } else {
                    self.vm.world.award_score(n)?;
                }
            }
            Opcode::Visits => {
                self.vm.world.cur.visits = self.vm.pop()?;
            }
            Opcode::Yorn => {
                let answer = self.read_line()?;
                let yes = answer.map_or(false, |a| a.trim_start().to_lowercase().starts_with('y'));
                self.vm.push_bool(yes)?;
            }
            Opcode::Match => {
                let word = self.vm.pop()? as usize;
                let n = self.vm.pop()?;
                let param = self
                    .params
                    .get((n as usize).wrapping_sub(1))
                    .ok_or_else(|| {
                        format!("MATCH on parameter {n}, command has {}", self.params.len())
                    })?;
                let matched = param.words.contains(&word);
                self.vm.push_bool(matched)?;
            }
            _ => return Err(format!("Unknown opcode {op}").into()),
        }
        Ok(ExecutionResult::Continue)
    }

    fn print_score(&mut self) -> Result<(), Interrupt> {
        let score = self.vm.world.cur.score as i32;
        let max = self.vm.world.max_score as i32;
        self.message(Message::ScoreStart)?;
        self.output(&score.to_string())?;
        self.message(Message::ScoreMiddle)?;
        self.output(&max.to_string())?;
        self.message(Message::ScoreEnd)?;
        self.new_line()
    }

    /// Ask until the player picks RESTART, RESTORE or QUIT. End of input
    /// quits.
    pub(crate) fn confirm_quit(&mut self) -> Result<Interrupt, Interrupt> {
        loop {
            self.reply(Message::QuitAction.text())?;
            let answer = match self.prompt(Message::Prompt.text())? {
                Some(answer) => answer.trim().to_lowercase(),
                None => return Ok(Interrupt::Quit),
            };
            debug!("quit confirmation: {answer:?}");
            match answer.as_str() {
                "restart" => return Ok(Interrupt::Restart),
                "quit" => {
                    info!("Player quit");
                    return Ok(Interrupt::Quit);
                }
                "restore" => {
                    if self.restore_game()? {
                        return Ok(Interrupt::Resumed);
                    }
                }
                _ => {}
            }
        }
    }
}

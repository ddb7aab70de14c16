/// Stack, call and structured control-flow operations
///
/// This module handles the opcodes that move the program counter or
/// manage the operand stack:
/// - Calls and returns (CALL, ARG, RETURN)
/// - Stack manipulation (DUP, POP)
/// - IF/ELSE/ENDIF and the DEPENDING statement
///
/// Control flow has no jump offsets; false branches are skipped by
/// scanning forward for the matching marker.
use crate::interpreter::core::control_flow;
use crate::interpreter::core::instruction::Opcode;
use crate::interpreter::core::interpreter::{ExecutionResult, Interpreter, Interrupt};
use log::debug;

impl Interpreter {
    /// Handle stack and control-flow opcodes
    pub fn execute_stack_op(
        &mut self,
        op: Opcode,
        base_depth: usize,
    ) -> Result<ExecutionResult, Interrupt> {
        match op {
            Opcode::Return => {
                if self.vm.call_stack.len() <= base_depth {
                    return Ok(ExecutionResult::Returned);
                }
                self.vm.return_from_call()?;
            }
            Opcode::Call => {
                let argc = self.vm.pop()? as usize;
                let address = self.vm.pop()? as usize;
                debug!("call {address} with {argc} arguments");
                self.vm.call(address, argc)?;
            }
            Opcode::Arg => {
                let n = self.vm.pop()?;
                let value = self.vm.argument(n)?;
                self.vm.push(value)?;
            }
            Opcode::Dup => {
                let value = self.vm.peek()?;
                self.vm.push(value)?;
            }
            Opcode::Pop => {
                self.vm.pop()?;
            }

            // ---- IF / ELSE / ENDIF ----
            Opcode::If => {
                if !self.vm.pop_bool()? {
                    self.vm.pc = control_flow::skip_if_false(&self.vm.game.memory, self.vm.pc)?;
                }
            }
            // reached only when the THEN part ran
            Opcode::Else => {
                self.vm.pc = control_flow::skip_else(&self.vm.game.memory, self.vm.pc)?;
            }
            Opcode::EndIf => {}

            // ---- DEPENDING ----
            Opcode::DepStart => {}
            Opcode::DepExec => {
                if !self.vm.pop_bool()? {
                    self.vm.pc = control_flow::next_case(&self.vm.game.memory, self.vm.pc)?;
                }
            }
            // the executed case ends here
            Opcode::DepCase | Opcode::DepElse => {
                self.vm.pc = control_flow::end_of_depending(&self.vm.game.memory, self.vm.pc)?;
            }
            Opcode::DepEnd => {
                self.vm.pop()?;
            }

            _ => return Err(format!("Unhandled stack opcode {op}").into()),
        }
        Ok(ExecutionResult::Continue)
    }

    /// Check if an opcode is a stack or control-flow operation
    pub fn is_stack_opcode(op: Opcode) -> bool {
        matches!(
            op,
            Opcode::Return
                | Opcode::Call
                | Opcode::Arg
                | Opcode::Dup
                | Opcode::Pop
                | Opcode::If
                | Opcode::Else
                | Opcode::EndIf
                | Opcode::DepStart
                | Opcode::DepCase
                | Opcode::DepExec
                | Opcode::DepElse
                | Opcode::DepEnd
        )
    }
}

/// Arithmetic, comparison and logical operations
///
/// Operands are popped in reverse push order: the right-hand side is on
/// top of the stack. Words are compared and computed as signed numbers and
/// booleans are 1 and 0.
use crate::interpreter::core::instruction::{Aword, Opcode};
use crate::interpreter::core::interpreter::{ExecutionResult, Interpreter, Interrupt};
use log::debug;

impl Interpreter {
    /// Handle mathematical and logical opcodes
    pub fn execute_math_op(&mut self, op: Opcode) -> Result<ExecutionResult, Interrupt> {
        match op {
            Opcode::Not => {
                let value = self.vm.pop_bool()?;
                self.vm.push_bool(!value)?;
            }
            Opcode::UMinus => {
                let value = self.vm.pop_signed()?;
                self.vm.push(value.wrapping_neg() as Aword)?;
            }
            Opcode::Rnd => {
                let high = self.vm.pop_signed()?;
                let low = self.vm.pop_signed()?;
                let value = self.rng.random_in_range(low, high);
                debug!("rnd {low}..{high} = {value}");
                self.vm.push(value as Aword)?;
            }
            Opcode::Btw => {
                let high = self.vm.pop_signed()?;
                let low = self.vm.pop_signed()?;
                let value = self.vm.pop_signed()?;
                let (low, high) = if low <= high { (low, high) } else { (high, low) };
                self.vm.push_bool((low..=high).contains(&value))?;
            }
            _ => {
                let rh = self.vm.pop_signed()?;
                let lh = self.vm.pop_signed()?;
                let result = Self::binary(op, lh, rh)?;
                self.vm.push(result as Aword)?;
            }
        }
        Ok(ExecutionResult::Continue)
    }

    fn binary(op: Opcode, lh: i32, rh: i32) -> Result<i32, String> {
        Ok(match op {
            Opcode::And => (lh != 0 && rh != 0) as i32,
            Opcode::Or => (lh != 0 || rh != 0) as i32,
            Opcode::Ne => (lh != rh) as i32,
            Opcode::Eq => (lh == rh) as i32,
            Opcode::Le => (lh <= rh) as i32,
            Opcode::Ge => (lh >= rh) as i32,
            Opcode::Lt => (lh < rh) as i32,
            Opcode::Gt => (lh > rh) as i32,
            Opcode::Plus => lh.wrapping_add(rh),
            Opcode::Minus => lh.wrapping_sub(rh),
            Opcode::Mult => lh.wrapping_mul(rh),
            Opcode::Div => {
                if rh == 0 {
                    return Err(format!("Division by zero ({lh} / 0)"));
                }
                lh.wrapping_div(rh)
            }
            _ => return Err(format!("Unhandled math opcode {op}")),
        })
    }

    /// Check if an opcode is a math operation
    pub fn is_math_opcode(op: Opcode) -> bool {
        matches!(
            op,
            Opcode::And
                | Opcode::Or
                | Opcode::Ne
                | Opcode::Eq
                | Opcode::Le
                | Opcode::Ge
                | Opcode::Lt
                | Opcode::Gt
                | Opcode::Plus
                | Opcode::Minus
                | Opcode::Mult
                | Opcode::Div
                | Opcode::Not
                | Opcode::UMinus
                | Opcode::Rnd
                | Opcode::Btw
        )
    }
}

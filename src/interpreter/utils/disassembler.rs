use crate::interpreter::core::instruction::{Aword, Instruction, Opcode};
use std::fmt::Write;

pub struct Disassembler<'a> {
    memory: &'a [Aword],
}

impl<'a> Disassembler<'a> {
    pub fn new(memory: &'a [Aword]) -> Self {
        Disassembler { memory }
    }

    /// Render the instruction at `addr` as "addr: word  text"
    pub fn instruction_at(&self, addr: Aword) -> String {
        match self.memory.get(addr as usize) {
            Some(&word) => match Instruction::decode(word) {
                Ok(inst) => format!("{addr:5}: {word:08x}  {inst}"),
                Err(e) => format!("{addr:5}: {word:08x}  ??? ({e})"),
            },
            None => format!("{addr:5}: <out of memory>"),
        }
    }

    /// Render a block from `addr` through its first RETURN
    pub fn block(&self, addr: Aword) -> String {
        let mut output = String::new();
        let return_word = Opcode::Return.word();
        let mut pc = addr;
        while let Some(&word) = self.memory.get(pc as usize) {
            let _ = writeln!(output, "{}", self.instruction_at(pc));
            pc += 1;
            if word == return_word {
                break;
            }
        }
        output
    }
}

/// Disassemble one instruction for trace logs
pub fn disassemble(memory: &[Aword], addr: Aword) -> String {
    Disassembler::new(memory).instruction_at(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn block_stops_after_return() {
        let memory = vec![
            0,
            Instruction::Constant(-3i32 as Aword).encode(),
            Opcode::SayInt.word(),
            Opcode::Return.word(),
            Opcode::Quit.word(),
        ];
        let text = Disassembler::new(&memory).block(1);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("CONST -3"));
        assert!(lines[2].ends_with("RETURN"));
        assert!(disassemble(&memory, 9).contains("out of memory"));
    }
}

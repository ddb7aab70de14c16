//! Forward scans for structured control flow
//!
//! Acode has no jump offsets. IF/ELSE/ENDIF and the DEPENDING statement
//! are executed by scanning forward for the matching marker word, counting
//! nested constructs of the same kind on the way.
use crate::interpreter::core::instruction::{Aword, Opcode};

/// Scan memory from `pc` for the first of `stops` at nesting depth zero.
/// `nest` is the (open, close) pair that brackets inner constructs.
/// Returns the marker's address and which marker was found.
pub fn scan_forward(
    memory: &[Aword],
    pc: usize,
    nest: (Opcode, Opcode),
    stops: &[Opcode],
) -> Result<(usize, Opcode), String> {
    let (open, close) = (nest.0.word(), nest.1.word());
    let mut depth = 0usize;
    for (addr, &word) in memory.iter().enumerate().skip(pc) {
        if word == open {
            depth += 1;
        } else if depth > 0 {
            if word == close {
                depth -= 1;
            }
        } else if let Some(&op) = stops.iter().find(|op| op.word() == word) {
            return Ok((addr, op));
        }
    }
    Err(format!(
        "No matching {} from address {pc}",
        stops
            .iter()
            .map(|op| op.mnemonic())
            .collect::<Vec<_>>()
            .join("/")
    ))
}

/// Where execution continues after a false IF: past the matching ELSE or ENDIF
pub fn skip_if_false(memory: &[Aword], pc: usize) -> Result<usize, String> {
    let (addr, _) = scan_forward(
        memory,
        pc,
        (Opcode::If, Opcode::EndIf),
        &[Opcode::Else, Opcode::EndIf],
    )?;
    Ok(addr + 1)
}

/// Where execution continues when the THEN part runs into ELSE
pub fn skip_else(memory: &[Aword], pc: usize) -> Result<usize, String> {
    let (addr, _) = scan_forward(memory, pc, (Opcode::If, Opcode::EndIf), &[Opcode::EndIf])?;
    Ok(addr + 1)
}

/// Where execution continues after a false DEPEXEC guard: the next case's
/// guard, the ELSE statements, or the DEPEND itself so the switch value
/// gets popped
pub fn next_case(memory: &[Aword], pc: usize) -> Result<usize, String> {
    let (addr, op) = scan_forward(
        memory,
        pc,
        (Opcode::DepStart, Opcode::DepEnd),
        &[Opcode::DepCase, Opcode::DepElse, Opcode::DepEnd],
    )?;
    Ok(if op == Opcode::DepEnd { addr } else { addr + 1 })
}

/// Where execution continues when a case's statements run into the next
/// DEPCASE or DEPELSE: at the DEPEND
pub fn end_of_depending(memory: &[Aword], pc: usize) -> Result<usize, String> {
    let (addr, _) = scan_forward(
        memory,
        pc,
        (Opcode::DepStart, Opcode::DepEnd),
        &[Opcode::DepEnd],
    )?;
    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::core::instruction::Instruction;
    use test_log::test;

    fn c(v: Aword) -> Aword {
        Instruction::Constant(v).encode()
    }

    #[test]
    fn if_scans_skip_nested_blocks() {
        // 0:IF 1:c 2:IF 3:ELSE 4:ENDIF 5:ELSE 6:c 7:ENDIF
        let memory = vec![
            Opcode::If.word(),
            c(1),
            Opcode::If.word(),
            Opcode::Else.word(),
            Opcode::EndIf.word(),
            Opcode::Else.word(),
            c(2),
            Opcode::EndIf.word(),
        ];
        assert_eq!(skip_if_false(&memory, 1).unwrap(), 6);
        assert_eq!(skip_else(&memory, 6).unwrap(), 8);
    }

    #[test]
    fn constants_never_look_like_markers() {
        let memory = vec![c(Opcode::EndIf as Aword), Opcode::EndIf.word()];
        assert_eq!(skip_else(&memory, 0).unwrap(), 2);
    }

    #[test]
    fn depending_cases() {
        // 0:DEPSTART 1:DEPEXEC 2:DEPSTART 3:DEPCASE 4:DEPEND 5:DEPCASE 6:DEPEXEC 7:DEPELSE 8:DEPEND
        let memory = vec![
            Opcode::DepStart.word(),
            Opcode::DepExec.word(),
            Opcode::DepStart.word(),
            Opcode::DepCase.word(),
            Opcode::DepEnd.word(),
            Opcode::DepCase.word(),
            Opcode::DepExec.word(),
            Opcode::DepElse.word(),
            Opcode::DepEnd.word(),
        ];
        assert_eq!(next_case(&memory, 2).unwrap(), 6);
        assert_eq!(next_case(&memory, 7).unwrap(), 8);
        assert_eq!(end_of_depending(&memory, 2).unwrap(), 8);
    }

    #[test]
    fn unmatched_markers_are_fatal() {
        let memory = vec![Opcode::If.word(), c(0)];
        assert!(skip_if_false(&memory, 1).is_err());
    }
}

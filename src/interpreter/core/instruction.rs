//! Acode instruction words
//!
//! Every instruction occupies exactly one 32-bit word. The top four bits
//! select the instruction class and the low 28 bits carry the operand:
//! - class 0: statement operation, operand is the opcode number
//! - class 1: constant, operand is a sign-extended 28-bit immediate
//! - class 3: current variable access, operand selects the variable
use std::collections::HashMap;
use std::fmt;

/// A word of acode memory
pub type Aword = u32;

/// Table terminator used by the score table in save files
pub const EOF_WORD: Aword = 0xFFFF_FFFF;

const CLASS_SHIFT: u32 = 28;
const OPERAND_MASK: Aword = 0x0FFF_FFFF;
const SIGN_BIT: Aword = 0x0800_0000;
const CLASS_STATEMENT: Aword = 0;
const CLASS_CONSTANT: Aword = 1;
const CLASS_CURVAR: Aword = 3;

/// Set in a current-variable instruction to store instead of load
const CURVAR_WRITE: Aword = 0x0100_0000;

/// The well-known pseudo-variables reachable without the operand stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurVar {
    /// Parameter of the current command, 1-based index in bits 8-15
    Param,
    CurLoc,
    CurAct,
    CurVrb,
    Score,
    Tick,
}

impl CurVar {
    pub fn from_number(n: u8) -> Option<CurVar> {
        match n {
            1 => Some(CurVar::Param),
            2 => Some(CurVar::CurLoc),
            3 => Some(CurVar::CurAct),
            4 => Some(CurVar::CurVrb),
            5 => Some(CurVar::Score),
            6 => Some(CurVar::Tick),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            CurVar::Param => 1,
            CurVar::CurLoc => 2,
            CurVar::CurAct => 3,
            CurVar::CurVrb => 4,
            CurVar::Score => 5,
            CurVar::Tick => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CurVar::Param => "param",
            CurVar::CurLoc => "curloc",
            CurVar::CurAct => "curact",
            CurVar::CurVrb => "curvrb",
            CurVar::Score => "score",
            CurVar::Tick => "tick",
        }
    }
}

macro_rules! opcodes {
    ($($name:ident = $num:literal => $mnemonic:literal),* $(,)?) => {
        /// Statement operations
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $($name = $num),*
        }

        /// Every opcode in numeric order
        pub const ALL_OPCODES: &[Opcode] = &[$(Opcode::$name),*];

        impl Opcode {
            pub fn from_number(n: Aword) -> Option<Opcode> {
                match n {
                    $($num => Some(Opcode::$name),)*
                    _ => None,
                }
            }

            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$name => $mnemonic),*
                }
            }
        }
    };
}

opcodes! {
    Print = 1 => "PRINT",
    Quit = 2 => "QUIT",
    Look = 3 => "LOOK",
    Save = 4 => "SAVE",
    Restore = 5 => "RESTORE",
    List = 6 => "LIST",
    Empty = 7 => "EMPTY",
    Schedule = 8 => "SCHEDULE",
    Cancel = 9 => "CANCEL",
    Make = 10 => "MAKE",
    Set = 11 => "SET",
    StrSet = 12 => "STRSET",
    Incr = 13 => "INCR",
    Decr = 14 => "DECR",
    Locate = 15 => "LOCATE",
    Use = 16 => "USE",
    In = 17 => "IN",
    Describe = 18 => "DESCRIBE",
    Say = 19 => "SAY",
    SayInt = 20 => "SAYINT",
    SayStr = 21 => "SAYSTR",
    If = 22 => "IF",
    Else = 23 => "ELSE",
    EndIf = 24 => "ENDIF",
    Attribute = 25 => "ATTRIBUTE",
    StrAttr = 26 => "STRATTR",
    Here = 27 => "HERE",
    Near = 28 => "NEAR",
    Where = 29 => "WHERE",
    And = 30 => "AND",
    Or = 31 => "OR",
    Ne = 32 => "NE",
    Eq = 33 => "EQ",
    StrEq = 34 => "STREQ",
    StrExact = 35 => "STREXACT",
    Le = 36 => "LE",
    Ge = 37 => "GE",
    Lt = 38 => "LT",
    Gt = 39 => "GT",
    Plus = 40 => "PLUS",
    Minus = 41 => "MINUS",
    Mult = 42 => "MULT",
    Div = 43 => "DIV",
    Not = 44 => "NOT",
    UMinus = 45 => "UMINUS",
    Rnd = 46 => "RND",
    Sum = 47 => "SUM",
    Max = 48 => "MAX",
    Count = 49 => "COUNT",
    Return = 50 => "RETURN",
    Restart = 51 => "RESTART",
    Btw = 52 => "BTW",
    Contains = 53 => "CONTAINS",
    DepStart = 54 => "DEPSTART",
    DepCase = 55 => "DEPCASE",
    DepExec = 56 => "DEPEXEC",
    DepElse = 57 => "DEPELSE",
    DepEnd = 58 => "DEPEND",
    Score = 59 => "SCORE",
    Visits = 60 => "VISITS",
    Call = 61 => "CALL",
    Arg = 62 => "ARG",
    Dup = 63 => "DUP",
    Pop = 64 => "POP",
    GetStr = 65 => "GETSTR",
    Match = 66 => "MATCH",
    Class = 67 => "CLASS",
    Yorn = 68 => "YORN",
    Newline = 69 => "NEWLINE",
}

lazy_static! {
    static ref MNEMONICS: HashMap<&'static str, Opcode> = {
        let mut m = HashMap::new();
        for op in ALL_OPCODES {
            m.insert(op.mnemonic(), *op);
        }
        m
    };
}

impl Opcode {
    /// Look up an opcode by its (case-insensitive) mnemonic
    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        MNEMONICS.get(name.to_ascii_uppercase().as_str()).copied()
    }

    /// The encoded statement word for this opcode
    pub fn word(self) -> Aword {
        Instruction::Statement(self).encode()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded instruction word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Constant(Aword),
    ReadVar { var: CurVar, index: u8 },
    WriteVar { var: CurVar, index: u8 },
    Statement(Opcode),
}

impl Instruction {
    /// Decode one instruction word. Unknown classes, variables and opcodes
    /// mean corrupted game data.
    pub fn decode(word: Aword) -> Result<Instruction, String> {
        let operand = word & OPERAND_MASK;
        match word >> CLASS_SHIFT {
            CLASS_STATEMENT => Opcode::from_number(operand)
                .map(Instruction::Statement)
                .ok_or_else(|| format!("Unknown opcode {operand}")),
            CLASS_CONSTANT => {
                let value = if operand & SIGN_BIT != 0 {
                    operand | !OPERAND_MASK
                } else {
                    operand
                };
                Ok(Instruction::Constant(value))
            }
            CLASS_CURVAR => {
                let var = CurVar::from_number((operand & 0xFF) as u8)
                    .ok_or_else(|| format!("Unknown current variable {}", operand & 0xFF))?;
                let index = ((operand >> 8) & 0xFF) as u8;
                if operand & CURVAR_WRITE != 0 {
                    Ok(Instruction::WriteVar { var, index })
                } else {
                    Ok(Instruction::ReadVar { var, index })
                }
            }
            class => Err(format!(
                "Unknown instruction class {class} in word 0x{word:08x}"
            )),
        }
    }

    pub fn encode(&self) -> Aword {
        match *self {
            Instruction::Statement(op) => (CLASS_STATEMENT << CLASS_SHIFT) | op as Aword,
            Instruction::Constant(value) => {
                (CLASS_CONSTANT << CLASS_SHIFT) | (value & OPERAND_MASK)
            }
            Instruction::ReadVar { var, index } => {
                (CLASS_CURVAR << CLASS_SHIFT) | ((index as Aword) << 8) | var.number() as Aword
            }
            Instruction::WriteVar { var, index } => {
                (CLASS_CURVAR << CLASS_SHIFT)
                    | CURVAR_WRITE
                    | ((index as Aword) << 8)
                    | var.number() as Aword
            }
        }
    }

    /// Whether a constant fits the 28-bit signed immediate
    pub fn constant_fits(value: i32) -> bool {
        (-(1 << 27)..(1 << 27)).contains(&value)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Constant(v) => write!(f, "CONST {}", *v as i32),
            Instruction::ReadVar { var: CurVar::Param, index } => write!(f, "LOAD param{index}"),
            Instruction::ReadVar { var, .. } => write!(f, "LOAD {}", var.name()),
            Instruction::WriteVar { var: CurVar::Param, index } => {
                write!(f, "STORE param{index}")
            }
            Instruction::WriteVar { var, .. } => write!(f, "STORE {}", var.name()),
            Instruction::Statement(op) => write!(f, "{op}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn negative_constants_are_sign_extended() {
        let word = Instruction::Constant(-5i32 as Aword).encode();
        assert_eq!(word >> 28, 1);
        assert_eq!(Instruction::decode(word).unwrap(), Instruction::Constant(-5i32 as Aword));
    }

    #[test]
    fn param_index_survives_encoding() {
        let inst = Instruction::ReadVar {
            var: CurVar::Param,
            index: 2,
        };
        assert_eq!(Instruction::decode(inst.encode()).unwrap(), inst);
        let store = Instruction::WriteVar {
            var: CurVar::Score,
            index: 0,
        };
        assert_eq!(Instruction::decode(store.encode()).unwrap(), store);
    }

    #[test]
    fn unknown_opcode_is_an_error() {
        assert!(Instruction::decode(0x0000_0FFF).is_err());
        assert!(Instruction::decode(0).is_err());
        assert!(Instruction::decode(EOF_WORD).is_err());
    }

    #[test]
    fn mnemonics_cover_every_opcode() {
        assert_eq!(ALL_OPCODES.len(), 69);
        for op in ALL_OPCODES {
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(*op));
            assert_eq!(Opcode::from_number(*op as Aword), Some(*op));
        }
        assert_eq!(Opcode::from_mnemonic("depexec"), Some(Opcode::DepExec));
    }
}

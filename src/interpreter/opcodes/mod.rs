//! Executor: statement operations grouped by family, each an
//! `impl Interpreter` block
pub mod opcodes_math;
pub mod opcodes_meta;
pub mod opcodes_stack;
pub mod opcodes_text;
pub mod opcodes_world;

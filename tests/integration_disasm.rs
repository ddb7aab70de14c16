//! Integration tests for the disassembler
//!
//! A game is built, written out as an image and loaded back, then its
//! start block is disassembled the way `alandasm -a` prints it.

use alanvm::interpreter::core::builder::{Assembler, GameBuilder};
use alanvm::interpreter::core::game::Game;
use alanvm::interpreter::core::instruction::{CurVar, Opcode};
use alanvm::interpreter::utils::disassembler::Disassembler;
use test_log::test;

fn loaded_game() -> Game {
    let mut b = GameBuilder::new("disasm");
    b.location("Hall");
    b.start(Assembler::with(|a| {
        a.text("Welcome.");
        a.constant(-42).op(Opcode::SayInt);
        a.read(CurVar::Score).op(Opcode::SayInt);
        a.param(2).op(Opcode::Pop);
    }));
    let game = b.build().unwrap();
    Game::from_image(&game.to_image()).unwrap()
}

#[test]
fn start_block_disassembles_through_return() {
    let game = loaded_game();
    let text = Disassembler::new(&game.memory).block(game.header.start);
    let ops: Vec<&str> = text
        .lines()
        .map(|line| line.rsplit("  ").next().unwrap())
        .collect();
    assert_eq!(
        ops,
        vec![
            // "Hall" and "you" come first in the text region
            "CONST 7",
            "CONST 8",
            "PRINT",
            "CONST -42",
            "SAYINT",
            "LOAD score",
            "SAYINT",
            "LOAD param2",
            "POP",
            "RETURN",
        ]
    );
}

#[test]
fn every_line_carries_its_address() {
    let game = loaded_game();
    let start = game.header.start;
    let text = Disassembler::new(&game.memory).block(start);
    let first = text.lines().next().unwrap();
    assert!(first.trim_start().starts_with(&format!("{start}:")));
    assert_eq!(text.lines().count(), 10);
}

#[test]
fn words_past_the_end_are_reported() {
    let game = loaded_game();
    let end = game.memory.len() as u32;
    let line = Disassembler::new(&game.memory).instruction_at(end);
    assert!(line.contains("out of memory"));
}

//! Integration tests for gameplay
//!
//! A small two-room game is built in memory and played through the full
//! turn loop with scripted input. The tests check what the player sees
//! and the world state left behind.

use alanvm::interpreter::core::builder::{
    AltSpec, Assembler, ContainerSpec, ExitSpec, GameBuilder, ScriptSpec,
};
use alanvm::interpreter::core::game::Game;
use alanvm::interpreter::core::instruction::{Aword, Opcode};
use alanvm::interpreter::core::interpreter::Interpreter;
use alanvm::interpreter::display::display_headless::HeadlessDisplay;
use alanvm::interpreter::input::input_scripted::ScriptedInput;
use alanvm::interpreter::savegame::save_state;
use alanvm::interpreter::utils::config::EngineConfig;
use alanvm::interpreter::utils::storage::MemoryStorage;
use test_log::test;

// ids: objects 1..=3, locations 4..=5, actors 6..=7
const BALL: Aword = 1;
const KEY: Aword = 2;
const BOX: Aword = 3;
const HALL: Aword = 4;
const GARDEN: Aword = 5;
const HERO: Aword = 6;

const TAKE: Aword = 1;
const STUFF: Aword = 2;
const WAIT: Aword = 3;
const RING: Aword = 4;
const SAVE: Aword = 5;
const RESTORE: Aword = 6;
const GO: Aword = 7;
const EXAMINE: Aword = 8;
const QUIT: Aword = 9;
const RESTART: Aword = 10;

const EAST: Aword = 1;
const WEST: Aword = 2;

const WEIGHT: Aword = 1;

fn cottage(name: &str) -> Game {
    let mut b = GameBuilder::new(name);
    let hero = b.hero();
    let hall = b.location("Hall");
    let garden = b.location("Garden");
    let ball = b.object("ball", hall);
    let key = b.object("key", hall);
    let chest = b.object("box", hall);
    let cat = b.actor("cat", hall);

    b.describe(hall, Assembler::with(|a| {
        a.text("A dusty hall.");
    }));
    b.describe(garden, Assembler::with(|a| {
        a.text("A lush garden.");
    }));
    b.exit(hall, ExitSpec::new(EAST, Some(garden)));
    b.exit(garden, ExitSpec::new(WEST, Some(hall)));

    b.attribute(WEIGHT, 1);
    b.container(hero, ContainerSpec::new());
    b.container(
        chest,
        ContainerSpec::new().limit(
            WEIGHT,
            1,
            Assembler::with(|a| {
                a.text("The box is full.");
            }),
        ),
    );

    b.script(
        cat,
        ScriptSpec::new(1)
            .step(
                0,
                Assembler::new(),
                Assembler::with(|a| {
                    a.text("The cat yawns.");
                }),
            )
            .step(
                0,
                Assembler::new(),
                Assembler::with(|a| {
                    a.text("The cat stretches.");
                }),
            ),
    );
    b.start(Assembler::with(|a| {
        a.entity(cat).constant(1).op(Opcode::Use);
    }));

    let chime = b.event(Assembler::with(|a| {
        a.text("The clock chimes.");
    }));
    b.rule(
        Assembler::with(|a| {
            a.entity(ball).entity(hero).op(Opcode::In);
        }),
        Assembler::with(|a| {
            a.text("You feel lucky.");
        }),
    );

    b.standard_words();
    b.noun("ball", ball);
    b.noun("key", key);
    b.noun("box", chest);
    b.verb("take", TAKE);
    b.verb("stuff", STUFF);
    b.verb("wait", WAIT);
    b.verb("ring", RING);
    b.verb("save", SAVE);
    b.verb("restore", RESTORE);
    b.verb("examine", EXAMINE);
    b.verb("quit", QUIT);
    b.verb("restart", RESTART);
    b.motion_verb("go", GO);
    b.direction("east", EAST);
    b.direction("west", WEST);
    b.syntax(TAKE, true);
    b.syntax(STUFF, true);
    b.syntax(WAIT, false);
    b.syntax(RING, false);
    b.syntax(SAVE, false);
    b.syntax(RESTORE, false);
    b.syntax(EXAMINE, true);
    b.syntax(QUIT, false);
    b.syntax(RESTART, false);

    b.global_verb(AltSpec::new(TAKE).action(Assembler::with(|a| {
        a.param(1).entity(hero).op(Opcode::Locate);
        a.text("Taken.");
    })));
    b.global_verb(AltSpec::new(STUFF).action(Assembler::with(|a| {
        a.param(1).entity(chest).op(Opcode::Locate);
        a.text("Done.");
    })));
    b.global_verb(AltSpec::new(WAIT).action(Assembler::with(|a| {
        a.text("Time passes.");
    })));
    b.global_verb(AltSpec::new(RING).action(Assembler::with(|a| {
        for _ in 0..2 {
            a.constant(chime as i32).entity(hall).constant(0);
            a.op(Opcode::Schedule);
        }
    })));
    b.global_verb(AltSpec::new(EXAMINE).action(Assembler::with(|a| {
        a.text("You see");
        a.param(1).op(Opcode::Say);
        a.text(".");
    })));
    b.global_verb(AltSpec::new(QUIT).action(Assembler::with(|a| {
        a.op(Opcode::Quit);
    })));
    b.global_verb(AltSpec::new(RESTART).action(Assembler::with(|a| {
        a.op(Opcode::Restart);
    })));
    b.global_verb(AltSpec::new(SAVE).action(Assembler::with(|a| {
        a.op(Opcode::Save);
    })));
    b.global_verb(AltSpec::new(RESTORE).action(Assembler::with(|a| {
        a.op(Opcode::Restore);
    })));

    b.build().expect("the cottage builds")
}

struct Session {
    interpreter: Interpreter,
    display: HeadlessDisplay,
    storage: MemoryStorage,
}

fn session(game: Game, lines: &[&str]) -> Session {
    let display = HeadlessDisplay::new();
    let storage = MemoryStorage::new();
    let mut interpreter = Interpreter::new(
        game,
        EngineConfig::default(),
        Box::new(display.clone()),
        Box::new(ScriptedInput::new(lines.iter().copied())),
    );
    interpreter.set_storage(Box::new(storage.clone()));
    Session {
        interpreter,
        display,
        storage,
    }
}

fn play(lines: &[&str]) -> Session {
    let mut s = session(cottage("cottage"), lines);
    s.interpreter.run().expect("the game ends normally");
    s
}

fn location_of(s: &Session, id: Aword) -> Aword {
    s.interpreter.vm.world.parent(id).unwrap()
}

#[test]
fn starting_shows_the_first_location() {
    let s = play(&[]);
    let out = s.display.get_output();
    assert!(out.starts_with("Hall."), "got: {out}");
    assert_eq!(s.display.count("A dusty hall."), 1);
    assert!(out.contains("There is a ball, a key and a box here."));
    assert!(out.contains("The box is empty."));
    assert!(out.contains("cat is here."));
}

#[test]
fn moving_shows_the_new_location_once() {
    let s = play(&["go east", "east", "west"]);
    assert_eq!(s.display.count("A lush garden."), 1);
    assert_eq!(s.display.count("You can't go that way."), 1);
    assert_eq!(s.display.count("A dusty hall."), 2);
    assert_eq!(location_of(&s, HERO), HALL);
}

#[test]
fn exits_move_the_hero() {
    let s = play(&["go east"]);
    assert_eq!(location_of(&s, HERO), GARDEN);
    assert_eq!(s.interpreter.vm.world.cur.loc, GARDEN);
}

#[test]
fn a_missing_exit_does_not_use_up_the_turn() {
    let s = play(&["west", "wait"]);
    assert_eq!(s.display.count("You can't go that way."), 1);
    assert_eq!(s.interpreter.vm.world.cur.tick, 2);
}

#[test]
fn several_objects_run_the_verb_for_each() {
    let s = play(&["take ball and key"]);
    assert_eq!(s.display.count("Taken."), 2);
    assert!(s.display.get_output().contains("ball: Taken."));
    assert_eq!(location_of(&s, BALL), HERO);
    assert_eq!(location_of(&s, KEY), HERO);
}

#[test]
fn a_full_container_refuses_more() {
    let s = play(&["stuff ball", "stuff key"]);
    assert_eq!(s.display.count("Done."), 1);
    assert_eq!(s.display.count("The box is full."), 1);
    assert_eq!(s.interpreter.vm.world.contents(BOX), vec![BALL]);
    assert_eq!(location_of(&s, KEY), HALL);
}

#[test]
fn scripted_actors_take_one_step_per_turn() {
    let s = play(&["wait", "wait", "wait"]);
    assert_eq!(s.display.count("The cat yawns."), 1);
    assert_eq!(s.display.count("The cat stretches."), 1);
    let out = s.display.get_output();
    assert!(out.find("yawns").unwrap() < out.find("stretches").unwrap());
    assert_eq!(s.interpreter.vm.world.actors[1].script, 0);
}

#[test]
fn rescheduling_an_event_keeps_one_entry() {
    let s = play(&["ring", "wait", "wait"]);
    assert_eq!(s.display.count("The clock chimes."), 1);
    assert!(s.interpreter.vm.world.queue.is_empty());
}

#[test]
fn when_rules_fire_once_per_change() {
    let s = play(&["take ball", "wait", "wait"]);
    assert_eq!(s.display.count("You feel lucky."), 1);
}

#[test]
fn restoring_brings_back_the_saved_world() {
    let s = play(&["take ball", "save", "slot", "stuff ball", "restore", "slot"]);
    assert!(s.storage.contains("slot"));
    assert_eq!(location_of(&s, BALL), HERO);
    assert_eq!(s.interpreter.vm.world.contents(BOX), Vec::<Aword>::new());
}

#[test]
fn an_empty_file_name_uses_the_game_name() {
    let s = play(&["save", ""]);
    assert!(s.storage.contains("cottage"));
}

#[test]
fn a_save_from_another_game_is_refused() {
    let other = cottage("mansion");
    let data = save_state(&other.world, &other.header);
    let mut s = session(cottage("cottage"), &["take key", "restore", "elsewhere"]);
    s.storage.insert("elsewhere", data);
    s.interpreter.run().unwrap();
    assert_eq!(s.display.count("That saved game is from another game."), 1);
    assert_eq!(location_of(&s, KEY), HERO);
}

#[test]
fn restoring_a_missing_file_says_so() {
    let s = play(&["restore", "nothing"]);
    assert_eq!(s.display.count("There is no saved game by that name."), 1);
}

#[test]
fn a_game_image_plays_the_same_after_reloading() {
    let lines = ["take ball", "go east", "go west", "stuff key"];
    let game = cottage("cottage");
    let reloaded = Game::from_image(&game.to_image()).unwrap();

    let mut first = session(game, &lines);
    first.interpreter.run().unwrap();
    let mut second = session(reloaded, &lines);
    second.interpreter.run().unwrap();
    assert_eq!(first.display.get_output(), second.display.get_output());
    assert_eq!(location_of(&second, BALL), HERO);
    assert_eq!(location_of(&second, HERO), HALL);
}

#[test]
fn it_does_not_outlive_a_number() {
    let s = play(&["examine 5", "examine it", "examine ball", "examine it"]);
    assert_eq!(s.display.count("I don't know what you mean by 'it'."), 1);
    assert_eq!(s.display.count("You see"), 3);
}

const QUIT_QUESTION: &str = "Do you want to RESTART, RESTORE or QUIT ?";

#[test]
fn quit_asks_until_it_gets_an_answer() {
    let s = play(&["quit", "maybe", "QUIT", "wait"]);
    assert_eq!(s.display.count(QUIT_QUESTION), 2);
    assert_eq!(s.display.count("Time passes."), 0);
}

#[test]
fn quit_ends_at_the_end_of_input() {
    let s = play(&["quit"]);
    assert_eq!(s.display.count(QUIT_QUESTION), 1);
}

#[test]
fn quit_then_restart_starts_over() {
    let s = play(&["take ball", "go east", "quit", "restart", "wait"]);
    assert_eq!(s.display.count("A dusty hall."), 2);
    assert_eq!(s.display.count("Time passes."), 1);
    assert_eq!(location_of(&s, BALL), HALL);
    assert_eq!(location_of(&s, HERO), HALL);
    assert_eq!(s.interpreter.vm.world.cur.tick, 2);
}

#[test]
fn quit_then_restore_resumes_the_saved_game() {
    let s = play(&[
        "take ball",
        "save",
        "slot",
        "stuff ball",
        "quit",
        "restore",
        "slot",
        "wait",
    ]);
    assert_eq!(s.display.count(QUIT_QUESTION), 1);
    assert_eq!(s.display.count("Time passes."), 1);
    assert_eq!(location_of(&s, BALL), HERO);
    assert!(s.interpreter.vm.world.contents(BOX).is_empty());
}

#[test]
fn a_failed_restore_asks_again() {
    let s = play(&["quit", "restore", "nothing", "quit"]);
    assert_eq!(s.display.count("There is no saved game by that name."), 1);
    assert_eq!(s.display.count(QUIT_QUESTION), 2);
}

#[test]
fn restart_puts_the_world_back() {
    let s = play(&["take ball", "stuff key", "go east", "restart"]);
    assert_eq!(s.display.count("A dusty hall."), 2);
    assert_eq!(location_of(&s, HERO), HALL);
    assert_eq!(location_of(&s, BALL), HALL);
    assert_eq!(location_of(&s, KEY), HALL);
    assert!(s.interpreter.vm.world.contents(BOX).is_empty());
    // input runs out before the cat's first turn after the restart
    assert_eq!(s.interpreter.vm.world.cur.tick, 1);
    assert_eq!(s.interpreter.vm.world.actors[1].step, 0);
}

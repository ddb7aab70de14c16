use super::*;
use crate::interpreter::core::builder::{Assembler, ContainerSpec, GameBuilder};
use crate::interpreter::core::instruction::Opcode;
use crate::interpreter::display::display_headless::HeadlessDisplay;
use crate::interpreter::input::input_scripted::ScriptedInput;
use test_log::test;

fn interpreter_for(b: GameBuilder) -> (Interpreter, HeadlessDisplay) {
    let game = b.build().unwrap();
    let display = HeadlessDisplay::new();
    let config = EngineConfig {
        random_seed: Some(7),
        ..EngineConfig::default()
    };
    let mut interp = Interpreter::new(
        game,
        config,
        Box::new(display.clone()),
        Box::new(ScriptedInput::default()),
    );
    let hero = interp.vm.world.hero();
    interp.vm.world.cur.act = hero;
    interp.vm.world.cur.loc = interp.vm.world.where_is(hero).unwrap();
    (interp, display)
}

/// Run `code` as an event block in a one-room game
fn run(code: Assembler) -> (Result<(), Interrupt>, Interpreter, HeadlessDisplay) {
    let mut b = GameBuilder::new("test");
    b.location("Hall");
    b.event(code);
    let (mut interp, display) = interpreter_for(b);
    let addr = interp.vm.world.events[0];
    let result = interp.interpret(addr);
    (result, interp, display)
}

fn output_of(code: Assembler) -> String {
    let (result, interp, display) = run(code);
    assert_eq!(result, Ok(()));
    assert!(interp.vm.stack.is_empty(), "stack left: {:?}", interp.vm.stack);
    display.get_output()
}

#[test]
fn false_if_runs_only_the_else_branch() {
    let out = output_of(Assembler::with(|a| {
        a.boolean(false).op(Opcode::If);
        a.boolean(true).op(Opcode::If).text("inner").op(Opcode::EndIf);
        a.text("then");
        a.op(Opcode::Else);
        a.text("else");
        a.op(Opcode::EndIf);
    }));
    assert_eq!(out, "else");
}

#[test]
fn true_if_skips_the_else_branch_and_its_nested_ifs() {
    let out = output_of(Assembler::with(|a| {
        a.boolean(true).op(Opcode::If).text("then");
        a.op(Opcode::Else);
        a.boolean(true).op(Opcode::If).text("x");
        a.op(Opcode::Else).text("y").op(Opcode::EndIf);
        a.op(Opcode::EndIf);
        a.text("after");
    }));
    assert_eq!(out, "then after");
}

fn depending(value: i32) -> Assembler {
    Assembler::with(|a| {
        a.constant(value).op(Opcode::DepStart);
        a.op(Opcode::Dup).constant(1).op(Opcode::Eq).op(Opcode::DepExec);
        a.text("one");
        a.op(Opcode::DepCase);
        a.op(Opcode::Dup).constant(2).op(Opcode::Eq).op(Opcode::DepExec);
        a.boolean(false).op(Opcode::If).text("never").op(Opcode::EndIf);
        a.text("two");
        a.op(Opcode::DepElse);
        a.text("other");
        a.op(Opcode::DepEnd);
    })
}

#[test]
fn depending_runs_exactly_one_case() {
    assert_eq!(output_of(depending(1)), "one");
    assert_eq!(output_of(depending(2)), "two");
    assert_eq!(output_of(depending(5)), "other");
}

#[test]
fn called_blocks_see_their_arguments_and_return_a_value() {
    let mut b = GameBuilder::new("test");
    b.location("Hall");
    let minus = b.block(Assembler::with(|a| {
        a.constant(1).op(Opcode::Arg);
        a.constant(2).op(Opcode::Arg);
        a.op(Opcode::Minus);
    }));
    b.event(Assembler::with(|a| {
        a.constant(10).constant(3).block(minus).constant(2).op(Opcode::Call);
        a.op(Opcode::SayInt);
    }));
    let (mut interp, display) = interpreter_for(b);
    let addr = interp.vm.world.events[0];
    interp.interpret(addr).unwrap();
    assert_eq!(display.get_output(), "7");
    assert!(interp.vm.stack.is_empty());
    assert!(interp.vm.call_stack.is_empty());
}

#[test]
fn arithmetic_is_signed() {
    let out = output_of(Assembler::with(|a| {
        a.constant(7).constant(2).op(Opcode::Div).op(Opcode::SayInt);
        a.constant(-7).constant(2).op(Opcode::Div).op(Opcode::SayInt);
        a.constant(-3).constant(5).op(Opcode::Lt).op(Opcode::SayInt);
        a.constant(4).constant(9).constant(1).op(Opcode::Btw).op(Opcode::SayInt);
        a.constant(6).op(Opcode::UMinus).op(Opcode::SayInt);
        a.boolean(true).boolean(false).op(Opcode::Or).op(Opcode::Not).op(Opcode::SayInt);
    }));
    assert_eq!(out, "3 -3 1 1 -6 0");
}

#[test]
fn random_numbers_stay_in_range() {
    let out = output_of(Assembler::with(|a| {
        for _ in 0..20 {
            a.constant(10).constant(3).op(Opcode::Rnd);
            a.constant(3).constant(10).op(Opcode::Btw).op(Opcode::SayInt);
        }
    }));
    assert_eq!(out, vec!["1"; 20].join(" "));
}

#[test]
fn division_by_zero_is_fatal_and_unwinds_the_stack() {
    let (result, interp, _) = run(Assembler::with(|a| {
        a.constant(99);
        a.constant(1).constant(0).op(Opcode::Div);
    }));
    assert!(matches!(result, Err(Interrupt::Fatal(m)) if m.contains("Division by zero")));
    assert!(interp.vm.stack.is_empty());
    assert_eq!(interp.pc(), 0);
}

#[test]
fn tick_is_read_only() {
    let (result, _, _) = run(Assembler::with(|a| {
        a.constant(5).write(CurVar::Tick);
    }));
    assert!(matches!(result, Err(Interrupt::Fatal(_))));
}

#[test]
fn stack_underflow_is_fatal() {
    let (result, _, _) = run(Assembler::with(|a| {
        a.op(Opcode::Pop);
    }));
    assert!(matches!(result, Err(Interrupt::Fatal(_))));
}

#[test]
fn current_variables_read_and_write() {
    let (result, interp, display) = run(Assembler::with(|a| {
        a.constant(12).write(CurVar::Score);
        a.read(CurVar::Score).op(Opcode::SayInt);
        a.read(CurVar::Tick).op(Opcode::SayInt);
    }));
    assert_eq!(result, Ok(()));
    assert_eq!(interp.vm.world.cur.score, 12);
    assert_eq!(display.get_output(), "12 0");
}

#[test]
fn string_comparisons_consume_their_operands() {
    let (result, interp, display) = run(Assembler::with(|a| {
        a.string("Hello").string("HELLO").op(Opcode::StrEq).op(Opcode::SayInt);
        a.string("Hello").string("HELLO").op(Opcode::StrExact).op(Opcode::SayInt);
        a.string("brass lamp").string("LAMP").op(Opcode::Contains).op(Opcode::SayInt);
        a.string("Shiny").op(Opcode::SayStr);
    }));
    assert_eq!(result, Ok(()));
    assert_eq!(display.get_output(), "1 0 1 Shiny");
    assert_eq!(interp.vm.world.strings.live_count(), 0);
}

#[test]
fn text_formatting_codes() {
    let out = output_of(Assembler::with(|a| {
        a.text("One$nTwo costs $$5 in the $l.");
    }));
    assert_eq!(out, "One\nTwo costs $5 in the Hall.");
}

#[test]
fn text_elsewhere_is_not_shown() {
    let mut b = GameBuilder::new("test");
    b.location("Hall");
    let yard = b.location("Yard");
    b.event(Assembler::with(|a| {
        a.text("Psst.");
        a.say(yard);
    }));
    let (mut interp, display) = interpreter_for(b);
    interp.vm.world.cur.loc = interp.vm.world.ranges.locations.min + 1;
    let addr = interp.vm.world.events[0];
    interp.interpret(addr).unwrap();
    assert_eq!(display.get_output(), "");
}

#[test]
fn no_code_is_a_no_op_and_no_condition_holds() {
    let (_, mut interp, _) = run(Assembler::new());
    assert_eq!(interp.interpret(0), Ok(()));
    assert_eq!(interp.evaluate(0), Ok(true));
}

#[test]
fn a_description_that_describes_itself_is_fatal() {
    let mut b = GameBuilder::new("test");
    let hall = b.location("Hall");
    let mirror = b.object("mirror", hall);
    let vase = b.object("vase", hall);
    b.describe(mirror, Assembler::with(|a| {
        a.text("A mirror shows");
        a.entity(mirror).op(Opcode::Describe);
    }));
    b.describe(vase, Assembler::with(|a| {
        a.text("A vase.");
    }));
    b.event(Assembler::with(|a| {
        a.entity(vase).op(Opcode::Describe);
        a.entity(vase).op(Opcode::Describe);
    }));
    b.event(Assembler::with(|a| {
        a.entity(mirror).op(Opcode::Describe);
    }));
    let (mut interp, display) = interpreter_for(b);

    let twice = interp.vm.world.events[0];
    assert_eq!(interp.interpret(twice), Ok(()));
    assert_eq!(display.count("A vase."), 2);

    let endless = interp.vm.world.events[1];
    let result = interp.interpret(endless);
    assert!(matches!(result, Err(Interrupt::Fatal(m)) if m.contains("Recursive DESCRIBE")));
    assert_eq!(display.count("A mirror shows"), 1);
    assert!(interp.describing.is_empty());
    assert!(interp.vm.stack.is_empty());
}

#[test]
fn yorn_reads_an_answer_and_end_of_input_is_no() {
    let mut b = GameBuilder::new("test");
    b.location("Hall");
    b.event(Assembler::with(|a| {
        a.op(Opcode::Yorn).op(Opcode::Yorn).op(Opcode::Yorn);
    }));
    let (mut interp, _) = interpreter_for(b);
    interp.input = Box::new(ScriptedInput::new(["  Yes please", "nope"]));
    let addr = interp.vm.world.events[0];
    assert_eq!(interp.interpret(addr), Ok(()));
    assert_eq!(interp.vm.stack, vec![1, 0, 0]);
}

#[test]
fn match_compares_the_words_the_player_used() {
    let mut b = GameBuilder::new("test");
    let hall = b.location("Hall");
    let ball = b.object("ball", hall);
    b.noun("ball", ball);
    b.adjective("red", ball);
    b.adjective("shiny", ball);
    b.event(Assembler::with(|a| {
        a.constant(1).word("red").op(Opcode::Match).op(Opcode::SayInt);
        a.constant(1).word("shiny").op(Opcode::Match).op(Opcode::SayInt);
    }));
    let (mut interp, display) = interpreter_for(b);
    let dictionary = &interp.vm.game.dictionary;
    let words = vec![
        dictionary.lookup("red").unwrap(),
        dictionary.lookup("ball").unwrap(),
    ];
    interp.params = vec![Param { code: 1, words }];
    let addr = interp.vm.world.events[0];
    assert_eq!(interp.interpret(addr), Ok(()));
    assert_eq!(display.get_output(), "1 0");
}

#[test]
fn match_without_that_parameter_is_fatal() {
    let (result, _, _) = run(Assembler::with(|a| {
        a.constant(2).constant(0).op(Opcode::Match);
    }));
    assert!(matches!(result, Err(Interrupt::Fatal(m)) if m.contains("MATCH")));
}

#[test]
fn empty_moves_every_item_out() {
    let mut b = GameBuilder::new("test");
    let hall = b.location("Hall");
    let chest = b.object("chest", hall);
    b.object("coin", chest);
    b.object("ring", chest);
    b.container(chest, ContainerSpec::new());
    b.event(Assembler::with(|a| {
        a.entity(chest).entity(hall).op(Opcode::Empty);
    }));
    let (mut interp, _) = interpreter_for(b);
    // ids: chest 1, coin 2, ring 3, hall 4
    assert_eq!(interp.vm.world.contents(1), vec![2, 3]);
    let addr = interp.vm.world.events[0];
    assert_eq!(interp.interpret(addr), Ok(()));
    assert!(interp.vm.world.contents(1).is_empty());
    assert_eq!(interp.vm.world.parent(2), Ok(4));
    assert_eq!(interp.vm.world.parent(3), Ok(4));
}

#[test]
fn a_count_limit_refuses_a_third_item() {
    let mut b = GameBuilder::new("test");
    let hall = b.location("Hall");
    let chest = b.object("chest", hall);
    b.object("apple", chest);
    b.object("pear", chest);
    let plum = b.object("plum", hall);
    b.container(
        chest,
        ContainerSpec::new().limit(
            0,
            2,
            Assembler::with(|a| {
                a.text("No room.");
            }),
        ),
    );
    b.event(Assembler::with(|a| {
        a.entity(plum).entity(chest).op(Opcode::Locate);
        a.text("Moved.");
    }));
    let (mut interp, display) = interpreter_for(b);
    // ids: chest 1, apple 2, pear 3, plum 4, hall 5
    let addr = interp.vm.world.events[0];
    assert_eq!(interp.interpret(addr), Err(Interrupt::Abort));
    assert_eq!(display.get_output(), "No room.");
    assert_eq!(interp.vm.world.contents(1), vec![2, 3]);
    assert_eq!(interp.vm.world.parent(4), Ok(5));
    assert!(interp.vm.stack.is_empty());
}

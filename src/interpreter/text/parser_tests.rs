use super::*;
use crate::interpreter::objects::entity::{EntityRanges, CLASS_ACTOR, CLASS_STRING};
use crate::interpreter::objects::world::AttributeMap;
use test_log::test;

// ids: objects 1..=4, locations 5..=6, actors 7..=8, literals 9..=10
const RED_BALL: Aword = 1;
const BLUE_BALL: Aword = 2;
const KEY: Aword = 3;
const LAMP: Aword = 4;
const HALL: Aword = 5;
const YARD: Aword = 6;
const BOB: Aword = 8;

const TAKE: Aword = 1;
const LOOK: Aword = 2;
const PUT: Aword = 3;
const GO: Aword = 4;
const SAY: Aword = 5;
const ATTACK: Aword = 6;
const EXAMINE: Aword = 7;

const IN: Aword = 1;
const EAST: Aword = 2;

struct Fixture {
    world: World,
    dictionary: Dictionary,
    syntaxes: Vec<SyntaxRule>,
}

impl Fixture {
    fn parse(&mut self, line: &str) -> Result<Command, ParseError> {
        parse(line, &self.dictionary, &self.syntaxes, &mut self.world, None)
    }

    fn parse_with_it(&mut self, line: &str, it: Aword) -> Result<Command, ParseError> {
        parse(line, &self.dictionary, &self.syntaxes, &mut self.world, Some(it))
    }
}

fn rule(verb: Aword, direct: bool, multiple: bool) -> SyntaxRule {
    SyntaxRule {
        verb,
        preposition: 0,
        direct,
        indirect: false,
        actor: false,
        multiple,
        restrictions: Vec::new(),
    }
}

fn fixture() -> Fixture {
    let mut world = World::new(EntityRanges::contiguous(4, 2, 2, 2), AttributeMap::new(), 4);
    for object in &mut world.objects {
        object.location = HALL;
    }
    world.objects[3].location = YARD;
    world.actors[0].location = HALL;
    world.actors[1].location = HALL;
    world.cur.loc = HALL;

    let mut dictionary = Dictionary::new();
    dictionary.add_phrase("take", TAKE, false).unwrap();
    dictionary.add_phrase("pick up", TAKE, false).unwrap();
    dictionary.add_phrase("look", LOOK, false).unwrap();
    dictionary.add_phrase("put", PUT, false).unwrap();
    dictionary.add_phrase("go", GO, true).unwrap();
    dictionary.add_phrase("say", SAY, false).unwrap();
    dictionary.add_phrase("attack", ATTACK, false).unwrap();
    dictionary.add_phrase("examine", EXAMINE, false).unwrap();
    dictionary.insert("the", WORD_ARTICLE, 0);
    dictionary.insert("and", WORD_CONJUNCTION, 0);
    dictionary.insert("but", WORD_BUT, 0);
    dictionary.insert("all", WORD_ALL, 0);
    dictionary.insert("it", WORD_IT, 0);
    dictionary.insert("in", WORD_PREPOSITION, IN);
    dictionary.insert("east", WORD_DIRECTION, EAST);
    dictionary.add_noun("ball", RED_BALL);
    dictionary.add_noun("ball", BLUE_BALL);
    dictionary.add_adjective("red", RED_BALL);
    dictionary.add_adjective("blue", BLUE_BALL);
    dictionary.add_noun("key", KEY);
    dictionary.add_noun("lamp", LAMP);
    dictionary.add_noun("bob", BOB);

    let syntaxes = vec![
        SyntaxRule {
            actor: true,
            ..rule(TAKE, true, true)
        },
        rule(LOOK, false, false),
        SyntaxRule {
            preposition: IN,
            indirect: true,
            ..rule(PUT, true, true)
        },
        SyntaxRule {
            restrictions: vec![Restriction {
                parameter: 1,
                classes: CLASS_STRING,
                failure: 0,
            }],
            ..rule(SAY, true, false)
        },
        SyntaxRule {
            restrictions: vec![Restriction {
                parameter: 1,
                classes: CLASS_ACTOR,
                failure: 300,
            }],
            ..rule(ATTACK, true, false)
        },
        rule(EXAMINE, true, false),
    ];
    Fixture {
        world,
        dictionary,
        syntaxes,
    }
}

fn codes(params: &[Param]) -> Vec<Aword> {
    params.iter().map(|p| p.code).collect()
}

#[test]
fn blank_input_is_empty() {
    let mut f = fixture();
    assert_eq!(f.parse("  ").unwrap_err(), ParseError::Empty);
    assert_eq!(f.parse("...").unwrap_err(), ParseError::Empty);
}

#[test]
fn unknown_words_are_named() {
    let mut f = fixture();
    let err = f.parse("take Xyzzy").unwrap_err();
    assert_eq!(err, ParseError::UnknownWord("xyzzy".to_string()));
    assert_eq!(err.to_string(), "I don't know the word 'xyzzy'.");
}

#[test]
fn verb_without_objects() {
    let mut f = fixture();
    let mut command = f.parse("look").unwrap();
    assert_eq!(command.action, Action::Verb(LOOK));
    assert_eq!(command.next_command(), Some(Vec::new()));
    assert_eq!(command.next_command(), None);
    assert_eq!(f.parse("take").unwrap_err(), ParseError::NotUnderstood);
}

#[test]
fn conjunction_runs_the_command_once_per_object() {
    let mut f = fixture();
    let mut command = f.parse("take the red ball and key").unwrap();
    assert_eq!(command.verb(), TAKE);
    assert!(command.is_multiple());
    assert_eq!(codes(&command.next_command().unwrap()), vec![RED_BALL]);
    assert_eq!(codes(&command.next_command().unwrap()), vec![KEY]);
    assert_eq!(command.next_command(), None);
}

#[test]
fn adjectives_disambiguate_and_words_are_kept() {
    let mut f = fixture();
    assert_eq!(
        f.parse("take ball").unwrap_err(),
        ParseError::Ambiguous("ball".to_string())
    );
    let command = f.parse("take blue ball").unwrap();
    let blue = f.dictionary.lookup("blue").unwrap();
    let ball = f.dictionary.lookup("ball").unwrap();
    assert_eq!(command.directs[0].code, BLUE_BALL);
    assert_eq!(command.directs[0].words, vec![blue, ball]);
}

#[test]
fn objects_elsewhere_cannot_be_seen() {
    let mut f = fixture();
    let err = f.parse("take lamp").unwrap_err();
    assert_eq!(err, ParseError::CantSee("lamp".to_string()));
    assert_eq!(err.to_string(), "I can't see any lamp here.");
}

#[test]
fn all_but_excludes_and_skips_what_is_elsewhere() {
    let mut f = fixture();
    let command = f.parse("take all but the key").unwrap();
    assert_eq!(codes(&command.directs), vec![RED_BALL, BLUE_BALL]);
    assert_eq!(
        f.parse("examine all").unwrap_err(),
        ParseError::NotMultiple("examine".to_string())
    );
    f.world.cur.loc = YARD;
    let command = f.parse("take all").unwrap();
    assert_eq!(codes(&command.directs), vec![LAMP]);
    assert_eq!(f.parse("take all but lamp").unwrap_err(), ParseError::NothingHere);
}

#[test]
fn it_refers_to_the_last_object_while_present() {
    let mut f = fixture();
    let command = f.parse_with_it("examine it", KEY).unwrap();
    assert_eq!(codes(&command.directs), vec![KEY]);
    assert_eq!(f.parse("examine it").unwrap_err(), ParseError::NoIt);
    assert_eq!(f.parse_with_it("examine it", LAMP).unwrap_err(), ParseError::NoIt);
}

#[test]
fn it_never_refers_to_a_literal() {
    let mut f = fixture();
    let command = f.parse("examine 5").unwrap();
    let literal = command.directs[0].code;
    assert!(f.world.ranges.literals.contains(literal));
    assert_eq!(f.parse_with_it("examine it", literal).unwrap_err(), ParseError::NoIt);
}

#[test]
fn split_verb_particle() {
    let mut f = fixture();
    let command = f.parse("pick the red ball up").unwrap();
    assert_eq!(command.action, Action::Verb(TAKE));
    assert_eq!(codes(&command.directs), vec![RED_BALL]);
    let command = f.parse("pick up key").unwrap();
    assert_eq!(codes(&command.directs), vec![KEY]);
}

#[test]
fn directions_move() {
    let mut f = fixture();
    assert_eq!(
        f.parse("east").unwrap().action,
        Action::Go {
            direction: EAST,
            verb: 0
        }
    );
    assert_eq!(
        f.parse("go east").unwrap().action,
        Action::Go {
            direction: EAST,
            verb: GO
        }
    );
}

#[test]
fn preposition_and_indirect_objects() {
    let mut f = fixture();
    let command = f.parse("put key in red ball").unwrap();
    assert_eq!(codes(&command.directs), vec![KEY]);
    assert_eq!(codes(&command.indirects), vec![RED_BALL]);
    assert_eq!(
        f.parse("put key and red ball in blue ball and key").unwrap_err(),
        ParseError::BothMultiple
    );
}

#[test]
fn literals_become_parameters() {
    let mut f = fixture();
    let command = f.parse("say \"Hello there\"").unwrap();
    assert_eq!(codes(&command.directs), vec![9]);
    let handle = f.world.attribute(9, 1).unwrap();
    assert_eq!(f.world.strings.get(handle).unwrap(), "Hello there");

    // the next command releases the previous literals
    assert_eq!(
        f.parse("say 42").unwrap_err(),
        ParseError::Restricted("say".to_string())
    );
    assert!(f.world.strings.get(handle).is_err());
    assert_eq!(f.world.literals, vec![Literal::Number(42)]);

    assert_eq!(f.parse("take 1, 2, 3").unwrap_err(), ParseError::TooManyLiterals);
}

#[test]
fn restriction_with_a_response_block() {
    let mut f = fixture();
    assert_eq!(
        f.parse("attack key").unwrap_err(),
        ParseError::RestrictionBlock(300)
    );
    let command = f.parse("attack bob").unwrap();
    assert_eq!(codes(&command.directs), vec![BOB]);
}

#[test]
fn commands_can_address_an_actor() {
    let mut f = fixture();
    let command = f.parse("bob, take key").unwrap();
    assert_eq!(command.actor, Some(BOB));
    assert_eq!(codes(&command.directs), vec![KEY]);
    assert_eq!(f.parse("bob, look").unwrap_err(), ParseError::NotUnderstood);
}

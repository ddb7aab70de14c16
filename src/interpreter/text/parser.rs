//! Command parser
//!
//! Turns a line of player input into a [`Command`]: an optional addressed
//! actor, a verb (or a movement), and resolved direct and indirect object
//! parameters checked against the syntax table. Every failure here is a
//! [`ParseError`] the turn loop reports to the player; none are fatal.
use crate::interpreter::core::instruction::Aword;
use crate::interpreter::objects::world::{Literal, World};
use crate::interpreter::text::dictionary::{
    Dictionary, WORD_ADJECTIVE, WORD_ALL, WORD_ARTICLE, WORD_BUT, WORD_CONJUNCTION,
    WORD_DIRECTION, WORD_IT, WORD_NOUN, WORD_PREPOSITION, WORD_VERB,
};
use crate::interpreter::text::messages::Message;
use log::debug;
use std::fmt;

/// Class restriction on a syntax parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restriction {
    /// 1 for the direct object, 2 for the indirect object
    pub parameter: u8,
    /// Accepted class bits
    pub classes: Aword,
    /// Block run instead of the default refusal, 0 for none
    pub failure: Aword,
}

/// One accepted sentence shape for a verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxRule {
    pub verb: Aword,
    /// Preposition code between the objects, 0 for none
    pub preposition: Aword,
    pub direct: bool,
    pub indirect: bool,
    /// May be addressed to another actor ("bob, take the key")
    pub actor: bool,
    /// Accepts several objects on one side
    pub multiple: bool,
    pub restrictions: Vec<Restriction>,
}

/// A resolved command parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Entity id (object, actor, location or literal)
    pub code: Aword,
    /// Dictionary indices of the adjectives and noun the player used
    pub words: Vec<usize>,
}

impl Param {
    fn bare(code: Aword) -> Param {
        Param {
            code,
            words: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Verb(Aword),
    /// Movement in a direction; carries the motion verb if one was used
    Go { direction: Aword, verb: Aword },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub actor: Option<Aword>,
    pub action: Action,
    pub directs: Vec<Param>,
    pub indirects: Vec<Param>,
    remaining: usize,
}

impl Command {
    fn new(
        actor: Option<Aword>,
        action: Action,
        directs: Vec<Param>,
        indirects: Vec<Param>,
    ) -> Self {
        let remaining = directs.len().max(indirects.len()).max(1);
        Command {
            actor,
            action,
            directs,
            indirects,
            remaining,
        }
    }

    pub fn verb(&self) -> Aword {
        match self.action {
            Action::Verb(verb) => verb,
            Action::Go { verb, .. } => verb,
        }
    }

    pub fn is_multiple(&self) -> bool {
        self.directs.len() > 1 || self.indirects.len() > 1
    }

    /// The parameter list for the next execution of the command. A command
    /// with several objects on one side runs once per object.
    pub fn next_command(&mut self) -> Option<Vec<Param>> {
        if self.remaining == 0 {
            return None;
        }
        let total = self.directs.len().max(self.indirects.len()).max(1);
        let index = total - self.remaining;
        self.remaining -= 1;
        let pick = |side: &[Param]| -> Option<Param> {
            match side.len() {
                0 => None,
                1 => Some(side[0].clone()),
                _ => side.get(index).cloned(),
            }
        };
        Some(
            pick(&self.directs)
                .into_iter()
                .chain(pick(&self.indirects))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing but blanks
    Empty,
    UnknownWord(String),
    NotUnderstood,
    CantSee(String),
    Ambiguous(String),
    NoIt,
    NothingHere,
    NotMultiple(String),
    BothMultiple,
    TooManyLiterals,
    /// A parameter has the wrong class for the verb
    Restricted(String),
    /// As `Restricted`, but the game supplies the response block
    RestrictionBlock(Aword),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => Ok(()),
            ParseError::UnknownWord(w) => write!(f, "{} '{}'.", Message::UnknownWord, w),
            ParseError::NotUnderstood => write!(f, "{}", Message::NotUnderstood),
            ParseError::CantSee(p) => write!(f, "{} {} here.", Message::CantSee, p),
            ParseError::Ambiguous(p) => write!(f, "{} {} you mean.", Message::WhichOne, p),
            ParseError::NoIt => write!(f, "{}", Message::NoIt),
            ParseError::NothingHere => write!(f, "{}", Message::NothingHere),
            ParseError::NotMultiple(v) => write!(f, "{} '{}'.", Message::NotMultiple, v),
            ParseError::BothMultiple => write!(f, "{}", Message::BothMultiple),
            ParseError::TooManyLiterals => write!(f, "{}", Message::TooManyLiterals),
            ParseError::Restricted(v) => write!(f, "{} {} that.", Message::CantVerb, v),
            ParseError::RestrictionBlock(_) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(usize),
    Number(i32),
    Text(String),
    Comma,
}

fn tokenize(line: &str, dictionary: &Dictionary) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() || matches!(ch, '.' | '!' | '?') {
            chars.next();
        } else if ch == ',' {
            chars.next();
            tokens.push(Token::Comma);
        } else if ch == '"' {
            chars.next();
            let text: String = chars.by_ref().take_while(|&c| c != '"').collect();
            tokens.push(Token::Text(text));
        } else {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphanumeric() || c == '-' || c == '\'' {
                    word.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            if word.is_empty() {
                // stray punctuation
                chars.next();
                continue;
            }
            if let Ok(n) = word.parse::<i32>() {
                tokens.push(Token::Number(n));
            } else {
                match dictionary.lookup(&word) {
                    Some(index) => tokens.push(Token::Word(index)),
                    None => return Err(ParseError::UnknownWord(word.to_lowercase())),
                }
            }
        }
    }
    Ok(tokens)
}

/// A noun phrase before resolution
enum Phrase {
    All(Vec<Param>),
    It,
    Number(i32),
    Text(String),
    Named { adjectives: Vec<usize>, noun: Option<usize> },
}

struct Parser<'a> {
    dictionary: &'a Dictionary,
    tokens: Vec<Token>,
    pos: usize,
    it: Option<Aword>,
}

impl<'a> Parser<'a> {
    fn peek_word(&self) -> Option<usize> {
        match self.tokens.get(self.pos) {
            Some(Token::Word(w)) => Some(*w),
            _ => None,
        }
    }

    fn word_is(&self, index: usize, class: Aword) -> bool {
        self.dictionary
            .entry(index)
            .map_or(false, |e| e.is(class))
    }

    fn peek_is(&self, class: Aword) -> bool {
        self.peek_word().map_or(false, |w| self.word_is(w, class))
    }

    fn phrase_text(&self, words: &[usize]) -> String {
        words
            .iter()
            .map(|&w| self.dictionary.text(w))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Articles, adjectives and a noun; `all`, `it` or a literal
    fn phrase(&mut self, world: &mut World) -> Result<Phrase, ParseError> {
        while self.peek_is(WORD_ARTICLE) {
            self.pos += 1;
        }
        match self.tokens.get(self.pos).cloned() {
            Some(Token::Number(n)) => {
                self.pos += 1;
                return Ok(Phrase::Number(n));
            }
            Some(Token::Text(t)) => {
                self.pos += 1;
                return Ok(Phrase::Text(t));
            }
            _ => {}
        }
        if self.peek_is(WORD_ALL) {
            self.pos += 1;
            let mut except = Vec::new();
            if self.peek_is(WORD_BUT) {
                self.pos += 1;
                except = self.object_list(world)?.0;
            }
            return Ok(Phrase::All(except));
        }
        if self.peek_is(WORD_IT) {
            self.pos += 1;
            return Ok(Phrase::It);
        }
        let mut words = Vec::new();
        while let Some(w) = self.peek_word() {
            if !self.word_is(w, WORD_ADJECTIVE | WORD_NOUN) {
                break;
            }
            // a preposition ends the phrase once it has a noun
            if self.word_is(w, WORD_PREPOSITION)
                && words.last().map_or(false, |&l| self.word_is(l, WORD_NOUN))
            {
                break;
            }
            words.push(w);
            self.pos += 1;
        }
        let Some(&last) = words.last() else {
            return Err(ParseError::NotUnderstood);
        };
        if self.word_is(last, WORD_NOUN) {
            words.pop();
            Ok(Phrase::Named {
                adjectives: words,
                noun: Some(last),
            })
        } else {
            Ok(Phrase::Named {
                adjectives: words,
                noun: None,
            })
        }
    }

    fn resolve(&self, phrase: Phrase, world: &mut World) -> Result<(Vec<Param>, bool), ParseError> {
        let here = |world: &World, id: Aword| world.is_here(id).unwrap_or(false);
        match phrase {
            Phrase::Number(n) => {
                let id = world
                    .add_literal(Literal::Number(n as Aword))
                    .map_err(|_| ParseError::TooManyLiterals)?;
                Ok((vec![Param::bare(id)], false))
            }
            Phrase::Text(t) => {
                let handle = world.strings.alloc(t);
                let id = world.add_literal(Literal::Text(handle)).map_err(|_| {
                    world.strings.free(handle);
                    ParseError::TooManyLiterals
                })?;
                Ok((vec![Param::bare(id)], false))
            }
            Phrase::It => match self.it {
                Some(id) if !world.ranges.literals.contains(id) && here(world, id) => {
                    Ok((vec![Param::bare(id)], false))
                }
                _ => Err(ParseError::NoIt),
            },
            Phrase::All(except) => {
                let view: &World = world;
                let everything: Vec<Param> = view
                    .ranges
                    .objects
                    .ids()
                    .filter(|&id| here(view, id))
                    .filter(|id| !except.iter().any(|e| e.code == *id))
                    .map(Param::bare)
                    .collect();
                if everything.is_empty() {
                    return Err(ParseError::NothingHere);
                }
                Ok((everything, true))
            }
            Phrase::Named { adjectives, noun } => {
                let mut candidates: Vec<Aword> = match noun.or(adjectives.first().copied()) {
                    Some(w) => {
                        let entry = self.dictionary.entry(w).ok_or(ParseError::NotUnderstood)?;
                        if noun.is_some() {
                            entry.nouns.clone()
                        } else {
                            entry.adjectives.clone()
                        }
                    }
                    None => return Err(ParseError::NotUnderstood),
                };
                for &adj in &adjectives {
                    if let Some(entry) = self.dictionary.entry(adj) {
                        candidates.retain(|c| entry.adjectives.contains(c));
                    }
                }
                let mut words = adjectives.clone();
                words.extend(noun);
                let view: &World = world;
                candidates.retain(|&c| here(view, c));
                match candidates.len() {
                    0 => Err(ParseError::CantSee(self.phrase_text(&words))),
                    1 => Ok((
                        vec![Param {
                            code: candidates[0],
                            words,
                        }],
                        false,
                    )),
                    _ => Err(ParseError::Ambiguous(self.phrase_text(&words))),
                }
            }
        }
    }

    /// Phrases joined by "and" or commas. The flag reports an `all`.
    fn object_list(&mut self, world: &mut World) -> Result<(Vec<Param>, bool), ParseError> {
        let mut params = Vec::new();
        let mut all = false;
        loop {
            let phrase = self.phrase(world)?;
            let (mut found, was_all) = self.resolve(phrase, world)?;
            all |= was_all;
            params.append(&mut found);
            let joined = match self.tokens.get(self.pos) {
                Some(Token::Comma) => true,
                Some(Token::Word(w)) => self.word_is(*w, WORD_CONJUNCTION),
                _ => false,
            };
            if !joined {
                break;
            }
            self.pos += 1;
        }
        Ok((params, all))
    }
}

/// Parse a line against the vocabulary, the syntax table and the world as
/// seen from the current location. `it` is the last single direct object.
pub fn parse(
    line: &str,
    dictionary: &Dictionary,
    syntaxes: &[SyntaxRule],
    world: &mut World,
    it: Option<Aword>,
) -> Result<Command, ParseError> {
    let tokens = tokenize(line, dictionary)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    world.clear_literals();
    let mut p = Parser {
        dictionary,
        tokens,
        pos: 0,
        it,
    };

    let actor = actor_prefix(&mut p, world)?;

    // a lone direction
    if p.pos + 1 == p.tokens.len() && p.peek_is(WORD_DIRECTION) && !p.peek_is(WORD_VERB) {
        let direction = direction_code(&p)?;
        return Ok(Command::new(
            actor,
            Action::Go { direction, verb: 0 },
            Vec::new(),
            Vec::new(),
        ));
    }

    let first = p.peek_word().ok_or(ParseError::NotUnderstood)?;
    if !p.word_is(first, WORD_VERB) {
        return Err(ParseError::NotUnderstood);
    }
    let second = match p.tokens.get(p.pos + 1) {
        Some(Token::Word(w)) => Some(*w),
        _ => None,
    };
    let last = match p.tokens.last() {
        Some(Token::Word(w)) if p.tokens.len() > p.pos + 2 => Some(*w),
        _ => None,
    };
    let phrase = if let Some(ph) = second.and_then(|s| dictionary.phrase(&[first, s])) {
        p.pos += 2;
        ph
    } else if let Some(ph) = last.and_then(|l| dictionary.phrase(&[first, l])) {
        // split phrasal verb: "pick the ball up"
        p.tokens.pop();
        p.pos += 1;
        ph
    } else if let Some(ph) = dictionary.phrase(&[first]) {
        p.pos += 1;
        ph
    } else {
        return Err(ParseError::NotUnderstood);
    };
    let verb = phrase.verb;
    debug!("parser: verb {} at token {}", verb, p.pos);

    if phrase.motion && p.pos + 1 == p.tokens.len() && p.peek_is(WORD_DIRECTION) {
        let direction = direction_code(&p)?;
        return Ok(Command::new(
            actor,
            Action::Go { direction, verb },
            Vec::new(),
            Vec::new(),
        ));
    }

    let mut directs = Vec::new();
    let mut all = false;
    if starts_object(&p) {
        let (found, was_all) = p.object_list(world)?;
        directs = found;
        all |= was_all;
    }
    let mut preposition = 0;
    let mut indirects = Vec::new();
    if let Some(w) = p.peek_word() {
        if p.word_is(w, WORD_PREPOSITION) {
            preposition = dictionary.entry(w).map_or(0, |e| e.code);
            p.pos += 1;
            let (found, was_all) = p.object_list(world)?;
            indirects = found;
            all |= was_all;
        }
    }
    if p.pos < p.tokens.len() {
        return Err(ParseError::NotUnderstood);
    }
    if directs.len() > 1 && indirects.len() > 1 {
        return Err(ParseError::BothMultiple);
    }

    let rule = syntaxes
        .iter()
        .find(|r| {
            r.verb == verb
                && r.preposition == preposition
                && r.direct == !directs.is_empty()
                && r.indirect == !indirects.is_empty()
                && (actor.is_none() || r.actor)
        })
        .ok_or(ParseError::NotUnderstood)?;

    let verb_word = dictionary.text(phrase.words[0]).to_string();
    if (all || directs.len() > 1 || indirects.len() > 1) && !rule.multiple {
        return Err(ParseError::NotMultiple(verb_word));
    }

    for restriction in &rule.restrictions {
        let side = if restriction.parameter == 1 {
            &directs
        } else {
            &indirects
        };
        for param in side {
            let class = world.class_of(param.code).map_err(|_| ParseError::NotUnderstood)?;
            if class & restriction.classes == 0 {
                return Err(if restriction.failure != 0 {
                    ParseError::RestrictionBlock(restriction.failure)
                } else {
                    ParseError::Restricted(verb_word.clone())
                });
            }
        }
    }

    Ok(Command::new(actor, Action::Verb(verb), directs, indirects))
}

fn starts_object(p: &Parser) -> bool {
    matches!(
        p.tokens.get(p.pos),
        Some(Token::Number(_)) | Some(Token::Text(_))
    ) || p.peek_is(WORD_NOUN | WORD_ADJECTIVE | WORD_ARTICLE | WORD_ALL | WORD_IT)
}

fn direction_code(p: &Parser) -> Result<Aword, ParseError> {
    p.peek_word()
        .and_then(|w| p.dictionary.entry(w))
        .map(|e| e.code)
        .ok_or(ParseError::NotUnderstood)
}

/// An optional leading actor phrase, optionally followed by a comma
fn actor_prefix(p: &mut Parser, world: &mut World) -> Result<Option<Aword>, ParseError> {
    if p.peek_is(WORD_VERB)
        || p.peek_is(WORD_DIRECTION)
        || !p.peek_is(WORD_NOUN | WORD_ADJECTIVE | WORD_ARTICLE)
    {
        return Ok(None);
    }
    let start = p.pos;
    let phrase = p.phrase(world);
    let resolved = match phrase {
        Ok(phrase) => p.resolve(phrase, world).ok(),
        Err(_) => None,
    };
    if let Some((params, false)) = resolved {
        if params.len() == 1 && world.ranges.is_actor(params[0].code) {
            if matches!(p.tokens.get(p.pos), Some(Token::Comma)) {
                p.pos += 1;
            }
            if p.peek_is(WORD_VERB) || p.peek_is(WORD_DIRECTION) {
                return Ok(Some(params[0].code));
            }
        }
    }
    p.pos = start;
    Ok(None)
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod parser_tests;

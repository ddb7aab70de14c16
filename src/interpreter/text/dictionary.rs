//! Player vocabulary
//!
//! Words are kept in insertion order so that a word's index is stable; the
//! MATCH operation and parameter word lists refer to words by that index.
use crate::interpreter::core::instruction::Aword;
use indexmap::IndexMap;
use std::fmt;

/// Word class bits; a word may belong to several classes
pub const WORD_VERB: Aword = 1;
pub const WORD_NOUN: Aword = 2;
pub const WORD_ADJECTIVE: Aword = 4;
pub const WORD_PREPOSITION: Aword = 8;
pub const WORD_CONJUNCTION: Aword = 16;
pub const WORD_BUT: Aword = 32;
pub const WORD_ALL: Aword = 64;
pub const WORD_IT: Aword = 128;
pub const WORD_ARTICLE: Aword = 256;
pub const WORD_DIRECTION: Aword = 512;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordEntry {
    pub class: Aword,
    /// Preposition or direction code
    pub code: Aword,
    /// Entities this word names as a noun
    pub nouns: Vec<Aword>,
    /// Entities this word describes as an adjective
    pub adjectives: Vec<Aword>,
}

impl WordEntry {
    pub fn is(&self, class: Aword) -> bool {
        self.class & class != 0
    }
}

/// One or two words naming a verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbPhrase {
    /// Dictionary indices
    pub words: Vec<usize>,
    pub verb: Aword,
    /// A motion verb followed by a direction means "go" in that direction
    pub motion: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    words: IndexMap<String, WordEntry>,
    pub phrases: Vec<VerbPhrase>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `text` with the given class, merging with an existing entry.
    /// Returns the word index.
    pub fn insert(&mut self, text: &str, class: Aword, code: Aword) -> usize {
        let entry = self.words.entry(text.to_lowercase());
        let index = entry.index();
        let word = entry.or_default();
        word.class |= class;
        if code != 0 {
            word.code = code;
        }
        index
    }

    pub fn add_noun(&mut self, text: &str, id: Aword) -> usize {
        let index = self.insert(text, WORD_NOUN, 0);
        let nouns = &mut self.words[index].nouns;
        if !nouns.contains(&id) {
            nouns.push(id);
        }
        index
    }

    pub fn add_adjective(&mut self, text: &str, id: Aword) -> usize {
        let index = self.insert(text, WORD_ADJECTIVE, 0);
        let adjectives = &mut self.words[index].adjectives;
        if !adjectives.contains(&id) {
            adjectives.push(id);
        }
        index
    }

    /// Register a verb phrase of one or two words
    pub fn add_phrase(&mut self, text: &str, verb: Aword, motion: bool) -> Result<(), String> {
        let words: Vec<usize> = text
            .split_whitespace()
            .map(|w| self.insert(w, WORD_VERB, 0))
            .collect();
        if words.is_empty() || words.len() > 2 {
            return Err(format!("Verb phrase '{text}' must have one or two words"));
        }
        self.phrases.push(VerbPhrase {
            words,
            verb,
            motion,
        });
        Ok(())
    }

    /// Index of a word, ignoring case
    pub fn lookup(&self, text: &str) -> Option<usize> {
        self.words.get_index_of(text.to_lowercase().as_str())
    }

    pub fn entry(&self, index: usize) -> Option<&WordEntry> {
        self.words.get_index(index).map(|(_, e)| e)
    }

    pub fn text(&self, index: usize) -> &str {
        self.words
            .get_index(index)
            .map(|(t, _)| t.as_str())
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WordEntry)> {
        self.words.iter().map(|(t, e)| (t.as_str(), e))
    }

    /// Rebuild from stored entries, keeping their order
    pub fn from_entries(entries: Vec<(String, WordEntry)>, phrases: Vec<VerbPhrase>) -> Self {
        Dictionary {
            words: entries.into_iter().collect(),
            phrases,
        }
    }

    /// The phrase using exactly these words
    pub fn phrase(&self, words: &[usize]) -> Option<&VerbPhrase> {
        self.phrases.iter().find(|p| p.words == words)
    }

    /// The first word of the verb's shortest phrase, for messages
    pub fn verb_word(&self, verb: Aword) -> &str {
        self.phrases
            .iter()
            .filter(|p| p.verb == verb)
            .min_by_key(|p| p.words.len())
            .map(|p| self.text(p.words[0]))
            .unwrap_or("do")
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} words, {} verb phrases", self.words.len(), self.phrases.len())?;
        for (i, (text, entry)) in self.words.iter().enumerate() {
            writeln!(
                f,
                "{:4} {:12} class {:#05x} code {} nouns {:?} adjectives {:?}",
                i, text, entry.class, entry.code, entry.nouns, entry.adjectives
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn classes_merge_and_indices_are_stable() {
        let mut d = Dictionary::new();
        let down = d.insert("Down", WORD_DIRECTION, 6);
        d.insert("in", WORD_PREPOSITION, 2);
        assert_eq!(d.insert("down", WORD_PREPOSITION, 0), down);
        let entry = d.entry(down).unwrap();
        assert!(entry.is(WORD_DIRECTION) && entry.is(WORD_PREPOSITION));
        assert_eq!(entry.code, 6);
        assert_eq!(d.lookup("DOWN"), Some(down));
        assert_eq!(d.text(down), "down");
    }

    #[test]
    fn noun_and_adjective_references() {
        let mut d = Dictionary::new();
        d.add_noun("ball", 1);
        d.add_noun("ball", 2);
        d.add_noun("ball", 2);
        d.add_adjective("red", 1);
        let ball = d.entry(d.lookup("ball").unwrap()).unwrap();
        assert_eq!(ball.nouns, vec![1, 2]);
        assert_eq!(d.entry(d.lookup("red").unwrap()).unwrap().adjectives, vec![1]);
    }

    #[test]
    fn verb_phrases() {
        let mut d = Dictionary::new();
        d.add_phrase("pick up", 3, false).unwrap();
        d.add_phrase("take", 3, false).unwrap();
        assert!(d.add_phrase("a b c", 4, false).is_err());
        let pick = d.lookup("pick").unwrap();
        let up = d.lookup("up").unwrap();
        assert_eq!(d.phrase(&[pick, up]).map(|p| p.verb), Some(3));
        assert_eq!(d.phrase(&[pick]), None);
        assert_eq!(d.verb_word(3), "take");
    }
}

//! Fixed engine messages
//!
//! Sentence fragments are printed through the spacing-aware output path,
//! so the pieces carry no surrounding blanks.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    UnknownWord,
    NotUnderstood,
    CantSee,
    WhichOne,
    NoIt,
    NothingHere,
    NotMultiple,
    BothMultiple,
    TooManyLiterals,
    CantDoThat,
    CantVerb,
    NoWay,
    Again,
    SeeObjectStart,
    SeeObjectComma,
    SeeObjectAnd,
    SeeObjectEnd,
    ActorHere,
    Article,
    ContainsStart,
    Contains,
    ContainsComma,
    ContainsAnd,
    ContainsEnd,
    EmptyStart,
    EmptyEnd,
    ScoreStart,
    ScoreMiddle,
    ScoreEnd,
    QuitAction,
    SaveWhere,
    SaveFailed,
    RestoreFrom,
    RestoreVersion,
    RestoreName,
    RestoreMissing,
    RestoreCorrupt,
    Prompt,
}

impl Message {
    pub fn text(self) -> &'static str {
        match self {
            Message::UnknownWord => "I don't know the word",
            Message::NotUnderstood => "I don't understand.",
            Message::CantSee => "I can't see any",
            Message::WhichOne => "I don't know which",
            Message::NoIt => "I don't know what you mean by 'it'.",
            Message::NothingHere => "There is nothing here to do that with.",
            Message::NotMultiple => "You can't refer to multiple objects with",
            Message::BothMultiple => {
                "You can't refer to multiple objects on both sides of a preposition."
            }
            Message::TooManyLiterals => "Too many numbers or strings in that command.",
            Message::CantDoThat => "You can't do that.",
            Message::CantVerb => "You can't",
            Message::NoWay => "You can't go that way.",
            Message::Again => "(again)",
            Message::SeeObjectStart => "There is",
            Message::SeeObjectComma => ",",
            Message::SeeObjectAnd => "and",
            Message::SeeObjectEnd => "here.",
            Message::ActorHere => "is here.",
            Message::Article => "a",
            Message::ContainsStart => "The",
            Message::Contains => "contains",
            Message::ContainsComma => ",",
            Message::ContainsAnd => "and",
            Message::ContainsEnd => ".",
            Message::EmptyStart => "The",
            Message::EmptyEnd => "is empty.",
            Message::ScoreStart => "You have scored",
            Message::ScoreMiddle => "points out of",
            Message::ScoreEnd => ".",
            Message::QuitAction => "Do you want to RESTART, RESTORE or QUIT ?",
            Message::SaveWhere => "Enter file name to save in",
            Message::SaveFailed => "Sorry, save failed.",
            Message::RestoreFrom => "Enter file name to restore from",
            Message::RestoreVersion => "That saved game is from another version of the game.",
            Message::RestoreName => "That saved game is from another game.",
            Message::RestoreMissing => "There is no saved game by that name.",
            Message::RestoreCorrupt => "That saved game is damaged.",
            Message::Prompt => ">",
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

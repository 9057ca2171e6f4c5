//! Question parsing.
//!
//! Questions go through these steps:
//! ```text
//! "Show me all the users with follower count more than 100"
//!     | normalizer: lower case, no filler words, synonyms replaced by column names
//! "show me all users with followers more than 100"
//!     | stage 1: pest splits it into tokens
//!     | stage 2: tokens become something a bit nicer to work with
//! [show] [me] [all] [users] [with] [followers] [more] [than] [100]
//!     | stage 3: find the SELECT list, the table, and the filter, group by, having, and
//!     |          order by fragments
//!     | stage 4: split filter fragments into conditions
//! ```
//! None of these stages look at whether the tables and columns actually go together, that's
//! done when building the query.

/// Lower-cases, drops filler words, and replaces synonyms.
mod normalizer;

/// Uses Pest to split questions into tokens.
mod stage1;

/// Takes Pest's output and transforms it into a list of tokens.
mod stage2;

/// Finds the clauses.
mod stage3;

/// Reads conditions.
mod stage4;

pub use normalizer::Normalizer;
pub use stage1::Rule;
pub use stage3::SelectError;
pub use stage4::Stage4Rep;

use crate::engine::syntax::stage1::parse_stage1;
use crate::engine::syntax::stage2::Stage2Rep;
use crate::engine::syntax::stage3::Stage3Rep;
use crate::engine::vocabulary::Vocabulary;
use crate::engine::Position;
use pest::Span;

pub fn parse_to_stage4<'a>(
    input: &'a str,
    vocabulary: &Vocabulary,
) -> Result<Stage4Rep<'a>, crate::error::Error> {
    let stage1 = parse_stage1(input)?;
    let stage2: Stage2Rep = stage1.into();
    let stage3 = Stage3Rep::extract(stage2, vocabulary);

    Ok(Stage4Rep::parse(stage3, vocabulary))
}

/// The pieces questions are made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Word(&'a str),
    Number(&'a str),
    /// The text between the quotes.
    Quoted(&'a str),
    /// Comparison symbols like `>=`.
    Symbol(&'a str),
    Comma,
    Star,
}

impl<'a> Token<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Token::Word(text) | Token::Number(text) | Token::Quoted(text) | Token::Symbol(text) => {
                text
            }
            Token::Comma => ",",
            Token::Star => "*",
        }
    }

    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Word(text) if *text == word)
    }

    /// Words and symbols are what phrases ("more than", ">=") are made of.
    pub fn is_phrase_part(&self, part: &str) -> bool {
        match self {
            Token::Word(text) | Token::Symbol(text) => *text == part,
            _ => false,
        }
    }
}

impl From<Span<'_>> for Position {
    fn from(span: Span) -> Self {
        Position {
            start: span.start(),
            end: span.end(),
        }
    }
}

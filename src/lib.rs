//! Translates English questions about a small, known schema into SQL SELECT statements.
//!
//! ```
//! let sql = nl2sql::render("Show me all users with followers more than 100").unwrap();
//!
//! assert_eq!("SELECT * FROM users WHERE followers > 100;", sql);
//! ```
//!
//! Use a [Translator] to work with your own [vocabulary::Vocabulary].

// I don't really care, and it's not important for this project
#![allow(clippy::result_large_err)]

mod engine;
mod error;

pub use engine::vocabulary;
pub use engine::{
    render, AggregateCall, Condition, ConditionList, Connective, LiteralValue, Operands,
    OrderDirection, Position, Query, SelectTarget, Subject, Translation, TranslationError,
    Translator, UnparsedFragment,
};
pub use error::{Error, ErrorKind, InternalError};

mod query_builder;
mod rendering;
mod syntax;
/// Tables, synonyms, and phrases the translator understands.
pub mod vocabulary;


pub use query_builder::{Query, TranslationError};
pub use syntax::Rule;
pub use vocabulary::{
    AggregateFunction, ColumnName, ConfigError, Operator, TableName, Vocabulary,
};

use crate::engine::query_builder::build_query;
use crate::engine::rendering::render_query;
use crate::engine::syntax::{parse_to_stage4, Normalizer};
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::ops::Range;

static BUILT_IN: Lazy<Translator> = Lazy::new(|| {
    let vocabulary = Vocabulary::built_in().expect("the built-in vocabulary is valid");

    Translator::new(vocabulary).expect("the built-in vocabulary builds a translator")
});

/// Translates a question to SQL using the built-in vocabulary.
pub fn render(input: &str) -> Result<String, crate::error::Error> {
    Ok(BUILT_IN.translate(input)?.sql)
}

/// Turns questions into SQL queries.
///
/// A translator never changes after it's built, so the same one can be used for any number of
/// questions, from any number of threads.
#[derive(Debug)]
pub struct Translator {
    vocabulary: Vocabulary,
    normalizer: Normalizer,
    strict: bool,
}

/// A successful translation.
#[derive(Debug, Clone)]
pub struct Translation {
    pub sql: String,
    pub query: Query,
    /// Filter segments we could not make sense of. They are missing from the SQL.
    pub unparsed: Vec<UnparsedFragment>,
}

impl Translator {
    pub fn new(vocabulary: Vocabulary) -> Result<Self, crate::error::Error> {
        let normalizer = Normalizer::new(&vocabulary)?;

        Ok(Translator {
            vocabulary,
            normalizer,
            strict: false,
        })
    }

    /// In strict mode, any filter segment we can't read fails the whole translation instead of
    /// being left out.
    pub fn strict(self, strict: bool) -> Self {
        Translator { strict, ..self }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn normalize(&self, input: &str) -> String {
        self.normalizer.normalize(input)
    }

    pub fn translate(&self, input: &str) -> Result<Translation, crate::error::Error> {
        let normalized = self.normalize(input);
        debug!("normalized {input:?} to {normalized:?}");

        let stage4 = parse_to_stage4(&normalized, &self.vocabulary)?;
        let unparsed = stage4.unparsed.clone();
        let query = build_query(stage4, self.vocabulary.schema())?;

        for fragment in &unparsed {
            warn!("left out a condition we could not read: {:?}", fragment.text);
        }

        if self.strict {
            if let Some(fragment) = unparsed.first() {
                Err(TranslationError::UnparsedCondition(fragment.text.clone()))?;
            }
        }

        let sql = render_query(&query);
        debug!("translated {input:?} to {sql:?}");

        Ok(Translation {
            sql,
            query,
            unparsed,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// These are things we deduced from the schema, like a table that was never named.
    Inferred,
    /// We found this in the (normalized) input.
    Input(Position),
}

/// Holds a reference to where we got something from.
///
/// Positions point into the normalized question, which is what the later stages work on.
/// ```text
/// show name from bar
///                ^^^-- Sourced<"bar", input pos 15..18>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sourced<T: Sized + Clone> {
    pub it: T,
    pub source: Source,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Position {
    pub start: usize,
    pub end: usize,
}

/// One item of the SELECT list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectTarget {
    Wildcard,
    Column(ColumnName),
    Aggregate(AggregateCall),
}

/// Something like `COUNT(*)` or `AVG(salary)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateCall {
    pub function: AggregateFunction,
    /// `None` renders as `*`.
    pub argument: Option<ColumnName>,
}

/// The left side of a condition. Aggregates only show up in HAVING.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Column(ColumnName),
    Aggregate(AggregateCall),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub subject: Subject,
    pub operator: Operator,
    pub operands: Operands,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operands {
    Single(LiteralValue),
    /// Only used by BETWEEN.
    Range(LiteralValue, LiteralValue),
}

/// A literal value like 1 or "kitten".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralValue {
    Number(String),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Ascending,
    Descending,
}

/// Conditions, and the AND/OR between each pair of them.
///
/// There is always exactly one less connective than there are conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionList {
    conditions: Vec<Condition>,
    connectives: Vec<Connective>,
}

/// A part of a filter that did not turn into a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnparsedFragment {
    pub text: String,
    pub position: Position,
}

impl ConditionList {
    /// Appends a condition. The connective is ignored for the first condition, because there's
    /// nothing before it to connect to.
    pub fn push(&mut self, connective: Connective, condition: Condition) {
        if !self.conditions.is_empty() {
            self.connectives.push(connective);
        }

        self.conditions.push(condition);
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn connectives(&self) -> &[Connective] {
        &self.connectives
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Each condition with the connective that comes before it. The first one has none.
    pub fn iter(&self) -> impl Iterator<Item = (Option<Connective>, &Condition)> {
        let connectives = std::iter::once(None).chain(self.connectives.iter().copied().map(Some));

        connectives.zip(self.conditions.iter())
    }
}

impl Subject {
    pub fn column(&self) -> Option<&ColumnName> {
        match self {
            Subject::Column(column) => Some(column),
            Subject::Aggregate(call) => call.argument.as_ref(),
        }
    }
}

impl<T: Sized + Clone> Sourced<T> {
    /// Something from the source input the user provided.
    pub fn from_input<P>(position: P, it: T) -> Self
    where
        P: Into<Position>,
    {
        Sourced {
            it,
            source: Source::Input(position.into()),
        }
    }

    pub fn inferred(it: T) -> Self {
        Sourced {
            it,
            source: Source::Inferred,
        }
    }

    pub fn map<D, F>(self, mapper: F) -> Sourced<D>
    where
        F: FnOnce(T) -> D,
        D: Sized + Clone,
    {
        Sourced {
            it: mapper(self.it),
            source: self.source,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self.source {
            Source::Input(position) => Some(position),
            _ => None,
        }
    }
}

impl<T> Copy for Sourced<T> where T: Copy {}

impl From<Range<usize>> for Position {
    fn from(range: Range<usize>) -> Self {
        Position {
            start: range.start,
            end: range.end,
        }
    }
}

impl Position {
    /// The smallest position covering both.
    pub fn join(self, other: Position) -> Position {
        Position {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[cfg(test)]
impl PartialEq<Source> for Position {
    fn eq(&self, other: &Source) -> bool {
        match other {
            Source::Input(position) => position == self,
            _ => false,
        }
    }
}

#[cfg(test)]
impl PartialEq<Source> for Range<usize> {
    fn eq(&self, other: &Source) -> bool {
        match other {
            Source::Input(position) => self == position,
            _ => false,
        }
    }
}

#[cfg(test)]
impl PartialEq<Position> for Range<usize> {
    fn eq(&self, other: &Position) -> bool {
        self.start == other.start && self.end == other.end
    }
}

//! Comparison phrases and aggregate phrases.
//!
//! Operator phrases are grouped into families. When reading a condition, the families are tried in
//! a fixed order (see [OperatorFamily::PRIORITY]), and inside a family longer phrases are tried
//! first. The first phrase found in a condition decides its operator.
use crate::engine::vocabulary::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    LesserThan,
    #[serde(rename = "<=")]
    LesserOrEqual,
    /// Renders as `LIKE '%value%'`.
    #[serde(rename = "LIKE")]
    Like,
    /// Takes two values, renders as `BETWEEN a AND b`.
    #[serde(rename = "BETWEEN")]
    Between,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorFamily {
    GreaterThan,
    LessThan,
    Equality,
    Contains,
    Between,
}

impl OperatorFamily {
    pub const PRIORITY: [OperatorFamily; 5] = [
        OperatorFamily::GreaterThan,
        OperatorFamily::LessThan,
        OperatorFamily::Equality,
        OperatorFamily::Contains,
        OperatorFamily::Between,
    ];

    fn rank(self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|family| *family == self)
            .unwrap_or(Self::PRIORITY.len())
    }
}

impl Operator {
    pub fn family(self) -> OperatorFamily {
        match self {
            Operator::GreaterThan | Operator::GreaterOrEqual => OperatorFamily::GreaterThan,
            Operator::LesserThan | Operator::LesserOrEqual => OperatorFamily::LessThan,
            Operator::Equals | Operator::NotEquals => OperatorFamily::Equality,
            Operator::Like => OperatorFamily::Contains,
            Operator::Between => OperatorFamily::Between,
        }
    }

    /// How many values the operator needs on its right side.
    pub fn arity(self) -> usize {
        match self {
            Operator::Between => 2,
            _ => 1,
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::LesserThan => "<",
            Operator::LesserOrEqual => "<=",
            Operator::Like => "LIKE",
            Operator::Between => "BETWEEN",
        };

        write!(f, "{symbol}")
    }
}

/// Maps phrases like "more than" to operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorLexicon {
    phrases: BTreeMap<String, Operator>,
}

/// An operator phrase, split into the words we look for in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorPhrase {
    pub words: Vec<String>,
    pub operator: Operator,
}

impl OperatorLexicon {
    pub fn get(&self, phrase: &str) -> Option<Operator> {
        self.phrases.get(phrase).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Operator)> {
        self.phrases
            .iter()
            .map(|(phrase, operator)| (phrase.as_str(), *operator))
    }

    /// Phrases in the order they should be tried: by family priority, then longest first.
    pub fn in_priority_order(&self) -> Vec<OperatorPhrase> {
        let mut phrases: Vec<_> = self
            .phrases
            .iter()
            .map(|(phrase, operator)| OperatorPhrase {
                words: phrase.split_whitespace().map(str::to_owned).collect(),
                operator: *operator,
            })
            .collect();

        phrases.sort_by(|a, b| {
            a.operator
                .family()
                .rank()
                .cmp(&b.operator.family().rank())
                .then(b.words.len().cmp(&a.words.len()))
                .then(b.words.concat().len().cmp(&a.words.concat().len()))
                .then(a.words.cmp(&b.words))
        });

        phrases
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        match self.phrases.keys().find(|phrase| phrase.trim().is_empty()) {
            Some(_) => Err(ConfigError::EmptyPhrase("operators".to_string())),
            None => Ok(()),
        }
    }

    pub(super) fn normalized(self) -> Self {
        let phrases = self
            .phrases
            .into_iter()
            .map(|(phrase, operator)| {
                let phrase = phrase.to_lowercase();
                (phrase.split_whitespace().collect::<Vec<_>>().join(" "), operator)
            })
            .collect();

        OperatorLexicon { phrases }
    }
}

impl Default for OperatorLexicon {
    fn default() -> Self {
        use Operator::*;

        let phrases = [
            (">", GreaterThan),
            ("more than", GreaterThan),
            ("more_than", GreaterThan),
            ("greater than", GreaterThan),
            ("over", GreaterThan),
            ("above", GreaterThan),
            (">=", GreaterOrEqual),
            ("at least", GreaterOrEqual),
            ("at_least", GreaterOrEqual),
            ("<", LesserThan),
            ("less than", LesserThan),
            ("less_than", LesserThan),
            ("fewer than", LesserThan),
            ("under", LesserThan),
            ("below", LesserThan),
            ("<=", LesserOrEqual),
            ("at most", LesserOrEqual),
            ("at_most", LesserOrEqual),
            ("=", Equals),
            ("equals", Equals),
            ("equal to", Equals),
            ("!=", NotEquals),
            ("<>", NotEquals),
            ("not equal to", NotEquals),
            ("not", NotEquals),
            ("contains", Like),
            ("like", Like),
            ("includes", Like),
            ("between", Between),
        ];

        OperatorLexicon {
            phrases: phrases
                .into_iter()
                .map(|(phrase, operator)| (phrase.to_string(), operator))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateFunction {
    Count,
    Avg,
    Sum,
    Max,
    Min,
}

impl Display for AggregateFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Min => "MIN",
        };

        write!(f, "{name}")
    }
}

/// Maps phrases like "total number" or "average" to aggregate functions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateLexicon {
    phrases: BTreeMap<String, AggregateFunction>,
}

impl AggregateLexicon {
    pub fn iter(&self) -> impl Iterator<Item = (&str, AggregateFunction)> {
        self.phrases
            .iter()
            .map(|(phrase, function)| (phrase.as_str(), *function))
    }

    /// Finds the aggregate phrase the words start with, preferring the longest one.
    ///
    /// Returns the function and how many words the phrase took up.
    pub fn match_prefix<S: AsRef<str>>(&self, words: &[S]) -> Option<(AggregateFunction, usize)> {
        self.phrases
            .iter()
            .filter_map(|(phrase, function)| {
                let phrase_words: Vec<_> = phrase.split_whitespace().collect();
                let matches = phrase_words.len() <= words.len()
                    && phrase_words
                        .iter()
                        .zip(words)
                        .all(|(expected, word)| *expected == word.as_ref());

                matches.then_some((*function, phrase_words.len()))
            })
            .max_by_key(|(_, length)| *length)
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        match self.phrases.keys().find(|phrase| phrase.trim().is_empty()) {
            Some(_) => Err(ConfigError::EmptyPhrase("aggregates".to_string())),
            None => Ok(()),
        }
    }

    pub(super) fn normalized(self) -> Self {
        let phrases = self
            .phrases
            .into_iter()
            .map(|(phrase, function)| {
                let phrase = phrase.to_lowercase();
                (phrase.split_whitespace().collect::<Vec<_>>().join(" "), function)
            })
            .collect();

        AggregateLexicon { phrases }
    }
}

impl Default for AggregateLexicon {
    fn default() -> Self {
        use AggregateFunction::*;

        let phrases = [
            ("total number", Count),
            ("count", Count),
            ("average", Avg),
            ("sum", Sum),
            ("maximum", Max),
            ("max", Max),
            ("minimum", Min),
            ("min", Min),
        ];

        AggregateLexicon {
            phrases: phrases
                .into_iter()
                .map(|(phrase, function)| (phrase.to_string(), function))
                .collect(),
        }
    }
}

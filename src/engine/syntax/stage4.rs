//! Stage 4 turns filter fragments into conditions.
//!
//! ```text
//! followers more than 100 and email contains example
//! |-------| |-------| |-| |-| |---| |------| |-----|
//!  column   operator  val  |  column operator value
//!                     connective
//! ```
//! Segments we can't read are left out of the query, and reported as [UnparsedFragment]s.
use crate::engine::syntax::stage3::{Fragment, SelectError, Stage3Rep};
use crate::engine::syntax::Token;
use crate::engine::vocabulary::operators::OperatorPhrase;
use crate::engine::vocabulary::{AggregateFunction, ColumnName, Operator, TableName, Vocabulary};
use crate::engine::{
    AggregateCall, Condition, ConditionList, Connective, LiteralValue, Operands, OrderDirection,
    Position, SelectTarget, Sourced, Subject, UnparsedFragment,
};
use log::debug;

#[derive(Debug)]
pub struct Stage4Rep<'a> {
    pub input: &'a str,
    pub select: Result<Vec<SelectTarget>, SelectError>,
    pub table: Option<Sourced<TableName>>,
    pub filter: ConditionList,
    pub group_by: Vec<ColumnName>,
    pub having: ConditionList,
    pub order_by: Vec<ColumnName>,
    pub order_direction: Option<OrderDirection>,
    pub unparsed: Vec<UnparsedFragment>,
}

/// Aggregates are only allowed on the left side of HAVING conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    Where,
    Having,
}

impl<'a> Stage4Rep<'a> {
    pub fn parse(stage3: Stage3Rep<'a>, vocabulary: &Vocabulary) -> Self {
        let parser = ConditionParser {
            input: stage3.input,
            vocabulary,
            phrases: vocabulary.operators().in_priority_order(),
        };

        let mut unparsed = Vec::new();
        let filter = parser.parse(&stage3.filter, Clause::Where, &mut unparsed);
        let having = parser.parse(&stage3.having, Clause::Having, &mut unparsed);

        Stage4Rep {
            input: stage3.input,
            select: stage3.select,
            table: stage3.table,
            filter,
            group_by: stage3.group_by,
            having,
            order_by: stage3.order_by,
            order_direction: stage3.order_direction,
            unparsed,
        }
    }
}

/// A run of tokens between two connectives, and the connective before it.
struct Segment<'t, 'a> {
    connective: Option<Connective>,
    tokens: &'t [Sourced<Token<'a>>],
}

struct ConditionParser<'v, 'a> {
    input: &'a str,
    vocabulary: &'v Vocabulary,
    phrases: Vec<OperatorPhrase>,
}

impl<'v, 'a> ConditionParser<'v, 'a> {
    fn parse(
        &self,
        fragment: &Fragment<'a>,
        clause: Clause,
        unparsed: &mut Vec<UnparsedFragment>,
    ) -> ConditionList {
        let mut conditions = ConditionList::default();

        for segment in self.split(fragment) {
            match self.condition(segment.tokens, clause) {
                // A dropped segment takes its connective with it. If the first segment is dropped,
                // the next one becomes first, and its connective is ignored by push.
                Some(condition) => {
                    conditions.push(segment.connective.unwrap_or(Connective::And), condition)
                }
                None => {
                    let fragment = self.unparsed(segment.tokens);
                    debug!("could not read condition {:?}", fragment.text);
                    unparsed.push(fragment);
                }
            }
        }

        conditions
    }

    /// Splits on "and" and "or", except for the "and" in "between 1 and 2".
    fn split<'t>(&self, tokens: &'t [Sourced<Token<'a>>]) -> Vec<Segment<'t, 'a>> {
        #[derive(PartialEq)]
        enum Between {
            Closed,
            Opened,
            HasLowValue,
        }

        let mut segments = Vec::new();
        let mut connective = None;
        let mut start = 0;
        let mut between = Between::Closed;
        let mut index = 0;

        while index < tokens.len() {
            let token = &tokens[index].it;

            let found = if token.is_word("and") {
                Some(Connective::And)
            } else if token.is_word("or") {
                Some(Connective::Or)
            } else {
                None
            };

            match found {
                Some(Connective::And) if between == Between::HasLowValue => {
                    between = Between::Closed;
                    index += 1;
                }
                Some(next) => {
                    if start < index {
                        segments.push(Segment {
                            connective,
                            tokens: &tokens[start..index],
                        });
                    }

                    connective = Some(next);
                    between = Between::Closed;
                    index += 1;
                    start = index;
                }
                None => match self.between_phrase_at(tokens, index) {
                    Some(length) => {
                        between = Between::Opened;
                        index += length;
                    }
                    None => {
                        if between == Between::Opened {
                            between = Between::HasLowValue;
                        }
                        index += 1;
                    }
                },
            }
        }

        if start < tokens.len() {
            segments.push(Segment {
                connective,
                tokens: &tokens[start..],
            });
        }

        segments
    }

    fn between_phrase_at(&self, tokens: &[Sourced<Token>], index: usize) -> Option<usize> {
        self.phrases
            .iter()
            .filter(|phrase| phrase.operator == Operator::Between)
            .find(|phrase| phrase_at(tokens, index, &phrase.words))
            .map(|phrase| phrase.words.len())
    }

    fn condition(&self, tokens: &[Sourced<Token<'a>>], clause: Clause) -> Option<Condition> {
        // The first phrase found decides, even if the rest of the segment makes no sense with it.
        let explicit = self.phrases.iter().find_map(|phrase| {
            (1..tokens.len())
                .find(|index| phrase_at(tokens, *index, &phrase.words))
                .map(|index| (phrase, index))
        });

        if let Some((phrase, index)) = explicit {
            let subject = self.subject(&tokens[..index], clause)?;
            let operands = operands(phrase.operator, &tokens[index + phrase.words.len()..])?;

            return Some(Condition {
                subject,
                operator: phrase.operator,
                operands,
            });
        }

        // "name bob" is what's left of "name is bob" after normalizing. Only a single word, number
        // or quoted text counts as the value, "followers roughly 100" is not a condition.
        let (value, column) = tokens.split_last()?;
        if column.is_empty() {
            return None;
        }

        Some(Condition {
            subject: self.subject(column, clause)?,
            operator: Operator::Equals,
            operands: operands(Operator::Equals, std::slice::from_ref(value))?,
        })
    }

    /// The left side of a condition: a column, or in HAVING, an aggregate.
    fn subject(&self, tokens: &[Sourced<Token>], clause: Clause) -> Option<Subject> {
        let words: Vec<&str> = tokens.iter().map(|token| token.it.text()).collect();

        if clause == Clause::Having {
            if let Some((function, length)) = self.vocabulary.aggregates().match_prefix(&words[..]) {
                return self.aggregate_subject(function, &words[length..]);
            }
        }

        self.column(&words).map(Subject::Column)
    }

    fn aggregate_subject(&self, function: AggregateFunction, rest: &[&str]) -> Option<Subject> {
        let rest = match rest {
            ["of", rest @ ..] => rest,
            rest => rest,
        };

        let argument = match function {
            AggregateFunction::Count => None,
            _ if rest.is_empty() => None,
            _ => Some(self.column(rest)?),
        };

        Some(Subject::Aggregate(AggregateCall { function, argument }))
    }

    /// The whole phrase, or if that's not a column, its last word.
    fn column(&self, words: &[&str]) -> Option<ColumnName> {
        self.vocabulary
            .resolve_column(&words.join(" "))
            .or_else(|| self.vocabulary.resolve_column(words.last()?))
    }

    fn unparsed(&self, tokens: &[Sourced<Token>]) -> UnparsedFragment {
        let position = tokens
            .iter()
            .filter_map(|token| token.position())
            .reduce(Position::join)
            .unwrap_or(Position { start: 0, end: 0 });

        UnparsedFragment {
            text: self.input[position.start..position.end].to_string(),
            position,
        }
    }
}

fn operands(operator: Operator, tokens: &[Sourced<Token>]) -> Option<Operands> {
    if operator.arity() == 1 {
        return value(tokens).map(Operands::Single);
    }

    let and = tokens.iter().position(|token| token.it.is_word("and"))?;
    let low = value(&tokens[..and])?;
    let high = value(&tokens[and + 1..])?;

    Some(Operands::Range(low, high))
}

fn value(tokens: &[Sourced<Token>]) -> Option<LiteralValue> {
    match tokens {
        [] => None,
        [token] => match token.it {
            Token::Number(number) => Some(LiteralValue::Number(number.to_string())),
            other => Some(LiteralValue::Text(other.text().to_string())),
        },
        tokens => {
            let words: Vec<_> = tokens.iter().map(|token| token.it.text()).collect();

            Some(LiteralValue::Text(words.join(" ")))
        }
    }
}

fn phrase_at(tokens: &[Sourced<Token>], index: usize, words: &[String]) -> bool {
    match tokens.get(index..index + words.len()) {
        Some(found) => found
            .iter()
            .zip(words)
            .all(|(token, word)| token.it.is_phrase_part(word)),
        None => false,
    }
}

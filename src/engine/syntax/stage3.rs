//! Stage 3 finds the clauses in a question.
//!
//! ```text
//! show name, salary from employees where age over 30 order by salary descending
//! |--| |----------|      |-------|       |---------|          |----| |--------|
//! trigger  select         table           filter              order   direction
//! ```
//!
//! The clauses are always looked for in the same order: select, from, where, group by, having, and
//! order by. A clause never takes over tokens that an earlier one claimed.
use crate::engine::syntax::stage2::Stage2Rep;
use crate::engine::syntax::Token;
use crate::engine::vocabulary::{AggregateFunction, ColumnName, TableName, Vocabulary};
use crate::engine::{AggregateCall, OrderDirection, SelectTarget, Sourced};
use log::debug;

/// Words that start a question. Longer triggers come first, so "show me" wins over "show".
const SELECT_TRIGGERS: &[&[&str]] = &[
    &["show", "me"],
    &["give", "me"],
    &["show"],
    &["list"],
    &["display"],
    &["select"],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    From,
    /// Starts the WHERE clause.
    Filter,
    Having,
    GroupBy,
    OrderBy,
    /// Only ends the SELECT list: "show name *of* employees".
    Connector,
}

const KEYWORDS: &[(&[&str], Keyword)] = &[
    (&["group", "by"], Keyword::GroupBy),
    (&["grouped", "by"], Keyword::GroupBy),
    (&["order", "by"], Keyword::OrderBy),
    (&["ordered", "by"], Keyword::OrderBy),
    (&["sort", "by"], Keyword::OrderBy),
    (&["sorted", "by"], Keyword::OrderBy),
    (&["from"], Keyword::From),
    (&["where"], Keyword::Filter),
    (&["who"], Keyword::Filter),
    (&["with"], Keyword::Filter),
    (&["whose"], Keyword::Filter),
    (&["having"], Keyword::Having),
    (&["of"], Keyword::Connector),
    (&["for"], Keyword::Connector),
    (&["on"], Keyword::Connector),
    (&["that"], Keyword::Connector),
];

const DIRECTIONS: &[(&str, OrderDirection)] = &[
    ("ascending", OrderDirection::Ascending),
    ("asc", OrderDirection::Ascending),
    ("descending", OrderDirection::Descending),
    ("desc", OrderDirection::Descending),
];

const WILDCARDS: &[&str] = &["all", "everything", "*"];

/// Why we could not tell what to select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    /// The question does not start with "show", "list", or similar.
    NoTrigger,
    /// There's a trigger, but nothing after it.
    NothingSelected,
    /// Part of the select list is not a column we know.
    Unresolved(String),
}

pub type Fragment<'a> = Vec<Sourced<Token<'a>>>;

pub struct Stage3Rep<'a> {
    pub input: &'a str,
    pub select: Result<Vec<SelectTarget>, SelectError>,
    /// `None` if we could not find or infer it.
    pub table: Option<Sourced<TableName>>,
    /// Empty if there is no WHERE.
    pub filter: Fragment<'a>,
    pub group_by: Vec<ColumnName>,
    pub having: Fragment<'a>,
    pub order_by: Vec<ColumnName>,
    pub order_direction: Option<OrderDirection>,
}

impl<'a> Stage3Rep<'a> {
    pub fn extract(stage2: Stage2Rep<'a>, vocabulary: &Vocabulary) -> Self {
        let extractor = Extractor {
            tokens: &stage2.tokens,
            vocabulary,
        };

        let (select, select_end) = extractor.select();
        let table = extractor.table();
        let table_name = table.as_ref().map(|table| table.it.as_str());
        let filter = extractor.filter(select_end, table_name);
        let group_by = extractor.group_by(select_end);
        let having = extractor.having(select_end);
        let (order_by, order_direction) = extractor.order_by(select_end);

        debug!(
            "clauses of {:?}: select {select:?}, table {:?}, {} filter tokens, group by {group_by:?}, {} having tokens, order by {order_by:?} {order_direction:?}",
            stage2.input,
            table_name,
            filter.len(),
            having.len(),
        );

        Stage3Rep {
            input: stage2.input,
            select,
            table,
            filter,
            group_by,
            having,
            order_by,
            order_direction,
        }
    }
}

struct Extractor<'t, 'a> {
    tokens: &'t [Sourced<Token<'a>>],
    vocabulary: &'t Vocabulary,
}

impl<'t, 'a> Extractor<'t, 'a> {
    /// Returns the select list, and the index of the first token after it.
    fn select(&self) -> (Result<Vec<SelectTarget>, SelectError>, usize) {
        let Some((trigger_at, trigger_length)) = self.find_select_trigger() else {
            // "users with followers more than 100" reads just like "show users with ...".
            let end = self.next_keyword(0, |_| true);

            return match self.wildcard(&self.tokens[..end]) {
                Some(wildcard) => (Ok(vec![wildcard]), end),
                None => (Err(SelectError::NoTrigger), 0),
            };
        };

        let start = trigger_at + trigger_length;
        let end = self.next_keyword(start, |_| true);

        (self.select_targets(start, end), end)
    }

    /// Triggers only count before the first clause, so "name equals list" is not one.
    fn find_select_trigger(&self) -> Option<(usize, usize)> {
        let first_clause = self.next_keyword(0, |_| true);

        (0..first_clause).find_map(|index| {
            SELECT_TRIGGERS
                .iter()
                .find(|trigger| self.phrase_at(index, trigger))
                .map(|trigger| (index, trigger.len()))
        })
    }

    fn select_targets(&self, start: usize, end: usize) -> Result<Vec<SelectTarget>, SelectError> {
        let phrase = &self.tokens[start..end];

        if phrase.is_empty() {
            return Err(SelectError::NothingSelected);
        }

        if let Some(wildcard) = self.wildcard(phrase) {
            return Ok(vec![wildcard]);
        }

        let words = texts(phrase);

        // An aggregate at the start takes over the whole list: "total number of users" is just
        // COUNT(*), no matter what comes after it.
        if let Some((function, length)) = self.vocabulary.aggregates().match_prefix(&words[..]) {
            let argument = match function {
                AggregateFunction::Count => None,
                _ if length < words.len() => self.resolve(&words[length..].join(" ")),
                // "average of salary": the "of" ended the phrase early
                _ => self.of_column(end),
            };

            return Ok(vec![SelectTarget::Aggregate(AggregateCall {
                function,
                argument,
            })]);
        }

        split_list(phrase)
            .into_iter()
            .map(|piece| self.select_target(&texts(piece)))
            .collect()
    }

    /// One element of a SELECT list like "name, department and count".
    fn select_target(&self, words: &[&str]) -> Result<SelectTarget, SelectError> {
        if let Some((function, length)) = self.vocabulary.aggregates().match_prefix(words) {
            let argument = match function {
                AggregateFunction::Count => None,
                _ => self.resolve(&words[length..].join(" ")),
            };

            return Ok(SelectTarget::Aggregate(AggregateCall { function, argument }));
        }

        let phrase = words.join(" ");

        self.resolve(&phrase)
            .map(SelectTarget::Column)
            .ok_or(SelectError::Unresolved(phrase))
    }

    /// `*` for "all", "everything", "*", "all users", or just "users".
    fn wildcard(&self, phrase: &[Sourced<Token>]) -> Option<SelectTarget> {
        let words = texts(phrase);
        let schema = self.vocabulary.schema();

        let is_wildcard = match words.as_slice() {
            [word] => WILDCARDS.contains(word) || schema.is_table(word),
            ["all", table] => schema.is_table(table),
            _ => false,
        };

        is_wildcard.then_some(SelectTarget::Wildcard)
    }

    /// The column in "of <column>", if the token at `index` is "of".
    fn of_column(&self, index: usize) -> Option<ColumnName> {
        if !self.tokens.get(index)?.it.is_word("of") {
            return None;
        }

        let end = self.next_keyword(index + 1, |_| true);

        self.resolve(&texts(&self.tokens[index + 1..end]).join(" "))
    }

    /// Explicit "from <table>" first, then any table name, then we try to guess from the columns.
    fn table(&self) -> Option<Sourced<TableName>> {
        let after_from = self.tokens.windows(2).find_map(|pair| match pair {
            [from, table] if from.it.is_word("from") => match table.it {
                Token::Word(name) => Some(table.map(|_| TableName::from(name))),
                _ => None,
            },
            _ => None,
        });

        if after_from.is_some() {
            return after_from;
        }

        let schema = self.vocabulary.schema();
        let named = self.tokens.iter().find_map(|token| match token.it {
            Token::Word(word) if schema.is_table(word) => Some(token.map(|_| TableName::from(word))),
            _ => None,
        });

        named.or_else(|| self.infer_table())
    }

    /// If the question mentions columns, and only one table has all of them, that's the table.
    fn infer_table(&self) -> Option<Sourced<TableName>> {
        let schema = self.vocabulary.schema();
        let mentioned: Vec<&str> = self
            .tokens
            .iter()
            .filter_map(|token| match token.it {
                Token::Word(word) if schema.is_column(word) => Some(word),
                _ => None,
            })
            .collect();

        if mentioned.is_empty() {
            return None;
        }

        let mut candidates = schema
            .tables()
            .iter()
            .filter(|table| mentioned.iter().all(|column| table.has_column(column)));

        match (candidates.next(), candidates.next()) {
            (Some(table), None) => {
                debug!("inferred table {} from columns {mentioned:?}", table.name);
                Some(Sourced::inferred(table.name.clone()))
            }
            _ => None,
        }
    }

    fn filter(&self, from: usize, table: Option<&str>) -> Fragment<'a> {
        let mut index = from;

        while index < self.tokens.len() {
            match self.keyword_at(index) {
                Some((Keyword::Filter, length)) => {
                    return self.fragment(index + length);
                }
                Some((Keyword::Having | Keyword::GroupBy | Keyword::OrderBy, _)) => break,
                Some((_, length)) => index += length,
                None => index += 1,
            }
        }

        // "users that have ...": a relative clause right after the table name.
        let table = match table {
            Some(table) => table,
            None => return Vec::new(),
        };

        let relative_clause = self
            .tokens
            .windows(2)
            .position(|pair| pair[0].it.is_word(table) && pair[1].it.is_word("that"));

        match relative_clause {
            Some(index) => self.fragment(index + 2),
            None => Vec::new(),
        }
    }

    fn group_by(&self, from: usize) -> Vec<ColumnName> {
        match self.find_keyword(from, Keyword::GroupBy) {
            Some((index, length)) => {
                let (columns, _) = self.column_list(index + length);
                columns
            }
            None => Vec::new(),
        }
    }

    fn having(&self, from: usize) -> Fragment<'a> {
        match self.find_keyword(from, Keyword::Having) {
            Some((index, length)) => self.fragment(index + length),
            None => Vec::new(),
        }
    }

    fn order_by(&self, from: usize) -> (Vec<ColumnName>, Option<OrderDirection>) {
        let Some((index, length)) = self.find_keyword(from, Keyword::OrderBy) else {
            return (Vec::new(), None);
        };

        let (columns, end) = self.column_list(index + length);
        let direction = self.tokens.get(end).and_then(|token| direction(&token.it));

        (columns, direction)
    }

    /// Reads "a, b and c" up to the next keyword or sort direction. Returns the columns and the
    /// index of the first token after them.
    ///
    /// Columns we don't know are kept as they are, so the error can name them later.
    fn column_list(&self, start: usize) -> (Vec<ColumnName>, usize) {
        let end = self.next_keyword(start, |_| true);
        let end = (start..end)
            .find(|index| direction(&self.tokens[*index].it).is_some())
            .unwrap_or(end);

        let columns = split_list(&self.tokens[start..end])
            .into_iter()
            .map(|piece| {
                let phrase = texts(piece).join(" ");
                self.resolve(&phrase).unwrap_or(ColumnName(phrase))
            })
            .collect();

        (columns, end)
    }

    /// Tokens from `start` up to the next clause.
    fn fragment(&self, start: usize) -> Fragment<'a> {
        let end = self.next_keyword(start, |keyword| {
            matches!(
                keyword,
                Keyword::From | Keyword::Having | Keyword::GroupBy | Keyword::OrderBy
            )
        });

        self.tokens[start..end].to_vec()
    }

    fn find_keyword(&self, from: usize, wanted: Keyword) -> Option<(usize, usize)> {
        (from..self.tokens.len()).find_map(|index| match self.keyword_at(index) {
            Some((keyword, length)) if keyword == wanted => Some((index, length)),
            _ => None,
        })
    }

    /// Index of the first keyword the filter accepts, or the end of the tokens.
    fn next_keyword<F>(&self, from: usize, accept: F) -> usize
    where
        F: Fn(Keyword) -> bool,
    {
        (from..self.tokens.len())
            .find(|index| matches!(self.keyword_at(*index), Some((keyword, _)) if accept(keyword)))
            .unwrap_or(self.tokens.len())
    }

    fn keyword_at(&self, index: usize) -> Option<(Keyword, usize)> {
        KEYWORDS
            .iter()
            .find(|(words, _)| self.phrase_at(index, words))
            .map(|(words, keyword)| (*keyword, words.len()))
    }

    fn phrase_at(&self, index: usize, words: &[&str]) -> bool {
        match self.tokens.get(index..index + words.len()) {
            Some(tokens) => tokens
                .iter()
                .zip(words)
                .all(|(token, word)| token.it.is_word(word)),
            None => false,
        }
    }

    fn resolve(&self, phrase: &str) -> Option<ColumnName> {
        self.vocabulary.resolve_column(phrase)
    }
}

fn direction(token: &Token) -> Option<OrderDirection> {
    DIRECTIONS
        .iter()
        .find(|(word, _)| token.is_word(word))
        .map(|(_, direction)| *direction)
}

/// Splits "a, b and c" into "a", "b", and "c". Empty pieces are dropped.
fn split_list<'t, 'a>(tokens: &'t [Sourced<Token<'a>>]) -> Vec<&'t [Sourced<Token<'a>>]> {
    tokens
        .split(|token| token.it == Token::Comma || token.it.is_word("and"))
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn texts<'a>(tokens: &[Sourced<Token<'a>>]) -> Vec<&'a str> {
    tokens.iter().map(|token| token.it.text()).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::syntax::stage1::parse_stage1;
    use crate::engine::Source;

    fn extract(input: &str) -> Stage3Rep<'_> {
        let vocabulary = Vocabulary::built_in().unwrap();
        let stage2: Stage2Rep = parse_stage1(input).unwrap().into();

        Stage3Rep::extract(stage2, &vocabulary)
    }

    fn table(stage3: &Stage3Rep) -> Option<String> {
        stage3.table.as_ref().map(|table| table.it.to_string())
    }

    fn columns(names: &[&str]) -> Vec<SelectTarget> {
        names
            .iter()
            .map(|name| SelectTarget::Column(ColumnName::from(*name)))
            .collect()
    }

    #[test]
    fn test_select_list_keeps_order() {
        let stage3 = extract("show email, name and followers from users");

        assert_eq!(Ok(columns(&["email", "name", "followers"])), stage3.select);
        assert_eq!(Some("users".to_string()), table(&stage3));
        assert_eq!(36..41, stage3.table.unwrap().source);
    }

    #[test]
    fn test_wildcards() {
        for input in [
            "show all from users",
            "show everything from users",
            "show * from users",
            "show me all users",
            "list users",
            "users with followers more than 100",
        ] {
            let stage3 = extract(input);

            assert_eq!(Ok(vec![SelectTarget::Wildcard]), stage3.select, "{input}");
            assert_eq!(Some("users".to_string()), table(&stage3), "{input}");
        }
    }

    #[test]
    fn test_aggregates() {
        let count = extract("show total number of employees");
        assert_eq!(
            Ok(vec![SelectTarget::Aggregate(AggregateCall {
                function: AggregateFunction::Count,
                argument: None,
            })]),
            count.select
        );

        let average = extract("show average of salary from employees");
        assert_eq!(
            Ok(vec![SelectTarget::Aggregate(AggregateCall {
                function: AggregateFunction::Avg,
                argument: Some("salary".into()),
            })]),
            average.select
        );

        let maximum = extract("show maximum from employees");
        assert_eq!(
            Ok(vec![SelectTarget::Aggregate(AggregateCall {
                function: AggregateFunction::Max,
                argument: None,
            })]),
            maximum.select
        );
    }

    #[test]
    fn test_select_failures() {
        assert_eq!(
            Err(SelectError::Unresolved("puppies".to_string())),
            extract("show name, puppies from users").select
        );
        assert_eq!(Err(SelectError::NothingSelected), extract("show from users").select);
        assert_eq!(Err(SelectError::NoTrigger), extract("name from users").select);
    }

    #[test]
    fn test_triggers_only_before_the_first_clause() {
        let stage3 = extract("users with name equals display");
        let filter: Vec<_> = stage3.filter.iter().map(|t| t.it.text()).collect();

        assert_eq!(Ok(vec![SelectTarget::Wildcard]), stage3.select);
        assert_eq!(vec!["name", "equals", "display"], filter);

        let stage3 = extract("please show name from users where name equals list");
        let filter: Vec<_> = stage3.filter.iter().map(|t| t.it.text()).collect();

        assert_eq!(Ok(columns(&["name"])), stage3.select);
        assert_eq!(vec!["name", "equals", "list"], filter);
    }

    #[test]
    fn test_explicit_table_wins() {
        let stage3 = extract("show foo from bar");

        assert_eq!(Some("bar".to_string()), table(&stage3));
    }

    #[test]
    fn test_table_inference() {
        let inferred = extract("show followers and name");
        assert_eq!(Some("users".to_string()), table(&inferred));
        assert_eq!(Some(Source::Inferred), inferred.table.map(|table| table.source));

        // every table has a name
        assert_eq!(None, table(&extract("show name")));
        // no table has both
        assert_eq!(None, table(&extract("show followers and salary")));
        assert_eq!(None, table(&extract("show puppies")));
    }

    #[test]
    fn test_filter_fragment() {
        let stage3 = extract("show name from employees where age over 30 order by name");
        let filter: Vec<_> = stage3.filter.iter().map(|t| t.it.text()).collect();

        assert_eq!(vec!["age", "over", "30"], filter);
        assert_eq!(vec![ColumnName::from("name")], stage3.order_by);
        assert_eq!(None, stage3.order_direction);
    }

    #[test]
    fn test_relative_clause() {
        let stage3 = extract("list users that followers over 10");
        let filter: Vec<_> = stage3.filter.iter().map(|t| t.it.text()).collect();

        assert_eq!(vec!["followers", "over", "10"], filter);
    }

    #[test]
    fn test_group_by_having_order_by() {
        let stage3 = extract(
            "show department and count from employees group by department having count over 2 order by department desc",
        );

        assert_eq!(vec![ColumnName::from("department")], stage3.group_by);
        assert!(stage3.filter.is_empty());

        let having: Vec<_> = stage3.having.iter().map(|t| t.it.text()).collect();
        assert_eq!(vec!["count", "over", "2"], having);

        assert_eq!(vec![ColumnName::from("department")], stage3.order_by);
        assert_eq!(Some(OrderDirection::Descending), stage3.order_direction);
    }

    #[test]
    fn test_unknown_order_columns_are_kept() {
        let stage3 = extract("show all from users order by shoe size ascending");

        assert_eq!(vec![ColumnName::from("shoe size")], stage3.order_by);
        assert_eq!(Some(OrderDirection::Ascending), stage3.order_direction);
    }
}

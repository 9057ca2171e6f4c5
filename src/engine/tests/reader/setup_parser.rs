//! We can insert create table statements at the beginning of our .sql tests and these will be used
//! as the schema for that file.
//!
//! Because I'm lazy, the statements have to be written in just the right way: a name, then the
//! column names between parentheses, separated by commas, and a ";" at the end. Anything after a
//! column's name (like a type) is ignored.
//!
//! Synonyms come from the built-in vocabulary, for the columns that are still around.
use crate::engine::tests::reader::TestLineIterator;
use crate::engine::vocabulary::{
    AggregateLexicon, ColumnName, OperatorLexicon, Schema, SynonymTable, Table,
};
use crate::engine::Vocabulary;
use crate::error::InternalError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static CREATE_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^create\s+table\s+`?(\w+)`?\s*\((.*)\)$").expect("the pattern is valid")
});

pub fn read_vocabulary(lines: &mut TestLineIterator) -> Result<Vocabulary, crate::Error> {
    let tables = read_create_table_statements(lines)?;

    if tables.is_empty() {
        return Vocabulary::built_in();
    }

    let schema = Schema::new(tables);
    let built_in = Vocabulary::built_in()?;

    let synonyms: BTreeMap<ColumnName, Vec<String>> = schema
        .tables()
        .iter()
        .flat_map(|table| table.columns.iter())
        .map(|column| {
            let phrases = built_in.synonyms().synonyms_of(column.as_str()).to_vec();
            (column.clone(), phrases)
        })
        .filter(|(_, phrases)| !phrases.is_empty())
        .collect();

    Ok(Vocabulary::new(
        schema,
        SynonymTable::new(synonyms),
        OperatorLexicon::default(),
        AggregateLexicon::default(),
    )?)
}

fn read_create_table_statements(lines: &mut TestLineIterator) -> Result<Vec<Table>, crate::Error> {
    let mut buffer = String::new();

    while let Some((_, next_item)) = lines.peek() {
        let line = match next_item {
            Ok(line) => line,
            Err(_) => break, // malformed UTF-8, the test reader will report it
        };

        if line.starts_with("-- Test: ") {
            // Any create table statements AFTER the first test are ignored.
            break;
        }

        if !line.trim().is_empty() && !line.starts_with("--") {
            buffer.push_str(line);
            buffer.push('\n');
        }

        lines.next();
    }

    buffer
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(parse_create_table)
        .collect()
}

fn parse_create_table(statement: &str) -> Result<Table, crate::Error> {
    let captures = CREATE_TABLE.captures(statement).ok_or_else(|| {
        InternalError(format!("Can't read create table statement:\n{statement}"))
    })?;

    let columns = captures[2]
        .split(',')
        .filter_map(|definition| definition.split_whitespace().next())
        .map(|name| name.trim_matches('`').to_lowercase());

    Ok(Table::new(captures[1].to_lowercase(), columns))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_create_table() {
        let table = parse_create_table("create table `books` (\n  `id` int,\n  title,\n  pages\n)")
            .unwrap();

        assert_eq!("books", table.name.as_str());
        assert_eq!(
            vec!["id", "title", "pages"],
            table
                .columns
                .iter()
                .map(ColumnName::as_str)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_bad_statement() {
        assert!(parse_create_table("create index on books").is_err());
    }
}

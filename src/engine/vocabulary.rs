//! Everything the translator knows about the world: tables, the words people use for columns,
//! comparison phrases and aggregate phrases.
//!
//! A [Vocabulary] is checked once when it's built and never changes after that, so it can be
//! shared freely between translations.
//!
//! Vocabularies can be read from JSON documents that look like this:
//! ```json
//! {
//!     "tables": [
//!         { "name": "users", "columns": ["id", "name", "followers"] }
//!     ],
//!     "synonyms": {
//!         "followers": ["follower count", "fans"]
//!     }
//! }
//! ```
//! `operators` and `aggregates` can be specified the same way, but default to the built-in ones.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub mod operators;
pub mod schema;
pub mod synonyms;

pub use operators::{AggregateFunction, AggregateLexicon, Operator, OperatorLexicon};
pub use schema::{ColumnName, Schema, Table, TableName};
pub use synonyms::SynonymTable;

static BUILT_IN_VOCABULARY: &str = include_str!("vocabulary/default.json");

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("the identifier pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "VocabularyDocument", into = "VocabularyDocument")]
pub struct Vocabulary {
    schema: Schema,
    synonyms: SynonymTable,
    operators: OperatorLexicon,
    aggregates: AggregateLexicon,
}

/// The shape of vocabulary JSON files. It becomes a [Vocabulary] only after passing the checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VocabularyDocument {
    tables: Schema,
    #[serde(default)]
    synonyms: SynonymTable,
    #[serde(default)]
    operators: OperatorLexicon,
    #[serde(default)]
    aggregates: AggregateLexicon,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("the schema does not have any tables")]
    NoTables,
    #[error("'{0}' is not a valid name, use lower case letters, digits and '_'")]
    InvalidIdentifier(String),
    #[error("table '{0}' is declared more than once")]
    DuplicateTable(TableName),
    #[error("table '{0}' does not have any columns")]
    EmptyTable(TableName),
    #[error("synonyms are listed for '{0}', but no table has that column")]
    UnknownCanonicalColumn(ColumnName),
    #[error("phrase '{phrase}' is listed for both '{first}' and '{second}'")]
    AmbiguousSynonym {
        phrase: String,
        first: ColumnName,
        second: ColumnName,
    },
    #[error("phrase '{phrase}' for '{column}' is already the name of another column")]
    SynonymShadowsColumn { phrase: String, column: ColumnName },
    #[error("empty phrase found in {0}")]
    EmptyPhrase(String),
    #[error("could not build the matcher for synonyms: {0}")]
    InvalidPattern(String),
}

impl Vocabulary {
    pub fn new(
        schema: Schema,
        synonyms: SynonymTable,
        operators: OperatorLexicon,
        aggregates: AggregateLexicon,
    ) -> Result<Self, ConfigError> {
        check_schema(&schema)?;

        let synonyms = synonyms.normalized();
        let operators = operators.normalized();
        let aggregates = aggregates.normalized();

        synonyms.check(&schema)?;
        operators.check()?;
        aggregates.check()?;

        Ok(Vocabulary {
            schema,
            synonyms,
            operators,
            aggregates,
        })
    }

    /// The vocabulary used when nothing else is configured.
    pub fn built_in() -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(BUILT_IN_VOCABULARY)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, crate::Error> {
        let contents = fs::read_to_string(path)?;

        Ok(serde_json::from_str(&contents)?)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    pub fn operators(&self) -> &OperatorLexicon {
        &self.operators
    }

    pub fn aggregates(&self) -> &AggregateLexicon {
        &self.aggregates
    }

    /// Resolves a phrase to a canonical column: either a column name, or one of its synonyms.
    pub fn resolve_column(&self, phrase: &str) -> Option<ColumnName> {
        if self.schema.is_column(phrase) {
            return Some(ColumnName::from(phrase));
        }

        self.synonyms.resolve(phrase).cloned()
    }
}

fn check_schema(schema: &Schema) -> Result<(), ConfigError> {
    if schema.tables().is_empty() {
        return Err(ConfigError::NoTables);
    }

    for (index, table) in schema.tables().iter().enumerate() {
        if !IDENTIFIER.is_match(table.name.as_str()) {
            return Err(ConfigError::InvalidIdentifier(table.name.to_string()));
        }

        if schema.tables()[..index]
            .iter()
            .any(|other| other.name == table.name)
        {
            return Err(ConfigError::DuplicateTable(table.name.clone()));
        }

        if table.columns.is_empty() {
            return Err(ConfigError::EmptyTable(table.name.clone()));
        }

        if let Some(column) = table
            .columns
            .iter()
            .find(|column| !IDENTIFIER.is_match(column.as_str()))
        {
            return Err(ConfigError::InvalidIdentifier(column.to_string()));
        }
    }

    Ok(())
}

impl TryFrom<VocabularyDocument> for Vocabulary {
    type Error = ConfigError;

    fn try_from(document: VocabularyDocument) -> Result<Self, Self::Error> {
        Vocabulary::new(
            document.tables,
            document.synonyms,
            document.operators,
            document.aggregates,
        )
    }
}

impl From<Vocabulary> for VocabularyDocument {
    fn from(vocabulary: Vocabulary) -> Self {
        VocabularyDocument {
            tables: vocabulary.schema,
            synonyms: vocabulary.synonyms,
            operators: vocabulary.operators,
            aggregates: vocabulary.aggregates,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_built_in_vocabulary_is_valid() {
        let vocabulary = Vocabulary::built_in().unwrap();
        let tables: Vec<_> = vocabulary
            .schema()
            .tables()
            .iter()
            .map(|table| table.name.as_str())
            .collect();

        assert_eq!(vec!["users", "employees", "departments"], tables);
        assert_eq!(
            Some(ColumnName::from("followers")),
            vocabulary.resolve_column("follower count")
        );
        assert_eq!(
            Some(ColumnName::from("created_at")),
            vocabulary.resolve_column("created_at")
        );
        assert_eq!(None, vocabulary.resolve_column("puppies"));
    }

    #[test]
    fn test_documents_are_checked() {
        let result: Result<Vocabulary, _> = serde_json::from_str(
            r#"{"tables": [{"name": "users", "columns": ["id"]}], "synonyms": {"name": ["username"]}}"#,
        );

        let error = result.unwrap_err().to_string();
        assert!(error.contains("no table has that column"), "{error}");
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let schema = Schema::new(vec![Table::new("Users", ["id"])]);
        let result = Vocabulary::new(
            schema,
            SynonymTable::default(),
            OperatorLexicon::default(),
            AggregateLexicon::default(),
        );

        assert_eq!(
            ConfigError::InvalidIdentifier("Users".to_string()),
            result.unwrap_err()
        );
    }

    #[test]
    fn test_duplicate_tables_are_rejected() {
        let schema = Schema::new(vec![
            Table::new("users", ["id"]),
            Table::new("users", ["name"]),
        ]);
        let result = Vocabulary::new(
            schema,
            SynonymTable::default(),
            OperatorLexicon::default(),
            AggregateLexicon::default(),
        );

        assert_eq!(
            ConfigError::DuplicateTable("users".into()),
            result.unwrap_err()
        );
    }

    #[test]
    fn test_round_trips_through_json() {
        let vocabulary = Vocabulary::built_in().unwrap();
        let json = serde_json::to_string(&vocabulary).unwrap();
        let again: Vocabulary = serde_json::from_str(&json).unwrap();

        assert_eq!(
            vocabulary.synonyms().synonyms_of("salary"),
            again.synonyms().synonyms_of("salary")
        );
    }
}

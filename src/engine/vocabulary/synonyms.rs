//! Other ways people refer to columns.
//!
//! "follower count", "followers count", and "subscribers" all mean the `followers` column. The
//! column's own name is not listed here, it always resolves to itself.
use crate::engine::vocabulary::schema::{ColumnName, Schema};
use crate::engine::vocabulary::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynonymTable {
    entries: BTreeMap<ColumnName, Vec<String>>,
}

impl SynonymTable {
    pub fn new(entries: BTreeMap<ColumnName, Vec<String>>) -> Self {
        SynonymTable { entries }
    }

    pub fn synonyms_of(&self, column: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(canonical, _)| *canonical == column)
            .map(|(_, phrases)| phrases.as_slice())
            .unwrap_or_default()
    }

    /// All (phrase, canonical column) pairs, longest phrase first.
    ///
    /// Matching in this order makes sure "follower count" wins over "follower".
    pub fn phrases_longest_first(&self) -> Vec<(&str, &ColumnName)> {
        let mut phrases: Vec<_> = self
            .entries
            .iter()
            .flat_map(|(column, phrases)| phrases.iter().map(move |p| (p.as_str(), column)))
            .collect();

        phrases.sort_by(|(a, _), (b, _)| {
            word_count(b)
                .cmp(&word_count(a))
                .then(b.len().cmp(&a.len()))
                .then(a.cmp(b))
        });

        phrases
    }

    /// Makes sure every phrase means exactly one column, and that all columns exist.
    pub fn check(&self, schema: &Schema) -> Result<(), ConfigError> {
        let mut seen: HashMap<String, &ColumnName> = HashMap::new();

        for (column, phrases) in &self.entries {
            if !schema.is_column(column.as_str()) {
                return Err(ConfigError::UnknownCanonicalColumn(column.clone()));
            }

            for phrase in phrases {
                let phrase = collapse_whitespace(phrase);

                if phrase.is_empty() {
                    return Err(ConfigError::EmptyPhrase(column.to_string()));
                }

                if schema.is_column(&phrase) && *column != phrase.as_str() {
                    return Err(ConfigError::SynonymShadowsColumn {
                        phrase,
                        column: column.clone(),
                    });
                }

                if let Some(previous) = seen.insert(phrase.clone(), column) {
                    return Err(ConfigError::AmbiguousSynonym {
                        phrase,
                        first: previous.clone(),
                        second: column.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Lower-cases all phrases and squashes their whitespace, so lookups can be exact.
    pub(super) fn normalized(self) -> Self {
        let entries = self
            .entries
            .into_iter()
            .map(|(column, phrases)| {
                let phrases = phrases
                    .iter()
                    .map(|phrase| collapse_whitespace(&phrase.to_lowercase()))
                    .collect();

                (column, phrases)
            })
            .collect();

        SynonymTable { entries }
    }

    pub fn resolve(&self, phrase: &str) -> Option<&ColumnName> {
        self.entries
            .iter()
            .find(|(_, phrases)| phrases.iter().any(|known| known == phrase))
            .map(|(column, _)| column)
    }
}

fn word_count(phrase: &str) -> usize {
    phrase.split_whitespace().count()
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! Cleans up questions before we tokenize them.
//!
//! - everything is lower-cased
//! - "the", "is", and "are" are dropped
//! - synonyms are replaced by the column they stand for: "follower count" becomes "followers"
//!
//! Text inside quotes is left alone: `name is 'The Boss'` becomes `name 'The Boss'`.
use crate::engine::vocabulary::synonyms::collapse_whitespace;
use crate::engine::vocabulary::{ColumnName, ConfigError, Vocabulary};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashMap;

const FILLER_WORDS: [&str; 3] = ["the", "is", "are"];

// A quote only starts a literal at the beginning of a word, "o'brien" is just a word. This has to
// agree with the tokenizer grammar.
static QUOTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(^|[\s=<>!,(])('[^']*'|"[^"]*")"#).expect("the quote pattern is valid")
});

static FILLERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(?:{})\b", FILLER_WORDS.join("|")))
        .expect("the filler pattern is valid")
});

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("the whitespace pattern is valid"));

#[derive(Debug)]
pub struct Normalizer {
    /// `None` when there are no synonyms at all.
    synonyms: Option<Regex>,
    canonical: HashMap<String, ColumnName>,
}

impl Normalizer {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, ConfigError> {
        let phrases = vocabulary.synonyms().phrases_longest_first();

        // The regex crate picks the first alternative that matches, so the order we got the
        // phrases in is the order they're tried in.
        let synonyms = if phrases.is_empty() {
            None
        } else {
            let alternatives: Vec<_> = phrases
                .iter()
                .map(|(phrase, _)| {
                    phrase
                        .split_whitespace()
                        .map(regex::escape)
                        .collect::<Vec<_>>()
                        .join(r"\s+")
                })
                .collect();

            let pattern = format!(r"\b(?:{})\b", alternatives.join("|"));
            let regex =
                Regex::new(&pattern).map_err(|error| ConfigError::InvalidPattern(error.to_string()))?;

            Some(regex)
        };

        let canonical = phrases
            .into_iter()
            .map(|(phrase, column)| (phrase.to_string(), column.clone()))
            .collect();

        Ok(Normalizer {
            synonyms,
            canonical,
        })
    }

    pub fn normalize(&self, input: &str) -> String {
        let mut output = String::with_capacity(input.len());
        let mut plain_start = 0;

        for captures in QUOTED.captures_iter(input) {
            if let Some(literal) = captures.get(2) {
                output.push_str(&self.normalize_plain(&input[plain_start..literal.start()]));
                output.push_str(literal.as_str());
                plain_start = literal.end();
            }
        }

        output.push_str(&self.normalize_plain(&input[plain_start..]));

        output.trim().to_string()
    }

    /// Normalizes text that has no quotes in it.
    fn normalize_plain(&self, text: &str) -> String {
        let lower = text.to_lowercase();

        let replaced = match &self.synonyms {
            Some(synonyms) => synonyms.replace_all(&lower, |captures: &Captures| {
                let phrase = collapse_whitespace(&captures[0]);

                match self.canonical.get(&phrase) {
                    Some(column) => column.to_string(),
                    None => captures[0].to_string(),
                }
            }),
            None => Cow::Borrowed(lower.as_str()),
        };

        let without_fillers = FILLERS.replace_all(&replaced, "");

        WHITESPACE.replace_all(&without_fillers, " ").into_owned()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn normalize(input: &str) -> String {
        let vocabulary = Vocabulary::built_in().unwrap();

        Normalizer::new(&vocabulary).unwrap().normalize(input)
    }

    #[test]
    fn test_lower_cases_and_drops_fillers() {
        assert_eq!(
            "show me all users",
            normalize("Show me ALL   the users")
        );
        assert_eq!("which island this", normalize("which island is this"));
        assert_eq!("users", normalize("  The users are  "));
    }

    #[test]
    fn test_replaces_longest_synonyms_first() {
        assert_eq!(
            "users with followers more than 100",
            normalize("users with follower count more than 100")
        );
        assert_eq!(
            "users with followers more than 100",
            normalize("users with Follower  Count more than 100")
        );
        assert_eq!("followers", normalize("follower"));
        assert_eq!("followers", normalize("followers"));
        assert_eq!("email", normalize("e-mail"));
        assert_eq!("created_at", normalize("sign up date"));
    }

    #[test]
    fn test_synonyms_only_match_whole_words() {
        assert_eq!("payment", normalize("payment"));
        assert_eq!("salary", normalize("pay"));
    }

    #[test]
    fn test_quoted_text_is_kept() {
        assert_eq!(
            "name equals 'The Boss Is Here'",
            normalize("Name equals 'The Boss Is Here'")
        );
        assert_eq!(
            r#"name="The Pay" or name 'Ann'"#,
            normalize(r#"Name="The Pay" or name is 'Ann'"#)
        );
        assert_eq!("name o'brien", normalize("name is O'Brien"));
    }

    #[test]
    fn test_without_synonyms() {
        let vocabulary: Vocabulary =
            serde_json::from_str(r#"{"tables": [{"name": "users", "columns": ["id"]}]}"#).unwrap();
        let normalizer = Normalizer::new(&vocabulary).unwrap();

        assert_eq!("show id", normalizer.normalize("Show the ID"));
    }
}

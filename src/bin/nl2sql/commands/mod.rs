use colored::Colorize;
use log::info;
use nl2sql::vocabulary::Vocabulary;
use nl2sql::{Translation, Translator};
use std::env::{self, VarError};
use std::path::{Path, PathBuf};

pub mod repl;

const CONFIG_VARIABLE: &str = "NL2SQL_CONFIG";

/// Builds a translator from --config, or the config environment variable, or the built-in
/// vocabulary, in that order.
pub fn translator(config: Option<&Path>, strict: bool) -> Result<Translator, nl2sql::Error> {
    let vocabulary = match config_path(config)? {
        Some(path) => {
            info!("reading vocabulary from {}", path.display());
            Vocabulary::from_file(&path)?
        }
        None => {
            info!("using the built-in vocabulary");
            Vocabulary::built_in()?
        }
    };

    Ok(Translator::new(vocabulary)?.strict(strict))
}

fn config_path(config: Option<&Path>) -> Result<Option<PathBuf>, nl2sql::Error> {
    if let Some(path) = config {
        return Ok(Some(path.to_path_buf()));
    }

    match env::var(CONFIG_VARIABLE) {
        Ok(path) if !path.trim().is_empty() => Ok(Some(PathBuf::from(path))),
        Ok(_) | Err(VarError::NotPresent) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

pub fn translate_one(translator: &Translator, input: &str) -> Result<(), nl2sql::Error> {
    let translation = translator.translate(input)?;

    print_translation(&translation);

    Ok(())
}

/// SQL goes to stdout, everything else to stderr.
pub fn print_translation(translation: &Translation) {
    println!("{}", translation.sql);

    for fragment in &translation.unparsed {
        eprintln!(
            "{intro}: left out \"{}\", it could not be read as a condition",
            fragment.text,
            intro = "warning".bold().yellow()
        );
    }
}

pub fn print_schema(vocabulary: &Vocabulary) {
    for table in vocabulary.schema().tables() {
        let columns: Vec<_> = table.columns.iter().map(|column| column.as_str()).collect();

        println!("{}: {}", table.name.to_string().bold(), columns.join(", "));
    }
}

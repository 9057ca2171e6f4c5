use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Vocabulary file (JSON) with the tables, synonyms, and phrases to use.
    ///
    /// Falls back to the NL2SQL_CONFIG environment variable, then to the built-in vocabulary.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Fail when part of a condition can't be read, instead of leaving it out.
    #[arg(long, global = true)]
    pub strict: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Translates a single question to SQL.
    Translate { input: String },
    /// Asks for questions until you type "exit". Type "history" to see what you asked.
    Repl,
    /// Lists the tables and columns questions can be about.
    Schema,
}

use crate::commands::print_translation;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{History, Input};
use log::debug;
use nl2sql::Translator;

/// Everything typed in this session, oldest first. It's never saved anywhere.
#[derive(Debug, Default)]
pub struct QueryHistory {
    entries: Vec<String>,
}

impl QueryHistory {
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl<T: ToString> History<T> for QueryHistory {
    /// Position 0 is the most recent entry.
    fn read(&self, pos: usize) -> Option<String> {
        let index = self.entries.len().checked_sub(pos + 1)?;

        self.entries.get(index).cloned()
    }

    fn write(&mut self, val: &T) {
        self.entries.push(val.to_string());
    }
}

/// What a line typed in the repl asks for.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Nothing,
    Exit,
    History,
    Question(&'a str),
}

impl<'a> Command<'a> {
    fn read(input: &'a str) -> Self {
        let input = input.trim();

        match input.to_lowercase().as_str() {
            "" => Command::Nothing,
            "exit" | "quit" => Command::Exit,
            "history" => Command::History,
            _ => Command::Question(input),
        }
    }
}

pub fn run(translator: &Translator) -> Result<(), nl2sql::Error> {
    let mut history = QueryHistory::default();

    println!(
        "Ask a question, {} to see what you asked, or {} to leave.",
        "history".bold(),
        "exit".bold()
    );

    loop {
        let input: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("question")
            .allow_empty(true)
            .history_with(&mut history)
            .interact_text()?;

        match Command::read(&input) {
            Command::Nothing => continue,
            Command::Exit => break,
            Command::History => print_history(&history),
            Command::Question(question) => match translator.translate(question) {
                Ok(translation) => print_translation(&translation),
                // A bad question should not end the session.
                Err(error) => eprintln!("{intro}: {error}", intro = "error".bold().red()),
            },
        }
    }

    debug!("asked {} question(s)", history.entries().len());

    Ok(())
}

fn print_history(history: &QueryHistory) {
    for (index, entry) in history.entries().iter().enumerate() {
        println!("{:>4}  {entry}", index + 1);
    }
}

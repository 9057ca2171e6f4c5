mod args;
mod commands;

use crate::args::{Args, Command};
use clap::Parser;
use colored::Colorize;
use std::process::exit;

fn main() {
    env_logger::init();

    let args = Args::parse();

    if let Err(error) = run(args) {
        eprintln!("{intro}: {error}", intro = "error".bold().red());
        exit(1);
    }
}

fn run(args: Args) -> Result<(), nl2sql::Error> {
    let translator = commands::translator(args.config.as_deref(), args.strict)?;

    match args.command {
        Command::Translate { input } => commands::translate_one(&translator, &input),
        Command::Repl => commands::repl::run(&translator),
        Command::Schema => {
            commands::print_schema(translator.vocabulary());
            Ok(())
        }
    }
}

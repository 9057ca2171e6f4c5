//! The stage 1 representation is just the raw output from Pest
use pest::iterators::Pairs;
use pest::Parser;
use pest_derive::Parser;

/// Pest parser
///
/// Pest will autogenerate all of the code needed, and will also give an enum called "Rule" that
/// will have all the rule names from the nl.pest file.
#[derive(Parser)]
#[grammar = "engine/syntax/nl.pest"]
struct Stage1Parser;

pub fn parse_stage1(input: &str) -> Result<Stage1Rep<'_>, crate::error::Error> {
    let pest = Stage1Parser::parse(
        // we've constructed our grammar to always start with a Rule:root node.
        Rule::root,
        input,
    )?; // "?" automatically transforms Pest errors into crate::error:Errors

    Ok(Stage1Rep { input, pest })
}

/// Pest pair holder
///
/// All of the data can be directly found in the input string, so everything after this can
/// reference substrings of the input directly.
#[derive(Debug)]
pub struct Stage1Rep<'a> {
    pub input: &'a str,
    pub pest: Pairs<'a, Rule>,
}

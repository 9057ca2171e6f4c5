//! Stage 2 representation is a flat list of tokens, each knowing where it came from.
//!
//! Since this is just a more convenient way of representing the source Pest info, it's not possible
//! to fail to parse.
use crate::engine::syntax::stage1::{Rule, Stage1Rep};
use crate::engine::syntax::Token;
use crate::engine::Sourced;
use pest::iterators::Pair;

pub struct Stage2Rep<'a> {
    pub input: &'a str,
    pub tokens: Vec<Sourced<Token<'a>>>,
}

/// Pest guarantees the input is valid, so this can't fail.
impl<'a> From<Stage1Rep<'a>> for Stage2Rep<'a> {
    fn from(stage1: Stage1Rep<'a>) -> Self {
        let mut pest = stage1.pest;
        let root = pest.next().expect("Impossible due to pest parsing");

        assert_eq!(Rule::root, root.as_rule());
        assert!(pest.next().is_none());

        let tokens = root.into_inner().filter_map(translate_token).collect();

        Stage2Rep {
            input: stage1.input,
            tokens,
        }
    }
}

fn translate_token(pair: Pair<Rule>) -> Option<Sourced<Token>> {
    let span = pair.as_span();
    let token = match pair.as_rule() {
        Rule::word => Token::Word(pair.as_str()),
        Rule::number => Token::Number(pair.as_str()),
        Rule::symbol => Token::Symbol(pair.as_str()),
        Rule::quoted => Token::Quoted(
            pair.into_inner()
                .next()
                .map(|inner| inner.as_str())
                .unwrap_or_default(),
        ),
        Rule::comma => Token::Comma,
        Rule::star => Token::Star,
        Rule::EOI => return None, // EOI is End Of Input
        _ => panic!("Unknown token {:#?}", pair),
    };

    Some(Sourced::from_input(span, token))
}

use chumsky::{error::SimpleReason, prelude::*};
use thiserror::Error;

use crate::term::{Identifier, Term};

pub type Span = std::ops::Range<usize>;

#[derive(derive_more::Deref, Clone, Debug)]
pub struct Spanned<T>(#[deref] T, Span);

impl<T> Spanned<T> {
    pub fn value(&self) -> &T {
        &self.0
    }
    pub fn span(&self) -> Span {
        self.1.clone()
    }
}
impl<T> From<Spanned<T>> for (T, Span) {
    fn from(Spanned(value, span): Spanned<T>) -> Self {
        (value, span)
    }
}

pub trait SimpleParser<I: Clone + std::hash::Hash, O>: Parser<I, O, Error = Simple<I>> {}
impl<I: Clone + std::hash::Hash, O, T> SimpleParser<I, O> for T where
    T: Parser<I, O, Error = Simple<I>>
{
}

#[derive(PartialEq, Eq, Hash, Clone, derive_more::Display, Debug)]
pub enum Token {
    #[display(fmt = "(")]
    LParen,
    #[display(fmt = ")")]
    RParen,
    #[display(fmt = "λ")]
    Lambda,
    #[display(fmt = ".")]
    Dot,
    #[display(fmt = "{}", "_0")]
    Ident(Identifier),
}

pub fn lexer() -> impl SimpleParser<char, Vec<Spanned<Token>>> {
    // Identifiers start with a letter; digits and underscores may follow.
    // `text::ident()` would also admit a leading underscore, so spell it out.
    let ident = filter(|c: &char| c.is_ascii_alphabetic())
        .chain::<char, _, _>(filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_').repeated())
        .collect::<String>()
        .map(Identifier::new);
    let token = choice((
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('λ').or(just('\\')).to(Token::Lambda),
        just('.').to(Token::Dot),
        ident.map(Token::Ident),
    ));
    token
        .map_with_span(Spanned)
        .padded()
        .repeated()
        .then_ignore(end())
}

fn term_parser() -> impl SimpleParser<Token, Term> {
    recursive(|term: Recursive<_, Term, _>| {
        let var = select! {
            Token::Ident(name) => name,
        }
        .labelled("variable");

        let abs = just(Token::Lambda)
            .ignore_then(var.clone())
            .then_ignore(just(Token::Dot))
            .then(term.clone())
            .map(|(param, body)| Term::Abs(param, body.into()))
            .labelled("abstraction");

        let atom = choice((
            abs,
            var.map(Term::Var),
            term.delimited_by(just(Token::LParen), just(Token::RParen)),
        ));

        // Application folds left; abstraction bodies already extend
        // maximally to the right through the recursive `term`.
        atom.clone()
            .then(atom.repeated())
            .foldl(|lhs, rhs| Term::App(lhs.into(), rhs.into()))
    })
    .then_ignore(end())
}

#[derive(Error, Debug)]
#[error("{message}")]
pub struct ParseError {
    message: String,
    errors: Vec<Simple<String>>,
}

impl ParseError {
    fn new(errors: Vec<Simple<String>>) -> Self {
        let message = errors.iter().map(describe).collect::<Vec<_>>().join("; ");
        Self { message, errors }
    }

    /// The underlying spanned errors, for diagnostic rendering.
    pub fn errors(&self) -> &[Simple<String>] {
        &self.errors
    }
}

fn describe(error: &Simple<String>) -> String {
    match error.reason() {
        SimpleReason::Unexpected => {
            let found = error.found().map(String::as_str).unwrap_or("end of input");
            let expected = error
                .expected()
                .map(|t| t.as_ref().map(String::as_str).unwrap_or("end of input"))
                .collect::<Vec<_>>()
                .join(", ");
            if expected.is_empty() {
                format!("unexpected {found}")
            } else {
                format!("unexpected {found}, expected {expected}")
            }
        }
        SimpleReason::Unclosed { delimiter, .. } => format!("unclosed delimiter {delimiter}"),
        SimpleReason::Custom(message) => message.clone(),
    }
}

pub fn parse(input: &str) -> Result<Term, ParseError> {
    let len = input.chars().count();
    let eoi = len..len + 1;
    let tokens = lexer().parse(input).map_err(|es| {
        ParseError::new(es.into_iter().map(|e| e.map(|c| c.to_string())).collect())
    })?;
    term_parser()
        .parse(chumsky::Stream::from_iter(
            eoi,
            tokens.into_iter().map(|token| token.into()),
        ))
        .map_err(|es| ParseError::new(es.into_iter().map(|e| e.map(|t| t.to_string())).collect()))
}

//! A packrat parser combinator engine.
//!
//! Grammars are built from [`Term`]s and run by the [`Evaluator`], which keeps
//! its own stack instead of recursing, memoizes every `(term, position)`
//! outcome, and cuts off left recursion by treating a rule that re-enters
//! itself at the same position as failed. The same terms run over text or
//! over tokens produced by a [`Tokenizer`].

pub mod convert;
mod error;
mod eval;
pub mod grammar;
mod precedence;
mod source;
mod term;
mod token;
mod value;

pub use convert::{ConvertError, FromValue, NodeFields};
pub use error::ParseError;
pub use eval::{Config, Evaluator, Outcome, Stats};
pub use precedence::{precedence, Fixity, Row};
pub use source::Source;
pub use term::{Continuation, Fold, Mapper, Pick, Predicate, Struct, Term};
pub use token::{Span, Token, TokenClass, Tokenizer};
pub use value::{Node, Value};

/// Parse all of `source` with `term`.
pub fn parse<S: Source + ?Sized>(term: &Term, source: &S) -> Result<Value, ParseError> {
    let root = Term::left(vec![term.clone(), Term::end()]);
    parse_prefix(&root, source)
}

/// Parse a prefix of `source` with `term`; trailing input is ignored.
pub fn parse_prefix<S: Source + ?Sized>(term: &Term, source: &S) -> Result<Value, ParseError> {
    let mut evaluator = Evaluator::new(source);
    match evaluator.eval(term, 0)? {
        Some((value, _)) => Ok(value),
        None => Err(ParseError::NoMatch),
    }
}

/// Tokenize `text`, then parse all of the tokens with `term`.
pub fn tokenize_and_parse(
    tokenizer: &Tokenizer,
    term: &Term,
    text: &str,
) -> Result<Value, ParseError> {
    let tokens = tokenizer.tokenize(text)?;
    parse(term, tokens.as_slice())
}

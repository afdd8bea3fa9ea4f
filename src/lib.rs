//! Packrat parser combinators with a stack-safe evaluator.
//!
//! Build grammars from [`Term`]s, or compile them from EBNF text with
//! [`load_grammar`], and run them over text or tokens with [`parse`]. Parsed
//! nodes convert into typed structs with `#[derive(Node)]`.
//!
//! ```
//! use trellis::{parse, precedence, Row, Term};
//!
//! let number = Term::regex("[0-9]+").unwrap();
//! let expr = precedence(number, vec![Row::infix_left(vec![Term::literal("+")])]);
//! let value = parse(&expr, "1+2+3").unwrap();
//! assert_eq!(
//!     value.to_string(),
//!     r#"Binary(left=Binary(left="1", op="+", right="2"), op="+", right="3")"#
//! );
//! ```

use anyhow::Context;
use log::debug;

pub use derive::Node;
pub use ebnf;
pub use engine::*;

/// Parse EBNF `text` and compile its rules.
pub fn load_grammar(text: &str) -> anyhow::Result<grammar::Rules> {
    let grammar: ebnf::Grammar = text.parse().context("invalid EBNF grammar")?;
    let rules = grammar::compile(&grammar)?;
    debug!("compiled grammar with {} rules", rules.len());
    Ok(rules)
}

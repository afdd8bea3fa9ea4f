use std::error;
use std::fmt::{self, Display};

/// The terminal failure of a parse run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The root term did not match, or did not consume the whole input.
    NoMatch,
    /// A forward reference was evaluated before being defined.
    Undefined(String),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParseError::NoMatch => write!(f, "failed to parse input"),
            ParseError::Undefined(ref name) => write!(f, "rule used before definition: {}", name),
        }
    }
}

impl error::Error for ParseError {}

use std::error;
use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Grammar text could not be parsed. Holds the unparsed remainder.
    Syntax(String),
    Incomplete,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Syntax(ref rest) => write!(f, "invalid ebnf near: {:?}", rest),
            Error::Incomplete => write!(f, "incomplete ebnf input"),
        }
    }
}

impl error::Error for Error {}

impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Error {
        match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                Error::Syntax(e.input.chars().take(32).collect())
            }
            nom::Err::Incomplete(_) => Error::Incomplete,
        }
    }
}

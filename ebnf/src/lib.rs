//! Data model for EBNF grammar text.
//!
//! Grammars are written in the ISO style: `name = rhs ;` productions using `|`
//! for alternation, `,` for concatenation, `-` for exceptions, `[ ]`, `{ }` and
//! `( )` for optional, repeated and grouped parts. Special sequences
//! (`? ... ?`) carry a regular expression, which may not itself contain `?`.
//! Comments are written `(* ... *)`.

use std::fmt::{self, Display};
use std::str::FromStr;

mod error;
pub use error::Error;
mod parser;

/// A constant identifying production rules.
#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub struct Identifier(pub String);

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A literal string.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Terminal(pub String);

impl Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.contains('"') {
            write!(f, "'{}'", self.0)
        } else {
            write!(f, "\"{}\"", self.0)
        }
    }
}

impl From<&str> for Terminal {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A special sequence, holding a regular expression.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Special(pub String);

impl Display for Special {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "? {} ?", self.0)
    }
}

impl From<&str> for Special {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// The lhs of a production rule.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Lhs(pub Identifier);

impl From<&str> for Lhs {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl Display for Lhs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The rhs of a production rule.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Rhs {
    Identifier(Identifier),
    Terminal(Terminal),
    Special(Special),
    Optional(Box<Rhs>),
    Repeat(Box<Rhs>),
    Group(Box<Rhs>),
    Exception(Box<Rhs>, Box<Rhs>),
    Alternation(Box<Rhs>, Box<Rhs>),
    Concatenation(Box<Rhs>, Box<Rhs>),
}

impl Rhs {
    /// Identifiers referenced anywhere in this rhs, in order of appearance.
    pub fn references(&self) -> Vec<&Identifier> {
        let mut refs = Vec::new();
        let mut pending = vec![self];
        while let Some(rhs) = pending.pop() {
            match rhs {
                Rhs::Identifier(iden) => refs.push(iden),
                Rhs::Terminal(_) | Rhs::Special(_) => {}
                Rhs::Optional(inner) | Rhs::Repeat(inner) | Rhs::Group(inner) => {
                    pending.push(inner)
                }
                Rhs::Exception(a, b) | Rhs::Alternation(a, b) | Rhs::Concatenation(a, b) => {
                    pending.push(b);
                    pending.push(a);
                }
            }
        }
        refs
    }
}

impl Display for Rhs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rhs::Identifier(iden) => write!(f, "{}", iden),
            Rhs::Terminal(term) => write!(f, "{}", term),
            Rhs::Special(special) => write!(f, "{}", special),
            Rhs::Optional(rhs) => write!(f, "[ {} ]", rhs),
            Rhs::Repeat(rhs) => write!(f, "{{ {} }}", rhs),
            Rhs::Group(rhs) => write!(f, "( {} )", rhs),
            Rhs::Exception(rhs1, rhs2) => write!(f, "{} - {}", rhs1, rhs2),
            Rhs::Alternation(rhs1, rhs2) => write!(f, "{} | {}", rhs1, rhs2),
            Rhs::Concatenation(rhs1, rhs2) => write!(f, "{} , {}", rhs1, rhs2),
        }
    }
}

impl FromStr for Rhs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, rhs) = parser::complete(parser::rhs)(s)?;
        Ok(rhs)
    }
}

/// A production rule.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Production {
    pub lhs: Lhs,
    pub rhs: Rhs,
}

impl Production {
    pub fn name(&self) -> &str {
        &(self.lhs.0).0
    }
}

impl Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {} ;", self.lhs, self.rhs)
    }
}

impl FromStr for Production {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, rule) = parser::complete(parser::production)(s)?;
        Ok(rule)
    }
}

/// A set of rules.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Grammar {
    pub rules: Vec<Production>,
}

impl Grammar {
    /// Find the production for `name`. The first one wins if a name is
    /// defined more than once.
    pub fn production(&self, name: &str) -> Option<&Production> {
        self.rules.iter().find(|rule| rule.name() == name)
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}

impl FromStr for Grammar {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, grammar) = parser::complete(parser::grammar)(s)?;
        Ok(grammar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Debug;
    use std::string::ToString;

    fn assert_lossless_conversion<T, E>(t: T)
    where
        T: ToString + FromStr<Err = E> + Eq + Debug,
        E: std::error::Error,
    {
        let s = t.to_string();
        let t_parse = T::from_str(&s).unwrap();
        assert_eq!(t, t_parse, "To string:\n{}\n", s);
    }

    #[test]
    fn lossless_rhs() {
        let tests = vec![
            Rhs::Exception(
                Box::new(Rhs::Terminal("hello".into())),
                Box::new(Rhs::Identifier("world".into())),
            ),
            Rhs::Alternation(
                Box::new(Rhs::Identifier("a".into())),
                Box::new(Rhs::Alternation(
                    Box::new(Rhs::Identifier("b".into())),
                    Box::new(Rhs::Concatenation(
                        Box::new(Rhs::Terminal("c".into())),
                        Box::new(Rhs::Special("[0-9]+".into())),
                    )),
                )),
            ),
            Rhs::Repeat(Box::new(Rhs::Terminal("say \"hi\"".into()))),
        ];

        for test in tests {
            assert_lossless_conversion(test);
        }
    }

    #[test]
    fn lossless_grammar() {
        let g = Grammar {
            rules: vec![
                Production {
                    lhs: Lhs("a".into()),
                    rhs: Rhs::Optional(Box::new(Rhs::Identifier("b".into()))),
                },
                Production {
                    lhs: Lhs("b".into()),
                    rhs: Rhs::Special("\\s+".into()),
                },
            ],
        };

        assert_lossless_conversion(g);
    }

    #[test]
    fn references_in_order() {
        let rhs: Rhs = "a , [ b | 'x' ] , { c - d }".parse().unwrap();
        let names: Vec<&str> = rhs.references().iter().map(|i| i.0.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn trailing_garbage_rejected() {
        assert!("a = b ; c".parse::<Grammar>().is_err());
        assert!("a b".parse::<Rhs>().is_err());
    }

    #[test]
    fn production_lookup() {
        let g: Grammar = "a = 'x' ; b = a ;".parse().unwrap();
        assert_eq!(g.production("b").unwrap().rhs, Rhs::Identifier("a".into()));
        assert!(g.production("c").is_none());
    }
}

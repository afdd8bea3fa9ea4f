//! Operator precedence tables.
//!
//! Each [`Row`] becomes one level of the grammar, built over the level before
//! it, so the first row binds tightest. Prefix and postfix rows are
//! expressed with the associativity folds and an empty middle term.

use std::sync::Arc;

use crate::term::{Assoc, Fold, Term};
use crate::value::{Node, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    Prefix,
    Postfix,
    InfixLeft,
    InfixRight,
}

/// One precedence level: a fixity and the operators sharing it.
///
/// The fold receives `(left, op, right)` for infix rows, `(op, None,
/// operand)` for prefix rows and `(operand, op, None)` for postfix rows.
pub struct Row {
    fixity: Fixity,
    ops: Vec<Term>,
    fold: Option<Fold>,
}

impl Row {
    pub fn new<I: IntoIterator<Item = Term>>(fixity: Fixity, ops: I) -> Row {
        Row {
            fixity,
            ops: ops.into_iter().collect(),
            fold: None,
        }
    }

    pub fn prefix<I: IntoIterator<Item = Term>>(ops: I) -> Row {
        Row::new(Fixity::Prefix, ops)
    }

    pub fn postfix<I: IntoIterator<Item = Term>>(ops: I) -> Row {
        Row::new(Fixity::Postfix, ops)
    }

    pub fn infix_left<I: IntoIterator<Item = Term>>(ops: I) -> Row {
        Row::new(Fixity::InfixLeft, ops)
    }

    pub fn infix_right<I: IntoIterator<Item = Term>>(ops: I) -> Row {
        Row::new(Fixity::InfixRight, ops)
    }

    /// Replace the default node builder for this row.
    pub fn fold_with<F>(mut self, fold: F) -> Row
    where
        F: Fn(Value, Value, Value) -> Value + Send + Sync + 'static,
    {
        self.fold = Some(Arc::new(fold));
        self
    }

    pub fn fixity(&self) -> Fixity {
        self.fixity
    }

    fn build(self, operand: Term) -> Term {
        let fixity = self.fixity;
        let op = Term::or(self.ops);
        let fold = self.fold.unwrap_or_else(|| default_fold(fixity));
        match fixity {
            Fixity::Prefix => Term::reduce(Assoc::Right, op, empty(), operand, fold),
            Fixity::Postfix => Term::reduce(Assoc::Left, operand, op, empty(), fold),
            Fixity::InfixLeft => Term::reduce(Assoc::Left, operand.clone(), op, operand, fold),
            Fixity::InfixRight => Term::reduce(Assoc::Right, operand.clone(), op, operand, fold),
        }
    }
}

fn empty() -> Term {
    Term::pure(Value::None)
}

fn default_fold(fixity: Fixity) -> Fold {
    match fixity {
        Fixity::Prefix => Arc::new(|op: Value, _: Value, operand: Value| -> Value {
            Value::node(Node::new("Prefix").with("op", op).with("operand", operand))
        }),
        Fixity::Postfix => Arc::new(|operand: Value, op: Value, _: Value| -> Value {
            Value::node(Node::new("Postfix").with("operand", operand).with("op", op))
        }),
        Fixity::InfixLeft | Fixity::InfixRight => {
            Arc::new(|left: Value, op: Value, right: Value| -> Value {
                Value::node(
                    Node::new("Binary")
                        .with("left", left)
                        .with("op", op)
                        .with("right", right),
                )
            })
        }
    }
}

/// Build an expression term over `atom` from `rows`, tightest first.
pub fn precedence<I: IntoIterator<Item = Row>>(atom: Term, rows: I) -> Term {
    rows.into_iter().fold(atom, |operand, row| row.build(operand))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn calculator() -> Term {
        let number = Term::regex("[0-9]+").unwrap();
        let rows = vec![
            Row::postfix(vec![Term::literal("!")]),
            Row::prefix(vec![Term::literal("-")]),
            Row::infix_right(vec![Term::literal("^")]),
            Row::infix_left(vec![Term::literal("*"), Term::literal("/")]),
            Row::infix_left(vec![Term::literal("+"), Term::literal("-")]),
        ];
        precedence(number, rows)
    }

    #[test]
    fn default_nodes() {
        let term = calculator();
        let tests = vec![
            ("1", "\"1\""),
            ("1+2", "Binary(left=\"1\", op=\"+\", right=\"2\")"),
            (
                "1-2-3",
                "Binary(left=Binary(left=\"1\", op=\"-\", right=\"2\"), op=\"-\", right=\"3\")",
            ),
            (
                "2^3^4",
                "Binary(left=\"2\", op=\"^\", right=Binary(left=\"3\", op=\"^\", right=\"4\"))",
            ),
            (
                "1+2*3",
                "Binary(left=\"1\", op=\"+\", right=Binary(left=\"2\", op=\"*\", right=\"3\"))",
            ),
            ("--1", "Prefix(op=\"-\", operand=Prefix(op=\"-\", operand=\"1\"))"),
            ("3!!", "Postfix(operand=Postfix(operand=\"3\", op=\"!\"), op=\"!\")"),
            (
                "-3!",
                "Prefix(op=\"-\", operand=Postfix(operand=\"3\", op=\"!\"))",
            ),
        ];
        for test in tests {
            let value = parse(&term, test.0).unwrap();
            assert_eq!(value.to_string(), test.1, "test case: {:?}", test);
        }
    }

    #[test]
    fn incomplete_expressions() {
        let term = calculator();
        for input in &["", "1+", "-", "+1", "1**2"] {
            assert!(parse(&term, *input).is_err(), "input: {:?}", input);
        }
    }

    #[test]
    fn long_flat_chain() {
        let number = Term::regex("[0-9]+").unwrap();
        let sum = precedence(number, vec![Row::infix_left(vec![Term::literal("+")])]);
        let input = vec!["1"; 200_000].join("+");
        let value = parse(&sum, input.as_str()).unwrap();
        assert_eq!(value.as_node().map(Node::name), Some("Binary"));
        drop(value);
    }

    #[test]
    fn custom_fold() {
        let number = Term::regex("[0-9]+")
            .unwrap()
            .map(|value| Value::int(value.as_text().and_then(|t| t.parse().ok()).unwrap_or(0)));
        let sum = Row::infix_left(vec![Term::literal("+"), Term::literal("-")]).fold_with(
            |left: Value, op: Value, right: Value| -> Value {
                let (l, r) = (left.as_int().unwrap_or(0), right.as_int().unwrap_or(0));
                match op.as_text() {
                    Some("-") => Value::int(l - r),
                    _ => Value::int(l + r),
                }
            },
        );
        assert_eq!(sum.fixity(), Fixity::InfixLeft);
        let term = precedence(number, vec![sum]);
        assert_eq!(parse(&term, "10-2-3+1"), Ok(Value::int(6)));
    }
}

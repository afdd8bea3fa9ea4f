//! Typed access to parsed values.
//!
//! `#[derive(Node)]` implements [`NodeFields`] and [`FromValue`] for structs
//! with named fields; the helpers at the bottom of this module are what the
//! generated code calls.

use std::error;
use std::fmt::{self, Display};

use crate::token::Token;
use crate::value::{Node, Value};

/// A record type whose field order is known statically.
pub trait NodeFields {
    const NAME: &'static str;
    /// Field names in declaration order.
    const FIELDS: &'static [&'static str];
}

pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ConvertError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    Expected {
        expected: &'static str,
        found: &'static str,
    },
    WrongNode {
        expected: &'static str,
        found: String,
    },
    MissingField {
        node: &'static str,
        field: &'static str,
    },
    InvalidInt(String),
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConvertError::Expected { expected, found } => {
                write!(f, "expected {} value, found {}", expected, found)
            }
            ConvertError::WrongNode { expected, found } => {
                write!(f, "expected {} node, found {}", expected, found)
            }
            ConvertError::MissingField { node, field } => {
                write!(f, "node {} has no field {}", node, field)
            }
            ConvertError::InvalidInt(text) => write!(f, "not an integer: {:?}", text),
        }
    }
}

impl error::Error for ConvertError {}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        Ok(value.clone())
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        value.as_text().map(str::to_owned).ok_or(ConvertError::Expected {
            expected: "text",
            found: value.kind_name(),
        })
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Int(n) => Ok(*n),
            Value::Text(_) | Value::Token(_) => {
                let text = value.as_text().unwrap_or_default();
                text.trim()
                    .parse()
                    .map_err(|_| ConvertError::InvalidInt(text.to_owned()))
            }
            other => Err(ConvertError::Expected {
                expected: "int",
                found: other.kind_name(),
            }),
        }
    }
}

impl FromValue for Token {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        value.as_token().cloned().ok_or(ConvertError::Expected {
            expected: "token",
            found: value.kind_name(),
        })
    }
}

impl FromValue for Node {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        value.as_node().cloned().ok_or(ConvertError::Expected {
            expected: "node",
            found: value.kind_name(),
        })
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::None => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        match value.as_list() {
            Some(items) => items.iter().map(T::from_value).collect(),
            None => Err(ConvertError::Expected {
                expected: "list",
                found: value.kind_name(),
            }),
        }
    }
}

impl<T: FromValue> FromValue for Box<T> {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        T::from_value(value).map(Box::new)
    }
}

/// The node named `name` held by `value`.
pub fn expect_node<'v>(value: &'v Value, name: &'static str) -> Result<&'v Node, ConvertError> {
    match value {
        Value::Node(node) if node.name() == name => Ok(node),
        Value::Node(node) => Err(ConvertError::WrongNode {
            expected: name,
            found: node.name().to_owned(),
        }),
        other => Err(ConvertError::Expected {
            expected: "node",
            found: other.kind_name(),
        }),
    }
}

pub fn field<'v>(
    node: &'v Node,
    node_name: &'static str,
    field: &'static str,
) -> Result<&'v Value, ConvertError> {
    node.field(field).ok_or(ConvertError::MissingField {
        node: node_name,
        field,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives() {
        assert_eq!(i64::from_value(&Value::text(" 42")), Ok(42));
        assert_eq!(i64::from_value(&Value::int(7)), Ok(7));
        assert_eq!(
            i64::from_value(&Value::text("x")),
            Err(ConvertError::InvalidInt("x".to_owned()))
        );
        assert_eq!(String::from_value(&Value::text("a")), Ok("a".to_owned()));
        assert_eq!(
            String::from_value(&Value::int(1)),
            Err(ConvertError::Expected {
                expected: "text",
                found: "int"
            })
        );
    }

    #[test]
    fn containers() {
        let list = Value::list(vec![Value::int(1), Value::int(2)]);
        assert_eq!(Vec::<i64>::from_value(&list), Ok(vec![1, 2]));
        assert_eq!(Option::<i64>::from_value(&Value::None), Ok(None));
        assert_eq!(Option::<i64>::from_value(&Value::int(3)), Ok(Some(3)));
        assert_eq!(Box::<i64>::from_value(&Value::int(3)), Ok(Box::new(3)));
    }

    #[test]
    fn node_helpers() {
        let value = Value::node(Node::new("Pair").with("key", "k"));
        let node = expect_node(&value, "Pair").unwrap();
        assert_eq!(field(node, "Pair", "key"), Ok(&Value::text("k")));
        assert_eq!(
            field(node, "Pair", "value"),
            Err(ConvertError::MissingField {
                node: "Pair",
                field: "value"
            })
        );
        assert!(matches!(
            expect_node(&value, "Other"),
            Err(ConvertError::WrongNode { .. })
        ));
    }
}

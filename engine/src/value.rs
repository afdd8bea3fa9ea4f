use std::fmt::{self, Display};
use std::sync::Arc;

use crate::token::Token;

/// A fragment of syntax produced by a term.
///
/// Composite payloads are reference counted so that memoized outcomes can be
/// handed out repeatedly without deep copies.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absent value, produced by optional terms that did not match and by
    /// zero-width checks.
    None,
    Text(Arc<str>),
    Int(i64),
    Token(Arc<Token>),
    List(Arc<Vec<Value>>),
    Node(Arc<Node>),
}

impl Value {
    pub fn text<S: Into<Arc<str>>>(s: S) -> Value {
        Value::Text(s.into())
    }

    pub fn int(n: i64) -> Value {
        Value::Int(n)
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Arc::new(items))
    }

    pub fn node(node: Node) -> Value {
        Value::Node(Arc::new(node))
    }

    pub fn token(token: Token) -> Value {
        Value::Token(Arc::new(token))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// The text of a `Text` value or of a token.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Token(t) => Some(&t.text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Value::Token(t) => Some(t),
            _ => None,
        }
    }

    /// Short name of the variant, used in conversion errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Text(_) => "text",
            Value::Int(_) => "int",
            Value::Token(_) => "token",
            Value::List(_) => "list",
            Value::Node(_) => "node",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::node(node)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::None => write!(f, "none"),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Token(t) => write!(f, "{}({:?})", t.class, t.text),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Node(node) => write!(f, "{}", node),
        }
    }
}

/// A named record with fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: Arc<str>,
    fields: Vec<(Arc<str>, Value)>,
}

impl Node {
    pub fn new<S: Into<Arc<str>>>(name: S) -> Node {
        Node {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field, builder style.
    pub fn with<S: Into<Arc<str>>, V: Into<Value>>(mut self, field: S, value: V) -> Node {
        self.push(field, value);
        self
    }

    pub fn push<S: Into<Arc<str>>, V: Into<Value>>(&mut self, field: S, value: V) {
        self.fields.push((field.into(), value.into()));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| &**field == name)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl DoubleEndedIterator<Item = (&str, &Value)> + ExactSizeIterator {
        self.fields.iter().map(|(name, value)| (&**name, value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// Folded chains nest one node per operator, so tear them down with a work
// list instead of the recursive drop glue.
impl Drop for Node {
    fn drop(&mut self) {
        let nested = |value: &Value| matches!(value, Value::Node(_) | Value::List(_));
        if !self.fields.iter().any(|(_, value)| nested(value)) {
            return;
        }
        let mut pending: Vec<Value> = self.fields.drain(..).map(|(_, value)| value).collect();
        while let Some(value) = pending.pop() {
            match value {
                Value::Node(node) => {
                    if let Ok(mut node) = Arc::try_unwrap(node) {
                        pending.extend(node.fields.drain(..).map(|(_, value)| value));
                    }
                }
                Value::List(items) => {
                    if let Ok(items) = Arc::try_unwrap(items) {
                        pending.extend(items);
                    }
                }
                _ => {}
            }
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, ")")
    }
}

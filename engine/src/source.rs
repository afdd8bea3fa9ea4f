use std::sync::Arc;

use crate::token::Token;
use crate::value::Value;

/// An input sequence a term can be evaluated against.
///
/// Positions index elements: byte offsets (on `char` boundaries) for text,
/// token indices for token sequences. Only text sources expose [`text`], which
/// regex terms require; on other sources regex terms simply fail.
///
/// [`text`]: Source::text
pub trait Source {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `pos` as a value, and the position after it.
    fn element(&self, pos: usize) -> Option<(Value, usize)>;

    /// Match `literal` at `pos`. Text sources compare a substring, token
    /// sources compare the text of a single token.
    fn literal(&self, pos: usize, literal: &str) -> Option<(Value, usize)>;

    fn token(&self, _pos: usize) -> Option<&Token> {
        None
    }

    fn text(&self) -> Option<&str> {
        None
    }
}

impl Source for str {
    fn len(&self) -> usize {
        str::len(self)
    }

    fn element(&self, pos: usize) -> Option<(Value, usize)> {
        let c = self.get(pos..)?.chars().next()?;
        let end = pos + c.len_utf8();
        Some((Value::text(&self[pos..end]), end))
    }

    fn literal(&self, pos: usize, literal: &str) -> Option<(Value, usize)> {
        let end = pos + literal.len();
        if self.get(pos..end) == Some(literal) {
            Some((Value::text(literal), end))
        } else {
            None
        }
    }

    fn text(&self) -> Option<&str> {
        Some(self)
    }
}

impl Source for String {
    fn len(&self) -> usize {
        self.as_str().len()
    }

    fn element(&self, pos: usize) -> Option<(Value, usize)> {
        self.as_str().element(pos)
    }

    fn literal(&self, pos: usize, literal: &str) -> Option<(Value, usize)> {
        self.as_str().literal(pos, literal)
    }

    fn text(&self) -> Option<&str> {
        Some(self)
    }
}

impl Source for [Token] {
    fn len(&self) -> usize {
        <[Token]>::len(self)
    }

    fn element(&self, pos: usize) -> Option<(Value, usize)> {
        let token = self.get(pos)?;
        Some((Value::Token(Arc::new(token.clone())), pos + 1))
    }

    fn literal(&self, pos: usize, literal: &str) -> Option<(Value, usize)> {
        match self.get(pos) {
            Some(token) if token.text == literal => {
                Some((Value::Token(Arc::new(token.clone())), pos + 1))
            }
            _ => None,
        }
    }

    fn token(&self, pos: usize) -> Option<&Token> {
        self.get(pos)
    }
}

impl Source for Vec<Token> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn element(&self, pos: usize) -> Option<(Value, usize)> {
        self.as_slice().element(pos)
    }

    fn literal(&self, pos: usize, literal: &str) -> Option<(Value, usize)> {
        self.as_slice().literal(pos, literal)
    }

    fn token(&self, pos: usize) -> Option<&Token> {
        self.get(pos)
    }
}

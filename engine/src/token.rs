use anyhow::{anyhow, Context};
use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::{parse, ParseError, Term, Value};

/// A byte range over tokenized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// The spanned part of `text`, or `None` if the span does not fall on
    /// character boundaries within it.
    pub fn as_str<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span contains the entirety of the other span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && self.end >= other.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span {
            start: range.start,
            end: range.end,
        }
    }
}

/// A piece of text matched by a token class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub class: Arc<str>,
    pub text: String,
    pub span: Span,
    /// Named capture groups of the class pattern, in pattern order.
    pub captures: Vec<(String, String)>,
}

impl Token {
    pub fn new<C, T, S>(class: C, text: T, span: S) -> Token
    where
        C: Into<Arc<str>>,
        T: Into<String>,
        S: Into<Span>,
    {
        Token {
            class: class.into(),
            text: text.into(),
            span: span.into(),
            captures: Vec::new(),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn capture(&self, name: &str) -> Option<&str> {
        self.captures
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, text)| text.as_str())
    }
}

/// Compile `pattern` so that it only matches at the start of the haystack.
pub(crate) fn anchored(pattern: &str) -> anyhow::Result<Regex> {
    Regex::new(&format!("^(?:{})", pattern))
        .with_context(|| format!("invalid pattern: {}", pattern))
}

enum Pattern {
    Literal(String),
    Regex(Regex),
}

/// A named lexical class.
///
/// On text a class produces a [`Token`]. On a token sequence it matches any
/// token produced by a class of the same name, so a tokenizer's output can be
/// re-parsed with the class definitions that produced it.
pub struct TokenClass {
    name: Arc<str>,
    pattern: Pattern,
    skip: bool,
}

impl TokenClass {
    pub fn regex(name: &str, pattern: &str) -> anyhow::Result<TokenClass> {
        Ok(TokenClass {
            name: name.into(),
            pattern: Pattern::Regex(anchored(pattern)?),
            skip: false,
        })
    }

    pub fn literal(name: &str, text: &str) -> TokenClass {
        TokenClass {
            name: name.into(),
            pattern: Pattern::Literal(text.to_owned()),
            skip: false,
        }
    }

    /// Mark this class as skipped: its tokens are dropped from tokenizer
    /// output.
    pub fn skip(mut self) -> TokenClass {
        self.skip = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_skip(&self) -> bool {
        self.skip
    }

    pub(crate) fn matches(&self, token: &Token) -> bool {
        self.name == token.class
    }

    pub(crate) fn match_text(&self, text: &str, pos: usize) -> Option<Token> {
        let rest = text.get(pos..)?;
        match &self.pattern {
            Pattern::Literal(lit) => {
                if !lit.is_empty() && rest.starts_with(lit.as_str()) {
                    Some(Token::new(self.name.clone(), lit.as_str(), pos..pos + lit.len()))
                } else {
                    None
                }
            }
            Pattern::Regex(re) => {
                let caps = re.captures(rest)?;
                // An empty token would stop the scan without progress.
                let whole = caps.get(0).filter(|m| m.end() > 0)?;
                let span = pos..pos + whole.end();
                let mut token = Token::new(self.name.clone(), whole.as_str(), span);
                token.captures = re
                    .capture_names()
                    .flatten()
                    .filter_map(|name| {
                        caps.name(name)
                            .map(|m| (name.to_owned(), m.as_str().to_owned()))
                    })
                    .collect();
                Some(token)
            }
        }
    }
}

impl fmt::Debug for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let pattern = match &self.pattern {
            Pattern::Literal(lit) => format!("{:?}", lit),
            Pattern::Regex(re) => format!("/{}/", re.as_str()),
        };
        f.debug_struct("TokenClass")
            .field("name", &self.name)
            .field("pattern", &pattern)
            .field("skip", &self.skip)
            .finish()
    }
}

/// Scans text into tokens using a set of named classes.
///
/// Classes are tried in declaration order at every position; the scan must
/// cover the whole text.
#[derive(Debug, Default)]
pub struct Tokenizer {
    classes: Vec<(Arc<TokenClass>, Term)>,
    by_name: HashMap<String, usize>,
    scanner: Option<Term>,
}

impl Tokenizer {
    pub fn new() -> Tokenizer {
        Tokenizer::default()
    }

    pub fn with(mut self, class: TokenClass) -> anyhow::Result<Tokenizer> {
        self.push(class)?;
        Ok(self)
    }

    /// Add a regex class.
    pub fn regex(self, name: &str, pattern: &str) -> anyhow::Result<Tokenizer> {
        self.with(TokenClass::regex(name, pattern)?)
    }

    /// Add a regex class whose tokens are dropped.
    pub fn skip(self, name: &str, pattern: &str) -> anyhow::Result<Tokenizer> {
        self.with(TokenClass::regex(name, pattern)?.skip())
    }

    pub fn literal(self, name: &str, text: &str) -> anyhow::Result<Tokenizer> {
        self.with(TokenClass::literal(name, text))
    }

    pub fn push(&mut self, class: TokenClass) -> anyhow::Result<()> {
        if self.by_name.contains_key(class.name()) {
            return Err(anyhow!("duplicate token class: {}", class.name()));
        }
        let class = Arc::new(class);
        let term = Term::class(class.clone());
        self.by_name.insert(class.name().to_owned(), self.classes.len());
        self.classes.push((class, term));

        let alternatives = self.classes.iter().map(|(_, term)| term.clone());
        self.scanner = Some(Term::or(alternatives).list());
        Ok(())
    }

    /// The term matching class `name`, for use in token-level grammars.
    pub fn class(&self, name: &str) -> Option<Term> {
        self.by_name
            .get(name)
            .map(|&idx| self.classes[idx].1.clone())
    }

    pub fn classes(&self) -> impl Iterator<Item = &TokenClass> {
        self.classes.iter().map(|(class, _)| &**class)
    }

    /// Scan `text`, dropping tokens of skipped classes.
    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>, ParseError> {
        let scanner = match &self.scanner {
            Some(scanner) => scanner,
            None if text.is_empty() => return Ok(Vec::new()),
            None => return Err(ParseError::NoMatch),
        };

        let scanned = match parse(scanner, text)? {
            Value::List(items) => items,
            _ => return Err(ParseError::NoMatch),
        };
        let total = scanned.len();
        let items = Arc::try_unwrap(scanned).unwrap_or_else(|shared| (*shared).clone());

        let tokens: Vec<Token> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Token(token) => {
                    Some(Arc::try_unwrap(token).unwrap_or_else(|shared| (*shared).clone()))
                }
                _ => None,
            })
            .filter(|token| !self.is_skipped(token))
            .collect();

        debug!(
            "tokenized {} bytes: {} tokens, {} skipped",
            text.len(),
            tokens.len(),
            total - tokens.len()
        );
        Ok(tokens)
    }

    fn is_skipped(&self, token: &Token) -> bool {
        self.by_name
            .get(token.class())
            .map_or(false, |&idx| self.classes[idx].0.is_skip())
    }
}

//! Grammar terms and the combinators that build them.
//!
//! A [`Term`] is an immutable, reference counted grammar node. Terms only
//! describe what may be parsed; evaluation lives in [`crate::eval`]. Cycles
//! between rules are tied with forward references ([`Term::forward`] and
//! [`Term::lazy`]).

use anyhow::anyhow;
use once_cell::sync::OnceCell;
use regex::Regex;
use std::fmt;
use std::ops::{BitAnd, BitOr, Neg};
use std::sync::Arc;

use crate::convert::NodeFields;
use crate::error::ParseError;
use crate::token::{anchored, TokenClass};
use crate::value::{Node, Value};

pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
pub type Mapper = Arc<dyn Fn(Value) -> Value + Send + Sync>;
pub type Continuation = Arc<dyn Fn(&Value) -> Term + Send + Sync>;
/// Combines three values into one. Used by the associativity folds.
pub type Fold = Arc<dyn Fn(Value, Value, Value) -> Value + Send + Sync>;

type Thunk = Box<dyn Fn() -> Term + Send + Sync>;

/// Which value of a sequence is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    First,
    Last,
    Index(usize),
    /// Keep every value, as a list.
    All,
}

impl Pick {
    pub(crate) fn select(self, mut values: Vec<Value>) -> Value {
        let picked = match self {
            Pick::First if !values.is_empty() => Some(values.swap_remove(0)),
            Pick::First => None,
            Pick::Last => values.pop(),
            Pick::Index(idx) => values.into_iter().nth(idx),
            Pick::All => return Value::list(values),
        };
        picked.unwrap_or(Value::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Assoc {
    Left,
    Right,
}

pub(crate) struct Forward {
    name: Arc<str>,
    target: OnceCell<Term>,
    thunk: Option<Thunk>,
}

impl Forward {
    fn get(&self) -> Option<&Term> {
        match &self.thunk {
            Some(thunk) => Some(self.target.get_or_init(|| thunk())),
            None => self.target.get(),
        }
    }
}

pub(crate) enum Kind {
    Any,
    End,
    Fail,
    Pure(Value),
    Literal(String),
    Regex(Regex),
    Class(Arc<TokenClass>),
    And(Term, Term),
    Or(Vec<Term>),
    Not(Term),
    Seq(Vec<Term>, Pick),
    List(Term),
    SepBy {
        item: Term,
        sep: Term,
        trailer: bool,
    },
    Require(Term, Predicate),
    Bind(Term, Continuation),
    Map(Term, Mapper),
    Forward(Forward),
    Struct(Arc<str>, Vec<(Arc<str>, Term)>),
    Reduce {
        assoc: Assoc,
        first: Term,
        op: Term,
        last: Term,
        fold: Fold,
    },
}

impl Kind {
    /// Leaf terms are matched directly against the source and never request
    /// other terms.
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(
            self,
            Kind::Any
                | Kind::End
                | Kind::Fail
                | Kind::Pure(_)
                | Kind::Literal(_)
                | Kind::Regex(_)
                | Kind::Class(_)
        )
    }
}

/// An immutable grammar node.
///
/// Cloning a term is cheap and preserves its identity: the evaluator memoizes
/// by identity, so reuse a clone rather than rebuilding an equal term when the
/// same rule is referenced from several places.
#[derive(Clone)]
pub struct Term(Arc<Kind>);

impl Term {
    fn new(kind: Kind) -> Term {
        Term(Arc::new(kind))
    }

    pub(crate) fn kind(&self) -> &Kind {
        &self.0
    }

    /// Identity of this term, stable for as long as the term is alive.
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Follow forward references until a concrete term is reached.
    pub(crate) fn resolve(&self) -> Result<Term, ParseError> {
        let mut term = self.clone();
        loop {
            let next = match term.kind() {
                Kind::Forward(fwd) => match fwd.get() {
                    Some(target) => target.clone(),
                    None => return Err(ParseError::Undefined(fwd.name.to_string())),
                },
                _ => return Ok(term),
            };
            term = next;
        }
    }

    /// Matches any single element.
    pub fn any() -> Term {
        Term::new(Kind::Any)
    }

    /// Matches only at the end of the input.
    pub fn end() -> Term {
        Term::new(Kind::End)
    }

    pub fn fail() -> Term {
        Term::new(Kind::Fail)
    }

    /// Always succeeds with `value`, consuming nothing.
    pub fn pure<V: Into<Value>>(value: V) -> Term {
        Term::new(Kind::Pure(value.into()))
    }

    pub fn literal<S: Into<String>>(s: S) -> Term {
        Term::new(Kind::Literal(s.into()))
    }

    /// A regular expression anchored at the current position. Only matches
    /// text sources.
    pub fn regex(pattern: &str) -> anyhow::Result<Term> {
        Ok(Term::new(Kind::Regex(anchored(pattern)?)))
    }

    pub fn class(class: Arc<TokenClass>) -> Term {
        Term::new(Kind::Class(class))
    }

    /// Ordered choice. Nested choices are flattened so that the alternatives
    /// reflect their true priority.
    pub fn or<I: IntoIterator<Item = Term>>(terms: I) -> Term {
        let mut alternatives = Vec::new();
        for term in terms {
            match term.kind() {
                Kind::Or(inner) => alternatives.extend(inner.iter().cloned()),
                _ => alternatives.push(term),
            }
        }
        Term::new(Kind::Or(alternatives))
    }

    /// Sequence keeping every value as a list.
    pub fn seq<I: IntoIterator<Item = Term>>(terms: I) -> Term {
        Term::pick(terms, Pick::All)
    }

    /// Sequence keeping the first value.
    pub fn left<I: IntoIterator<Item = Term>>(terms: I) -> Term {
        Term::pick(terms, Pick::First)
    }

    /// Sequence keeping the last value.
    pub fn right<I: IntoIterator<Item = Term>>(terms: I) -> Term {
        Term::pick(terms, Pick::Last)
    }

    pub fn middle(left: Term, middle: Term, right: Term) -> Term {
        Term::pick(vec![left, middle, right], Pick::Index(1))
    }

    pub fn pick<I: IntoIterator<Item = Term>>(terms: I, pick: Pick) -> Term {
        Term::new(Kind::Seq(terms.into_iter().collect(), pick))
    }

    /// A named forward reference resolved by calling `thunk` on first use.
    /// The thunk runs at most once.
    pub fn lazy<F>(name: &str, thunk: F) -> Term
    where
        F: Fn() -> Term + Send + Sync + 'static,
    {
        Term::new(Kind::Forward(Forward {
            name: name.into(),
            target: OnceCell::new(),
            thunk: Some(Box::new(thunk)),
        }))
    }

    /// A named forward reference to be tied later with [`Term::define`].
    pub fn forward(name: &str) -> Term {
        Term::new(Kind::Forward(Forward {
            name: name.into(),
            target: OnceCell::new(),
            thunk: None,
        }))
    }

    /// Tie a forward reference created with [`Term::forward`] to its target.
    pub fn define(&self, target: Term) -> anyhow::Result<()> {
        match self.kind() {
            Kind::Forward(fwd) if fwd.thunk.is_none() => fwd
                .target
                .set(target)
                .map_err(|_| anyhow!("rule already defined: {}", fwd.name)),
            Kind::Forward(fwd) => Err(anyhow!("rule is defined lazily: {}", fwd.name)),
            _ => Err(anyhow!("only forward references can be defined")),
        }
    }

    /// Parses `first (op last)*` and folds to the left:
    /// `fold(fold(first, op1, last1), op2, last2)`.
    pub fn reduce_left<F>(first: Term, op: Term, last: Term, fold: F) -> Term
    where
        F: Fn(Value, Value, Value) -> Value + Send + Sync + 'static,
    {
        Term::reduce(Assoc::Left, first, op, last, Arc::new(fold))
    }

    /// Parses `(first op)* last` and folds to the right:
    /// `fold(first1, op1, fold(first2, op2, last))`.
    pub fn reduce_right<F>(first: Term, op: Term, last: Term, fold: F) -> Term
    where
        F: Fn(Value, Value, Value) -> Value + Send + Sync + 'static,
    {
        Term::reduce(Assoc::Right, first, op, last, Arc::new(fold))
    }

    pub(crate) fn reduce(assoc: Assoc, first: Term, op: Term, last: Term, fold: Fold) -> Term {
        Term::new(Kind::Reduce {
            assoc,
            first,
            op,
            last,
            fold,
        })
    }

    /// Succeeds with this term's value when `check` also matches where this
    /// term ended. `check` consumes nothing.
    pub fn and(self, check: Term) -> Term {
        Term::new(Kind::And(self, check))
    }

    pub fn or_else(self, other: Term) -> Term {
        Term::or(vec![self, other])
    }

    /// Negative lookahead: succeeds with [`Value::None`] without consuming
    /// when this term fails.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Term {
        Term::new(Kind::Not(self))
    }

    pub fn optional(self) -> Term {
        Term::or(vec![self, Term::pure(Value::None)])
    }

    /// Zero or more repetitions. Never fails.
    pub fn list(self) -> Term {
        Term::new(Kind::List(self))
    }

    /// One or more repetitions.
    pub fn some(self) -> Term {
        self.list()
            .require(|value| value.as_list().map_or(false, |items| !items.is_empty()))
    }

    /// `self (sep self)* sep?`, keeping only the items.
    pub fn sep_by(self, sep: Term) -> Term {
        Term::new(Kind::SepBy {
            item: self,
            sep,
            trailer: true,
        })
    }

    /// Like [`Term::sep_by`] but a trailing separator is left unconsumed.
    pub fn sep_by_strict(self, sep: Term) -> Term {
        Term::new(Kind::SepBy {
            item: self,
            sep,
            trailer: false,
        })
    }

    pub fn require<F>(self, predicate: F) -> Term
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Term::new(Kind::Require(self, Arc::new(predicate)))
    }

    /// Continue with the term chosen by `next` from this term's value.
    pub fn bind<F>(self, next: F) -> Term
    where
        F: Fn(&Value) -> Term + Send + Sync + 'static,
    {
        Term::new(Kind::Bind(self, Arc::new(next)))
    }

    pub fn map<F>(self, f: F) -> Term
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Term::new(Kind::Map(self, Arc::new(f)))
    }
}

impl BitOr for Term {
    type Output = Term;

    fn bitor(self, other: Term) -> Term {
        self.or_else(other)
    }
}

impl BitAnd for Term {
    type Output = Term;

    fn bitand(self, check: Term) -> Term {
        self.and(check)
    }
}

impl Neg for Term {
    type Output = Term;

    fn neg(self) -> Term {
        self.optional()
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::literal(s)
    }
}

impl fmt::Debug for Term {
    // Shallow: grammars may be cyclic.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind() {
            Kind::Any => write!(f, "Any"),
            Kind::End => write!(f, "End"),
            Kind::Fail => write!(f, "Fail"),
            Kind::Pure(value) => write!(f, "Pure({})", value),
            Kind::Literal(lit) => write!(f, "Literal({:?})", lit),
            Kind::Regex(re) => write!(f, "Regex({:?})", re.as_str()),
            Kind::Class(class) => write!(f, "Class({})", class.name()),
            Kind::And(..) => write!(f, "And"),
            Kind::Or(alts) => write!(f, "Or({} alternatives)", alts.len()),
            Kind::Not(_) => write!(f, "Not"),
            Kind::Seq(terms, pick) => write!(f, "Seq({}, {:?})", terms.len(), pick),
            Kind::List(_) => write!(f, "List"),
            Kind::SepBy { trailer, .. } => write!(f, "SepBy(trailer={})", trailer),
            Kind::Require(..) => write!(f, "Require"),
            Kind::Bind(..) => write!(f, "Bind"),
            Kind::Map(..) => write!(f, "Map"),
            Kind::Forward(fwd) => write!(f, "Forward({})", fwd.name),
            Kind::Struct(name, _) => write!(f, "Struct({})", name),
            Kind::Reduce { assoc, .. } => write!(f, "Reduce({:?})", assoc),
        }
    }
}

/// Declares a struct node: a name plus ordered `(field, term)` pairs.
///
/// Fields are consumed from the input in declaration order.
pub struct Struct {
    name: Arc<str>,
    fields: Vec<(Arc<str>, Term)>,
}

impl Struct {
    pub fn new(name: &str) -> Struct {
        Struct {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Take the node name and field names, in declaration order, from a type
    /// deriving `Node`, pairing them with `terms`.
    pub fn typed<T, I>(terms: I) -> anyhow::Result<Struct>
    where
        T: NodeFields,
        I: IntoIterator<Item = Term>,
    {
        let terms: Vec<Term> = terms.into_iter().collect();
        if terms.len() != T::FIELDS.len() {
            return Err(anyhow!(
                "{} has {} fields, got {} terms",
                T::NAME,
                T::FIELDS.len(),
                terms.len()
            ));
        }
        let mut def = Struct::new(T::NAME);
        for (field, term) in T::FIELDS.iter().zip(terms) {
            def = def.field(field, term);
        }
        Ok(def)
    }

    pub fn field(mut self, name: &str, term: Term) -> Struct {
        self.fields.push((name.into(), term));
        self
    }

    /// Evaluate fields in order into a single node.
    pub fn build(self) -> Term {
        Term::new(Kind::Struct(self.name, self.fields))
    }

    /// Treat the first, middle and last fields as `(operand, operator,
    /// operand)` and nest repeated occurrences to the left.
    pub fn left_assoc(self) -> anyhow::Result<Term> {
        self.fold(Assoc::Left)
    }

    /// Like [`Struct::left_assoc`], nesting to the right.
    pub fn right_assoc(self) -> anyhow::Result<Term> {
        self.fold(Assoc::Right)
    }

    fn fold(self, assoc: Assoc) -> anyhow::Result<Term> {
        let count = self.fields.len();
        let mut fields = self.fields.into_iter();
        let ((first_name, first), (last_name, last)) = match (fields.next(), fields.next_back()) {
            (Some(first), Some(last)) if count >= 3 => (first, last),
            _ => {
                return Err(anyhow!(
                    "associative struct {} needs at least 3 fields, got {}",
                    self.name,
                    count
                ))
            }
        };
        let (middle_names, middle): (Vec<Arc<str>>, Vec<Term>) = fields.unzip();

        let op = if middle.len() == 1 {
            middle[0].clone()
        } else {
            Term::seq(middle)
        };

        let name = self.name;
        let fold: Fold = Arc::new(move |left: Value, op: Value, right: Value| -> Value {
            let mut node = Node::new(name.clone());
            node.push(first_name.clone(), left);
            match (&middle_names[..], op) {
                ([single], op) => node.push(single.clone(), op),
                (names, Value::List(values)) => {
                    for (name, value) in names.iter().zip(values.iter()) {
                        node.push(name.clone(), value.clone());
                    }
                }
                // Sequences of several terms always produce lists.
                (_, _) => {}
            }
            node.push(last_name.clone(), right);
            Value::node(node)
        });

        Ok(Term::reduce(assoc, first, op, last, fold))
    }
}

//! The trampoline evaluator.
//!
//! Terms never call each other. Each composite term runs as a [`Frame`] on an
//! explicit stack; whenever it needs a sub-term it returns a
//! [`Step::Request`] and is resumed later with the outcome. Leaf terms are
//! matched directly. Every `(term, position)` outcome is memoized, and a key is
//! seeded as failed while it is being computed so that a left-recursive
//! re-entry observes failure instead of looping.

use log::{debug, trace};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::mem;

use crate::error::ParseError;
use crate::source::Source;
use crate::term::{Assoc, Kind, Term};
use crate::value::{Node, Value};

/// A value and the position after it, or `None` when the term failed.
pub type Outcome = Option<(Value, usize)>;

/// Evaluator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Initial capacity of the memo table.
    pub memo_capacity: usize,
    /// Initial capacity of the frame stack.
    pub stack_capacity: usize,
    /// Emit a trace record for every request and completion.
    pub log_steps: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            memo_capacity: 1024,
            stack_capacity: 64,
            log_steps: false,
        }
    }
}

impl Config {
    pub fn with_memo_capacity(mut self, capacity: usize) -> Self {
        self.memo_capacity = capacity;
        self
    }

    pub fn with_stack_capacity(mut self, capacity: usize) -> Self {
        self.stack_capacity = capacity;
        self
    }

    pub fn with_step_logging(mut self, enabled: bool) -> Self {
        self.log_steps = enabled;
        self
    }
}

/// Counters for one evaluator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Frame resumptions.
    pub steps: usize,
    /// Frames pushed, i.e. composite keys computed.
    pub frames: usize,
    pub memo_hits: usize,
    /// Requests that found their key still in progress.
    pub recursion_guards: usize,
    /// Deepest the frame stack has been.
    pub max_depth: usize,
}

#[derive(Clone)]
struct Key {
    term: Term,
    pos: usize,
}

impl PartialEq for Key {
    fn eq(&self, other: &Key) -> bool {
        self.term.id() == other.term.id() && self.pos == other.pos
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.term.id().hash(state);
        self.pos.hash(state);
    }
}

enum Memo {
    InProgress,
    Done(Outcome),
}

enum Step {
    Request(Term, usize),
    Done(Outcome),
}

/// Where a suspended frame resumes.
enum State {
    Start,
    /// Waiting on the single operand of a combinator.
    Operand,
    /// `And` matched its term and waits on the check.
    Check { value: Value, end: usize },
    /// `Bind` waits on the term chosen by its continuation.
    Continue,
    Choice { index: usize },
    Sequence { index: usize, values: Vec<Value> },
    Repeat { cursor: usize, values: Vec<Value> },
    Item {
        cursor: usize,
        values: Vec<Value>,
        after_sep: Option<usize>,
    },
    Separator { cursor: usize, values: Vec<Value> },
    LeftOp { acc: Value, cursor: usize },
    LeftLast { acc: Value, op: Value, cursor: usize },
    RightFirst { pairs: Vec<(Value, Value)>, cursor: usize },
    RightOp {
        pairs: Vec<(Value, Value)>,
        first: Value,
        cursor: usize,
    },
    RightLast { pairs: Vec<(Value, Value)> },
}

struct Frame {
    key: Key,
    state: State,
}

impl Frame {
    fn new(key: Key) -> Frame {
        Frame {
            key,
            state: State::Start,
        }
    }

    fn wait(&mut self, state: State, term: &Term, pos: usize) -> Step {
        self.state = state;
        Step::Request(term.clone(), pos)
    }

    /// Advance this frame with the outcome of its last request. `input` is
    /// `None` only on the first resumption.
    fn resume(&mut self, input: Option<Outcome>) -> Step {
        let pos = self.key.pos;
        let term = self.key.term.clone();
        let state = mem::replace(&mut self.state, State::Start);
        let result = input.flatten();

        match (term.kind(), state) {
            (Kind::And(a, _), State::Start) => self.wait(State::Operand, a, pos),
            (Kind::And(_, check), State::Operand) => match result {
                Some((value, end)) => self.wait(State::Check { value, end }, check, end),
                None => Step::Done(None),
            },
            (Kind::And(..), State::Check { value, end }) => {
                Step::Done(result.map(|_| (value, end)))
            }

            (Kind::Or(alts), State::Start) => match alts.first() {
                Some(first) => self.wait(State::Choice { index: 0 }, first, pos),
                None => Step::Done(None),
            },
            (Kind::Or(alts), State::Choice { index }) => {
                if result.is_some() {
                    return Step::Done(result);
                }
                match alts.get(index + 1) {
                    Some(next) => self.wait(State::Choice { index: index + 1 }, next, pos),
                    None => Step::Done(None),
                }
            }

            (Kind::Not(a), State::Start) => self.wait(State::Operand, a, pos),
            (Kind::Not(_), State::Operand) => match result {
                Some(_) => Step::Done(None),
                None => Step::Done(Some((Value::None, pos))),
            },

            (Kind::Seq(terms, pick), State::Start) => match terms.first() {
                Some(first) => self.begin_sequence(first, pos),
                None => Step::Done(Some((pick.select(Vec::new()), pos))),
            },
            (Kind::Seq(terms, pick), State::Sequence { index, values }) => {
                match self.continue_sequence(terms.get(index + 1), index, values, result) {
                    Ok(step) => step,
                    Err((values, end)) => Step::Done(Some((pick.select(values), end))),
                }
            }

            (Kind::Struct(name, fields), State::Start) => match fields.first() {
                Some((_, first)) => self.begin_sequence(first, pos),
                None => Step::Done(Some((Value::node(Node::new(name.clone())), pos))),
            },
            (Kind::Struct(name, fields), State::Sequence { index, values }) => {
                let next = fields.get(index + 1).map(|(_, term)| term);
                match self.continue_sequence(next, index, values, result) {
                    Ok(step) => step,
                    Err((values, end)) => {
                        let mut node = Node::new(name.clone());
                        for ((field, _), value) in fields.iter().zip(values) {
                            node.push(field.clone(), value);
                        }
                        Step::Done(Some((Value::node(node), end)))
                    }
                }
            }

            (Kind::List(a), State::Start) => {
                let state = State::Repeat {
                    cursor: pos,
                    values: Vec::new(),
                };
                self.wait(state, a, pos)
            }
            (Kind::List(a), State::Repeat { cursor, mut values }) => match result {
                // A repetition that consumes nothing would match forever.
                Some((value, end)) if end > cursor => {
                    values.push(value);
                    self.wait(State::Repeat { cursor: end, values }, a, end)
                }
                _ => Step::Done(Some((Value::list(values), cursor))),
            },

            (Kind::SepBy { item, .. }, State::Start) => {
                let state = State::Item {
                    cursor: pos,
                    values: Vec::new(),
                    after_sep: None,
                };
                self.wait(state, item, pos)
            }
            (
                Kind::SepBy { sep, trailer, .. },
                State::Item {
                    cursor,
                    mut values,
                    after_sep,
                },
            ) => match result {
                Some((value, end)) => {
                    values.push(value);
                    self.wait(State::Separator { cursor: end, values }, sep, end)
                }
                None => {
                    let end = match after_sep {
                        Some(sep_end) if *trailer => sep_end,
                        _ => cursor,
                    };
                    Step::Done(Some((Value::list(values), end)))
                }
            },
            (Kind::SepBy { item, .. }, State::Separator { cursor, values }) => match result {
                Some((_, end)) if end > cursor => {
                    let state = State::Item {
                        cursor,
                        values,
                        after_sep: Some(end),
                    };
                    self.wait(state, item, end)
                }
                _ => Step::Done(Some((Value::list(values), cursor))),
            },

            (Kind::Require(a, _), State::Start) => self.wait(State::Operand, a, pos),
            (Kind::Require(_, predicate), State::Operand) => {
                Step::Done(result.filter(|(value, _)| predicate(value)))
            }

            (Kind::Bind(a, _), State::Start) => self.wait(State::Operand, a, pos),
            (Kind::Bind(_, next), State::Operand) => match result {
                Some((value, end)) => {
                    let chosen = next(&value);
                    self.wait(State::Continue, &chosen, end)
                }
                None => Step::Done(None),
            },
            (Kind::Bind(..), State::Continue) => Step::Done(result),

            (Kind::Map(a, _), State::Start) => self.wait(State::Operand, a, pos),
            (Kind::Map(_, f), State::Operand) => {
                Step::Done(result.map(|(value, end)| (f(value), end)))
            }

            (Kind::Reduce { assoc, first, .. }, State::Start) => match assoc {
                Assoc::Left => self.wait(State::Operand, first, pos),
                Assoc::Right => {
                    let state = State::RightFirst {
                        pairs: Vec::new(),
                        cursor: pos,
                    };
                    self.wait(state, first, pos)
                }
            },

            (Kind::Reduce { op, .. }, State::Operand) => match result {
                Some((acc, end)) => self.wait(State::LeftOp { acc, cursor: end }, op, end),
                None => Step::Done(None),
            },
            (Kind::Reduce { last, .. }, State::LeftOp { acc, cursor }) => match result {
                Some((op, end)) => self.wait(State::LeftLast { acc, op, cursor }, last, end),
                None => Step::Done(Some((acc, cursor))),
            },
            (Kind::Reduce { op: op_term, fold, .. }, State::LeftLast { acc, op, cursor }) => {
                match result {
                    Some((last, end)) => {
                        let acc = fold(acc, op, last);
                        if end == cursor {
                            return Step::Done(Some((acc, end)));
                        }
                        self.wait(State::LeftOp { acc, cursor: end }, op_term, end)
                    }
                    // The operator is left unconsumed.
                    None => Step::Done(Some((acc, cursor))),
                }
            }

            (Kind::Reduce { op, last, .. }, State::RightFirst { pairs, cursor }) => match result {
                Some((first, end)) => {
                    self.wait(State::RightOp { pairs, first, cursor }, op, end)
                }
                None => self.wait(State::RightLast { pairs }, last, cursor),
            },
            (
                Kind::Reduce { first: first_term, last, .. },
                State::RightOp {
                    mut pairs,
                    first,
                    cursor,
                },
            ) => match result {
                Some((op, end)) if end > cursor => {
                    pairs.push((first, op));
                    self.wait(State::RightFirst { pairs, cursor: end }, first_term, end)
                }
                _ => self.wait(State::RightLast { pairs }, last, cursor),
            },
            (Kind::Reduce { fold, .. }, State::RightLast { pairs }) => match result {
                Some((last, end)) => {
                    let acc = pairs
                        .into_iter()
                        .rev()
                        .fold(last, |acc, (first, op)| fold(first, op, acc));
                    Step::Done(Some((acc, end)))
                }
                None => Step::Done(None),
            },

            (_, _) => unreachable!("frame for {:?} resumed in an unexpected state", term),
        }
    }

    fn begin_sequence(&mut self, first: &Term, pos: usize) -> Step {
        let state = State::Sequence {
            index: 0,
            values: Vec::new(),
        };
        self.wait(state, first, pos)
    }

    /// Record the latest element of a sequence. Returns the next request, or
    /// the collected values and end position once the sequence is complete.
    fn continue_sequence(
        &mut self,
        next: Option<&Term>,
        index: usize,
        mut values: Vec<Value>,
        result: Outcome,
    ) -> Result<Step, (Vec<Value>, usize)> {
        match result {
            Some((value, end)) => {
                values.push(value);
                match next {
                    Some(next) => {
                        let state = State::Sequence {
                            index: index + 1,
                            values,
                        };
                        Ok(self.wait(state, next, end))
                    }
                    None => Err((values, end)),
                }
            }
            None => Ok(Step::Done(None)),
        }
    }
}

/// Match a leaf term directly against the source.
fn leaf<S: Source + ?Sized>(kind: &Kind, pos: usize, source: &S) -> Outcome {
    match kind {
        Kind::Any => source.element(pos),
        Kind::End if pos >= source.len() => Some((Value::None, pos)),
        Kind::End | Kind::Fail => None,
        Kind::Pure(value) => Some((value.clone(), pos)),
        Kind::Literal(lit) => source.literal(pos, lit),
        Kind::Regex(re) => {
            let rest = source.text()?.get(pos..)?;
            let m = re.find(rest)?;
            Some((Value::text(m.as_str()), pos + m.end()))
        }
        Kind::Class(class) => match source.text() {
            Some(text) => {
                let token = class.match_text(text, pos)?;
                let end = token.span.end;
                Some((Value::token(token), end))
            }
            None => {
                let token = source.token(pos).filter(|token| class.matches(token))?;
                Some((Value::token(token.clone()), pos + 1))
            }
        },
        _ => None,
    }
}

enum Entered {
    Ready(Outcome),
    Pushed,
}

/// Runs terms against one source.
///
/// The memo table is kept between calls to [`Evaluator::eval`], so evaluating
/// several terms against the same source shares work. An evaluator must not be
/// reused for a different source.
pub struct Evaluator<'s, S: Source + ?Sized> {
    source: &'s S,
    config: Config,
    memo: HashMap<Key, Memo>,
    stack: Vec<Frame>,
    stats: Stats,
}

impl<'s, S: Source + ?Sized> Evaluator<'s, S> {
    pub fn new(source: &'s S) -> Self {
        Evaluator::with_config(source, Config::default())
    }

    pub fn with_config(source: &'s S, config: Config) -> Self {
        Evaluator {
            source,
            memo: HashMap::with_capacity(config.memo_capacity),
            stack: Vec::with_capacity(config.stack_capacity),
            config,
            stats: Stats::default(),
        }
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Evaluate `term` at `pos`, returning its value and end position, or
    /// `None` if it does not match.
    pub fn eval(&mut self, term: &Term, pos: usize) -> Result<Outcome, ParseError> {
        let result = self.drive(term, pos);
        if result.is_err() {
            // Abandoned frames leave keys marked in progress.
            self.stack.clear();
            self.memo.clear();
        }
        debug!(
            "eval at {}: {} steps, {} frames, {} memo hits, {} recursion guards, depth {}",
            pos,
            self.stats.steps,
            self.stats.frames,
            self.stats.memo_hits,
            self.stats.recursion_guards,
            self.stats.max_depth
        );
        result
    }

    fn drive(&mut self, term: &Term, pos: usize) -> Result<Outcome, ParseError> {
        let mut last = match self.enter(term, pos)? {
            Entered::Ready(outcome) => return Ok(outcome),
            Entered::Pushed => None,
        };

        while let Some(frame) = self.stack.last_mut() {
            self.stats.steps += 1;
            match frame.resume(last.take()) {
                Step::Request(term, pos) => {
                    if self.config.log_steps {
                        trace!("request {:?} at {}", term, pos);
                    }
                    if let Entered::Ready(outcome) = self.enter(&term, pos)? {
                        last = Some(outcome);
                    }
                }
                Step::Done(outcome) => {
                    if let Some(frame) = self.stack.pop() {
                        if self.config.log_steps {
                            trace!(
                                "done {:?} at {}: {}",
                                frame.key.term,
                                frame.key.pos,
                                outcome.as_ref().map_or(-1, |(_, end)| *end as i64)
                            );
                        }
                        self.memo.insert(frame.key, Memo::Done(outcome.clone()));
                    }
                    last = Some(outcome);
                }
            }
        }

        Ok(last.flatten())
    }

    /// Start evaluating `term` at `pos`: answer from the memo table or a leaf
    /// match when possible, otherwise push a frame.
    fn enter(&mut self, term: &Term, pos: usize) -> Result<Entered, ParseError> {
        let term = term.resolve()?;
        let key = Key { term, pos };

        match self.memo.get(&key) {
            Some(Memo::Done(outcome)) => {
                self.stats.memo_hits += 1;
                return Ok(Entered::Ready(outcome.clone()));
            }
            Some(Memo::InProgress) => {
                self.stats.recursion_guards += 1;
                debug!("left recursion through {:?} at {}", key.term, pos);
                return Ok(Entered::Ready(None));
            }
            None => {}
        }

        if key.term.kind().is_leaf() {
            let outcome = leaf(key.term.kind(), pos, self.source);
            self.memo.insert(key, Memo::Done(outcome.clone()));
            return Ok(Entered::Ready(outcome));
        }

        self.memo.insert(key.clone(), Memo::InProgress);
        self.stack.push(Frame::new(key));
        self.stats.frames += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.stack.len());
        Ok(Entered::Pushed)
    }
}

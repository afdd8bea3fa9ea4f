//! Compiling EBNF grammars into terms.

use anyhow::{anyhow, Context, Result};
use ebnf::{Grammar, Rhs};
use std::collections::HashMap;

use crate::term::{Struct, Term};

/// The compiled rules of a grammar, by name.
#[derive(Debug)]
pub struct Rules {
    terms: HashMap<String, Term>,
    order: Vec<String>,
}

impl Rules {
    pub fn get(&self, name: &str) -> Option<Term> {
        self.terms.get(name).cloned()
    }

    /// The first rule of the grammar.
    pub fn start(&self) -> Option<Term> {
        self.order.first().and_then(|name| self.get(name))
    }

    /// Rule names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Compile every production of `grammar`.
///
/// Each rule parses to a node named after the rule, holding the value of its
/// body in the field `value`. Rules may reference each other in any order.
pub fn compile(grammar: &Grammar) -> Result<Rules> {
    let mut terms = HashMap::new();
    let mut order = Vec::new();
    for rule in &grammar.rules {
        let name = rule.name();
        if terms.contains_key(name) {
            return Err(anyhow!("rule defined more than once: {}", name));
        }
        terms.insert(name.to_owned(), Term::forward(name));
        order.push(name.to_owned());
    }

    for rule in &grammar.rules {
        let name = rule.name();
        let body = compile_rhs(&rule.rhs, &terms)
            .with_context(|| format!("failed to compile rule {}", name))?;
        let node = Struct::new(name).field("value", body).build();
        terms[name].define(node)?;
    }

    Ok(Rules { terms, order })
}

fn compile_rhs(rhs: &Rhs, rules: &HashMap<String, Term>) -> Result<Term> {
    Ok(match rhs {
        Rhs::Identifier(iden) => rules
            .get(&iden.0)
            .cloned()
            .ok_or_else(|| anyhow!("undefined rule: {}", iden))?,
        Rhs::Terminal(term) => Term::literal(term.0.as_str()),
        Rhs::Special(special) => Term::regex(&special.0)?,
        Rhs::Optional(inner) => compile_rhs(inner, rules)?.optional(),
        Rhs::Repeat(inner) => compile_rhs(inner, rules)?.list(),
        Rhs::Group(inner) => compile_rhs(inner, rules)?,
        Rhs::Exception(term, except) => {
            let except = compile_rhs(except, rules)?;
            Term::right(vec![except.not(), compile_rhs(term, rules)?])
        }
        Rhs::Alternation(a, b) => Term::or(vec![compile_rhs(a, rules)?, compile_rhs(b, rules)?]),
        Rhs::Concatenation(..) => {
            let mut items = Vec::new();
            let mut rest = rhs;
            while let Rhs::Concatenation(head, tail) = rest {
                items.push(compile_rhs(head, rules)?);
                rest = tail;
            }
            items.push(compile_rhs(rest, rules)?);
            Term::seq(items)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse, parse_prefix, Value};

    fn rules(text: &str) -> Rules {
        let grammar: Grammar = text.parse().unwrap();
        compile(&grammar).unwrap()
    }

    #[test]
    fn rule_nodes() {
        let rules = rules(r#"pair = key, "=", key ; key = ? [a-z]+ ? ;"#);
        assert_eq!(rules.names().collect::<Vec<_>>(), vec!["pair", "key"]);
        let value = parse(&rules.start().unwrap(), "a=b").unwrap();
        assert_eq!(
            value.to_string(),
            r#"pair(value=[key(value="a"), "=", key(value="b")])"#
        );
    }

    #[test]
    fn optional_and_repeat() {
        let rules = rules(r#"digits = "-", { ? [0-9] ? } | [ "+" ] ;"#);
        let digits = rules.get("digits").unwrap();
        let tests = vec![
            ("-12", r#"digits(value=["-", ["1", "2"]])"#),
            ("-", r#"digits(value=["-", []])"#),
            ("+", r#"digits(value="+")"#),
            ("", "digits(value=none)"),
        ];
        for test in tests {
            let value = parse(&digits, test.0).unwrap();
            assert_eq!(value.to_string(), test.1, "test case: {:?}", test);
        }
    }

    #[test]
    fn exception() {
        let rules = rules(r#"ident = ? [a-z]+ ? - "if" ;"#);
        let ident = rules.get("ident").unwrap();
        assert!(parse(&ident, "abc").is_ok());
        assert!(parse(&ident, "if").is_err());
    }

    #[test]
    fn left_recursion_falls_back() {
        let rules = rules(r#"expr = expr, "+", num | num ; num = ? [0-9] ? ;"#);
        let expr = rules.get("expr").unwrap();
        assert!(parse(&expr, "1+2").is_err());
        let value = parse_prefix(&expr, "1+2").unwrap();
        assert_eq!(value.to_string(), r#"expr(value=num(value="1"))"#);
        assert!(matches!(value, Value::Node(_)));
    }

    #[test]
    fn construction_errors() {
        let tests = vec![
            (r#"a = b ;"#, "undefined rule: b"),
            (r#"a = "x" ; a = "y" ;"#, "more than once"),
            (r#"a = ? ( ? ;"#, "rule a"),
        ];
        for test in tests {
            let grammar: Grammar = test.0.parse().unwrap();
            let err = compile(&grammar).unwrap_err();
            assert!(
                format!("{:#}", err).contains(test.1),
                "test case: {:?}, got {:#}",
                test,
                err
            );
        }
    }
}

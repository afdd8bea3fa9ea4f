//! Property-based tests for the combinator laws.

use proptest::prelude::*;
use trellis::{parse, parse_prefix, Evaluator, Term, Value};

fn number() -> Term {
    Term::regex("[0-9]+").unwrap().map(|value| {
        let n = value.as_text().and_then(|t| t.parse().ok()).unwrap_or(0);
        Value::int(n)
    })
}

fn int(value: &Value) -> i64 {
    value.as_int().unwrap_or(0)
}

/// Short lowercase words separated by commas.
fn word_list_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,5}", 0..8)
}

proptest! {
    #[test]
    fn optional_never_fails(input in "[ab]{0,6}", pat in "[ab]{1,3}") {
        let term = Term::literal(pat.as_str()).optional();
        let mut evaluator = Evaluator::new(input.as_str());
        let outcome = evaluator.eval(&term, 0).unwrap();
        prop_assert!(outcome.is_some());
    }

    #[test]
    fn literal_matches_prefix(input in "[ab]{0,6}", pat in "[ab]{0,3}") {
        let mut evaluator = Evaluator::new(input.as_str());
        let outcome = evaluator.eval(&Term::literal(pat.as_str()), 0).unwrap();
        if input.starts_with(pat.as_str()) {
            prop_assert_eq!(outcome, Some((Value::text(pat.as_str()), pat.len())));
        } else {
            prop_assert_eq!(outcome, None);
        }
    }

    #[test]
    fn separated_list_keeps_items(words in word_list_strategy(), trailing in any::<bool>()) {
        let mut input = words.join(",");
        if trailing && !words.is_empty() {
            input.push(',');
        }
        let item = Term::regex("[a-z]+").unwrap();

        let value = parse(&item.clone().sep_by(Term::literal(",")), input.as_str()).unwrap();
        let got: Vec<&str> = value
            .as_list()
            .unwrap()
            .iter()
            .filter_map(Value::as_text)
            .collect();
        prop_assert_eq!(got, words.iter().map(String::as_str).collect::<Vec<_>>());

        let strict = parse(&item.sep_by_strict(Term::literal(",")), input.as_str());
        prop_assert_eq!(strict.is_ok(), !(trailing && !words.is_empty()));
    }

    #[test]
    fn left_fold_sums(nums in prop::collection::vec(0i64..1000, 1..20)) {
        let input = nums.iter().map(i64::to_string).collect::<Vec<_>>().join("+");
        let add = |a: Value, _: Value, b: Value| Value::int(int(&a) + int(&b));
        let sum = Term::reduce_left(number(), Term::literal("+"), number(), add);
        prop_assert_eq!(parse(&sum, input.as_str()), Ok(Value::int(nums.iter().sum())));
    }

    #[test]
    fn right_fold_subtracts(nums in prop::collection::vec(0i64..1000, 1..20)) {
        let input = nums.iter().map(i64::to_string).collect::<Vec<_>>().join("-");
        let sub = |a: Value, _: Value, b: Value| Value::int(int(&a) - int(&b));
        let diff = Term::reduce_right(number(), Term::literal("-"), number(), sub);
        let expected = nums.iter().rev().fold(None, |acc: Option<i64>, n| match acc {
            Some(acc) => Some(n - acc),
            None => Some(*n),
        });
        prop_assert_eq!(parse(&diff, input.as_str()).ok(), expected.map(Value::int));
    }

    #[test]
    fn map_commutes_with_parse(input in "[0-9]{1,6}") {
        let double = |value: Value| Value::int(int(&value) * 2);
        let mapped = number().map(double);
        let term = number();
        let expected = parse(&term, input.as_str()).map(double);
        prop_assert_eq!(parse(&mapped, input.as_str()), expected);
    }

    #[test]
    fn prefix_ignores_trailing_input(word in "[a-z]{1,5}", rest in "[0-9]{1,5}") {
        let input = format!("{}{}", word, rest);
        let term = Term::regex("[a-z]+").unwrap();
        prop_assert!(parse(&term, input.as_str()).is_err());
        prop_assert_eq!(parse_prefix(&term, input.as_str()), Ok(Value::text(word.as_str())));
    }
}

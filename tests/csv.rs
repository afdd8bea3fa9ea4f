//! A very simple csv parser that acts only on numbers, compiled from an EBNF
//! grammar.

use trellis::{load_grammar, parse, Node, ParseError, Term, Value};

const GRAMMAR: &str = r#"
    (* The top level rule. A csv may have 0 or more records. *)
    csv = { record } ;
    (* A record contains fields, and is terminated by a newline. *)
    record = fields , "\n" ;
    (* Fields contains 1 or more 'field's separated by a comma. *)
    fields = field , { "," , field } ;
    (* A field contains 1 or more digits. *)
    field = digit , { digit } ;
    digit = "0" | "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9" ;
"#;

fn rule(name: &str) -> Term {
    let rules = load_grammar(&GRAMMAR.replace("\\n", "\n")).unwrap();
    rules.get(name).unwrap()
}

/// Every node named `name` in `value`, outermost first.
fn nodes<'v>(value: &'v Value, name: &str) -> Vec<&'v Node> {
    let mut found = Vec::new();
    let mut pending = vec![value];
    while let Some(value) = pending.pop() {
        match value {
            Value::Node(node) => {
                if node.name() == name {
                    found.push(&**node);
                }
                pending.extend(node.fields().map(|(_, value)| value).rev());
            }
            Value::List(items) => pending.extend(items.iter().rev()),
            _ => {}
        }
    }
    found
}

/// The text matched under `node`.
fn text(node: &Node) -> String {
    let mut out = String::new();
    let mut pending: Vec<&Value> = node.fields().map(|(_, value)| value).rev().collect();
    while let Some(value) = pending.pop() {
        match value {
            Value::Text(s) => out.push_str(s),
            Value::Node(node) => pending.extend(node.fields().map(|(_, value)| value).rev()),
            Value::List(items) => pending.extend(items.iter().rev()),
            _ => {}
        }
    }
    out
}

#[test]
fn digit() {
    let input = "7";
    let value = parse(&rule("digit"), input).unwrap();

    let digits = nodes(&value, "digit");
    assert_eq!(digits.len(), 1, "unexpected nodes: {}", value);
    assert_eq!(text(digits[0]), input);
}

#[test]
fn field() {
    let input = "789";
    let value = parse(&rule("field"), input).unwrap();

    let fields = nodes(&value, "field");
    assert_eq!(fields.len(), 1, "unexpected nodes: {}", value);
    assert_eq!(text(fields[0]), input);
    assert_eq!(nodes(&value, "digit").len(), 3);
}

#[test]
fn fields() {
    let input = "123,789";
    let value = parse(&rule("fields"), input).unwrap();

    let field_nodes = nodes(&value, "field");
    assert_eq!(text(field_nodes[0]), "123");
    assert_eq!(text(field_nodes[1]), "789");

    assert_eq!(nodes(&value, "fields").len(), 1);
}

#[test]
fn record() {
    let input = "123,789\n";
    let value = parse(&rule("record"), input).unwrap();

    assert_eq!(nodes(&value, "record").len(), 1);
    assert_eq!(parse(&rule("record"), "123,789"), Err(ParseError::NoMatch));
}

#[test]
fn csv() {
    let input = "184,754\n33,22222\n";
    let value = parse(&rule("csv"), input).unwrap();

    let records = nodes(&value, "record");
    assert_eq!(records.len(), 2, "nodes: {}", value);
    assert_eq!(text(records[1]), "33,22222\n");

    let empty = parse(&rule("csv"), "").unwrap();
    assert!(nodes(&empty, "record").is_empty());
}

#[test]
fn malformed_csv() {
    for input in &["1,\n", ",1\n", "1,,2\n", "12\n3"] {
        assert_eq!(
            parse(&rule("csv"), *input),
            Err(ParseError::NoMatch),
            "input: {:?}",
            input
        );
    }
}

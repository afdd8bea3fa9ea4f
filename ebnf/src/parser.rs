use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{alpha1, alphanumeric1, char, multispace1},
    combinator::{all_consuming, map, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::{Grammar, Identifier, Lhs, Production, Rhs, Special, Terminal};

/// Require `f` to consume the entire input, allowing trailing space.
pub fn complete<'a, O, F>(f: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    all_consuming(terminated(f, space))
}

/// Whitespace and `(* ... *)` comments.
fn space(input: &str) -> IResult<&str, ()> {
    let (rem, _) = many0(alt((
        multispace1,
        delimited(tag("(*"), take_until("*)"), tag("*)")),
    )))(input)?;
    Ok((rem, ()))
}

pub fn terminal(input: &str) -> IResult<&str, Terminal> {
    let (rem, matched) = alt((
        delimited(char('"'), take_until("\""), char('"')),
        delimited(char('\''), take_until("'"), char('\'')),
    ))(input)?;
    Ok((rem, Terminal(matched.to_owned())))
}

pub fn special(input: &str) -> IResult<&str, Special> {
    let (rem, matched) = delimited(char('?'), take_until("?"), char('?'))(input)?;
    Ok((rem, Special(matched.trim().to_owned())))
}

pub fn identifier(input: &str) -> IResult<&str, Identifier> {
    let (rem, matched) = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)?;
    Ok((rem, Identifier(matched.to_owned())))
}

pub fn lhs(input: &str) -> IResult<&str, Lhs> {
    let (rem, matched) = preceded(space, identifier)(input)?;
    Ok((rem, Lhs(matched)))
}

/// Alternation has the lowest precedence, then concatenation, then
/// exceptions.
pub fn rhs(input: &str) -> IResult<&str, Rhs> {
    let (rem, (first, rest)) = pair(
        rhs_concatenation,
        many0(preceded(pair(space, char('|')), rhs_concatenation)),
    )(input)?;
    Ok((rem, fold_right(first, rest, Rhs::Alternation)))
}

pub fn production(input: &str) -> IResult<&str, Production> {
    let (rem, (matched_lhs, _, _, matched_rhs, _, _)) =
        tuple((lhs, space, char('='), rhs, space, char(';')))(input)?;
    Ok((
        rem,
        Production {
            lhs: matched_lhs,
            rhs: matched_rhs,
        },
    ))
}

pub fn grammar(input: &str) -> IResult<&str, Grammar> {
    let (rem, rules) = many0(production)(input)?;
    Ok((rem, Grammar { rules }))
}

fn fold_right(first: Rhs, mut rest: Vec<Rhs>, join: fn(Box<Rhs>, Box<Rhs>) -> Rhs) -> Rhs {
    let mut acc = match rest.pop() {
        Some(last) => last,
        None => return first,
    };
    while let Some(item) = rest.pop() {
        acc = join(Box::new(item), Box::new(acc));
    }
    join(Box::new(first), Box::new(acc))
}

fn rhs_concatenation(input: &str) -> IResult<&str, Rhs> {
    let (rem, (first, rest)) = pair(
        rhs_exception,
        many0(preceded(pair(space, char(',')), rhs_exception)),
    )(input)?;
    Ok((rem, fold_right(first, rest, Rhs::Concatenation)))
}

fn rhs_exception(input: &str) -> IResult<&str, Rhs> {
    let (rem, (matched, except)) = pair(
        rhs_factor,
        opt(preceded(pair(space, char('-')), rhs_factor)),
    )(input)?;
    match except {
        Some(except) => Ok((rem, Rhs::Exception(Box::new(matched), Box::new(except)))),
        None => Ok((rem, matched)),
    }
}

fn rhs_factor(input: &str) -> IResult<&str, Rhs> {
    preceded(
        space,
        alt((
            map(bracketed('[', ']'), |rhs| Rhs::Optional(Box::new(rhs))),
            map(bracketed('{', '}'), |rhs| Rhs::Repeat(Box::new(rhs))),
            map(bracketed('(', ')'), |rhs| Rhs::Group(Box::new(rhs))),
            map(terminal, Rhs::Terminal),
            map(special, Rhs::Special),
            map(identifier, Rhs::Identifier),
        )),
    )(input)
}

fn bracketed<'a>(open: char, close: char) -> impl FnMut(&'a str) -> IResult<&'a str, Rhs> {
    delimited(char(open), rhs, pair(space, char(close)))
}

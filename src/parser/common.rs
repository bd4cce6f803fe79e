use crate::core::{DataType, Value};
use super::statement::VariableDecl;
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while},
    character::complete::{alpha1, char, digit1, multispace1, none_of, not_line_ending, one_of, satisfy},
    combinator::{map, map_opt, map_res, not, opt, recognize, value, verify},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

/// Words that can never be used as bare identifiers or aliases.
const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "ORDER", "BY", "AS", "AND", "OR", "NOT", "LIKE", "MATCH", "IN",
    "ANY", "TOP", "ASC", "DESC", "TRUE", "FALSE", "USE", "DECLARE", "SET", "CREATE", "ALTER",
    "DROP", "VIEW", "RECURSIVE",
];

#[must_use]
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

const fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// `-- comment` runs to the end of the line
fn comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("--"), not_line_ending))(input)
}

/// Whitespace and comments.
pub fn sp(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((multispace1, comment))))(input)
}

pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(sp, inner, sp)
}

/// Case-insensitive keyword that must not run into a following identifier
/// character (`AS` does not match the start of `ASC`).
pub fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    ws(terminated(tag_no_case(word), not(satisfy(is_identifier_char))))
}

pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            take_while(is_identifier_char),
        )),
        |s: &str| s.to_string(),
    )(input)
}

pub fn non_keyword_identifier(input: &str) -> IResult<&str, String> {
    verify(identifier, |s: &String| !is_keyword(s))(input)
}

/// `@name`, returned with the `@`.
pub fn variable_name(input: &str) -> IResult<&str, String> {
    map(recognize(pair(char('@'), identifier)), |s: &str| s.to_string())(input)
}

/// `@@name`, returned without the `@@`.
pub fn system_variable_name(input: &str) -> IResult<&str, String> {
    preceded(tag("@@"), identifier)(input)
}

pub fn data_type(input: &str) -> IResult<&str, DataType> {
    map_opt(identifier, |name| DataType::from_name(&name))(input)
}

pub fn variable_decl(input: &str) -> IResult<&str, VariableDecl> {
    map(
        tuple((ws(variable_name), ws(data_type))),
        |(name, data_type)| VariableDecl { name, data_type },
    )(input)
}

/// Single-quoted text; a doubled quote stands for one quote.
pub fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('\''),
            many0(alt((value('\'', tag("''")), none_of("'")))),
            char('\''),
        ),
        |chars: Vec<char>| chars.into_iter().collect(),
    )(input)
}

pub fn number_literal(input: &str) -> IResult<&str, Value> {
    alt((
        map_res(
            recognize(tuple((
                digit1,
                char('.'),
                digit1,
                opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
            ))),
            |s: &str| s.parse::<f64>().map(Value::Float),
        ),
        map_res(
            terminated(digit1, not(satisfy(is_identifier_char))),
            |s: &str| s.parse::<i64>().map(Value::Integer),
        ),
    ))(input)
}

pub fn unsigned(input: &str) -> IResult<&str, u64> {
    map_res(digit1, str::parse::<u64>)(input)
}

pub fn literal(input: &str) -> IResult<&str, Value> {
    alt((
        map(string_literal, Value::String),
        number_literal,
        map(keyword("TRUE"), |_| Value::Boolean(true)),
        map(keyword("FALSE"), |_| Value::Boolean(false)),
    ))(input)
}

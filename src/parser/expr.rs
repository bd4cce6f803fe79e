use crate::core::CompareOp;
use super::common::{identifier, keyword, literal, non_keyword_identifier, system_variable_name, variable_name, ws};
use super::queries::select_query;
use super::statement::{AnyTarget, BinaryOp, Expr, UnaryOp};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{map, opt, peek},
    multi::{many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

// Precedence, loosest first: OR, AND, NOT, predicates, + -, * / %, unary -.

pub fn expression(input: &str) -> IResult<&str, Expr> {
    or_expr(input)
}

fn or_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(keyword("OR"), and_expr))(input)?;
    Ok((input, rest.into_iter().fold(first, |l, r| Expr::binary(BinaryOp::Or, l, r))))
}

fn and_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = not_expr(input)?;
    let (input, rest) = many0(preceded(keyword("AND"), not_expr))(input)?;
    Ok((input, rest.into_iter().fold(first, |l, r| Expr::binary(BinaryOp::And, l, r))))
}

fn not_expr(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(keyword("NOT"), not_expr), Expr::not),
        predicate,
    ))(input)
}

fn compare_op(input: &str) -> IResult<&str, CompareOp> {
    ws(alt((
        map(tag("<="), |_| CompareOp::LessOrEqual),
        map(tag(">="), |_| CompareOp::GreaterOrEqual),
        map(tag("<>"), |_| CompareOp::NotEqual),
        map(tag("!="), |_| CompareOp::NotEqual),
        map(tag("="), |_| CompareOp::Equal),
        map(tag("<"), |_| CompareOp::Less),
        map(tag(">"), |_| CompareOp::Greater),
    )))(input)
}

// `( SELECT ... )` or `( expr, expr, ... )`
fn any_target(input: &str) -> IResult<&str, AnyTarget> {
    delimited(
        ws(char('(')),
        alt((
            map(select_query, |q| AnyTarget::Subquery(Box::new(q))),
            map(separated_list1(ws(char(',')), expression), AnyTarget::List),
        )),
        ws(char(')')),
    )(input)
}

enum Suffix {
    Compare(CompareOp, Expr),
    Any(CompareOp, AnyTarget),
    Like(bool, Expr),
    Match(bool, Expr),
    In(bool, AnyTarget),
}

fn predicate_suffix(input: &str) -> IResult<&str, Suffix> {
    alt((
        map(
            pair(compare_op, preceded(keyword("ANY"), any_target)),
            |(op, target)| Suffix::Any(op, target),
        ),
        map(pair(compare_op, additive), |(op, right)| Suffix::Compare(op, right)),
        map(
            tuple((opt(keyword("NOT")), keyword("LIKE"), additive)),
            |(not, _, pattern)| Suffix::Like(not.is_some(), pattern),
        ),
        map(
            tuple((opt(keyword("NOT")), keyword("MATCH"), additive)),
            |(not, _, pattern)| Suffix::Match(not.is_some(), pattern),
        ),
        map(
            tuple((opt(keyword("NOT")), keyword("IN"), any_target)),
            |(not, _, target)| Suffix::In(not.is_some(), target),
        ),
    ))(input)
}

fn predicate(input: &str) -> IResult<&str, Expr> {
    let (input, left) = additive(input)?;
    let (input, suffix) = opt(predicate_suffix)(input)?;
    let expr = match suffix {
        None => left,
        Some(Suffix::Compare(op, right)) => Expr::binary(BinaryOp::Compare(op), left, right),
        Some(Suffix::Any(op, target)) => Expr::Any {
            op,
            left: Box::new(left),
            target,
        },
        Some(Suffix::Like(negated, pattern)) => Expr::Like {
            operand: Box::new(left),
            pattern: Box::new(pattern),
            negated,
        },
        Some(Suffix::Match(negated, pattern)) => Expr::Match {
            operand: Box::new(left),
            pattern: Box::new(pattern),
            negated,
        },
        Some(Suffix::In(negated, target)) => {
            let any = Expr::Any {
                op: CompareOp::Equal,
                left: Box::new(left),
                target,
            };
            if negated { Expr::not(any) } else { any }
        }
    };
    Ok((input, expr))
}

fn additive(input: &str) -> IResult<&str, Expr> {
    let (input, first) = multiplicative(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            map(char('+'), |_| BinaryOp::Add),
            map(terminated(char('-'), nom::combinator::not(char('-'))), |_| BinaryOp::Subtract),
        ))),
        multiplicative,
    ))(input)?;
    Ok((input, rest.into_iter().fold(first, |l, (op, r)| Expr::binary(op, l, r))))
}

fn multiplicative(input: &str) -> IResult<&str, Expr> {
    let (input, first) = unary(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            map(char('*'), |_| BinaryOp::Multiply),
            map(char('/'), |_| BinaryOp::Divide),
            map(char('%'), |_| BinaryOp::Modulo),
        ))),
        unary,
    ))(input)?;
    Ok((input, rest.into_iter().fold(first, |l, (op, r)| Expr::binary(op, l, r))))
}

fn unary(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(ws(char('-')), unary), |operand| Expr::Unary {
            op: UnaryOp::Negate,
            operand: Box::new(operand),
        }),
        primary,
    ))(input)
}

fn function_call(input: &str) -> IResult<&str, Expr> {
    map(
        pair(
            terminated(ws(identifier), peek(char('('))),
            delimited(
                ws(char('(')),
                separated_list0(ws(char(',')), expression),
                ws(char(')')),
            ),
        ),
        |(name, args)| Expr::Function { name, args },
    )(input)
}

fn column_ref(input: &str) -> IResult<&str, Expr> {
    map(
        pair(
            ws(non_keyword_identifier),
            opt(preceded(char('.'), identifier)),
        ),
        |(first, second)| match second {
            Some(name) => Expr::Column {
                qualifier: Some(first),
                name,
            },
            None => Expr::column(first),
        },
    )(input)
}

fn primary(input: &str) -> IResult<&str, Expr> {
    ws(alt((
        map(literal, Expr::Literal),
        map(system_variable_name, Expr::SystemVariable),
        map(variable_name, Expr::Variable),
        delimited(ws(char('(')), expression, ws(char(')'))),
        function_call,
        column_ref,
    )))(input)
}

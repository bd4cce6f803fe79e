use super::common::{keyword, non_keyword_identifier, unsigned, ws};
use super::expr::expression;
use super::statement::{
    DirectoryOrder, OrderItem, OrderKey, SelectItem, SelectQuery, SortOrder, SourceKind, SourceRef,
};
use nom::{
    branch::alt,
    character::complete::{char, one_of},
    combinator::{map, not, opt},
    multi::{many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

fn sort_order(input: &str) -> IResult<&str, SortOrder> {
    map(
        opt(alt((
            map(keyword("ASC"), |_| SortOrder::Asc),
            map(keyword("DESC"), |_| SortOrder::Desc),
        ))),
        Option::unwrap_or_default,
    )(input)
}

fn alias(input: &str) -> IResult<&str, String> {
    preceded(opt(keyword("AS")), ws(non_keyword_identifier))(input)
}

fn select_item(input: &str) -> IResult<&str, SelectItem> {
    alt((
        map(ws(char('*')), |_| SelectItem::Wildcard),
        map(pair(expression, opt(alias)), |(expr, alias)| SelectItem::Expr { expr, alias }),
    ))(input)
}

enum DirectoryOption {
    Recursive,
    Order(DirectoryOrder),
}

fn directory_option(input: &str) -> IResult<&str, DirectoryOption> {
    preceded(
        ws(char(',')),
        alt((
            map(keyword("RECURSIVE"), |_| DirectoryOption::Recursive),
            map(preceded(keyword("NAME"), sort_order), |o| {
                DirectoryOption::Order(DirectoryOrder::Name(o))
            }),
            map(preceded(keyword("WRITETIME"), sort_order), |o| {
                DirectoryOption::Order(DirectoryOrder::WriteTime(o))
            }),
        )),
    )(input)
}

// DIR('*.log', RECURSIVE, WRITETIME DESC)
fn directory_source(input: &str) -> IResult<&str, SourceKind> {
    let (input, _) = terminated(keyword("DIR"), ws(char('(')))(input)?;
    let (input, path) = expression(input)?;
    let (input, options) = many0(directory_option)(input)?;
    let (input, _) = ws(char(')'))(input)?;

    let mut recursive = false;
    let mut order = None;
    for option in options {
        match option {
            DirectoryOption::Recursive => recursive = true,
            DirectoryOption::Order(o) => order = Some(o),
        }
    }
    Ok((input, SourceKind::Directory { path, recursive, order }))
}

fn text_source(input: &str) -> IResult<&str, SourceKind> {
    map(
        delimited(
            terminated(keyword("TEXT"), ws(char('('))),
            expression,
            ws(char(')')),
        ),
        |path| SourceKind::Text { path },
    )(input)
}

fn view_source(input: &str) -> IResult<&str, SourceKind> {
    map(
        pair(
            ws(non_keyword_identifier),
            opt(delimited(
                ws(char('(')),
                separated_list0(ws(char(',')), expression),
                ws(char(')')),
            )),
        ),
        |(name, arguments)| SourceKind::View {
            name,
            arguments: arguments.unwrap_or_default(),
        },
    )(input)
}

fn source(input: &str) -> IResult<&str, SourceRef> {
    map(
        pair(
            alt((
                directory_source,
                text_source,
                map(delimited(ws(char('(')), select_query, ws(char(')'))), |q| {
                    SourceKind::Subquery(Box::new(q))
                }),
                view_source,
            )),
            opt(alias),
        ),
        |(kind, alias)| SourceRef { kind, alias },
    )(input)
}

// A bare integer is a 1-based select-list position, unless it starts an
// arithmetic expression.
fn ordinal(input: &str) -> IResult<&str, usize> {
    map(
        terminated(ws(unsigned), not(one_of("+-*/%"))),
        |n| usize::try_from(n).unwrap_or(usize::MAX),
    )(input)
}

fn order_item(input: &str) -> IResult<&str, OrderItem> {
    map(
        pair(
            alt((
                map(ordinal, OrderKey::Ordinal),
                map(expression, OrderKey::Expr),
            )),
            sort_order,
        ),
        |(key, order)| OrderItem { key, order },
    )(input)
}

pub fn select_query(input: &str) -> IResult<&str, SelectQuery> {
    let (input, _) = keyword("SELECT")(input)?;
    let (input, top) = opt(preceded(keyword("TOP"), ws(unsigned)))(input)?;
    let (input, items) = separated_list1(ws(char(',')), select_item)(input)?;
    let (input, from) = opt(preceded(keyword("FROM"), source))(input)?;
    let (input, filter) = opt(preceded(keyword("WHERE"), expression))(input)?;
    let (input, order_by) = opt(preceded(
        tuple((keyword("ORDER"), keyword("BY"))),
        separated_list1(ws(char(',')), order_item),
    ))(input)?;

    Ok((
        input,
        SelectQuery {
            top,
            items,
            from,
            filter,
            order_by: order_by.unwrap_or_default(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::statement::Expr;

    #[test]
    fn test_select_directory() {
        let (rest, query) =
            select_query("SELECT TOP 5 Name, Length AS Size FROM DIR('*.log', RECURSIVE, WRITETIME DESC) d WHERE Length > 0 ORDER BY 2 DESC, Name")
                .unwrap();
        assert!(rest.is_empty());
        assert_eq!(query.top, Some(5));
        assert_eq!(query.items.len(), 2);
        let from = query.from.unwrap();
        assert_eq!(from.alias.as_deref(), Some("d"));
        assert!(matches!(
            from.kind,
            SourceKind::Directory { recursive: true, order: Some(DirectoryOrder::WriteTime(SortOrder::Desc)), .. }
        ));
        assert!(query.filter.is_some());
        assert_eq!(query.order_by[0].key, OrderKey::Ordinal(2));
        assert_eq!(query.order_by[0].order, SortOrder::Desc);
        assert_eq!(query.order_by[1].key, OrderKey::Expr(Expr::column("Name")));
    }

    #[test]
    fn test_select_without_from() {
        let (_, query) = select_query("SELECT 1 + 1").unwrap();
        assert!(query.from.is_none());
    }

    #[test]
    fn test_view_with_arguments() {
        let (_, query) = select_query("SELECT * FROM errors('app', 3)").unwrap();
        match query.from.unwrap().kind {
            SourceKind::View { name, arguments } => {
                assert_eq!(name, "errors");
                assert_eq!(arguments.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_subquery_source() {
        let (_, query) = select_query("SELECT Line FROM (SELECT * FROM TEXT('a.log')) AS t").unwrap();
        let from = query.from.unwrap();
        assert!(matches!(from.kind, SourceKind::Subquery(_)));
        assert_eq!(from.alias.as_deref(), Some("t"));
    }

    #[test]
    fn test_order_by_expression_starting_with_number() {
        let (_, query) = select_query("SELECT Length FROM DIR('*') ORDER BY 2 * Length").unwrap();
        assert!(matches!(query.order_by[0].key, OrderKey::Expr(_)));
    }
}

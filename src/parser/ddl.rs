use super::common::{keyword, non_keyword_identifier, variable_decl, ws};
use super::queries::select_query;
use super::statement::{Command, SelectQuery, VariableDecl};
use nom::{
    branch::alt,
    character::complete::char,
    combinator::{map, opt},
    multi::separated_list0,
    sequence::{delimited, tuple},
    IResult,
};

// name [(@p TYPE, ...)] AS SELECT ...
fn view_body(input: &str) -> IResult<&str, (String, Vec<VariableDecl>, SelectQuery)> {
    let (input, name) = ws(non_keyword_identifier)(input)?;
    let (input, parameters) = opt(delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), variable_decl),
        ws(char(')')),
    ))(input)?;
    let (input, _) = keyword("AS")(input)?;
    let (input, query) = select_query(input)?;

    Ok((input, (name, parameters.unwrap_or_default(), query)))
}

pub fn create_view(input: &str) -> IResult<&str, Command> {
    let (input, _) = tuple((keyword("CREATE"), keyword("VIEW")))(input)?;
    let (input, (name, parameters, query)) = view_body(input)?;

    Ok((input, Command::CreateView { name, parameters, query }))
}

pub fn alter_view(input: &str) -> IResult<&str, Command> {
    let (input, _) = tuple((keyword("ALTER"), keyword("VIEW")))(input)?;
    let (input, (name, parameters, query)) = view_body(input)?;

    Ok((input, Command::AlterView { name, parameters, query }))
}

pub fn drop_view(input: &str) -> IResult<&str, Command> {
    map(
        tuple((keyword("DROP"), keyword("VIEW"), ws(non_keyword_identifier))),
        |(_, _, name)| Command::DropView { name },
    )(input)
}

pub fn view_command(input: &str) -> IResult<&str, Command> {
    alt((create_view, alter_view, drop_view))(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;

    #[test]
    fn test_create_parameterized_view() {
        let (rest, cmd) = create_view(
            "CREATE VIEW big_logs (@min INT, @mask STRING) AS SELECT Name FROM DIR(@mask) WHERE Length > @min",
        )
        .unwrap();
        assert!(rest.is_empty());
        match cmd {
            Command::CreateView { name, parameters, query } => {
                assert_eq!(name, "big_logs");
                assert_eq!(parameters[0], VariableDecl { name: "@min".into(), data_type: DataType::Integer });
                assert_eq!(parameters[1].data_type, DataType::String);
                assert!(query.filter.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_alter_and_drop() {
        assert!(matches!(
            view_command("ALTER VIEW v AS SELECT * FROM DIR('*')").unwrap().1,
            Command::AlterView { .. }
        ));
        assert_eq!(
            view_command("DROP VIEW v").unwrap().1,
            Command::DropView { name: "v".into() }
        );
    }
}

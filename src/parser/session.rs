use super::common::{keyword, variable_decl, variable_name, ws};
use super::expr::expression;
use super::statement::Command;
use nom::{
    branch::alt,
    character::complete::char,
    combinator::map,
    multi::separated_list1,
    sequence::{preceded, tuple},
    IResult,
};

pub fn use_directory(input: &str) -> IResult<&str, Command> {
    map(preceded(keyword("USE"), expression), Command::Use)(input)
}

pub fn declare(input: &str) -> IResult<&str, Command> {
    map(
        preceded(keyword("DECLARE"), separated_list1(ws(char(',')), variable_decl)),
        Command::Declare,
    )(input)
}

pub fn set_variable(input: &str) -> IResult<&str, Command> {
    map(
        tuple((keyword("SET"), ws(variable_name), ws(char('=')), expression)),
        |(_, name, _, value)| Command::Set { name, value },
    )(input)
}

pub fn session_command(input: &str) -> IResult<&str, Command> {
    alt((use_directory, declare, set_variable))(input)
}

//! Command/argument tokenization, per `SPEC_FULL.md` §4.2 and §6: whitespace-delimited
//! tokens, with the first token that begins with `:` absorbing the remainder of the line
//! (including embedded whitespace) as a single trailing argument.

use nom::{
    IResult, Parser,
    bytes::complete::take_till1,
    character::complete::{char, space1},
    combinator::rest,
};

/// One parsed command line: the upper-cased command token plus its argument vector, the
/// last of which may be a trailing (`:`-introduced) argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: String,
    pub args: Vec<String>,
}

fn middle_token(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(input)
}

fn trailing_token(input: &str) -> IResult<&str, &str> {
    let (input, _) = char(':')(input)?;
    rest(input)
}

/// Returns `None` for a line with no command token at all (blank after trimming — the
/// line framer already drops truly empty lines, but a line of only whitespace can still
/// reach here).
pub fn parse_line(line: &str) -> Option<ParsedCommand> {
    let mut remaining = line.trim_start();
    let (rest_after_command, command) = middle_token(remaining).ok()?;
    remaining = rest_after_command;

    let mut args = Vec::new();
    loop {
        let Ok((_, after_spaces)) = space1::<_, nom::error::Error<&str>>(remaining) else {
            break;
        };
        remaining = after_spaces;
        if remaining.is_empty() {
            break;
        }
        if let Ok((_, trailing)) = trailing_token(remaining) {
            args.push(trailing.to_string());
            remaining = "";
            break;
        }
        let (after_token, token) = middle_token(remaining).ok()?;
        args.push(token.to_string());
        remaining = after_token;
    }

    Some(ParsedCommand {
        command: command.to_uppercase(),
        args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ParsedCommand {
        parse_line(line).expect("line should parse")
    }

    #[test]
    fn uppercases_command() {
        let p = parse("nick alice");
        assert_eq!(p.command, "NICK");
        assert_eq!(p.args, vec!["alice"]);
    }

    #[test]
    fn trailing_argument_absorbs_rest_of_line() {
        let p = parse("PRIVMSG #room :hello world, how are you");
        assert_eq!(p.command, "PRIVMSG");
        assert_eq!(p.args, vec!["#room", "hello world, how are you"]);
    }

    #[test]
    fn no_trailing_argument() {
        let p = parse("JOIN #room");
        assert_eq!(p.args, vec!["#room"]);
    }

    #[test]
    fn command_with_no_args() {
        let p = parse("QUIT");
        assert_eq!(p.command, "QUIT");
        assert!(p.args.is_empty());
    }

    #[test]
    fn trailing_argument_can_be_empty() {
        let p = parse("TOPIC #room :");
        assert_eq!(p.args, vec!["#room", ""]);
    }

    #[test]
    fn trailing_as_first_argument() {
        let p = parse("QUIT :goodbye cruel world");
        assert_eq!(p.args, vec!["goodbye cruel world"]);
    }

    #[test]
    fn user_command_realname_trailing() {
        let p = parse("USER alice 0 * :Alice A");
        assert_eq!(p.args, vec!["alice", "0", "*", "Alice A"]);
    }
}

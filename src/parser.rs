use nom::{
    branch::alt,
    bytes::complete::{is_a, tag},
    character::{
        complete::{alpha1, digit1, space1},
        is_digit,
    },
    combinator::{eof, map, map_res, value, verify},
    sequence::{terminated, tuple},
    IResult,
};

use crate::ast::{Command::*, *};
use crate::error::{Result, TranslateError};

/// A line that parsed syntactically. Segment names are still raw so an
/// unknown one can be reported as such rather than as a malformed line.
#[derive(Debug, PartialEq)]
enum Parsed<'a> {
    Access(bool, &'a str, u16),
    Command(Command),
}

fn integer(input: &str) -> IResult<&str, u16> {
    map_res(digit1, |c: &str| c.parse())(input)
}

fn access(input: &str) -> IResult<&str, Parsed<'_>> {
    map(
        tuple((
            alt((value(true, tag("push")), value(false, tag("pop")))),
            space1,
            alpha1,
            space1,
            integer,
        )),
        |(is_push, _, segment, _, arg)| Parsed::Access(is_push, segment, arg),
    )(input)
}

#[test]
fn test_access() {
    assert_eq!(
        access("push  pointer  32"),
        Ok(("", Parsed::Access(true, "pointer", 32)))
    );
    assert_eq!(
        access("pop heap 1"),
        Ok(("", Parsed::Access(false, "heap", 1)))
    );
}

fn prim(input: &str) -> IResult<&str, Command> {
    alt((
        value(Add, tag("add")),
        value(Sub, tag("sub")),
        value(Neg, tag("neg")),
        value(Eq, tag("eq")),
        value(Gt, tag("gt")),
        value(Lt, tag("lt")),
        value(And, tag("and")),
        value(Or, tag("or")),
        value(Not, tag("not")),
    ))(input)
}

#[test]
fn test_prim() {
    assert_eq!(prim("neg"), Ok(("", Neg)));
}

/// A label or function name; also the symbol grammar of the emitted assembly.
pub(crate) fn symbol_str(input: &str) -> IResult<&str, &str> {
    verify(
        is_a("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_.$:0123456789"),
        |c: &str| !is_digit(c.as_bytes()[0]),
    )(input)
}

fn symbol(input: &str) -> IResult<&str, String> {
    map(symbol_str, |sym: &str| sym.to_string())(input)
}

fn branching(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((tag("label"), tag("goto"), tag("if-goto"))),
            space1,
            symbol,
        )),
        |(op, _, sym)| match op {
            "label" => Label(sym),
            "goto" => Goto(sym),
            _ => IfGoto(sym),
        },
    )(input)
}

fn function(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((tag("function"), tag("call"))),
            space1,
            symbol,
            space1,
            integer,
        )),
        |(op, _, sym, _, n)| match op {
            "function" => Function(sym, n),
            _ => Call(sym, n),
        },
    )(input)
}

#[test]
fn test_function() {
    assert_eq!(
        function("function Main.fib 2"),
        Ok(("", Function("Main.fib".to_string(), 2)))
    );
    assert_eq!(
        function("call Math.multiply 2"),
        Ok(("", Call("Math.multiply".to_string(), 2)))
    );
}

fn line(input: &str) -> IResult<&str, Parsed<'_>> {
    terminated(
        alt((
            access,
            map(
                alt((branching, function, value(Return, tag("return")), prim)),
                Parsed::Command,
            ),
        )),
        eof,
    )(input)
}

/// Strips a trailing `//` comment and surrounding whitespace.
fn strip_comment(line: &str) -> &str {
    line.split_once("//").map(|(s, _)| s).unwrap_or(line).trim()
}

/// Parses one source unit. `file` is only used for error reporting.
pub fn parse(file: &str, input: &str) -> Result<Vec<VmCommand>> {
    let mut commands = vec![];

    for (index, raw) in input.lines().enumerate() {
        let line_no = index + 1;
        let text = strip_comment(raw);
        if text.is_empty() {
            continue;
        }

        let malformed = || TranslateError::Malformed {
            file: file.to_string(),
            line: line_no,
            text: text.to_string(),
        };

        let command = match line(text) {
            Ok((_, Parsed::Command(command))) => command,
            Ok((_, Parsed::Access(is_push, name, arg))) => {
                let segment =
                    Segment::from_name(name).ok_or_else(|| TranslateError::UnknownSegment {
                        file: file.to_string(),
                        line: line_no,
                        segment: name.to_string(),
                        text: text.to_string(),
                    })?;
                match (is_push, segment) {
                    (true, segment) => Push(segment, arg),
                    (false, Segment::Constant) => return Err(malformed()),
                    (false, segment) => Pop(segment, arg),
                }
            }
            Err(_) => return Err(malformed()),
        };

        commands.push(VmCommand::new(line_no, text, command));
    }

    Ok(commands)
}

#[test]
fn test_parse_skips_comments_and_blanks() {
    let commands = parse(
        "Main",
        "// header\n\n  push constant 7   // seven\nadd\r\nreturn\n",
    )
    .unwrap();
    assert_eq!(
        commands,
        vec![
            VmCommand::new(3, "push constant 7", Push(Segment::Constant, 7)),
            VmCommand::new(4, "add", Add),
            VmCommand::new(5, "return", Return),
        ]
    );
}

#[test]
fn test_parse_control() {
    let commands = parse("Main", "label LOOP_1\nif-goto LOOP_1\ngoto END$x").unwrap();
    let kinds: Vec<Command> = commands.into_iter().map(|c| c.command).collect();
    assert_eq!(
        kinds,
        vec![
            Label("LOOP_1".to_string()),
            IfGoto("LOOP_1".to_string()),
            Goto("END$x".to_string()),
        ]
    );
}

#[test]
fn test_parse_rejects_malformed_line() {
    let err = parse("Main", "push constant 1\nmul\n").unwrap_err();
    match err {
        TranslateError::Malformed { file, line, text } => {
            assert_eq!(file, "Main");
            assert_eq!(line, 2);
            assert_eq!(text, "mul");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_parse_rejects_trailing_operands() {
    assert!(matches!(
        parse("Main", "add 3"),
        Err(TranslateError::Malformed { line: 1, .. })
    ));
    assert!(matches!(
        parse("Main", "addition"),
        Err(TranslateError::Malformed { .. })
    ));
    assert!(matches!(
        parse("Main", "goto 1abc"),
        Err(TranslateError::Malformed { .. })
    ));
}

#[test]
fn test_parse_rejects_pop_constant() {
    assert!(matches!(
        parse("Main", "pop constant 3"),
        Err(TranslateError::Malformed { .. })
    ));
}

#[test]
fn test_parse_reports_unknown_segment() {
    match parse("Main", "\npush heap 3") {
        Err(TranslateError::UnknownSegment {
            line, segment, text, ..
        }) => {
            assert_eq!(line, 2);
            assert_eq!(segment, "heap");
            assert_eq!(text, "push heap 3");
        }
        other => panic!("unexpected result {other:?}"),
    }
}

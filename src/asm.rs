use std::collections::HashSet;
use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{alpha1, char, digit1},
    combinator::{all_consuming, map, opt, rest, verify},
    sequence::{delimited, preceded, terminated, tuple},
    IResult,
};

use crate::parser::symbol_str;

/// Computations the Hack ALU understands, in assembler spelling.
pub const COMPS: [&str; 28] = [
    "0", "1", "-1", "D", "A", "!D", "!A", "-D", "-A", "D+1", "A+1", "D-1", "A-1", "D+A", "D-A",
    "A-D", "D&A", "D|A", "M", "!M", "-M", "M+1", "M-1", "D+M", "D-M", "M-D", "D&M", "D|M",
];

pub const DESTS: [&str; 7] = ["M", "D", "MD", "A", "AM", "AD", "AMD"];

pub const JUMPS: [&str; 7] = ["JGT", "JEQ", "JGE", "JLT", "JNE", "JLE", "JMP"];

/// Largest value an A-instruction can load.
const MAX_LITERAL: u16 = 0x7fff;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Line<'a> {
    Comment(&'a str),
    /// `@value`, either a decimal literal or a symbol.
    Address(&'a str),
    Compute {
        dest: Option<&'a str>,
        comp: &'a str,
        jump: Option<&'a str>,
    },
    /// `(symbol)`
    Label(&'a str),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum LineError {
    Invalid(String),
    DuplicateLabel(String),
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::Invalid(line) => write!(f, "invalid assembly line `{}`", line),
            LineError::DuplicateLabel(sym) => write!(f, "label `{}` declared twice", sym),
        }
    }
}

fn literal(input: &str) -> IResult<&str, &str> {
    verify(digit1, |c: &str| {
        c.parse::<u16>().map_or(false, |v| v <= MAX_LITERAL)
    })(input)
}

fn comment(input: &str) -> IResult<&str, Line<'_>> {
    map(preceded(tag("//"), rest), |c: &str| Line::Comment(c.trim()))(input)
}

fn address(input: &str) -> IResult<&str, Line<'_>> {
    map(preceded(char('@'), alt((literal, symbol_str))), Line::Address)(input)
}

fn label(input: &str) -> IResult<&str, Line<'_>> {
    map(delimited(char('('), symbol_str, char(')')), Line::Label)(input)
}

fn dest(input: &str) -> IResult<&str, &str> {
    verify(is_not("=;"), |d: &str| DESTS.contains(&d))(input)
}

fn comp(input: &str) -> IResult<&str, &str> {
    verify(is_not("=;"), |c: &str| COMPS.contains(&c))(input)
}

fn jump(input: &str) -> IResult<&str, &str> {
    verify(alpha1, |j: &str| JUMPS.contains(&j))(input)
}

fn compute(input: &str) -> IResult<&str, Line<'_>> {
    map(
        verify(
            tuple((
                opt(terminated(dest, char('='))),
                comp,
                opt(preceded(char(';'), jump)),
            )),
            // A bare computation stores nothing and jumps nowhere.
            |(dest, _, jump): &(Option<&str>, &str, Option<&str>)| {
                dest.is_some() || jump.is_some()
            },
        ),
        |(dest, comp, jump)| Line::Compute { dest, comp, jump },
    )(input)
}

impl<'a> Line<'a> {
    pub fn parse(line: &'a str) -> Result<Line<'a>, LineError> {
        all_consuming(alt((comment, address, label, compute)))(line)
            .map(|(_, parsed)| parsed)
            .map_err(|_| LineError::Invalid(line.to_string()))
    }
}

/// Checks every line is well formed and every label is declared exactly once.
pub fn validate<S: AsRef<str>>(lines: &[S]) -> Result<(), LineError> {
    let mut declared = HashSet::new();
    for line in lines {
        if let Line::Label(sym) = Line::parse(line.as_ref())? {
            if !declared.insert(sym) {
                return Err(LineError::DuplicateLabel(sym.to_string()));
            }
        }
    }
    Ok(())
}

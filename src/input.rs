use crate::dice::Scenario;
use std::iter::Peekable;
use std::str::{FromStr, SplitAsciiWhitespace};

/// Whitespace separated tokens of a puzzle input, handed out one at a time with a description
/// of what the caller expected in case the input runs dry or holds garbage.
pub struct Tokens<'a> {
    inner: Peekable<SplitAsciiWhitespace<'a>>,
    consumed: usize,
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum ParseError {
    #[error("input ended early; expected {expected}")]
    UnexpectedEof { expected: &'static str },
    #[error("token {index} ({token:?}) is not a valid {expected}")]
    InvalidToken {
        index: usize,
        token: String,
        expected: &'static str,
    },
    #[error("the grid must have at least one row and one column, got {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("a {rows}x{cols} grid has more cells than fit in memory")]
    GridTooLarge { rows: usize, cols: usize },
    #[error("grid row {row} has {got} cells, expected {expected}")]
    WrongRowLength {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("grid row {row} holds {cell:?} at column {col}; cells are '0' or '1'")]
    InvalidCell { row: usize, col: usize, cell: char },
    #[error("query {query} refers to ({row}, {col}) outside the {rows}x{cols} grid")]
    CoordinateOutOfRange {
        query: usize,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

impl<'a> Tokens<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: input.split_ascii_whitespace().peekable(),
            consumed: 0,
        }
    }

    pub fn next_str(&mut self, expected: &'static str) -> Result<&'a str, ParseError> {
        let token = self
            .inner
            .next()
            .ok_or(ParseError::UnexpectedEof { expected })?;
        self.consumed += 1;
        Ok(token)
    }

    pub fn parse<T: FromStr>(&mut self, expected: &'static str) -> Result<T, ParseError> {
        let token = self.next_str(expected)?;
        token.parse().map_err(|_| ParseError::InvalidToken {
            index: self.consumed - 1,
            token: token.to_owned(),
            expected,
        })
    }

    pub fn is_exhausted(&mut self) -> bool {
        self.inner.peek().is_none()
    }

    /// Number of tokens handed out so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

/// Reads `A C X` triples until the `0 0 0` terminator or the end of input. A triple cut short
/// by the end of input is an error.
pub fn parse_scenarios(input: &str) -> Result<Vec<Scenario>, ParseError> {
    let mut tokens = Tokens::new(input);
    let mut scenarios = Vec::new();
    while !tokens.is_exhausted() {
        let scenario = Scenario {
            multiplier: tokens.parse("multiplier A")?,
            increment: tokens.parse("increment C")?,
            seed: tokens.parse("seed X")?,
        };
        if scenario.is_terminator() {
            break;
        }
        scenarios.push(scenario);
    }
    Ok(scenarios)
}

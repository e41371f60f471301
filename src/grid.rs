use crate::input::{ParseError, Tokens};
use std::collections::VecDeque;
use std::str::FromStr;
use strum_macros::Display;

/// A 0-indexed cell of the grid.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

/// Rectangular map of single-bit labels. Zero cells are "binary" land, one cells "decimal".
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GridMap {
    rows: usize,
    cols: usize,
    labels: Vec<u8>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ReachabilityQuery {
    pub from: Cell,
    pub to: Cell,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Answer {
    /// A path through `0` cells connects the endpoints.
    Binary,
    /// A path through `1` cells connects the endpoints.
    Decimal,
    Neither,
}

/// A grid together with the queries asked about it, as read from the puzzle input.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Puzzle {
    pub map: GridMap,
    pub queries: Vec<ReachabilityQuery>,
}

/// Connected component id per cell. `0` means not yet known; every other id is shared by all
/// cells of exactly one fully explored component and never changes once set.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EquivalenceMap {
    cols: usize,
    ids: Vec<u32>,
}

/// Answers queries one after another against a single map. Each breadth-first search labels a
/// whole component, and later queries reuse those labels instead of searching again.
#[derive(Debug, Clone)]
pub struct ReachabilitySearch<'a> {
    map: &'a GridMap,
    classes: EquivalenceMap,
    next_class: u32,
    queue: VecDeque<Cell>,
}

impl GridMap {
    /// Builds a map from row strings of `'0'`/`'1'` characters.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, ParseError> {
        let cols = rows.first().map_or(0, |row| row.as_ref().chars().count());
        if rows.is_empty() || cols == 0 {
            return Err(ParseError::EmptyGrid {
                rows: rows.len(),
                cols,
            });
        }
        let mut labels = Vec::new();
        for (row, line) in rows.iter().enumerate() {
            push_row(&mut labels, row, line.as_ref(), cols)?;
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            labels,
        })
    }

    fn parse_from(tokens: &mut Tokens) -> Result<Self, ParseError> {
        let rows = tokens.parse("row count")?;
        let cols = tokens.parse("column count")?;
        if rows == 0 || cols == 0 {
            return Err(ParseError::EmptyGrid { rows, cols });
        }
        if rows.checked_mul(cols).is_none() {
            return Err(ParseError::GridTooLarge { rows, cols });
        }
        // Grows with the rows actually present; the header alone is not trusted.
        let mut labels = Vec::new();
        for row in 0..rows {
            push_row(&mut labels, row, tokens.next_str("grid row")?, cols)?;
        }
        Ok(Self { rows, cols, labels })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    pub fn label(&self, cell: Cell) -> u8 {
        self.labels[self.index(cell)]
    }

    fn index(&self, cell: Cell) -> usize {
        cell.row * self.cols + cell.col
    }

    /// Cells north, west, east and south of `cell` that lie on the map.
    pub fn neighbours(&self, cell: Cell) -> impl Iterator<Item = Cell> {
        let Cell { row, col } = cell;
        [
            row.checked_sub(1).map(|row| Cell { row, col }),
            col.checked_sub(1).map(|col| Cell { row, col }),
            Some(Cell { row, col: col + 1 }),
            Some(Cell { row: row + 1, col }),
        ]
        .into_iter()
        .flatten()
        .filter(move |&neighbour| self.contains(neighbour))
    }
}

fn push_row(labels: &mut Vec<u8>, row: usize, line: &str, cols: usize) -> Result<(), ParseError> {
    let got = line.chars().count();
    if got != cols {
        return Err(ParseError::WrongRowLength {
            row: row + 1,
            expected: cols,
            got,
        });
    }
    for (col, cell) in line.chars().enumerate() {
        let label = match cell {
            '0' => 0,
            '1' => 1,
            _ => {
                return Err(ParseError::InvalidCell {
                    row: row + 1,
                    col: col + 1,
                    cell,
                });
            }
        };
        labels.push(label);
    }
    Ok(())
}

impl Answer {
    fn connected_through(label: u8) -> Self {
        if label == 0 {
            Answer::Binary
        } else {
            Answer::Decimal
        }
    }
}

impl Puzzle {
    /// Reads `rows cols`, the rows, the query count and then `r1 c1 r2 c2` per query with
    /// 1-indexed coordinates.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut tokens = Tokens::new(input);
        let map = GridMap::parse_from(&mut tokens)?;
        let count: usize = tokens.parse("query count")?;
        let queries = (0..count)
            .map(|query| {
                let from = parse_cell(&mut tokens, &map, query)?;
                let to = parse_cell(&mut tokens, &map, query)?;
                Ok(ReachabilityQuery { from, to })
            })
            .collect::<Result<Vec<_>, ParseError>>()?;
        Ok(Self { map, queries })
    }

    pub fn solve(&self) -> Vec<Answer> {
        ReachabilitySearch::new(&self.map).answer_all(&self.queries)
    }
}

impl FromStr for Puzzle {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_cell(tokens: &mut Tokens, map: &GridMap, query: usize) -> Result<Cell, ParseError> {
    let row: usize = tokens.parse("query row")?;
    let col: usize = tokens.parse("query column")?;
    if !(1..=map.rows()).contains(&row) || !(1..=map.cols()).contains(&col) {
        return Err(ParseError::CoordinateOutOfRange {
            query: query + 1,
            row,
            col,
            rows: map.rows(),
            cols: map.cols(),
        });
    }
    Ok(Cell {
        row: row - 1,
        col: col - 1,
    })
}

impl EquivalenceMap {
    pub fn new(map: &GridMap) -> Self {
        Self {
            cols: map.cols(),
            ids: vec![0; map.labels.len()],
        }
    }

    pub fn class(&self, cell: Cell) -> Option<u32> {
        match self.ids[cell.row * self.cols + cell.col] {
            0 => None,
            id => Some(id),
        }
    }

    fn assign(&mut self, cell: Cell, id: u32) {
        let slot = &mut self.ids[cell.row * self.cols + cell.col];
        debug_assert_eq!(*slot, 0, "Component ids are never overwritten.");
        *slot = id;
    }

    /// Number of cells whose component is known.
    pub fn resolved(&self) -> usize {
        self.ids.iter().filter(|&&id| id != 0).count()
    }
}

impl<'a> ReachabilitySearch<'a> {
    pub fn new(map: &'a GridMap) -> Self {
        Self {
            map,
            classes: EquivalenceMap::new(map),
            next_class: 1,
            queue: VecDeque::new(),
        }
    }

    pub fn classes(&self) -> &EquivalenceMap {
        &self.classes
    }

    /// Endpoints off the map are connected to nothing and answer [`Answer::Neither`].
    pub fn answer(&mut self, query: &ReachabilityQuery) -> Answer {
        let ReachabilityQuery { from, to } = *query;
        if !self.map.contains(from) || !self.map.contains(to) {
            return Answer::Neither;
        }
        let label = self.map.label(from);
        match (self.classes.class(from), self.classes.class(to)) {
            (Some(a), Some(b)) if a == b => Answer::connected_through(label),
            (Some(_), Some(_)) => Answer::Neither,
            _ if label != self.map.label(to) => Answer::Neither,
            // The source component is complete and does not hold the target.
            (Some(_), None) => Answer::Neither,
            (None, _) => {
                let id = self.explore(from);
                if self.classes.class(to) == Some(id) {
                    Answer::connected_through(label)
                } else {
                    Answer::Neither
                }
            }
        }
    }

    pub fn answer_all(&mut self, queries: &[ReachabilityQuery]) -> Vec<Answer> {
        queries.iter().map(|query| self.answer(query)).collect()
    }

    /// Labels the whole same-label component around `source` with a fresh id.
    fn explore(&mut self, source: Cell) -> u32 {
        let map = self.map;
        let id = self.next_class;
        self.next_class += 1;
        let label = map.label(source);
        self.classes.assign(source, id);
        self.queue.push_back(source);
        while let Some(cell) = self.queue.pop_front() {
            for neighbour in map.neighbours(cell) {
                if map.label(neighbour) == label && self.classes.class(neighbour).is_none() {
                    self.classes.assign(neighbour, id);
                    self.queue.push_back(neighbour);
                }
            }
        }
        id
    }
}

use enum_map::{Enum, EnumMap};
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumCount, EnumIter};

/// One round per category.
pub const NUM_ROUNDS: usize = 11;

/// Five dice as they are presented to the judge. Always exactly `NUM_DICE` values, each on
/// `1..=NUM_FACES`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Roll([u8; Roll::NUM_DICE]);

/// The eleven scoring rules. The declaration order is the total order used whenever two
/// categories have to be compared, e.g. when breaking ties.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Hash, Enum, EnumIter, EnumCount, Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreCategory {
    Ones,
    Twos,
    Threes,
    Fours,
    Fives,
    Sixes,
    Sequence,
    FullHouse,
    FourOfAKind,
    FiveOfAKind,
    Chance,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Hash)]
pub enum ScoreCategoryState {
    #[default]
    Unscored,
    Scored,
}

/// Half-open range `[start, end)` of positions in the dice sequence.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Hash)]
pub struct ScoreEntry {
    pub score: u16,
    pub state: ScoreCategoryState,
    /// Where in the dice sequence the score came from, if known.
    pub window: Option<Window>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Hash)]
pub struct ScoreSheet {
    entries: EnumMap<ScoreCategory, ScoreEntry>,
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum ConstructionError {
    #[error("a roll needs exactly {expected} dice, got {got}")]
    WrongNumberOfDice { expected: usize, got: usize },
    #[error("die face {got} is outside 1..={max}")]
    FaceOutOfRange { max: u8, got: u8 },
    #[error("value {got} is larger than the maximum {max}")]
    ValueTooLarge { max: u8, got: u8 },
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum ScoringError {
    #[error("category {category} has already been scored")]
    CategoryAlreadyScored { category: ScoreCategory },
    #[error("all {rounds} rounds have already been played")]
    GameOver { rounds: usize },
}

impl Roll {
    pub const NUM_DICE: usize = 5;
    pub const NUM_FACES: usize = 6;

    pub fn dice(&self) -> &[u8; Self::NUM_DICE] {
        &self.0
    }

    pub fn sum(&self) -> u16 {
        self.0.iter().map(|&d| d as u16).sum()
    }

    /// How many dice show each face; index 0 holds the count of ones.
    pub fn face_counts(&self) -> [u8; Self::NUM_FACES] {
        let mut counts = [0u8; Self::NUM_FACES];
        for &die in &self.0 {
            counts[(die - 1) as usize] += 1;
        }
        counts
    }
}

impl TryFrom<[u8; Roll::NUM_DICE]> for Roll {
    type Error = ConstructionError;

    fn try_from(value: [u8; Roll::NUM_DICE]) -> Result<Self, Self::Error> {
        match value
            .iter()
            .find(|&&die| die == 0 || die as usize > Self::NUM_FACES)
        {
            Some(&bad) => Err(Self::Error::FaceOutOfRange {
                max: Self::NUM_FACES as u8,
                got: bad,
            }),
            None => Ok(Self(value)),
        }
    }
}

impl TryFrom<&[u8]> for Roll {
    type Error = ConstructionError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let dice: [u8; Roll::NUM_DICE] =
            value
                .try_into()
                .map_err(|_| Self::Error::WrongNumberOfDice {
                    expected: Self::NUM_DICE,
                    got: value.len(),
                })?;
        Self::try_from(dice)
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e] = self.0;
        write!(f, "{a} {b} {c} {d} {e}")
    }
}

impl ScoreCategory {
    /// The face counted by the upper-section categories.
    pub fn face(&self) -> Option<u8> {
        match self {
            ScoreCategory::Ones => Some(1),
            ScoreCategory::Twos => Some(2),
            ScoreCategory::Threes => Some(3),
            ScoreCategory::Fours => Some(4),
            ScoreCategory::Fives => Some(5),
            ScoreCategory::Sixes => Some(6),
            _ => None,
        }
    }
}

impl ScoreSheet {
    pub fn entries(&self) -> &EnumMap<ScoreCategory, ScoreEntry> {
        &self.entries
    }

    pub fn entry(&self, category: ScoreCategory) -> &ScoreEntry {
        &self.entries[category]
    }

    pub fn is_scored(&self, category: ScoreCategory) -> bool {
        self.entries[category].state == ScoreCategoryState::Scored
    }

    /// Marks `category` as used with the given score. A category can only go from unscored to
    /// scored once.
    pub fn score(&self, category: ScoreCategory, score: u16) -> Result<Self, ScoringError> {
        if self.is_scored(category) {
            return Err(ScoringError::CategoryAlreadyScored { category });
        }
        let mut entries = self.entries;
        entries[category] = ScoreEntry {
            score,
            state: ScoreCategoryState::Scored,
            window: entries[category].window,
        };
        Ok(Self { entries })
    }

    /// Keeps the better of the current and the offered score for `category`. Only strictly
    /// better offers replace the entry, so the earliest window wins a tie. Returns whether the
    /// entry changed.
    pub fn record_best(&mut self, category: ScoreCategory, score: u16, window: Window) -> bool {
        let entry = &mut self.entries[category];
        if score > entry.score {
            entry.score = score;
            entry.window = Some(window);
            true
        } else {
            false
        }
    }

    pub fn unscored(&self) -> impl Iterator<Item = ScoreCategory> + '_ {
        ScoreCategory::iter().filter(|&category| !self.is_scored(category))
    }

    pub fn is_complete(&self) -> bool {
        self.unscored().next().is_none()
    }

    /// Sum over the scored categories only.
    pub fn total(&self) -> u32 {
        self.entries
            .values()
            .filter(|entry| entry.state == ScoreCategoryState::Scored)
            .map(|entry| entry.score as u32)
            .sum()
    }

    /// Sum over every entry regardless of state. Used for the per-category ceiling of the
    /// greedy planner, where nothing is ever marked as scored.
    pub fn ceiling(&self) -> u32 {
        self.entries.values().map(|entry| entry.score as u32).sum()
    }
}

const CATEGORY_COLUMN_WIDTH: usize = 20;

impl fmt::Display for ScoreSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (category, entry) in self.entries.iter() {
            let status = match entry.state {
                ScoreCategoryState::Scored => "Scored!",
                ScoreCategoryState::Unscored => "NoScore",
            };
            let window = match entry.window {
                Some(Window { start, end }) => format!(" ({start},{end})"),
                None => String::new(),
            };
            writeln!(
                f,
                "{:<width$}{status} {}{window}",
                category.to_string(),
                entry.score,
                width = CATEGORY_COLUMN_WIDTH
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::EnumCount;

    #[test]
    fn roll_valid_initialisation() {
        let result = Roll::try_from([1, 6, 3, 3, 2]);
        assert!(result.is_ok());
    }

    #[test]
    fn roll_face_out_of_range() {
        assert_eq!(
            Roll::try_from([1, 7, 3, 3, 2]),
            Err(ConstructionError::FaceOutOfRange { max: 6, got: 7 })
        );
        assert_eq!(
            Roll::try_from([0, 1, 1, 1, 1]),
            Err(ConstructionError::FaceOutOfRange { max: 6, got: 0 })
        );
    }

    #[test]
    fn roll_wrong_number_of_dice() {
        let dice: &[u8] = &[1, 2, 3, 4];
        assert_eq!(
            Roll::try_from(dice),
            Err(ConstructionError::WrongNumberOfDice {
                expected: Roll::NUM_DICE,
                got: 4
            })
        );
    }

    #[test]
    fn face_counts() {
        let roll = Roll::try_from([6, 1, 6, 3, 6]).unwrap();
        assert_eq!(roll.face_counts(), [1, 0, 1, 0, 0, 3]);
        assert_eq!(roll.sum(), 22);
    }

    #[test]
    fn score_upper_section() {
        let sheet = ScoreSheet::default().score(ScoreCategory::Threes, 9).unwrap();
        assert!(sheet.is_scored(ScoreCategory::Threes));
        assert_eq!(sheet.entry(ScoreCategory::Threes).score, 9);
        assert_eq!(sheet.total(), 9);
        assert!(!sheet.is_complete());
    }

    #[test]
    fn invalid_score() {
        let sheet = ScoreSheet::default()
            .score(ScoreCategory::Ones, 3)
            .unwrap()
            .score(ScoreCategory::Ones, 3);
        assert_eq!(
            sheet,
            Err(ScoringError::CategoryAlreadyScored {
                category: ScoreCategory::Ones
            })
        );
    }

    #[test]
    fn record_best_keeps_first_of_equal_scores() {
        let mut sheet = ScoreSheet::default();
        assert!(sheet.record_best(ScoreCategory::Chance, 20, Window { start: 0, end: 5 }));
        assert!(!sheet.record_best(ScoreCategory::Chance, 20, Window { start: 3, end: 8 }));
        assert!(sheet.record_best(ScoreCategory::Chance, 21, Window { start: 4, end: 9 }));
        assert_eq!(
            sheet.entry(ScoreCategory::Chance).window,
            Some(Window { start: 4, end: 9 })
        );
        assert_eq!(sheet.total(), 0);
        assert_eq!(sheet.ceiling(), 21);
    }

    #[test]
    fn category_order_is_declaration_order() {
        assert!(ScoreCategory::Ones < ScoreCategory::Sixes);
        assert!(ScoreCategory::FiveOfAKind < ScoreCategory::Chance);
        assert_eq!(ScoreCategory::iter().last(), Some(ScoreCategory::Chance));
    }

    #[test]
    fn category_names() {
        assert_eq!(ScoreCategory::FourOfAKind.to_string(), "FOUR_OF_A_KIND");
        assert_eq!(ScoreCategory::Ones.to_string(), "ONES");
    }

    #[test]
    fn num_categories_as_expected() {
        assert_eq!(
            ScoreCategory::COUNT,
            11,
            "The game is played over exactly one round per category."
        );
    }
}

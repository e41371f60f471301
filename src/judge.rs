use crate::dice::{DiceCup, DiceSequence, RollError};
use crate::scoring::score;
use crate::types::{NUM_ROUNDS, Roll, ScoreCategory, ScoreSheet, ScoringError};

/// Referee for a single game: every category is used at most once and the game ends after
/// `NUM_ROUNDS` registered rolls.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Judge {
    sheet: ScoreSheet,
    total_score: u32,
    rolls_registered: usize,
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum PlayError {
    #[error(transparent)]
    Roll(#[from] RollError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl Judge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scores `roll` under `category` and returns the updated total.
    pub fn register_roll(
        &mut self,
        roll: &Roll,
        category: ScoreCategory,
    ) -> Result<u32, ScoringError> {
        if self.has_game_ended() {
            return Err(ScoringError::GameOver { rounds: NUM_ROUNDS });
        }
        let points = score(roll, category);
        self.sheet = self.sheet.score(category, points)?;
        self.total_score += points as u32;
        self.rolls_registered += 1;
        Ok(self.total_score)
    }

    pub fn has_game_ended(&self) -> bool {
        self.rolls_registered >= NUM_ROUNDS
    }

    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    pub fn rolls_registered(&self) -> usize {
        self.rolls_registered
    }

    pub fn score_sheet(&self) -> &ScoreSheet {
        &self.sheet
    }
}

/// Plays a whole game without ever re-rolling: each turn takes the next five dice and books
/// them under whichever open category pays most. Ties go to the category that comes last in
/// category order.
pub fn play_without_rerolls(sequence: &DiceSequence) -> Result<Judge, PlayError> {
    let mut judge = Judge::new();
    let mut cup = DiceCup::new(sequence);
    while !judge.has_game_ended() {
        let roll = cup.roll()?;
        let category = judge
            .score_sheet()
            .unscored()
            .max_by_key(|&category| score(&roll, category))
            .expect("An unfinished game always has an open category.");
        let roll = cup.take()?;
        judge.register_roll(&roll, category)?;
    }
    Ok(judge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::Scenario;
    use strum::IntoEnumIterator;

    fn roll(dice: [u8; 5]) -> Roll {
        Roll::try_from(dice).unwrap()
    }

    #[test]
    fn register_accumulates_total() {
        let mut judge = Judge::new();
        assert_eq!(
            judge.register_roll(&roll([2, 2, 2, 3, 3]), ScoreCategory::FullHouse),
            Ok(12)
        );
        assert_eq!(
            judge.register_roll(&roll([6, 6, 1, 2, 3]), ScoreCategory::Sixes),
            Ok(24)
        );
        assert_eq!(judge.total_score(), 24);
        assert_eq!(judge.score_sheet().total(), 24);
        assert!(!judge.has_game_ended());
    }

    #[test]
    fn category_cannot_be_reused() {
        let mut judge = Judge::new();
        judge
            .register_roll(&roll([1, 1, 1, 1, 1]), ScoreCategory::Ones)
            .unwrap();
        assert_eq!(
            judge.register_roll(&roll([1, 1, 1, 1, 1]), ScoreCategory::Ones),
            Err(ScoringError::CategoryAlreadyScored {
                category: ScoreCategory::Ones
            })
        );
        assert_eq!(judge.total_score(), 5);
        assert_eq!(judge.rolls_registered(), 1);
    }

    #[test]
    fn game_ends_after_every_category() {
        let mut judge = Judge::new();
        for category in ScoreCategory::iter() {
            judge
                .register_roll(&roll([5, 5, 5, 5, 5]), category)
                .unwrap();
        }
        assert!(judge.has_game_ended());
        assert!(judge.score_sheet().is_complete());
        // 25 + 25 (fives, chance) + 25 (four of a kind) + 50
        assert_eq!(judge.total_score(), 125);
        assert_eq!(
            judge.register_roll(&roll([5, 5, 5, 5, 5]), ScoreCategory::Chance),
            Err(ScoringError::GameOver { rounds: 11 })
        );
    }

    #[test]
    fn greedy_game_without_rerolls() {
        let sequence = DiceSequence::generate(Scenario {
            multiplier: 1103515245,
            increment: 12345,
            seed: 42,
        });
        let judge = play_without_rerolls(&sequence).unwrap();
        assert!(judge.has_game_ended());
        assert!(judge.score_sheet().is_complete());
        assert_eq!(judge.total_score(), judge.score_sheet().total());
        // The first roll is 4 2 2 6 5; chance pays most.
        assert_eq!(judge.score_sheet().entry(ScoreCategory::Chance).score, 19);
    }

    #[test]
    fn greedy_game_needs_enough_dice() {
        let sequence = DiceSequence::try_from(vec![1; 12]).unwrap();
        assert_eq!(
            play_without_rerolls(&sequence).unwrap_err(),
            PlayError::Roll(RollError::SequenceExhausted { position: 12 })
        );
    }
}

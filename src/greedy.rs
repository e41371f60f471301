use crate::dice::DiceSequence;
use crate::scoring::score;
use crate::types::{Roll, ScoreCategory, ScoreSheet, Window};
use strum::IntoEnumIterator;

/// Best score per category over every window of five consecutive dice, with each category
/// considered on its own. Windows may overlap between categories, so the sum is a ceiling on
/// what a real game could reach rather than a playable plan.
pub fn plan_ceiling(sequence: &DiceSequence) -> ScoreSheet {
    plan_ceiling_for(sequence, ScoreCategory::iter())
}

/// Like [`plan_ceiling`] but only for the given categories; the others stay at zero.
pub fn plan_ceiling_for(
    sequence: &DiceSequence,
    categories: impl IntoIterator<Item = ScoreCategory> + Clone,
) -> ScoreSheet {
    let mut sheet = ScoreSheet::default();
    for (start, dice) in sequence.dice().windows(Roll::NUM_DICE).enumerate() {
        let roll = Roll::try_from(dice).expect("Windows always hold five valid dice.");
        let window = Window {
            start,
            end: start + Roll::NUM_DICE,
        };
        for category in categories.clone() {
            sheet.record_best(category, score(&roll, category), window);
        }
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::Scenario;

    #[test]
    fn finds_best_window_per_category() {
        let sequence =
            DiceSequence::try_from(vec![1, 2, 3, 4, 5, 6, 6, 6, 6, 6, 2, 2, 2, 3, 3]).unwrap();
        let sheet = plan_ceiling(&sequence);
        let five = sheet.entry(ScoreCategory::FiveOfAKind);
        assert_eq!(five.score, 50);
        assert_eq!(five.window, Some(Window { start: 5, end: 10 }));
        let sequence_entry = sheet.entry(ScoreCategory::Sequence);
        assert_eq!(sequence_entry.score, 20);
        assert_eq!(sequence_entry.window, Some(Window { start: 1, end: 6 }));
        let full_house = sheet.entry(ScoreCategory::FullHouse);
        assert_eq!(full_house.score, 22);
        assert_eq!(full_house.window, Some(Window { start: 7, end: 12 }));
        assert_eq!(sheet.entry(ScoreCategory::Sixes).score, 30);
        assert_eq!(sheet.entry(ScoreCategory::Ones).score, 1);
        // Nothing is booked, only remembered.
        assert_eq!(sheet.total(), 0);
        assert!(sheet.ceiling() > 0);
    }

    #[test]
    fn last_window_is_included() {
        let sequence = DiceSequence::try_from(vec![1, 1, 1, 1, 2, 2, 2, 2, 2]).unwrap();
        let sheet = plan_ceiling(&sequence);
        assert_eq!(
            sheet.entry(ScoreCategory::FiveOfAKind).window,
            Some(Window { start: 4, end: 9 })
        );
    }

    #[test]
    fn restricted_categories() {
        let sequence = DiceSequence::generate(Scenario {
            multiplier: 1103515245,
            increment: 12345,
            seed: 42,
        });
        let sheet = plan_ceiling_for(&sequence, [ScoreCategory::Chance]);
        assert!(sheet.entry(ScoreCategory::Chance).score > 0);
        assert_eq!(sheet.ceiling(), sheet.entry(ScoreCategory::Chance).score as u32);
    }

    #[test]
    fn short_sequence_has_no_windows() {
        let sequence = DiceSequence::try_from(vec![6, 6, 6, 6]).unwrap();
        assert_eq!(plan_ceiling(&sequence), ScoreSheet::default());
    }
}

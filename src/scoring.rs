use crate::types::{Roll, ScoreCategory};

pub const FIVE_OF_A_KIND_VALUE: u16 = 50;

/// Scores `roll` under `category`. Pure; never fails because `Roll` already guarantees five
/// dice on 1..=6.
pub fn score(roll: &Roll, category: ScoreCategory) -> u16 {
    match category {
        ScoreCategory::Ones
        | ScoreCategory::Twos
        | ScoreCategory::Threes
        | ScoreCategory::Fours
        | ScoreCategory::Fives
        | ScoreCategory::Sixes => {
            let face = category
                .face()
                .expect("Upper section categories always have a face.");
            score_repetition(roll, face)
        }
        ScoreCategory::Sequence => score_sequence(roll),
        ScoreCategory::FullHouse => score_full_house(roll),
        ScoreCategory::FourOfAKind => score_four_of_a_kind(roll),
        ScoreCategory::FiveOfAKind => score_five_of_a_kind(roll),
        ScoreCategory::Chance => roll.sum(),
    }
}

fn score_repetition(roll: &Roll, face: u8) -> u16 {
    roll.dice()
        .iter()
        .filter(|&&die| die == face)
        .map(|&die| die as u16)
        .sum()
}

fn score_sequence(roll: &Roll) -> u16 {
    let mut sorted = *roll.dice();
    sorted.sort_unstable();
    if sorted.windows(2).all(|pair| pair[1] == pair[0] + 1) {
        roll.sum()
    } else {
        0
    }
}

fn score_full_house(roll: &Roll) -> u16 {
    let counts = roll.face_counts();
    let has_three = counts.contains(&3);
    let has_two = counts.contains(&2);
    if has_three && has_two { roll.sum() } else { 0 }
}

/// Any face showing at least four times qualifies, so five of a kind also scores here.
fn score_four_of_a_kind(roll: &Roll) -> u16 {
    if roll.face_counts().iter().any(|&count| count >= 4) {
        roll.sum()
    } else {
        0
    }
}

fn score_five_of_a_kind(roll: &Roll) -> u16 {
    if roll.face_counts().contains(&(Roll::NUM_DICE as u8)) {
        FIVE_OF_A_KIND_VALUE
    } else {
        0
    }
}

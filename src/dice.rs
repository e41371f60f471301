use crate::types::{ConstructionError, NUM_ROUNDS, Roll};

/// The three numbers that define a game: `X' = (multiplier * X + increment) mod 2^32`,
/// starting from `seed`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Scenario {
    pub multiplier: u32,
    pub increment: u32,
    pub seed: u32,
}

/// Linear congruential generator over a 32-bit modulus. Only the upper 16 bits of the state
/// feed into a die face.
#[derive(Debug, Clone)]
pub struct Lcg {
    multiplier: u64,
    increment: u64,
    state: u64,
}

/// The pre-rolled, immutable stream of dice that every consumer reads from.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct DiceSequence(Vec<u8>);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RollsLeft(u8);

/// Plays one turn after another against a `DiceSequence`: five fresh dice per roll, then up to
/// `RollsLeft::MAX` re-rolls, each replacing the chosen dice with the next values in the
/// sequence. Remembers the sequence position behind every die on the table.
#[derive(Debug, Clone)]
pub struct DiceCup<'a> {
    sequence: &'a DiceSequence,
    next: usize,
    slots: Option<[usize; Roll::NUM_DICE]>,
    rolls_left: RollsLeft,
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum RollError {
    #[error("there are no dice on the table; roll first")]
    NoActiveRoll,
    #[error("at most {max} re-rolls are allowed per turn")]
    NoRerollsLeft { max: u8 },
    #[error("re-roll index {index} is outside 0..{dice}")]
    IndexOutOfRange { index: usize, dice: usize },
    #[error("die {index} was listed more than once in a single re-roll")]
    DuplicateIndex { index: usize },
    #[error("the dice sequence ran out at position {position}")]
    SequenceExhausted { position: usize },
}

const MODULUS: u64 = 1 << 32;
const DISCARDED_LOW_BITS: u32 = 16;

impl Scenario {
    /// `0 0 0` ends the list of scenarios on stdin.
    pub fn is_terminator(&self) -> bool {
        self.multiplier == 0 && self.increment == 0 && self.seed == 0
    }
}

impl Lcg {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            multiplier: scenario.multiplier as u64,
            increment: scenario.increment as u64,
            state: scenario.seed as u64,
        }
    }

    pub fn roll_die(&mut self) -> u8 {
        // Both factors are below 2^32, so the product plus increment stays below 2^64.
        self.state = (self.multiplier * self.state + self.increment) % MODULUS;
        ((self.state >> DISCARDED_LOW_BITS) % Roll::NUM_FACES as u64) as u8 + 1
    }
}

impl Iterator for Lcg {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        Some(self.roll_die())
    }
}

impl DiceSequence {
    /// Eighteen dice per round, which leaves headroom over the fifteen a round can use.
    pub const MAX_ROLLS: usize = NUM_ROUNDS * 18;

    pub fn generate(scenario: Scenario) -> Self {
        Self::with_len(scenario, Self::MAX_ROLLS)
    }

    pub fn with_len(scenario: Scenario, len: usize) -> Self {
        Self(Lcg::new(scenario).take(len).collect())
    }

    pub fn dice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<u8>> for DiceSequence {
    type Error = ConstructionError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        match value
            .iter()
            .find(|&&die| die == 0 || die as usize > Roll::NUM_FACES)
        {
            Some(&bad) => Err(Self::Error::FaceOutOfRange {
                max: Roll::NUM_FACES as u8,
                got: bad,
            }),
            None => Ok(Self(value)),
        }
    }
}

impl RollsLeft {
    pub const MAX: u8 = 2;

    pub fn rolls_left(&self) -> u8 {
        self.0
    }

    fn decremented(&self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

impl Default for RollsLeft {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl TryFrom<u8> for RollsLeft {
    type Error = ConstructionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > Self::MAX {
            Err(Self::Error::ValueTooLarge {
                max: Self::MAX,
                got: value,
            })
        } else {
            Ok(Self(value))
        }
    }
}

impl<'a> DiceCup<'a> {
    pub fn new(sequence: &'a DiceSequence) -> Self {
        Self {
            sequence,
            next: 0,
            slots: None,
            rolls_left: RollsLeft::default(),
        }
    }

    /// Position of the next unused die in the sequence.
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn rolls_left(&self) -> RollsLeft {
        self.rolls_left
    }

    /// Sequence positions of the dice currently on the table.
    pub fn slots(&self) -> Option<&[usize; Roll::NUM_DICE]> {
        self.slots.as_ref()
    }

    /// Starts a turn with the next five dice. Any dice still on the table are discarded.
    pub fn roll(&mut self) -> Result<Roll, RollError> {
        self.ensure_available(Roll::NUM_DICE)?;
        let start = self.next;
        let slots = std::array::from_fn(|i| start + i);
        self.next += Roll::NUM_DICE;
        self.slots = Some(slots);
        self.rolls_left = RollsLeft::default();
        Ok(self.roll_at(slots))
    }

    /// Replaces the dice at `indices` (0-based, in the given order) with the next dice of the
    /// sequence. An empty list still uses up one re-roll.
    pub fn reroll(&mut self, indices: &[usize]) -> Result<Roll, RollError> {
        let mut slots = self.slots.ok_or(RollError::NoActiveRoll)?;
        let rolls_left = self
            .rolls_left
            .decremented()
            .ok_or(RollError::NoRerollsLeft {
                max: RollsLeft::MAX,
            })?;
        let mut seen = [false; Roll::NUM_DICE];
        for &index in indices {
            if index >= Roll::NUM_DICE {
                return Err(RollError::IndexOutOfRange {
                    index,
                    dice: Roll::NUM_DICE,
                });
            }
            if seen[index] {
                return Err(RollError::DuplicateIndex { index });
            }
            seen[index] = true;
        }
        self.ensure_available(indices.len())?;
        for &index in indices {
            slots[index] = self.next;
            self.next += 1;
        }
        self.slots = Some(slots);
        self.rolls_left = rolls_left;
        Ok(self.roll_at(slots))
    }

    /// Hands over the dice on the table and clears it, so a roll can only be submitted once.
    pub fn take(&mut self) -> Result<Roll, RollError> {
        let slots = self.slots.take().ok_or(RollError::NoActiveRoll)?;
        Ok(self.roll_at(slots))
    }

    fn ensure_available(&self, count: usize) -> Result<(), RollError> {
        if self.next + count > self.sequence.len() {
            Err(RollError::SequenceExhausted {
                position: self.sequence.len(),
            })
        } else {
            Ok(())
        }
    }

    fn roll_at(&self, slots: [usize; Roll::NUM_DICE]) -> Roll {
        Roll::try_from(slots.map(|position| self.sequence.dice()[position]))
            .expect("A DiceSequence only ever holds valid faces.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: Scenario = Scenario {
        multiplier: 1103515245,
        increment: 12345,
        seed: 42,
    };

    #[test]
    fn lcg_matches_reference_values() {
        let dice: Vec<u8> = Lcg::new(SCENARIO).take(12).collect();
        assert_eq!(dice, vec![4, 2, 2, 6, 5, 4, 6, 1, 2, 2, 5, 1]);
        let other = Scenario {
            multiplier: 22695477,
            increment: 1,
            seed: 1,
        };
        let dice: Vec<u8> = Lcg::new(other).take(6).collect();
        assert_eq!(dice, vec![5, 1, 5, 5, 1, 4]);
    }

    #[test]
    fn lcg_handles_maximal_parameters() {
        let scenario = Scenario {
            multiplier: u32::MAX,
            increment: u32::MAX,
            seed: u32::MAX,
        };
        let dice: Vec<u8> = Lcg::new(scenario).take(6).collect();
        assert_eq!(dice, vec![1, 4, 1, 4, 1, 4]);
    }

    #[test]
    fn single_draws_equal_batch() {
        let mut lcg = Lcg::new(SCENARIO);
        let one_by_one: Vec<u8> = (0..DiceSequence::MAX_ROLLS).map(|_| lcg.roll_die()).collect();
        assert_eq!(one_by_one, DiceSequence::generate(SCENARIO).dice());
    }

    #[test]
    fn shorter_sequence_is_prefix() {
        let long = DiceSequence::with_len(SCENARIO, 150);
        for len in [0, 1, 5, 77, 149] {
            let short = DiceSequence::with_len(SCENARIO, len);
            assert_eq!(short.dice(), &long.dice()[..len]);
        }
        assert_eq!(DiceSequence::generate(SCENARIO).len(), 198);
    }

    #[test]
    fn terminator() {
        assert!(
            Scenario {
                multiplier: 0,
                increment: 0,
                seed: 0
            }
            .is_terminator()
        );
        assert!(!SCENARIO.is_terminator());
    }

    #[test]
    fn rolls_left_bounds() {
        assert!(RollsLeft::try_from(2).is_ok());
        assert_eq!(
            RollsLeft::try_from(3),
            Err(ConstructionError::ValueTooLarge { max: 2, got: 3 })
        );
    }

    fn counting_sequence() -> DiceSequence {
        DiceSequence::try_from((0..30).map(|i| i % 6 + 1).collect::<Vec<u8>>()).unwrap()
    }

    #[test]
    fn cup_reroll_replaces_in_given_order() {
        let sequence = counting_sequence();
        let mut cup = DiceCup::new(&sequence);
        assert_eq!(cup.roll().unwrap().dice(), &[1, 2, 3, 4, 5]);
        assert_eq!(cup.reroll(&[4, 0]).unwrap().dice(), &[1, 2, 3, 4, 6]);
        assert_eq!(cup.slots(), Some(&[6, 1, 2, 3, 5]));
        assert_eq!(cup.position(), 7);
        assert_eq!(cup.reroll(&[]).unwrap().dice(), &[1, 2, 3, 4, 6]);
        assert_eq!(
            cup.reroll(&[1]),
            Err(RollError::NoRerollsLeft { max: 2 })
        );
        assert_eq!(cup.take().unwrap().dice(), &[1, 2, 3, 4, 6]);
        assert_eq!(cup.take(), Err(RollError::NoActiveRoll));
    }

    #[test]
    fn cup_rejects_bad_indices() {
        let sequence = counting_sequence();
        let mut cup = DiceCup::new(&sequence);
        assert_eq!(cup.reroll(&[0]), Err(RollError::NoActiveRoll));
        cup.roll().unwrap();
        assert_eq!(
            cup.reroll(&[5]),
            Err(RollError::IndexOutOfRange { index: 5, dice: 5 })
        );
        assert_eq!(cup.reroll(&[2, 2]), Err(RollError::DuplicateIndex { index: 2 }));
        // Rejected re-rolls neither move the cursor nor spend a re-roll.
        assert_eq!(cup.position(), 5);
        assert_eq!(cup.rolls_left().rolls_left(), 2);
    }

    #[test]
    fn cup_runs_out_of_dice() {
        let sequence = DiceSequence::try_from(vec![1, 2, 3, 4, 5, 6, 1]).unwrap();
        let mut cup = DiceCup::new(&sequence);
        cup.roll().unwrap();
        assert_eq!(
            cup.reroll(&[0, 1, 2]),
            Err(RollError::SequenceExhausted { position: 7 })
        );
        assert_eq!(cup.roll(), Err(RollError::SequenceExhausted { position: 7 }));
    }
}

//! Bit-vector encoding of a whole game for the genetic optimizer.
//!
//! Position `i` of the vector stands for die `i` of the dice sequence; a set bit means that die
//! ends up in a scored roll. The vector is cut into one contiguous interval per turn. A turn
//! always scores exactly five dice, but its interval is wider than five whenever it re-rolled,
//! because each re-rolled die pulls the next value from the sequence. That makes the turn
//! boundaries move around, and every operator below has to keep them consistent.

use crate::dice::{DiceCup, DiceSequence, RollError, RollsLeft};
use crate::scoring::score;
use crate::types::{NUM_ROUNDS, Roll, ScoreCategory};
use enum_map::EnumMap;
use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError};
use std::fmt;
use std::ops::RangeInclusive;

/// Five initial dice plus five more for each of the two re-rolls.
pub const SLOTS_PER_TURN: usize = Roll::NUM_DICE * (1 + RollsLeft::MAX as usize);
pub const CHROMOSOME_LEN: usize = NUM_ROUNDS * SLOTS_PER_TURN;
pub const USED_DICE: usize = NUM_ROUNDS * Roll::NUM_DICE;

/// Order in which categories get to pick a turn when scoring a chromosome. The most demanding
/// categories go first, which matters a lot for the resulting fitness.
pub const FITNESS_ORDER: [ScoreCategory; NUM_ROUNDS] = [
    ScoreCategory::FiveOfAKind,
    ScoreCategory::FourOfAKind,
    ScoreCategory::FullHouse,
    ScoreCategory::Sequence,
    ScoreCategory::Sixes,
    ScoreCategory::Fives,
    ScoreCategory::Fours,
    ScoreCategory::Threes,
    ScoreCategory::Twos,
    ScoreCategory::Ones,
    ScoreCategory::Chance,
];

const WORD_BITS: usize = u64::BITS as usize;
const WORDS: usize = CHROMOSOME_LEN.div_ceil(WORD_BITS);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Genes([u64; WORDS]);

/// Closed interval `[start, end]` of gene positions owned by one turn.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TurnInterval {
    start: usize,
    end: usize,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Chromosome {
    genes: Genes,
    intervals: [TurnInterval; NUM_ROUNDS],
    fitness: u32,
}

/// The turn a category was booked on and what it paid.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TurnScore {
    pub turn: usize,
    pub score: u16,
}

pub type Assignment = EnumMap<ScoreCategory, Option<TurnScore>>;

/// How the random initialization plays its re-rolls: each of the two re-roll rounds happens
/// with `probability` (the turn stops re-rolling at the first round that doesn't), and the
/// number of dice thrown again is drawn from `count`, rounded and clamped to `0..=5`.
#[derive(Debug, Copy, Clone)]
pub struct RerollPolicy {
    probability: f64,
    count: Normal<f64>,
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum ChromosomeError {
    #[error("turn {turn} starts at position {got} instead of {expected}")]
    NotContiguous {
        turn: usize,
        expected: usize,
        got: usize,
    },
    #[error("turn {turn} spans {len} positions, outside 5..={max}")]
    BadIntervalLength { turn: usize, len: usize, max: usize },
    #[error("turn {turn} uses {got} dice instead of 5")]
    WrongDiceInTurn { turn: usize, got: usize },
    #[error("gene {position} is set but belongs to no turn")]
    StrayGene { position: usize },
    #[error("{got} genes set in total instead of {expected}")]
    WrongTotal { expected: usize, got: usize },
}

impl Genes {
    pub const LEN: usize = CHROMOSOME_LEN;

    pub fn get(&self, position: usize) -> bool {
        (self.0[position / WORD_BITS] >> (position % WORD_BITS)) & 1 == 1
    }

    pub fn set(&mut self, position: usize, value: bool) {
        let mask = 1u64 << (position % WORD_BITS);
        if value {
            self.0[position / WORD_BITS] |= mask;
        } else {
            self.0[position / WORD_BITS] &= !mask;
        }
    }

    pub fn count_ones(&self) -> usize {
        self.0.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// The set positions among `positions`, in iteration order.
    pub fn ones_in<I>(&self, positions: I) -> impl Iterator<Item = usize>
    where
        I: IntoIterator<Item = usize>,
    {
        positions
            .into_iter()
            .filter(move |&position| self.get(position))
    }
}

impl fmt::Display for Genes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for position in 0..Self::LEN {
            f.write_str(if self.get(position) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl TurnInterval {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "empty turn interval [{start}, {end}]");
        Self { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn positions(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    fn shifted(&self, delta: isize) -> Self {
        Self::new(shift(self.start, delta), shift(self.end, delta))
    }
}

fn shift(position: usize, delta: isize) -> usize {
    position
        .checked_add_signed(delta)
        .expect("Turns never shift in front of the first gene.")
}

impl RerollPolicy {
    pub fn new(probability: f64, mean: f64, std_dev: f64) -> Result<Self, NormalError> {
        Ok(Self {
            probability,
            count: Normal::new(mean, std_dev)?,
        })
    }

    fn wants_reroll<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.random_bool(self.probability)
    }

    fn dice_to_reroll<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.count
            .sample(rng)
            .round()
            .clamp(0.0, Roll::NUM_DICE as f64) as usize
    }
}

impl Default for RerollPolicy {
    fn default() -> Self {
        Self::new(0.5, 3.0, 1.5).expect("A positive standard deviation is always valid.")
    }
}

impl Chromosome {
    /// Plays one random but legal game against `sequence` and records which dice it used.
    pub fn random<R: Rng + ?Sized>(
        sequence: &DiceSequence,
        policy: &RerollPolicy,
        rng: &mut R,
    ) -> Result<Self, RollError> {
        let mut genes = Genes::default();
        let mut intervals = [TurnInterval::new(0, 0); NUM_ROUNDS];
        let mut cup = DiceCup::new(sequence);
        for interval in intervals.iter_mut() {
            let start = cup.position();
            cup.roll()?;
            for _ in 0..RollsLeft::MAX {
                if !policy.wants_reroll(rng) {
                    break;
                }
                let count = policy.dice_to_reroll(rng);
                let indices = rand::seq::index::sample(rng, Roll::NUM_DICE, count).into_vec();
                cup.reroll(&indices)?;
            }
            let slots = cup.slots().ok_or(RollError::NoActiveRoll)?;
            for &position in slots {
                genes.set(position, true);
            }
            // The last die drawn is never replaced later in the same turn, so it closes the
            // interval.
            *interval = TurnInterval::new(start, cup.position() - 1);
            cup.take()?;
        }
        let mut chromosome = Self {
            genes,
            intervals,
            fitness: 0,
        };
        chromosome.evaluate(sequence);
        Ok(chromosome)
    }

    /// Builds a chromosome from explicit genes and turn intervals, checking every structural
    /// invariant before scoring it.
    pub fn from_parts(
        genes: Genes,
        intervals: [TurnInterval; NUM_ROUNDS],
        sequence: &DiceSequence,
    ) -> Result<Self, ChromosomeError> {
        let mut chromosome = Self {
            genes,
            intervals,
            fitness: 0,
        };
        chromosome.validate()?;
        chromosome.evaluate(sequence);
        Ok(chromosome)
    }

    pub fn genes(&self) -> &Genes {
        &self.genes
    }

    pub fn intervals(&self) -> &[TurnInterval; NUM_ROUNDS] {
        &self.intervals
    }

    pub fn fitness(&self) -> u32 {
        self.fitness
    }

    /// Checks that the turns tile the vector from position 0 without gaps or overlaps, that
    /// every turn uses exactly five dice, and that no gene outside the turns is set.
    pub fn validate(&self) -> Result<(), ChromosomeError> {
        let mut expected_start = 0;
        for (turn, interval) in self.intervals.iter().enumerate() {
            if interval.start != expected_start {
                return Err(ChromosomeError::NotContiguous {
                    turn,
                    expected: expected_start,
                    got: interval.start,
                });
            }
            let len = interval.len();
            if !(Roll::NUM_DICE..=SLOTS_PER_TURN).contains(&len) || interval.end >= Genes::LEN {
                return Err(ChromosomeError::BadIntervalLength {
                    turn,
                    len,
                    max: SLOTS_PER_TURN,
                });
            }
            let used = self.genes.ones_in(interval.positions()).count();
            if used != Roll::NUM_DICE {
                return Err(ChromosomeError::WrongDiceInTurn { turn, got: used });
            }
            expected_start = interval.end + 1;
        }
        if let Some(position) = (expected_start..Genes::LEN).find(|&p| self.genes.get(p)) {
            return Err(ChromosomeError::StrayGene { position });
        }
        let total = self.genes.count_ones();
        if total != USED_DICE {
            return Err(ChromosomeError::WrongTotal {
                expected: USED_DICE,
                got: total,
            });
        }
        Ok(())
    }

    /// The five dice a turn ends up scoring.
    pub fn turn_roll(&self, turn: usize, sequence: &DiceSequence) -> Roll {
        let mut dice = [0u8; Roll::NUM_DICE];
        for (die, position) in dice
            .iter_mut()
            .zip(self.genes.ones_in(self.intervals[turn].positions()))
        {
            *die = sequence.dice()[position];
        }
        Roll::try_from(dice).expect("Every turn uses exactly five dice from the sequence.")
    }

    /// Lets each category in `FITNESS_ORDER` claim the open turn that pays it most. Ties go to
    /// the lowest turn index. A category that nothing pays for is left unassigned so the turn
    /// stays available for a later category.
    pub fn assign_categories(&self, sequence: &DiceSequence) -> Assignment {
        let rolls: [Roll; NUM_ROUNDS] = std::array::from_fn(|turn| self.turn_roll(turn, sequence));
        let mut open = [true; NUM_ROUNDS];
        let mut assignment = Assignment::default();
        for category in FITNESS_ORDER {
            let mut best: Option<TurnScore> = None;
            for turn in (0..NUM_ROUNDS).filter(|&turn| open[turn]) {
                let points = score(&rolls[turn], category);
                if best.is_none_or(|best| points > best.score) {
                    best = Some(TurnScore {
                        turn,
                        score: points,
                    });
                }
            }
            if let Some(best) = best.filter(|best| best.score > 0) {
                open[best.turn] = false;
                assignment[category] = Some(best);
            }
        }
        assignment
    }

    /// Recomputes the cached fitness. Needed after every change to the genes.
    pub fn evaluate(&mut self, sequence: &DiceSequence) {
        self.fitness = self
            .assign_categories(sequence)
            .values()
            .flatten()
            .map(|turn_score| turn_score.score as u32)
            .sum();
    }

    /// Replaces `turn` with the donor's genes for the same turn. If the donor's interval has a
    /// different length, every later turn moves by the difference so the turns keep tiling the
    /// vector. The fitness is left stale; call [`Chromosome::evaluate`] afterwards.
    pub fn splice_turn(&mut self, turn: usize, donor: &Chromosome) {
        let own = self.intervals[turn];
        let incoming = donor.intervals[turn];
        let delta = incoming.len() as isize - own.len() as isize;
        let tail_end = self.intervals[NUM_ROUNDS - 1].end;

        // Built into a fresh vector, so growing turns never overwrite live genes of their
        // successors.
        let mut genes = Genes::default();
        for position in self.genes.ones_in(0..own.start) {
            genes.set(position, true);
        }
        for (offset, position) in incoming.positions().enumerate() {
            genes.set(own.start + offset, donor.genes.get(position));
        }
        for position in self.genes.ones_in(own.end + 1..=tail_end) {
            genes.set(shift(position, delta), true);
        }
        self.genes = genes;

        self.intervals[turn] = TurnInterval::new(own.start, own.start + incoming.len() - 1);
        for later in self.intervals[turn + 1..].iter_mut() {
            *later = later.shifted(delta);
        }
    }

    /// Picks a breakpoint between two turns uniformly and crosses the parents over there.
    pub fn recombine<R: Rng + ?Sized>(
        first: &Chromosome,
        second: &Chromosome,
        sequence: &DiceSequence,
        rng: &mut R,
    ) -> [Chromosome; 2] {
        let breakpoint = rng.random_range(1..NUM_ROUNDS);
        Self::recombine_at(first, second, breakpoint, sequence)
    }

    /// Both children start as copies of `second`. The first child takes turns
    /// `breakpoint..` from `first`, the second child takes turns `..breakpoint` from `first`.
    pub fn recombine_at(
        first: &Chromosome,
        second: &Chromosome,
        breakpoint: usize,
        sequence: &DiceSequence,
    ) -> [Chromosome; 2] {
        let mut late = second.clone();
        for turn in breakpoint..NUM_ROUNDS {
            late.splice_turn(turn, first);
        }
        let mut early = second.clone();
        for turn in 0..breakpoint {
            early.splice_turn(turn, first);
        }
        late.evaluate(sequence);
        early.evaluate(sequence);
        [late, early]
    }

    /// With `probability` per turn, moves one used die of the turn to an unused position of the
    /// same turn. Turns that use every position of their interval are left alone. Returns
    /// whether anything changed; the fitness is refreshed if so.
    pub fn mutate_within<R: Rng + ?Sized>(
        &mut self,
        probability: f64,
        sequence: &DiceSequence,
        rng: &mut R,
    ) -> bool {
        let mut mutated = false;
        for turn in 0..NUM_ROUNDS {
            if !rng.random_bool(probability) {
                continue;
            }
            let (used, unused): (Vec<usize>, Vec<usize>) = self.intervals[turn]
                .positions()
                .partition(|&position| self.genes.get(position));
            if unused.is_empty() {
                continue;
            }
            let switch_on = unused[rng.random_range(0..unused.len())];
            let switch_off = used[rng.random_range(0..used.len())];
            self.genes.set(switch_on, true);
            self.genes.set(switch_off, false);
            mutated = true;
        }
        if mutated {
            self.evaluate(sequence);
        }
        mutated
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.genes)?;
        for (turn, interval) in self.intervals.iter().enumerate() {
            let symbol = if turn % 2 == 0 { "+" } else { "-" };
            f.write_str(&symbol.repeat(interval.len()))?;
        }
        write!(f, "\nScore: {}", self.fitness)
    }
}

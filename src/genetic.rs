use crate::chromosome::{Chromosome, RerollPolicy};
use crate::dice::{DiceSequence, RollError};
use rand::Rng;
use rand_distr::NormalError;
use std::cmp::Reverse;

/// Every generation breeds two children and drops the two least fit individuals.
pub const CHILDREN_PER_GENERATION: usize = 2;

/// Knobs of the genetic optimizer. The defaults reproduce the reference run; the generation
/// budget and the optional stall limit are what make the search terminate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeneticParams {
    pub population_size: usize,
    pub mutation_probability: f64,
    pub reroll_probability: f64,
    pub reroll_mean: f64,
    pub reroll_std_dev: f64,
    pub max_generations: usize,
    /// Stop once the best fitness has not improved for this many generations.
    pub stall_generations: Option<usize>,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GeneticError {
    #[error("the population needs at least {min} chromosomes, got {got}")]
    PopulationTooSmall { min: usize, got: usize },
    #[error("{name} must be a probability in [0, 1], got {got}")]
    NotAProbability { name: &'static str, got: f64 },
    #[error("the generation budget must allow at least one generation")]
    NoGenerations,
    #[error("invalid re-roll count distribution: {0}")]
    RerollDistribution(#[from] NormalError),
    #[error("could not play a random game: {0}")]
    Roll(#[from] RollError),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StopReason {
    GenerationBudget,
    Stalled,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GenerationStats {
    pub generation: usize,
    pub best: u32,
    pub mean: f64,
    pub worst: u32,
}

/// Steady-state genetic search over chromosomes for one dice sequence. The population is kept
/// sorted by descending fitness, so the best individual is always first.
pub struct GeneticOptimizer<'a, R> {
    sequence: &'a DiceSequence,
    params: GeneticParams,
    population: Vec<Chromosome>,
    generation: usize,
    best_fitness: u32,
    stalled_for: usize,
    rng: R,
}

impl Default for GeneticParams {
    fn default() -> Self {
        Self {
            population_size: 50,
            mutation_probability: 0.01,
            reroll_probability: 0.5,
            reroll_mean: 3.0,
            reroll_std_dev: 1.5,
            max_generations: 2000,
            stall_generations: None,
        }
    }
}

impl GeneticParams {
    pub fn validate(&self) -> Result<(), GeneticError> {
        if self.population_size < CHILDREN_PER_GENERATION {
            return Err(GeneticError::PopulationTooSmall {
                min: CHILDREN_PER_GENERATION,
                got: self.population_size,
            });
        }
        for (name, value) in [
            ("mutation probability", self.mutation_probability),
            ("re-roll probability", self.reroll_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GeneticError::NotAProbability { name, got: value });
            }
        }
        if self.max_generations == 0 {
            return Err(GeneticError::NoGenerations);
        }
        self.reroll_policy()?;
        Ok(())
    }

    pub fn reroll_policy(&self) -> Result<RerollPolicy, NormalError> {
        RerollPolicy::new(
            self.reroll_probability,
            self.reroll_mean,
            self.reroll_std_dev,
        )
    }
}

fn sort_by_fitness(population: &mut [Chromosome]) {
    // Stable, so among equally fit individuals the older ones survive.
    population.sort_by_key(|chromosome| Reverse(chromosome.fitness()));
}

impl<'a, R: Rng> GeneticOptimizer<'a, R> {
    /// Seeds the population with random legal games.
    pub fn new(
        sequence: &'a DiceSequence,
        params: GeneticParams,
        mut rng: R,
    ) -> Result<Self, GeneticError> {
        params.validate()?;
        let policy = params.reroll_policy()?;
        let mut population = (0..params.population_size)
            .map(|_| Chromosome::random(sequence, &policy, &mut rng))
            .collect::<Result<Vec<_>, _>>()?;
        sort_by_fitness(&mut population);
        let best_fitness = population[0].fitness();
        Ok(Self {
            sequence,
            params,
            population,
            generation: 0,
            best_fitness,
            stalled_for: 0,
            rng,
        })
    }

    pub fn params(&self) -> &GeneticParams {
        &self.params
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    pub fn best(&self) -> &Chromosome {
        &self.population[0]
    }

    pub fn into_best(mut self) -> Chromosome {
        self.population.swap_remove(0)
    }

    pub fn stats(&self) -> GenerationStats {
        let total: u64 = self
            .population
            .iter()
            .map(|chromosome| chromosome.fitness() as u64)
            .sum();
        GenerationStats {
            generation: self.generation,
            best: self.best().fitness(),
            mean: total as f64 / self.population.len() as f64,
            worst: self
                .population
                .last()
                .map(Chromosome::fitness)
                .unwrap_or_default(),
        }
    }

    /// One generation: two parents drawn uniformly with replacement (possibly the same
    /// individual), recombined, both children mutated and added, then the two least fit
    /// individuals removed.
    pub fn step(&mut self) -> GenerationStats {
        let first = self.rng.random_range(0..self.population.len());
        let second = self.rng.random_range(0..self.population.len());
        let children = Chromosome::recombine(
            &self.population[first],
            &self.population[second],
            self.sequence,
            &mut self.rng,
        );
        for mut child in children {
            child.mutate_within(
                self.params.mutation_probability,
                self.sequence,
                &mut self.rng,
            );
            self.population.push(child);
        }
        sort_by_fitness(&mut self.population);
        self.population.truncate(self.params.population_size);

        self.generation += 1;
        let best = self.best().fitness();
        if best > self.best_fitness {
            self.best_fitness = best;
            self.stalled_for = 0;
        } else {
            self.stalled_for += 1;
        }
        self.stats()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        if self.generation >= self.params.max_generations {
            Some(StopReason::GenerationBudget)
        } else if self
            .params
            .stall_generations
            .is_some_and(|limit| self.stalled_for >= limit)
        {
            Some(StopReason::Stalled)
        } else {
            None
        }
    }

    /// Steps until a stopping rule fires, handing the statistics of every generation to
    /// `on_generation`.
    pub fn run(&mut self, mut on_generation: impl FnMut(&GenerationStats)) -> StopReason {
        loop {
            if let Some(reason) = self.stop_reason() {
                return reason;
            }
            let stats = self.step();
            on_generation(&stats);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::Scenario;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn sequence() -> DiceSequence {
        DiceSequence::generate(Scenario {
            multiplier: 22695477,
            increment: 1,
            seed: 1,
        })
    }

    fn small_params() -> GeneticParams {
        GeneticParams {
            population_size: 12,
            max_generations: 150,
            mutation_probability: 0.2,
            ..GeneticParams::default()
        }
    }

    #[test]
    fn default_params_are_valid() {
        assert_eq!(GeneticParams::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_invalid_params() {
        let params = GeneticParams {
            population_size: 1,
            ..GeneticParams::default()
        };
        assert_eq!(
            params.validate(),
            Err(GeneticError::PopulationTooSmall { min: 2, got: 1 })
        );
        let params = GeneticParams {
            mutation_probability: 1.5,
            ..GeneticParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(GeneticError::NotAProbability {
                name: "mutation probability",
                ..
            })
        ));
        let params = GeneticParams {
            max_generations: 0,
            ..GeneticParams::default()
        };
        assert_eq!(params.validate(), Err(GeneticError::NoGenerations));
        let params = GeneticParams {
            reroll_std_dev: -1.0,
            ..GeneticParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(GeneticError::RerollDistribution(_))
        ));
    }

    #[test]
    fn short_sequence_fails_initialisation() {
        let sequence = DiceSequence::try_from(vec![2; 30]).unwrap();
        let result = GeneticOptimizer::new(
            &sequence,
            small_params(),
            ChaCha12Rng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(GeneticError::Roll(_))));
    }

    #[test]
    fn best_fitness_never_drops_and_population_stays_valid() {
        let sequence = sequence();
        let mut optimizer =
            GeneticOptimizer::new(&sequence, small_params(), ChaCha12Rng::seed_from_u64(9))
                .unwrap();
        let initial_best = optimizer.best().fitness();
        let mut previous = initial_best;
        let reason = optimizer.run(|stats| {
            assert!(stats.best >= previous);
            assert!(stats.best as f64 >= stats.mean && stats.mean >= stats.worst as f64);
            previous = stats.best;
        });
        assert_eq!(reason, StopReason::GenerationBudget);
        assert_eq!(optimizer.generation(), 150);
        assert_eq!(optimizer.population().len(), 12);
        assert!(optimizer.best().fitness() >= initial_best);
        for chromosome in optimizer.population() {
            assert_eq!(chromosome.validate(), Ok(()));
        }
        assert!(
            optimizer
                .population()
                .windows(2)
                .all(|pair| pair[0].fitness() >= pair[1].fitness())
        );
    }

    #[test]
    fn same_seed_same_result() {
        let sequence = sequence();
        let run = |seed| {
            let mut optimizer =
                GeneticOptimizer::new(&sequence, small_params(), ChaCha12Rng::seed_from_u64(seed))
                    .unwrap();
            optimizer.run(|_| {});
            optimizer.into_best()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn stalls_out_before_budget() {
        let sequence = sequence();
        let params = GeneticParams {
            population_size: 4,
            mutation_probability: 0.0,
            max_generations: 100_000,
            stall_generations: Some(5),
            ..GeneticParams::default()
        };
        let mut optimizer =
            GeneticOptimizer::new(&sequence, params, ChaCha12Rng::seed_from_u64(3)).unwrap();
        assert_eq!(optimizer.run(|_| {}), StopReason::Stalled);
        assert!(optimizer.generation() < 100_000);
    }

    #[test]
    fn step_is_resumable() {
        let sequence = sequence();
        let mut optimizer =
            GeneticOptimizer::new(&sequence, small_params(), ChaCha12Rng::seed_from_u64(5))
                .unwrap();
        assert_eq!(optimizer.stop_reason(), None);
        for expected in 1..=3 {
            assert_eq!(optimizer.step().generation, expected);
        }
        assert_eq!(optimizer.stats().generation, 3);
    }
}

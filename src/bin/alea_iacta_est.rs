use anyhow::{Context, Result, bail};
use clap::Parser;
use dice_grid_solvers::chromosome::{Chromosome, FITNESS_ORDER};
use dice_grid_solvers::dice::{DiceSequence, Scenario};
use dice_grid_solvers::genetic::{GeneticOptimizer, GeneticParams};
use dice_grid_solvers::greedy::plan_ceiling;
use dice_grid_solvers::input::parse_scenarios;
use dice_grid_solvers::judge::play_without_rerolls;
use itertools::Itertools;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::io::{self, Read};

/// Reads `A C X` dice generator scenarios from stdin and searches for a high scoring way to
/// play each one.
#[derive(Parser, Debug)]
#[command(name = "alea-iacta-est", version)]
struct Args {
    #[clap(long, default_value_t = 0)]
    seed: u64,
    #[clap(long, default_value_t = GeneticParams::default().population_size)]
    population: usize,
    #[clap(long, default_value_t = GeneticParams::default().mutation_probability)]
    mutation: f64,
    /// Chance of re-rolling at each opportunity while seeding the population
    #[clap(long, default_value_t = GeneticParams::default().reroll_probability)]
    reroll: f64,
    #[clap(long, default_value_t = GeneticParams::default().max_generations)]
    generations: usize,
    /// Stop early after this many generations without improvement
    #[clap(long)]
    stall: Option<usize>,
    /// Print population statistics every N generations (0 disables)
    #[clap(long, default_value_t = 100)]
    log_every: usize,
    #[clap(long, short)]
    quiet: bool,
    /// Solve every scenario up to `0 0 0` instead of only the first
    #[clap(long)]
    all_scenarios: bool,
}

fn solve(scenario: Scenario, params: GeneticParams, args: &Args) -> Result<Chromosome> {
    let trace = !args.quiet;
    let sequence = DiceSequence::generate(scenario);
    if trace {
        eprintln!(
            "scenario A={} C={} X={}",
            scenario.multiplier, scenario.increment, scenario.seed
        );
        let ceiling = plan_ceiling(&sequence);
        eprintln!("greedy windows:\n{ceiling}");
        eprintln!("greedy ceiling: {}", ceiling.ceiling());
        let baseline =
            play_without_rerolls(&sequence).context("could not play the no re-roll game")?;
        eprintln!("no re-roll game: {}", baseline.total_score());
    }

    let rng = ChaCha12Rng::seed_from_u64(args.seed);
    let mut optimizer = GeneticOptimizer::new(&sequence, params, rng)
        .context("could not set up the genetic search")?;
    let reason = optimizer.run(|stats| {
        if trace && args.log_every > 0 && stats.generation % args.log_every == 0 {
            eprintln!(
                "generation {:>6}: best {:>4} mean {:>8.2} worst {:>4}",
                stats.generation, stats.best, stats.mean, stats.worst
            );
        }
    });
    let generations = optimizer.generation();
    let best = optimizer.into_best();

    if trace {
        eprintln!("stopped after {generations} generations ({reason:?})");
        eprintln!("{best}");
        eprintln!(
            "turn lengths: {}",
            best.intervals().iter().map(|interval| interval.len()).join(" ")
        );
        let assignment = best.assign_categories(&sequence);
        for category in FITNESS_ORDER {
            match assignment[category] {
                Some(turn_score) => eprintln!(
                    "{:<20}turn {:>2} [{}] {:>3}",
                    category.to_string(),
                    turn_score.turn + 1,
                    best.turn_roll(turn_score.turn, &sequence),
                    turn_score.score
                ),
                None => eprintln!("{:<20}unassigned", category.to_string()),
            }
        }
    }
    Ok(best)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let params = GeneticParams {
        population_size: args.population,
        mutation_probability: args.mutation,
        reroll_probability: args.reroll,
        max_generations: args.generations,
        stall_generations: args.stall,
        ..GeneticParams::default()
    };
    params.validate().context("invalid search parameters")?;

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read scenarios from stdin")?;
    let scenarios = parse_scenarios(&input).context("malformed scenario list")?;
    if scenarios.is_empty() {
        bail!("no scenario before the 0 0 0 terminator");
    }
    let take = if args.all_scenarios { scenarios.len() } else { 1 };

    for &scenario in &scenarios[..take] {
        let best = solve(scenario, params, &args)?;
        println!("{}", best.fitness());
    }
    Ok(())
}

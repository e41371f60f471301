use anyhow::{Context, Result};
use clap::Parser;
use dice_grid_solvers::grid::Puzzle;
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::time::Instant;

/// Answers "binary", "decimal" or "neither" for every query of a 0/1 grid puzzle.
#[derive(Parser, Debug)]
#[command(name = "ten-kinds-of-people", version)]
struct Args {
    /// Puzzle file; stdin is read when omitted
    path: Option<PathBuf>,
    /// Report parse and solve durations on stderr
    #[clap(long)]
    timing: bool,
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read the puzzle from stdin")?;
            Ok(input)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let start = Instant::now();
    let input = read_input(args.path.as_ref())?;
    let puzzle = Puzzle::parse(&input).context("malformed puzzle")?;
    let parsed = start.elapsed();
    let answers = puzzle.solve();
    let solved = start.elapsed();

    let mut out = BufWriter::new(io::stdout().lock());
    for answer in &answers {
        writeln!(out, "{answer}")?;
    }
    out.flush()?;

    if args.timing {
        eprintln!(
            "{} queries on a {}x{} grid: parse {:?}, solve {:?}",
            answers.len(),
            puzzle.map.rows(),
            puzzle.map.cols(),
            parsed,
            solved - parsed
        );
    }
    Ok(())
}

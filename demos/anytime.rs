//! Runs AD* on every problem of a MovingAI scenario and prints the cost of each published
//! solution, optionally replanning after blocking the middle of the final path.
//!
//! `RUST_LOG=adpath_adstar=debug` shows the episodes of each search.

use std::path::PathBuf;
use std::time::Instant;

use adpath::adstar::{AdStarConfig, Outcome};
use adpath::grid::{movingai, Connectivity, GridGraph};
use adpath::GridPlanner;
use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Options {
    /// MovingAI `.scen` file.
    scen: PathBuf,
    /// Inflation of the first episode.
    #[arg(long, default_value_t = 2.5)]
    initial_epsilon: f64,
    /// Inflation at which improvement stops.
    #[arg(long, default_value_t = 1.0)]
    final_epsilon: f64,
    /// Amount ε is lowered by between episodes.
    #[arg(long, default_value_t = 0.5)]
    epsilon_step: f64,
    /// Expansion budget of a single episode.
    #[arg(long)]
    max_expansions: Option<u64>,
    /// Only allow orthogonal moves.
    #[arg(long)]
    four_connected: bool,
    /// Block the middle cell of each final path and replan.
    #[arg(long)]
    replan: bool,
}

struct Report {
    index: usize,
    optimal: f64,
    costs: Vec<(f64, f64)>,
    replanned: Option<Option<f64>>,
    expansions: u64,
    elapsed_ms: f64,
}

fn main() -> Result<()> {
    let opt = Options::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let scen = movingai::read_scenario(&opt.scen)
        .with_context(|| format!("reading scenario {}", opt.scen.display()))?;
    let map = movingai::read_bitgrid(&scen.map)
        .with_context(|| format!("reading map {}", scen.map.display()))?;
    let connectivity = if opt.four_connected {
        Connectivity::Four
    } else {
        Connectivity::Eight
    };
    let graph = GridGraph::new(map, connectivity);
    let config = AdStarConfig {
        initial_epsilon: opt.initial_epsilon,
        final_epsilon: opt.final_epsilon,
        epsilon_step: opt.epsilon_step,
        max_expansions: opt.max_expansions,
        ..AdStarConfig::default()
    };
    config.validate()?;
    info!(
        map = %scen.map.display(),
        problems = scen.problems.len(),
        "loaded scenario"
    );

    let width = graph.map().width();
    let height = graph.map().height();
    let reports = scen
        .problems
        .par_iter()
        .enumerate()
        .map_init(
            || GridPlanner::new(width, height),
            |planner, (index, problem)| -> Result<Report> {
                let start_time = Instant::now();
                let mut search =
                    planner.search(graph.clone(), problem.start, problem.goal, config.clone())?;
                let mut costs = vec![];
                let best = search
                    .run_anytime(|solution| costs.push((solution.epsilon, solution.cost)))?;

                let mut replanned = None;
                if let Some(best) = best.filter(|_| opt.replan) {
                    let middle = best.states[best.states.len() / 2];
                    if middle != problem.start && middle != problem.goal {
                        let affected = search.graph_mut().set_traversable(middle, false);
                        search.invalidate(affected)?;
                        let mut outcome = search.improve()?;
                        while search.epsilon() > config.final_epsilon {
                            outcome = search.improve()?;
                        }
                        replanned = Some(match outcome {
                            Outcome::Solved(solution) => Some(solution.cost),
                            _ => None,
                        });
                    }
                }

                debug!(index, solutions = costs.len(), "problem finished");
                Ok(Report {
                    index,
                    optimal: problem.optimal,
                    costs,
                    replanned,
                    expansions: search.stats().expansions,
                    elapsed_ms: start_time.elapsed().as_secs_f64() * 1000.0,
                })
            },
        )
        .collect::<Result<Vec<_>>>()?;

    for report in reports {
        let costs: Vec<_> = report
            .costs
            .iter()
            .map(|(epsilon, cost)| format!("{epsilon:.2}:{cost:.3}"))
            .collect();
        print!(
            "{:>5} optimal {:.3} | {} | {} expansions, {:.2} ms",
            report.index,
            report.optimal,
            costs.join(" "),
            report.expansions,
            report.elapsed_ms
        );
        match report.replanned {
            Some(Some(cost)) => println!(" | replanned {cost:.3}"),
            Some(None) => println!(" | replanned: unreachable"),
            None => println!(),
        }
    }

    Ok(())
}

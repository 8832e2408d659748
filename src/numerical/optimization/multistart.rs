//! Independent runs of a driver from many starting points, on rayon's thread pool.
//!
//! Every run owns its driver instance and only shares the objective (`Arc`), so the runs
//! need no synchronization. Logging is switched off inside the runs; the summary is
//! logged once at the end.
use crate::numerical::optimization::grad_desc::grad_desc;
use crate::numerical::optimization::newton_opt::newton_opt;
use crate::numerical::optimization::objective::{DriverResult, Objective, OptimizationResult, Point};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::HashMap;
use strum_macros::Display;
use tabled::{builder::Builder, settings::Style};

#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum OptimizationMethod {
    #[strum(to_string = "gradient descent")]
    GradientDescent { gamma: f64 },
    #[strum(to_string = "Newton")]
    Newton,
}

/// `count` points drawn uniformly from the box `bounds` = [(name, low, high)]
/// # Panics
/// if some low >= high
pub fn random_starts(bounds: &[(String, f64, f64)], count: usize, seed: u64) -> Vec<Point> {
    for (name, low, high) in bounds {
        assert!(
            low < high,
            "bounds of {} must satisfy low < high, got [{}, {}]",
            name,
            low,
            high
        );
    }
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            bounds
                .iter()
                .map(|(name, low, high)| (name.clone(), rng.random_range(*low..*high)))
                .collect()
        })
        .collect()
}

pub fn multistart(
    f: &Objective,
    starts: &[Point],
    method: OptimizationMethod,
    tolerance: f64,
    max_iterations: usize,
) -> Vec<DriverResult<OptimizationResult>> {
    let results: Vec<DriverResult<OptimizationResult>> = starts
        .par_iter()
        .map(|start| match method {
            OptimizationMethod::GradientDescent { gamma } => {
                grad_desc(f.clone(), start.clone(), gamma, tolerance, max_iterations)
            }
            OptimizationMethod::Newton => {
                newton_opt(f.clone(), start.clone(), tolerance, max_iterations)
            }
        })
        .collect();
    log_summary(method, &results);
    results
}

/// converged run with the smallest objective value
pub fn best_of(results: &[DriverResult<OptimizationResult>]) -> Option<&OptimizationResult> {
    results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .filter(|r| r.converged)
        .min_by(|a, b| a.value.total_cmp(&b.value))
}

fn log_summary(method: OptimizationMethod, results: &[DriverResult<OptimizationResult>]) {
    let mut stats: HashMap<String, usize> = HashMap::new();
    stats.insert("number of starts".to_string(), results.len());
    stats.insert(
        "converged".to_string(),
        results.iter().filter(|r| matches!(r, Ok(r) if r.converged)).count(),
    );
    stats.insert(
        "failed".to_string(),
        results.iter().filter(|r| r.is_err()).count(),
    );
    let mut table = Builder::from(stats).build();
    table.with(Style::modern_rounded());
    info!("\n \n MULTISTART ({}) \n \n {}", method, table.to_string());
}

//! # Gradient descent
//!
//! x_{k+1} = x_k - gamma * grad f(x_k), with the gradient taken from the AD node returned
//! by the objective. The loop stops when the length of the step falls to the tolerance or
//! when the iteration limit is reached; the last iterate is returned in both cases, with
//! `converged` telling them apart. A non-finite iterate (the step size is too large and
//! the iteration blew up) is an error.
//!
//! Example#
//! ```
//! use RustedAutoDiff::numerical::optimization::grad_desc::GradDesc;
//! use RustedAutoDiff::numerical::optimization::objective::{objective, point_variable, Point};
//! // f = 2*x1^2 + 5
//! let f = objective(|p: &Point| {
//!     let x1 = point_variable(p, "x1")?;
//!     Ok(2.0 * x1.powf(2.0)? + 5.0)
//! });
//! let mut gd = GradDesc::new();
//! gd.set_problem(f, Point::from([("x1".to_string(), 5.0)]), 0.1);
//! gd.set_solver_params(Some("none".to_string()), None, None);
//! let res = gd.solve().unwrap();
//! assert_eq!(res.iters, 25);
//! assert!(res.point["x1"].abs() < 1e-4);
//! ```
use crate::numerical::optimization::objective::{
    DriverResult, Objective, OptimizationResult, Point, evaluate, sorted_names, to_point,
    to_vector,
};
use crate::Utils::logger::{init_logger, save_trajectory_to_csv};
use log::{error, info, warn};
use nalgebra::DVector;
use std::collections::HashMap;
use std::time::Instant;
use tabled::{builder::Builder, settings::Style};

pub struct GradDesc {
    pub objective: Option<Objective>,
    pub initial_guess: Point,
    pub values: Vec<String>, // variable names, sorted
    pub gamma: f64,          // step size
    pub tolerance: f64,
    pub max_iterations: usize,
    pub loglevel: Option<String>,
    pub log_file: bool,
    pub i: usize,
    pub history: Vec<DVector<f64>>,
    pub history_values: Vec<f64>,
    pub result: Option<OptimizationResult>,
    calc_statistics: HashMap<String, usize>,
}

impl Default for GradDesc {
    fn default() -> Self {
        Self::new()
    }
}

impl GradDesc {
    pub fn new() -> GradDesc {
        GradDesc {
            objective: None,
            initial_guess: HashMap::new(),
            values: Vec::new(),
            gamma: 0.01,
            tolerance: 1e-5,
            max_iterations: 10000,
            loglevel: Some("info".to_string()),
            log_file: false,
            i: 0,
            history: Vec::new(),
            history_values: Vec::new(),
            result: None,
            calc_statistics: HashMap::new(),
        }
    }
    ////////////////////////////SETTERS///////////////////////////////////////////////////
    pub fn set_problem(&mut self, objective: Objective, initial_guess: Point, gamma: f64) {
        assert!(gamma > 0.0, "step size must be positive");
        self.values = sorted_names(&initial_guess);
        self.objective = Some(objective);
        self.initial_guess = initial_guess;
        self.gamma = gamma;
    }

    pub fn set_solver_params(
        &mut self,
        loglevel: Option<String>,
        tolerance: Option<f64>,
        max_iterations: Option<usize>,
    ) {
        if let Some(level) = loglevel {
            assert!(
                ["debug", "info", "warn", "error", "off", "none"].contains(&level.as_str()),
                "loglevel must be debug, info, warn, error, off or none"
            );
            self.loglevel = Some(level);
        }
        if let Some(tolerance) = tolerance {
            assert!(tolerance > 0.0, "tolerance must be positive");
            self.tolerance = tolerance;
        }
        if let Some(max_iterations) = max_iterations {
            self.max_iterations = max_iterations;
        }
    }

    pub fn main_loop(&mut self) -> DriverResult<OptimizationResult> {
        let f = self
            .objective
            .clone()
            .ok_or("objective function is not set, call set_problem first")?;
        let names = self.values.clone();
        let mut x = to_vector(&self.initial_guess, &names);
        self.i = 0;
        self.history = vec![x.clone()];
        self.history_values.clear();
        let mut step_norm = f64::INFINITY;
        while step_norm > self.tolerance && self.i < self.max_iterations {
            let node = evaluate(&f, &x, &names)?;
            self.history_values.push(node.value()[0]);
            let grad = DVector::from_iterator(
                names.len(),
                names.iter().map(|name| node.partial(name)[0]),
            );
            let new_x = &x - self.gamma * grad;
            if new_x.iter().any(|v| !v.is_finite()) {
                error!("iteration {} diverged, step size {} is too large", self.i, self.gamma);
                return Err(format!(
                    "gradient descent diverged at iteration {} (step size {})",
                    self.i, self.gamma
                )
                .into());
            }
            step_norm = (&new_x - &x).norm();
            x = new_x;
            self.i += 1;
            self.history.push(x.clone());
            if self.i % 1000 == 0 {
                info!("iteration = {}, step = {}", self.i, step_norm);
            }
        }
        let value = evaluate(&f, &x, &names)?.value()[0];
        self.history_values.push(value);
        let converged = step_norm <= self.tolerance;
        if !converged {
            warn!("Maximum number of iterations reached, step = {}", step_norm);
        }
        Ok(OptimizationResult {
            point: to_point(&x, &names),
            x,
            iters: self.i,
            value,
            converged,
        })
    }
    ////////////////////////////////////////////////////////////////////////////////////////
    //                    main functions to start the solver and calculate statistics
    ////////////////////////////////////////////////////////////////////////////////////////
    pub fn solver(&mut self) -> DriverResult<OptimizationResult> {
        let begin = Instant::now();
        let res = self.main_loop();
        let end = begin.elapsed();
        info!("Elapsed {} ms", end.as_millis());
        self.calc_statistics
            .insert("time elapsed, ms".to_string(), end.as_millis() as usize);
        self.calc_statistics();
        match &res {
            Ok(r) => {
                info!("local minimum at {:?}, f = {}", r.point, r.value);
                self.result = Some(r.clone());
            }
            Err(e) => error!("gradient descent failed: {}", e),
        }
        res
    }
    /// wrapper around solver function to implement logging
    pub fn solve(&mut self) -> DriverResult<OptimizationResult> {
        if init_logger(&self.loglevel, self.log_file) {
            let res = self.solver();
            info!(" \n \n Program ended");
            res
        } else {
            self.solver()
        }
    }

    pub fn get_result(&self) -> Option<OptimizationResult> {
        self.result.clone()
    }

    /// iterates of the last run and the objective at each of them
    pub fn save_history(&self, filename: &str) -> std::io::Result<()> {
        save_trajectory_to_csv(&self.history, &self.history_values, &self.values, filename)
    }

    fn calc_statistics(&self) {
        let mut stats = self.calc_statistics.clone();
        stats.insert("number of variables".to_string(), self.values.len());
        stats.insert("number of iterations".to_string(), self.i);
        let mut table = Builder::from(stats).build();
        table.with(Style::modern_rounded());
        info!("\n \n CALC STATISTICS \n \n {}", table.to_string());
    }
}

/// one-call gradient descent with logging off
pub fn grad_desc(
    f: Objective,
    point: Point,
    gamma: f64,
    precision: f64,
    max_iters: usize,
) -> DriverResult<OptimizationResult> {
    let mut gd = GradDesc::new();
    gd.set_problem(f, point, gamma);
    gd.set_solver_params(Some("none".to_string()), Some(precision), Some(max_iters));
    gd.solver()
}

//! # Newton optimization
//!
//! Newton steps on the stationarity condition grad f = 0: at every iterate the AD node
//! gives both the gradient and the exact Hessian, and the step s solves H s = -grad f.
//! Stops when |s| falls to the tolerance or at the iteration limit.
//!
//! Example#
//! ```
//! use RustedAutoDiff::numerical::optimization::newton_opt::NewtonOpt;
//! use RustedAutoDiff::numerical::optimization::objective::{objective, point_variable, Point};
//! let f = objective(|p: &Point| {
//!     let x = point_variable(p, "x")?;
//!     let y = point_variable(p, "y")?;
//!     let z1 = (-(&x * &x) - &y * &y).exp()?;
//!     let z2 = (-((&x - 1.0) * (&x - 1.0)) - (&y - 1.0) * (&y - 1.0)).exp()?;
//!     Ok((z1 - z2) * 2.0)
//! });
//! let mut newton = NewtonOpt::new();
//! newton.set_problem(f, Point::from([("x".to_string(), 0.8), ("y".to_string(), 1.4)]));
//! newton.set_solver_params(Some("none".to_string()), None, None, None);
//! let res = newton.solve().unwrap();
//! assert_eq!(res.iters, 5);
//! assert!((res.point["x"] - 1.099839320128867).abs() < 1e-10);
//! ```
use crate::numerical::optimization::objective::{
    DriverResult, Objective, OptimizationResult, Point, evaluate, sorted_names, to_point,
    to_vector,
};
use crate::Utils::logger::{init_logger, save_trajectory_to_csv};
use log::{error, info, warn};
use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;
use std::time::Instant;
use tabled::{builder::Builder, settings::Style};

pub struct NewtonOpt {
    pub objective: Option<Objective>,
    pub initial_guess: Point,
    pub values: Vec<String>, // variable names, sorted
    pub tolerance: f64,
    pub max_iterations: usize,
    pub loglevel: Option<String>,
    pub log_file: bool,
    pub linear_sys_method: Option<String>, // "lu" or "inv"
    pub i: usize,
    pub hessian: DMatrix<f64>, // Hessian at the last iterate
    pub history: Vec<DVector<f64>>,
    pub history_values: Vec<f64>,
    pub result: Option<OptimizationResult>,
    calc_statistics: HashMap<String, usize>,
}

impl Default for NewtonOpt {
    fn default() -> Self {
        Self::new()
    }
}

impl NewtonOpt {
    pub fn new() -> NewtonOpt {
        NewtonOpt {
            objective: None,
            initial_guess: HashMap::new(),
            values: Vec::new(),
            tolerance: 1e-5,
            max_iterations: 10000,
            loglevel: Some("info".to_string()),
            log_file: false,
            linear_sys_method: Some("lu".to_string()),
            i: 0,
            hessian: DMatrix::zeros(0, 0),
            history: Vec::new(),
            history_values: Vec::new(),
            result: None,
            calc_statistics: HashMap::new(),
        }
    }
    ////////////////////////////SETTERS///////////////////////////////////////////////////
    pub fn set_problem(&mut self, objective: Objective, initial_guess: Point) {
        self.values = sorted_names(&initial_guess);
        self.objective = Some(objective);
        self.initial_guess = initial_guess;
    }

    pub fn set_solver_params(
        &mut self,
        loglevel: Option<String>,
        linear_sys_method: Option<String>,
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
        if let Some(method) = linear_sys_method {
            let method = method.to_lowercase();
            assert!(method == "lu" || method == "inv", "linear_sys_method must be lu or inv");
            self.linear_sys_method = Some(method);
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
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let method = self.linear_sys_method.clone().unwrap_or("lu".to_string());
        let mut x = to_vector(&self.initial_guess, &names);
        self.i = 0;
        self.history = vec![x.clone()];
        self.history_values.clear();
        let mut step_norm = f64::INFINITY;
        while step_norm > self.tolerance && self.i < self.max_iterations {
            let node = evaluate(&f, &x, &names)?;
            self.history_values.push(node.value()[0]);
            let grad = node.gradient(&refs)?;
            self.hessian = node.hessian(&refs)?;
            let step = solve_linear_system(&method, &self.hessian, &(-grad))?;
            if step.iter().any(|v| !v.is_finite()) {
                error!("non-finite Newton step at iteration {}", self.i);
                return Err(format!("non-finite Newton step at iteration {}", self.i).into());
            }
            step_norm = step.norm();
            x += step;
            self.i += 1;
            self.history.push(x.clone());
            info!("iteration = {}, step = {}", self.i, step_norm);
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
                info!("stationary point at {:?}, f = {}", r.point, r.value);
                self.result = Some(r.clone());
            }
            Err(e) => error!("Newton optimization failed: {}", e),
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

    pub fn save_history(&self, filename: &str) -> std::io::Result<()> {
        save_trajectory_to_csv(&self.history, &self.history_values, &self.values, filename)
    }

    fn calc_statistics(&self) {
        let mut stats = self.calc_statistics.clone();
        let (r, c) = self.hessian.shape();
        stats.insert("number of hessian elements".to_string(), r * c);
        stats.insert("number of variables".to_string(), self.values.len());
        stats.insert("number of iterations".to_string(), self.i);
        let mut table = Builder::from(stats).build();
        table.with(Style::modern_rounded());
        info!("\n \n CALC STATISTICS \n \n {}", table.to_string());
    }
}

//////////////////////////////////////////////////////////////////////////////////////////////
///                 LINEAR SYSTEM SOLVERS
//////////////////////////////////////////////////////////////////////////////////////////////
pub fn solve_linear_system(
    method: &str,
    A: &DMatrix<f64>,
    b: &DVector<f64>,
) -> DriverResult<DVector<f64>> {
    match method {
        "lu" => A
            .clone()
            .lu()
            .solve(b)
            .ok_or_else(|| "singular Hessian, LU solve failed".into()),
        "inv" => {
            let A_inv = A
                .clone()
                .try_inverse()
                .ok_or("singular Hessian, cannot be inverted")?;
            Ok(A_inv * b)
        }
        _ => Err(format!("unknown linear solver {}", method).into()),
    }
}

/// one-call Newton optimization with logging off
pub fn newton_opt(
    f: Objective,
    init: Point,
    precision: f64,
    max_iters: usize,
) -> DriverResult<OptimizationResult> {
    let mut newton = NewtonOpt::new();
    newton.set_problem(f, init);
    newton.set_solver_params(Some("none".to_string()), None, Some(precision), Some(max_iters));
    newton.solver()
}

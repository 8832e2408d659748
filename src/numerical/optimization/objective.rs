//! Objective functions for the optimization drivers and the result they return.
//!
//! An objective maps a point (variable name -> value) to an AD node. It builds its own
//! independent variables from the point, which is how the drivers get the gradient and
//! the Hessian at every iterate without any symbolic work.
use crate::autodiff::ad_errors::{AdError, AdResult};
use crate::autodiff::ad_variable::Variable;
use nalgebra::DVector;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

pub type Point = HashMap<String, f64>;
pub type Objective = Arc<dyn Fn(&Point) -> AdResult<Variable> + Send + Sync>;
/// driver-level result; Send + Sync so results can come back from the rayon pool
pub type DriverResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

pub fn objective<F>(f: F) -> Objective
where
    F: Fn(&Point) -> AdResult<Variable> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// independent variable `name` at its coordinate in `point`
/// # Example
/// ```
/// use RustedAutoDiff::numerical::optimization::objective::{point_variable, Point};
/// let p = Point::from([("x".to_string(), 2.0)]);
/// let x = point_variable(&p, "x").unwrap();
/// assert_eq!(x.partial("x")[0], 1.0);
/// assert!(point_variable(&p, "y").unwrap_err().is_unknown_variable());
/// ```
pub fn point_variable(point: &Point, name: &str) -> AdResult<Variable> {
    point
        .get(name)
        .map(|v| Variable::new(*v, name))
        .ok_or_else(|| AdError::UnknownVariableError(name.to_string()))
}

/// sorted variable names of a starting point; fixes the coordinate order of the drivers
pub fn sorted_names(point: &Point) -> Vec<String> {
    let mut names: Vec<String> = point.keys().cloned().collect();
    names.sort();
    names
}

pub fn to_vector(point: &Point, names: &[String]) -> DVector<f64> {
    DVector::from_iterator(names.len(), names.iter().map(|n| point[n]))
}

pub fn to_point(x: &DVector<f64>, names: &[String]) -> Point {
    names.iter().cloned().zip(x.iter().cloned()).collect()
}

/// objective evaluated at a single point, checked to be a single value
pub(crate) fn evaluate(f: &Objective, x: &DVector<f64>, names: &[String]) -> AdResult<Variable> {
    let node = f(&to_point(x, names))?;
    node.scalar()?;
    Ok(node)
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// final iterate keyed by variable name
    pub point: Point,
    /// final iterate in sorted-name order
    pub x: DVector<f64>,
    pub iters: usize,
    /// objective at the final iterate
    pub value: f64,
    /// false if the iteration limit was hit before the step fell below the tolerance
    pub converged: bool,
}

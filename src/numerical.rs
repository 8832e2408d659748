//! numerical drivers built on the AD core
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
///  Gradient descent, Newton optimization and multistart
/// Example#1
/// ```
/// use RustedAutoDiff::numerical::optimization::grad_desc::grad_desc;
/// use RustedAutoDiff::numerical::optimization::objective::{objective, point_variable, Point};
/// use RustedAutoDiff::autodiff::ad_functions::sin;
/// // local minimum of 2*x1^2 + sin(x2) closest to (5, 6): x1 = 0, x2 = 3pi/2
/// let f = objective(|p: &Point| {
///     let x1 = point_variable(p, "x1")?;
///     let x2 = point_variable(p, "x2")?;
///     Ok(2.0 * x1.powf(2.0)? + sin(&x2)?)
/// });
/// let start = Point::from([("x1".to_string(), 5.0), ("x2".to_string(), 6.0)]);
/// let res = grad_desc(f, start, 0.1, 1e-5, 10000).unwrap();
/// assert!(res.converged);
/// assert!((res.point["x2"] - 4.71247).abs() < 1e-4);
/// ```
pub mod optimization;

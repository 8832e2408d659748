//! Forward-mode automatic differentiation with exact first and second derivatives
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// ShapeError, DomainError, UnknownVariableError
pub mod ad_errors;
/// merging of sparse partial-derivative maps (missing key = zero)
pub mod partials;
///________________________________________________________________________________________________________________________________
/// # Dual-value node
/// value + gradient + Hessian with respect to named independent variables
/// Example#
/// ```
/// use RustedAutoDiff::autodiff::ad_variable::Variable;
/// use RustedAutoDiff::autodiff::ad_functions::{exp, log};
/// let x1 = Variable::new(1.0, "x1"); // register independent variables by name
/// let x2 = Variable::new(1.0, "x2");
/// let f = exp(&x1).unwrap() * log(&x2).unwrap();
/// // d2f/dx2^2 = -exp(x1)/x2^2
/// assert!((f.partial2("x2", "x2")[0] + std::f64::consts::E).abs() < 1e-12);
/// // only names of registered variables ever show up
/// assert_eq!(f.names(), vec!["x1".to_string(), "x2".to_string()]);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod ad_variable;
/// node-or-constant operand of a binary operation
pub mod ad_operand;
/// + - * / ^ and negation
pub mod ad_ops;
/// exp, log, sin, cos, tan, arcsin, arccos, arctan, sinh, cosh, tanh
pub mod ad_functions;
mod ad_fd_tests;

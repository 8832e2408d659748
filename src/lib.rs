#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
//! Forward-mode automatic differentiation with exact gradients and Hessians, and the
//! numerical drivers built on it: gradient descent, Newton optimization, multistart
//! and a GMRES solve driven by AD Jacobians.
pub mod Utils;
pub mod autodiff;
pub mod numerical;
pub mod somelinalg;

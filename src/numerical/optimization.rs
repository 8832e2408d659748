/// objective type, point conversions and the result of a driver run
pub mod objective;
/// gradient descent driven by AD gradients
pub mod grad_desc;
/// Newton steps with the exact AD Hessian
pub mod newton_opt;
/// many starting points in parallel
pub mod multistart;

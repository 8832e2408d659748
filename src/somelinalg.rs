//! linear algebra on top of the AD core
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// Jacobians of systems of AD nodes, Jacobian-vector products and GMRES (faer_gmres)
pub mod gmres_autodiff;

//! # Dual-Value Node
//!
//! `Variable` is the value object of the forward-mode engine: a vector of values
//! (one per evaluation point) together with its first- and second-order partial
//! derivatives with respect to named independent variables.
//!
//! Nodes are immutable. Every operator and elementary function reads its operands
//! and returns a new node; no node keeps a reference to the nodes it was computed
//! from, so there is no tape and nothing to invalidate.
//!
//! # Example
//! ```
//! use RustedAutoDiff::autodiff::ad_variable::Variable;
//! let x1 = Variable::new(4.0, "x1");
//! let x2 = Variable::new(1.0, "x2");
//! let f = 3.0 * &x1 * &x2 * 3.0;
//! assert_eq!(f.value()[0], 36.0);
//! assert_eq!(f.partial("x1")[0], 9.0);
//! assert_eq!(f.partial("x2")[0], 36.0);
//! let H = f.hessian(&["x1", "x2"]).unwrap();
//! assert_eq!(H[(0, 1)], 9.0);
//! ```
use crate::autodiff::ad_errors::{AdError, AdResult};
use crate::autodiff::partials::{Der, Der2, broadcast, get_or_zero, has_nan, pair_key};
use log::warn;
use nalgebra::{DMatrix, DVector};
use std::fmt;

/// Conversion of user-supplied values into the value vector of a node
pub trait IntoValue {
    fn into_value(self) -> DVector<f64>;
}

impl IntoValue for f64 {
    fn into_value(self) -> DVector<f64> {
        DVector::from_element(1, self)
    }
}

impl IntoValue for Vec<f64> {
    fn into_value(self) -> DVector<f64> {
        DVector::from_vec(self)
    }
}

impl IntoValue for &[f64] {
    fn into_value(self) -> DVector<f64> {
        DVector::from_row_slice(self)
    }
}

impl<const N: usize> IntoValue for [f64; N] {
    fn into_value(self) -> DVector<f64> {
        DVector::from_row_slice(&self)
    }
}

impl IntoValue for DVector<f64> {
    fn into_value(self) -> DVector<f64> {
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    value: DVector<f64>,
    der: Der,
    der2: Der2,
}

impl Variable {
    ////////////////////////////CONSTRUCTORS///////////////////////////////////////////////
    /// Independent variable: der = {name: 1}, der2 = {(name, name): 0}
    /// # Panics
    /// on an empty value, see `try_new`
    pub fn new(value: impl IntoValue, name: &str) -> Variable {
        match Variable::try_new(value, name) {
            Ok(v) => v,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_new(value: impl IntoValue, name: &str) -> AdResult<Variable> {
        let value = value.into_value();
        let n = value.len();
        if n == 0 {
            return Err(AdError::ShapeError(format!(
                "variable {} needs at least one value",
                name
            )));
        }
        let der = Der::from([(name.to_string(), DVector::from_element(n, 1.0))]);
        let der2 = Der2::from([(pair_key(name, name), DVector::zeros(n))]);
        Ok(Variable { value, der, der2 })
    }

    /// constant node: no partial derivatives at all
    /// # Panics
    /// on an empty value, see `try_constant`
    pub fn constant(value: impl IntoValue) -> Variable {
        match Variable::try_constant(value) {
            Ok(v) => v,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_constant(value: impl IntoValue) -> AdResult<Variable> {
        let value = value.into_value();
        if value.is_empty() {
            return Err(AdError::ShapeError(
                "constant needs at least one value".to_string(),
            ));
        }
        Ok(Variable {
            value,
            der: Der::new(),
            der2: Der2::new(),
        })
    }

    /// Derived node from explicitly supplied derivative maps.
    ///
    /// The only validation is that every partial has the length of `value`.
    pub fn from_parts(value: impl IntoValue, der: Der, der2: Der2) -> AdResult<Variable> {
        let value = value.into_value();
        let n = value.len();
        if let Some((name, d)) = der.iter().find(|(_, d)| d.len() != n) {
            return Err(AdError::ShapeError(format!(
                "partial d/d{} has length {}, value has length {}",
                name,
                d.len(),
                n
            )));
        }
        if let Some(((x, y), d)) = der2.iter().find(|(_, d)| d.len() != n) {
            return Err(AdError::ShapeError(format!(
                "partial d2/d{}d{} has length {}, value has length {}",
                x,
                y,
                d.len(),
                n
            )));
        }
        Ok(Variable { value, der, der2 })
    }

    /// used by the operators, which build consistent maps by construction
    pub(crate) fn derived(value: DVector<f64>, der: Der, der2: Der2) -> Variable {
        debug_assert!(der.values().all(|d| d.len() == value.len()));
        debug_assert!(der2.values().all(|d| d.len() == value.len()));
        Variable { value, der, der2 }
    }

    /// surfaces NaN produced by an operation as a domain error instead of passing it on
    pub(crate) fn ensure_defined(self, operation: &str) -> AdResult<Variable> {
        let undefined = has_nan(&self.value)
            || self.der.values().any(has_nan)
            || self.der2.values().any(has_nan);
        if undefined {
            warn!("{} produced an undefined (NaN) result", operation);
            Err(AdError::DomainError(format!(
                "{} is undefined at the evaluation point",
                operation
            )))
        } else {
            Ok(self)
        }
    }

    /// the same node repeated up to n evaluation points (n must be compatible)
    pub(crate) fn broadcast_to(&self, n: usize) -> Variable {
        if self.len() == n {
            return self.clone();
        }
        Variable {
            value: broadcast(&self.value, n),
            der: self.der.iter().map(|(k, d)| (k.clone(), broadcast(d, n))).collect(),
            der2: self.der2.iter().map(|(k, d)| (k.clone(), broadcast(d, n))).collect(),
        }
    }

    ////////////////////////////GETTERS///////////////////////////////////////////////////
    pub fn value(&self) -> &DVector<f64> {
        &self.value
    }
    /// first-order partials (gradient) keyed by variable name
    pub fn der(&self) -> &Der {
        &self.der
    }
    /// second-order partials keyed by (name, name), symmetric
    pub fn der2(&self) -> &Der2 {
        &self.der2
    }
    /// number of evaluation points
    pub fn len(&self) -> usize {
        self.value.len()
    }
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
    pub fn is_constant(&self) -> bool {
        self.der.is_empty()
    }
    /// value at the only evaluation point
    pub fn scalar(&self) -> AdResult<f64> {
        self.single_point()?;
        Ok(self.value[0])
    }
    /// d(value)/d(name), zero if the node does not depend on `name`
    pub fn partial(&self, name: &str) -> DVector<f64> {
        get_or_zero(&self.der, &name.to_string(), self.len())
    }
    /// d2(value)/d(x)d(y), zero if absent
    pub fn partial2(&self, x: &str, y: &str) -> DVector<f64> {
        get_or_zero(&self.der2, &pair_key(x, y), self.len())
    }
    /// sorted names of the independent variables this node depends on
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.der.keys().cloned().collect();
        names.sort();
        names
    }
    pub fn depends_on(&self, name: &str) -> bool {
        self.der.contains_key(name)
    }

    ////////////////////////////MATRIX VIEWS///////////////////////////////////////////////
    fn single_point(&self) -> AdResult<()> {
        if self.len() == 1 {
            Ok(())
        } else {
            Err(AdError::ShapeError(format!(
                "node holds {} evaluation points, pick one with the *_at methods",
                self.len()
            )))
        }
    }

    fn check_names(&self, names: &[&str]) -> AdResult<()> {
        match names.iter().find(|name| !self.der.contains_key(**name)) {
            Some(name) => Err(AdError::UnknownVariableError(name.to_string())),
            None => Ok(()),
        }
    }

    fn check_point(&self, k: usize) -> AdResult<()> {
        if k < self.len() {
            Ok(())
        } else {
            Err(AdError::ShapeError(format!(
                "evaluation point {} requested, node holds {}",
                k,
                self.len()
            )))
        }
    }

    /// Dense Hessian at evaluation point `k` for the given ordering of variables.
    ///
    /// H[(i, j)] = d2f/d(names[i])d(names[j]); a pair missing from the map is zero.
    /// A name the node does not depend on at all is reported as `UnknownVariableError`
    /// rather than silently producing a zero row.
    pub fn hessian_at(&self, names: &[&str], k: usize) -> AdResult<DMatrix<f64>> {
        self.check_names(names)?;
        self.check_point(k)?;
        let n = names.len();
        Ok(DMatrix::from_fn(n, n, |i, j| {
            self.der2
                .get(&pair_key(names[i], names[j]))
                .map(|d| d[k])
                .unwrap_or(0.0)
        }))
    }

    /// Hessian of a single-point node
    pub fn hessian(&self, names: &[&str]) -> AdResult<DMatrix<f64>> {
        self.single_point()?;
        self.hessian_at(names, 0)
    }

    /// one Hessian per evaluation point
    pub fn hessians(&self, names: &[&str]) -> AdResult<Vec<DMatrix<f64>>> {
        (0..self.len()).map(|k| self.hessian_at(names, k)).collect()
    }

    /// gradient at evaluation point `k` in the given ordering of variables
    pub fn gradient_at(&self, names: &[&str], k: usize) -> AdResult<DVector<f64>> {
        self.check_names(names)?;
        self.check_point(k)?;
        Ok(DVector::from_iterator(
            names.len(),
            names.iter().map(|name| self.der[*name][k]),
        ))
    }

    /// gradient of a single-point node
    pub fn gradient(&self, names: &[&str]) -> AdResult<DVector<f64>> {
        self.single_point()?;
        self.gradient_at(names, 0)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let values: Vec<String> = self.value.iter().map(|v| v.to_string()).collect();
        write!(f, "value: [{}], der: {{", values.join(", "))?;
        for (i, name) in self.names().iter().enumerate() {
            let d: Vec<String> = self.der[name].iter().map(|v| v.to_string()).collect();
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: [{}]", name, d.join(", "))?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_independent_variable() {
        let x = Variable::new(3.0, "x");
        assert_eq!(x.value()[0], 3.0);
        assert_eq!(x.der().len(), 1);
        assert_eq!(x.der()["x"], DVector::from_element(1, 1.0));
        assert_eq!(x.der2().len(), 1);
        assert_eq!(x.der2()[&pair_key("x", "x")], DVector::zeros(1));
        assert!(!x.is_constant());
        assert!(x.depends_on("x"));
        assert!(!x.depends_on("y"));
    }

    #[test]
    fn test_vector_valued_variable() {
        let x = Variable::new(vec![1.0, 2.0, 3.0], "x");
        assert_eq!(x.len(), 3);
        assert_eq!(x.der()["x"], DVector::from_element(3, 1.0));
        assert_eq!(x.partial("y"), DVector::zeros(3));
        assert!(x.scalar().unwrap_err().is_shape());
    }

    #[test]
    fn test_empty_value() {
        assert!(Variable::try_new(Vec::<f64>::new(), "x").unwrap_err().is_shape());
        assert!(Variable::try_new([1.0, 2.0], "x").is_ok());
        assert!(Variable::try_constant(Vec::<f64>::new()).unwrap_err().is_shape());
        // an empty operand does not broadcast against a single point either
        let x = Variable::new(1.0, "x");
        assert!(x.try_add(Vec::<f64>::new()).unwrap_err().is_shape());
        assert!(x.try_mul(Vec::<f64>::new()).unwrap_err().is_shape());
    }

    #[test]
    #[should_panic]
    fn test_empty_value_panics() {
        let _ = Variable::new(Vec::<f64>::new(), "x");
    }

    #[test]
    fn test_from_parts_shape_check() {
        let der: Der = HashMap::from([("x".to_string(), DVector::from_element(2, 1.0))]);
        let res = Variable::from_parts([1.0, 2.0, 3.0], der.clone(), Der2::new());
        assert!(res.unwrap_err().is_shape());
        let ok = Variable::from_parts([1.0, 2.0], der, Der2::new()).unwrap();
        assert_eq!(ok.names(), vec!["x".to_string()]);
    }

    #[test]
    fn test_hessian_unknown_variable() {
        let x = Variable::new(1.0, "x");
        let err = x.hessian(&["x", "y"]).unwrap_err();
        assert_eq!(err, AdError::UnknownVariableError("y".to_string()));
        let H = x.hessian(&["x"]).unwrap();
        assert_eq!(H, DMatrix::zeros(1, 1));
    }

    #[test]
    fn test_hessian_multi_point() {
        let x = Variable::new(vec![1.0, 2.0], "x");
        assert!(x.hessian(&["x"]).unwrap_err().is_shape());
        assert_eq!(x.hessians(&["x"]).unwrap().len(), 2);
        assert!(x.hessian_at(&["x"], 2).unwrap_err().is_shape());
        assert_eq!(x.gradient_at(&["x"], 1).unwrap()[0], 1.0);
    }

    #[test]
    fn test_display() {
        let x = Variable::new(2.0, "x");
        assert_eq!(x.to_string(), "value: [2], der: {x: [1]}");
    }
}

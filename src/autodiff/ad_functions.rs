//! # Elementary Functions
//!
//! exp, log, trigonometric, inverse trigonometric and hyperbolic functions of a node.
//! Every function goes through the single-argument chain rule:
//!
//! - value = f(u)
//! - der\[x\] = f'(u) u'_x
//! - der2\[x, y\] = f'(u) u''_xy + f''(u) u'_x u'_y
//!
//! so each function only has to supply f, f' and f''.
//!
//! # Example
//! ```
//! use RustedAutoDiff::autodiff::ad_variable::Variable;
//! use RustedAutoDiff::autodiff::ad_functions::{cos, sin, tan};
//! let x1 = Variable::new(1.0, "x1");
//! let x2 = Variable::new(1.0, "x2");
//! let f = sin(&x1).unwrap() * cos(&x2).unwrap() + tan(&x2).unwrap();
//! let H = f.hessian(&["x1", "x2"]).unwrap();
//! assert!((H[(1, 1)] - 10.215210231562478).abs() < 1e-12);
//! ```
use crate::autodiff::ad_errors::{AdError, AdResult};
use crate::autodiff::ad_variable::Variable;
use crate::autodiff::partials::{map_values, symmetric_pairs};
use log::debug;
use nalgebra::DVector;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ElementaryFunction {
    Exp,
    #[strum(to_string = "log", serialize = "ln")]
    Log,
    Sin,
    Cos,
    #[strum(to_string = "tan", serialize = "tg")]
    Tan,
    Arcsin,
    Arccos,
    #[strum(to_string = "arctan", serialize = "arctg")]
    Arctan,
    Sinh,
    Cosh,
    Tanh,
}

impl ElementaryFunction {
    fn check_domain(&self, u: &DVector<f64>) -> AdResult<()> {
        let violation = match self {
            ElementaryFunction::Log => u
                .iter()
                .find(|v| **v <= 0.0)
                .map(|v| format!("log of non-positive value {}", v)),
            // the derivative (1-u^2)^(-1/2) is unbounded at the endpoints as well
            ElementaryFunction::Arcsin | ElementaryFunction::Arccos => u
                .iter()
                .find(|v| v.abs() >= 1.0)
                .map(|v| format!("{} of {} (derivative defined only on (-1, 1))", self, v)),
            _ => None,
        };
        match violation {
            Some(msg) => {
                debug!("domain violation: {}", msg);
                Err(AdError::DomainError(msg))
            }
            None => Ok(()),
        }
    }

    /// (f(u), f'(u), f''(u))
    pub fn eval(&self, u: f64) -> (f64, f64, f64) {
        match self {
            ElementaryFunction::Exp => {
                let e = u.exp();
                (e, e, e)
            }
            ElementaryFunction::Log => (u.ln(), 1.0 / u, -1.0 / (u * u)),
            ElementaryFunction::Sin => (u.sin(), u.cos(), -u.sin()),
            ElementaryFunction::Cos => (u.cos(), -u.sin(), -u.cos()),
            ElementaryFunction::Tan => {
                let t = u.tan();
                let sec2 = 1.0 + t * t;
                (t, sec2, 2.0 * t * sec2)
            }
            ElementaryFunction::Sinh => (u.sinh(), u.cosh(), u.sinh()),
            ElementaryFunction::Cosh => (u.cosh(), u.sinh(), u.cosh()),
            ElementaryFunction::Tanh => {
                let t = u.tanh();
                let sech2 = 1.0 - t * t;
                (t, sech2, -2.0 * t * sech2)
            }
            ElementaryFunction::Arcsin => {
                let s = 1.0 - u * u;
                (u.asin(), s.powf(-0.5), u * s.powf(-1.5))
            }
            ElementaryFunction::Arccos => {
                let s = 1.0 - u * u;
                (u.acos(), -s.powf(-0.5), -u * s.powf(-1.5))
            }
            ElementaryFunction::Arctan => {
                let s = 1.0 + u * u;
                (u.atan(), 1.0 / s, -2.0 * u / (s * s))
            }
        }
    }

    pub fn apply(&self, u: &Variable) -> AdResult<Variable> {
        self.check_domain(u.value())?;
        let n = u.len();
        let mut f0 = DVector::zeros(n);
        let mut f1 = DVector::zeros(n);
        let mut f2 = DVector::zeros(n);
        for (k, v) in u.value().iter().enumerate() {
            (f0[k], f1[k], f2[k]) = self.eval(*v);
        }
        chain_rule(u, f0, &f1, &f2).ensure_defined(&self.to_string())
    }
}

/// composition of a single-argument function (values f0, f1 = f', f2 = f'' at u) with u
fn chain_rule(u: &Variable, f0: DVector<f64>, f1: &DVector<f64>, f2: &DVector<f64>) -> Variable {
    let der = map_values(u.der(), |d| d.component_mul(f1));
    let der2 = symmetric_pairs(&u.names(), |x, y| {
        f1.component_mul(&u.partial2(x, y))
            + f2.component_mul(&u.partial(x)).component_mul(&u.partial(y))
    });
    Variable::derived(f0, der, der2)
}

impl Variable {
    pub fn exp(&self) -> AdResult<Variable> {
        ElementaryFunction::Exp.apply(self)
    }
    /// natural logarithm
    pub fn ln(&self) -> AdResult<Variable> {
        ElementaryFunction::Log.apply(self)
    }
    pub fn sin(&self) -> AdResult<Variable> {
        ElementaryFunction::Sin.apply(self)
    }
    pub fn cos(&self) -> AdResult<Variable> {
        ElementaryFunction::Cos.apply(self)
    }
    pub fn tan(&self) -> AdResult<Variable> {
        ElementaryFunction::Tan.apply(self)
    }
    pub fn arcsin(&self) -> AdResult<Variable> {
        ElementaryFunction::Arcsin.apply(self)
    }
    pub fn arccos(&self) -> AdResult<Variable> {
        ElementaryFunction::Arccos.apply(self)
    }
    pub fn arctan(&self) -> AdResult<Variable> {
        ElementaryFunction::Arctan.apply(self)
    }
    pub fn sinh(&self) -> AdResult<Variable> {
        ElementaryFunction::Sinh.apply(self)
    }
    pub fn cosh(&self) -> AdResult<Variable> {
        ElementaryFunction::Cosh.apply(self)
    }
    pub fn tanh(&self) -> AdResult<Variable> {
        ElementaryFunction::Tanh.apply(self)
    }
}

pub fn exp(u: &Variable) -> AdResult<Variable> {
    u.exp()
}
pub fn log(u: &Variable) -> AdResult<Variable> {
    u.ln()
}
pub fn sin(u: &Variable) -> AdResult<Variable> {
    u.sin()
}
pub fn cos(u: &Variable) -> AdResult<Variable> {
    u.cos()
}
pub fn tan(u: &Variable) -> AdResult<Variable> {
    u.tan()
}
pub fn arcsin(u: &Variable) -> AdResult<Variable> {
    u.arcsin()
}
pub fn arccos(u: &Variable) -> AdResult<Variable> {
    u.arccos()
}
pub fn arctan(u: &Variable) -> AdResult<Variable> {
    u.arctan()
}
pub fn sinh(u: &Variable) -> AdResult<Variable> {
    u.sinh()
}
pub fn cosh(u: &Variable) -> AdResult<Variable> {
    u.cosh()
}
pub fn tanh(u: &Variable) -> AdResult<Variable> {
    u.tanh()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_names_round_trip() {
        for f in ElementaryFunction::iter() {
            let parsed = ElementaryFunction::from_str(&f.to_string()).unwrap();
            assert_eq!(parsed, f);
        }
        assert_eq!(ElementaryFunction::from_str("ln").unwrap(), ElementaryFunction::Log);
        assert_eq!(ElementaryFunction::from_str("arctg").unwrap(), ElementaryFunction::Arctan);
        assert!(ElementaryFunction::from_str("sec").is_err());
    }

    #[test]
    fn test_domain_checks() {
        let x = Variable::new(-1.0, "x");
        assert!(x.ln().unwrap_err().is_domain());
        assert!(Variable::new(0.0, "x").ln().unwrap_err().is_domain());
        assert!(Variable::new(1.5, "x").arcsin().unwrap_err().is_domain());
        assert!(Variable::new(-1.0, "x").arccos().unwrap_err().is_domain());
        assert!(Variable::new(-1.0, "x").arctan().is_ok());
        // one bad point poisons the whole vector
        assert!(Variable::new(vec![1.0, 2.0, -3.0], "x").ln().unwrap_err().is_domain());
    }
}

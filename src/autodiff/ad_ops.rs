//! # Arithmetic Operators
//!
//! First- and second-order rules for `+ - * / ^` and unary negation, for the three call
//! shapes node∘node, node∘constant and constant∘node. Dispatch happens once, in
//! [`BinaryOp::apply`], by matching on the [`Operand`] variants. A node without partials
//! counts as a constant. Sums promote a constant to a node with empty derivative maps;
//! products, quotients and powers with a constant side have their own rules, which only
//! touch the partials of the node (the general power rule needs ln(base), which does not
//! exist for a negative constant base).
//!
//! Rules, with a', a'' the partials of the operand with respect to x and (x, y):
//! - product: (ab)''_xy = b a''_xy + a b''_xy + a'_x b'_y + a'_y b'_x
//! - quotient: (a/b)''_xy = a''_xy/b - a b''_xy/b^2 + 2a b'_x b'_y/b^3 - (a'_x b'_y + a'_y b'_x)/b^2
//! - power: differentiate exp(b ln a) twice
//!
//! The std::ops operators panic on a shape or domain violation the same way nalgebra
//! operators panic on a dimension mismatch; `try_add`, `try_div`, `pow`, ... return the
//! error instead.
use crate::autodiff::ad_errors::{AdError, AdResult};
use crate::autodiff::ad_operand::Operand;
use crate::autodiff::ad_variable::Variable;
use crate::autodiff::partials::{
    broadcast, common_len, expand_pairs, map_values, pair_key, support, symmetric_pairs,
    zip_union,
};
use log::debug;
use nalgebra::DVector;
use std::ops::{Add, Div, Mul, Neg, Sub};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BinaryOp {
    #[strum(to_string = "addition")]
    Add,
    #[strum(to_string = "subtraction")]
    Sub,
    #[strum(to_string = "multiplication")]
    Mul,
    #[strum(to_string = "division")]
    Div,
    #[strum(to_string = "power")]
    Pow,
}

impl BinaryOp {
    /// Applies the operation, broadcasting a length-1 operand against the other one.
    pub fn apply(self, lhs: Operand, rhs: Operand) -> AdResult<Variable> {
        let n = common_len(lhs.len(), rhs.len()).ok_or_else(|| {
            AdError::ShapeError(format!(
                "{}: operands of lengths {} and {} cannot be broadcast",
                self,
                lhs.len(),
                rhs.len()
            ))
        })?;
        let (lhs, rhs) = (lhs.normalized(), rhs.normalized());
        let result = match self {
            BinaryOp::Add => {
                let (a, b) = promote(lhs, rhs, n);
                add(&a, &b)
            }
            BinaryOp::Sub => {
                let (a, b) = promote(lhs, rhs, n);
                sub(&a, &b)
            }
            BinaryOp::Mul => match (lhs, rhs) {
                (Operand::Node(a), Operand::Constant(c))
                | (Operand::Constant(c), Operand::Node(a)) => {
                    scale(&a.broadcast_to(n), &broadcast(&c, n))
                }
                (lhs, rhs) => {
                    let (a, b) = promote(lhs, rhs, n);
                    mul(&a, &b)
                }
            },
            BinaryOp::Div => match (lhs, rhs) {
                (Operand::Node(a), Operand::Constant(c)) => {
                    let c = broadcast(&c, n);
                    if c.iter().any(|v| *v == 0.0) {
                        return Err(domain_error("division by zero"));
                    }
                    scale(&a.broadcast_to(n), &c.map(|v| 1.0 / v))
                }
                (Operand::Constant(c), Operand::Node(b)) => {
                    reciprocal(&broadcast(&c, n), &b.broadcast_to(n))?
                }
                (lhs, rhs) => {
                    let (a, b) = promote(lhs, rhs, n);
                    div(&a, &b)?
                }
            },
            BinaryOp::Pow => match (lhs, rhs) {
                (Operand::Node(a), Operand::Node(b)) => {
                    pow_nodes(&a.broadcast_to(n), &b.broadcast_to(n))?
                }
                (Operand::Node(a), Operand::Constant(c)) => {
                    pow_const_exponent(&a.broadcast_to(n), &broadcast(&c, n))?
                }
                (Operand::Constant(c), Operand::Node(b)) => {
                    pow_const_base(&broadcast(&c, n), &b.broadcast_to(n))?
                }
                (Operand::Constant(c1), Operand::Constant(c2)) => pow_const_exponent(
                    &Variable::constant(broadcast(&c1, n)),
                    &broadcast(&c2, n),
                )?,
            },
        };
        result.ensure_defined(&self.to_string())
    }
}

fn promote(lhs: Operand, rhs: Operand, n: usize) -> (Variable, Variable) {
    (
        lhs.into_variable().broadcast_to(n),
        rhs.into_variable().broadcast_to(n),
    )
}

fn domain_error(msg: &str) -> AdError {
    debug!("domain violation: {}", msg);
    AdError::DomainError(msg.to_string())
}

/// a'_x b'_y + a'_y b'_x
fn cross_term(a: &Variable, b: &Variable, x: &str, y: &str) -> DVector<f64> {
    a.partial(x).component_mul(&b.partial(y)) + a.partial(y).component_mul(&b.partial(x))
}

fn add(a: &Variable, b: &Variable) -> Variable {
    let n = a.len();
    Variable::derived(
        a.value() + b.value(),
        zip_union(a.der(), b.der(), n, |da, db| da + db),
        zip_union(a.der2(), b.der2(), n, |da, db| da + db),
    )
}

fn sub(a: &Variable, b: &Variable) -> Variable {
    let n = a.len();
    Variable::derived(
        a.value() - b.value(),
        zip_union(a.der(), b.der(), n, |da, db| da - db),
        zip_union(a.der2(), b.der2(), n, |da, db| da - db),
    )
}

fn negate(a: &Variable) -> Variable {
    Variable::derived(
        -a.value(),
        map_values(a.der(), |d| -d),
        map_values(a.der2(), |d| -d),
    )
}

fn mul(a: &Variable, b: &Variable) -> Variable {
    let n = a.len();
    let (av, bv) = (a.value(), b.value());
    let der = zip_union(a.der(), b.der(), n, |da, db| {
        da.component_mul(bv) + db.component_mul(av)
    });
    let names = support(a.der(), b.der());
    let (a2, b2) = expand_pairs(a.der(), b.der(), a.der2(), b.der2(), n);
    let der2 = symmetric_pairs(&names, |x, y| {
        let key = pair_key(x, y);
        a2[&key].component_mul(bv) + b2[&key].component_mul(av) + cross_term(a, b, x, y)
    });
    Variable::derived(av.component_mul(bv), der, der2)
}

/// a * c, c constant: every partial is scaled, the other operand has none
fn scale(a: &Variable, c: &DVector<f64>) -> Variable {
    Variable::derived(
        a.value().component_mul(c),
        map_values(a.der(), |d| d.component_mul(c)),
        map_values(a.der2(), |d| d.component_mul(c)),
    )
}

/// c / b, c constant: (c/b)'_x = -c b'_x/b^2, (c/b)''_xy = c (2 b'_x b'_y/b^3 - b''_xy/b^2)
fn reciprocal(c: &DVector<f64>, b: &Variable) -> AdResult<Variable> {
    let bv = b.value();
    if bv.iter().any(|v| *v == 0.0) {
        return Err(domain_error("division by zero"));
    }
    let inv = bv.map(|v| 1.0 / v);
    let c_inv2 = c.component_mul(&inv).component_mul(&inv);
    let c_inv3 = c_inv2.component_mul(&inv);
    let der = map_values(b.der(), |d| -d.component_mul(&c_inv2));
    let der2 = symmetric_pairs(&b.names(), |x, y| {
        2.0 * c_inv3.component_mul(&b.partial(x)).component_mul(&b.partial(y))
            - c_inv2.component_mul(&b.partial2(x, y))
    });
    Ok(Variable::derived(c.component_mul(&inv), der, der2))
}

fn div(a: &Variable, b: &Variable) -> AdResult<Variable> {
    let n = a.len();
    let (av, bv) = (a.value(), b.value());
    if bv.iter().any(|v| *v == 0.0) {
        return Err(domain_error("division by zero"));
    }
    let inv = bv.map(|v| 1.0 / v);
    let inv2 = inv.component_mul(&inv);
    // a/b^2 and a/b^3
    let a_inv2 = av.component_mul(&inv2);
    let a_inv3 = a_inv2.component_mul(&inv);
    let der = zip_union(a.der(), b.der(), n, |da, db| {
        da.component_mul(&inv) - db.component_mul(&a_inv2)
    });
    let names = support(a.der(), b.der());
    let (a2, b2) = expand_pairs(a.der(), b.der(), a.der2(), b.der2(), n);
    let der2 = symmetric_pairs(&names, |x, y| {
        let key = pair_key(x, y);
        let (bx, by) = (b.partial(x), b.partial(y));
        a2[&key].component_mul(&inv) - b2[&key].component_mul(&a_inv2)
            + 2.0 * a_inv3.component_mul(&bx).component_mul(&by)
            - inv2.component_mul(&cross_term(a, b, x, y))
    });
    Ok(Variable::derived(av.component_mul(&inv), der, der2))
}

/// a^b with both a and b depending on variables
fn pow_nodes(a: &Variable, b: &Variable) -> AdResult<Variable> {
    let n = a.len();
    let (av, bv) = (a.value(), b.value());
    if av.iter().any(|v| *v <= 0.0) {
        return Err(domain_error(
            "power with a variable exponent requires a positive base",
        ));
    }
    let p = av.zip_map(bv, |x, e| x.powf(e));
    let p1 = av.zip_map(bv, |x, e| x.powf(e - 1.0));
    let p2 = av.zip_map(bv, |x, e| x.powf(e - 2.0));
    let ln_a = av.map(f64::ln);
    // coefficients of a'_x, b'_x in the gradient
    let b_p1 = bv.component_mul(&p1);
    let ln_p = ln_a.component_mul(&p);
    // coefficients of a'_x a'_y, (a'_x b'_y + a'_y b'_x), b'_x b'_y in the Hessian
    let c_aa = p2.component_mul(&bv.map(|e| e * e - e));
    let c_ab = &p1 + ln_a.component_mul(&b_p1);
    let c_bb = ln_a.component_mul(&ln_p);
    let der = zip_union(a.der(), b.der(), n, |da, db| {
        da.component_mul(&b_p1) + db.component_mul(&ln_p)
    });
    let names = support(a.der(), b.der());
    let (a2, b2) = expand_pairs(a.der(), b.der(), a.der2(), b.der2(), n);
    let der2 = symmetric_pairs(&names, |x, y| {
        let key = pair_key(x, y);
        let (ax, ay, bx, by) = (a.partial(x), a.partial(y), b.partial(x), b.partial(y));
        a2[&key].component_mul(&b_p1)
            + b2[&key].component_mul(&ln_p)
            + c_aa.component_mul(&ax).component_mul(&ay)
            + c_ab.component_mul(&cross_term(a, b, x, y))
            + c_bb.component_mul(&bx).component_mul(&by)
    });
    Ok(Variable::derived(p, der, der2))
}

/// a^c with a constant exponent c
fn pow_const_exponent(a: &Variable, c: &DVector<f64>) -> AdResult<Variable> {
    let av = a.value();
    for (x, e) in av.iter().zip(c.iter()) {
        if *x == 0.0 && *e < 0.0 {
            return Err(domain_error("0 raised to a negative power"));
        }
        if *x < 0.0 && e.fract() != 0.0 {
            return Err(domain_error("negative base raised to a non-integer power"));
        }
        if *x == 0.0 && *e > 0.0 && *e < 2.0 && *e != 1.0 && !a.is_constant() {
            return Err(domain_error(
                "derivative of a power with exponent in (0, 2) is unbounded at 0",
            ));
        }
    }
    let value = av.zip_map(c, |x, e| x.powf(e));
    // c a^(c-1) and c (c-1) a^(c-2), exactly zero where the factor c or c-1 vanishes
    let g1 = av.zip_map(c, |x, e| if e == 0.0 { 0.0 } else { e * x.powf(e - 1.0) });
    let g2 = av.zip_map(c, |x, e| {
        if e == 0.0 || e == 1.0 {
            0.0
        } else {
            e * (e - 1.0) * x.powf(e - 2.0)
        }
    });
    let der = map_values(a.der(), |d| d.component_mul(&g1));
    let der2 = symmetric_pairs(&a.names(), |x, y| {
        g2.component_mul(&a.partial(x)).component_mul(&a.partial(y))
            + g1.component_mul(&a.partial2(x, y))
    });
    Ok(Variable::derived(value, der, der2))
}

/// c^b with a constant base c
fn pow_const_base(c: &DVector<f64>, b: &Variable) -> AdResult<Variable> {
    if c.iter().any(|v| *v <= 0.0) {
        return Err(domain_error(
            "power with a variable exponent requires a positive base",
        ));
    }
    let p = c.zip_map(b.value(), |base, e| base.powf(e));
    let ln_c = c.map(f64::ln);
    let ln_p = ln_c.component_mul(&p);
    let der = map_values(b.der(), |d| d.component_mul(&ln_p));
    let der2 = symmetric_pairs(&b.names(), |x, y| {
        let bxy = ln_c.component_mul(&b.partial(x)).component_mul(&b.partial(y));
        ln_p.component_mul(&(bxy + b.partial2(x, y)))
    });
    Ok(Variable::derived(p, der, der2))
}

impl Variable {
    pub fn try_add(&self, rhs: impl Into<Operand>) -> AdResult<Variable> {
        BinaryOp::Add.apply(self.into(), rhs.into())
    }
    pub fn try_sub(&self, rhs: impl Into<Operand>) -> AdResult<Variable> {
        BinaryOp::Sub.apply(self.into(), rhs.into())
    }
    pub fn try_mul(&self, rhs: impl Into<Operand>) -> AdResult<Variable> {
        BinaryOp::Mul.apply(self.into(), rhs.into())
    }
    pub fn try_div(&self, rhs: impl Into<Operand>) -> AdResult<Variable> {
        BinaryOp::Div.apply(self.into(), rhs.into())
    }
    /// lhs - self, for a constant (or node) on the left
    pub fn try_rsub(&self, lhs: impl Into<Operand>) -> AdResult<Variable> {
        BinaryOp::Sub.apply(lhs.into(), self.into())
    }
    /// lhs / self, for a constant (or node) on the left
    pub fn try_rdiv(&self, lhs: impl Into<Operand>) -> AdResult<Variable> {
        BinaryOp::Div.apply(lhs.into(), self.into())
    }
    /// self ^ exponent, the exponent being a node or a constant
    pub fn pow(&self, exponent: impl Into<Operand>) -> AdResult<Variable> {
        BinaryOp::Pow.apply(self.into(), exponent.into())
    }
    pub fn powf(&self, exponent: f64) -> AdResult<Variable> {
        self.pow(exponent)
    }
    /// base ^ self
    pub fn rpow(&self, base: impl Into<Operand>) -> AdResult<Variable> {
        BinaryOp::Pow.apply(base.into(), self.into())
    }
    pub fn sqrt(&self) -> AdResult<Variable> {
        self.pow(0.5)
    }
    pub fn negate(&self) -> Variable {
        negate(self)
    }
    /// unary plus: the same value and partials in a new node
    pub fn pos(&self) -> Variable {
        self.clone()
    }
}

/// # Panics
/// on a shape or domain error; use the `try_*` methods to get the error back
fn apply_or_panic(op: BinaryOp, lhs: Operand, rhs: Operand) -> Variable {
    match op.apply(lhs, rhs) {
        Ok(v) => v,
        Err(e) => panic!("{} failed: {}", op, e),
    }
}

macro_rules! impl_binary_operator {
    ($Trait:ident, $method:ident, $op:expr) => {
        impl $Trait<Variable> for Variable {
            type Output = Variable;
            fn $method(self, rhs: Variable) -> Variable {
                apply_or_panic($op, self.into(), rhs.into())
            }
        }
        impl $Trait<&Variable> for Variable {
            type Output = Variable;
            fn $method(self, rhs: &Variable) -> Variable {
                apply_or_panic($op, self.into(), rhs.into())
            }
        }
        impl $Trait<Variable> for &Variable {
            type Output = Variable;
            fn $method(self, rhs: Variable) -> Variable {
                apply_or_panic($op, self.into(), rhs.into())
            }
        }
        impl $Trait<&Variable> for &Variable {
            type Output = Variable;
            fn $method(self, rhs: &Variable) -> Variable {
                apply_or_panic($op, self.into(), rhs.into())
            }
        }
        impl $Trait<f64> for Variable {
            type Output = Variable;
            fn $method(self, rhs: f64) -> Variable {
                apply_or_panic($op, self.into(), rhs.into())
            }
        }
        impl $Trait<f64> for &Variable {
            type Output = Variable;
            fn $method(self, rhs: f64) -> Variable {
                apply_or_panic($op, self.into(), rhs.into())
            }
        }
        impl $Trait<Variable> for f64 {
            type Output = Variable;
            fn $method(self, rhs: Variable) -> Variable {
                apply_or_panic($op, self.into(), rhs.into())
            }
        }
        impl $Trait<&Variable> for f64 {
            type Output = Variable;
            fn $method(self, rhs: &Variable) -> Variable {
                apply_or_panic($op, self.into(), rhs.into())
            }
        }
    };
}

impl_binary_operator!(Add, add, BinaryOp::Add);
impl_binary_operator!(Sub, sub, BinaryOp::Sub);
impl_binary_operator!(Mul, mul, BinaryOp::Mul);
impl_binary_operator!(Div, div, BinaryOp::Div);

impl Neg for Variable {
    type Output = Variable;
    fn neg(self) -> Variable {
        negate(&self)
    }
}

impl Neg for &Variable {
    type Output = Variable;
    fn neg(self) -> Variable {
        negate(self)
    }
}

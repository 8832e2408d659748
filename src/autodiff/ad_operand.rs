use crate::autodiff::ad_variable::{IntoValue, Variable};
use nalgebra::DVector;

/// Right- or left-hand side of a binary operation: a node carrying derivatives,
/// or a plain numeric constant whose derivatives are zero.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Node(Variable),
    Constant(DVector<f64>),
}

impl Operand {
    pub fn constant(value: impl IntoValue) -> Operand {
        Operand::Constant(value.into_value())
    }

    pub fn value(&self) -> &DVector<f64> {
        match self {
            Operand::Node(v) => v.value(),
            Operand::Constant(c) => c,
        }
    }

    pub fn len(&self) -> usize {
        self.value().len()
    }

    pub fn is_empty(&self) -> bool {
        self.value().is_empty()
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Operand::Constant(_))
    }

    /// a node without partials is the constant it holds
    pub fn normalized(self) -> Operand {
        match self {
            Operand::Node(v) if v.is_constant() => Operand::Constant(v.value().clone()),
            other => other,
        }
    }

    /// promotes a constant to a node with empty derivative maps
    pub fn into_variable(self) -> Variable {
        match self {
            Operand::Node(v) => v,
            Operand::Constant(c) => Variable::constant(c),
        }
    }
}

impl From<Variable> for Operand {
    fn from(v: Variable) -> Self {
        Operand::Node(v)
    }
}

impl From<&Variable> for Operand {
    fn from(v: &Variable) -> Self {
        Operand::Node(v.clone())
    }
}

impl From<f64> for Operand {
    fn from(c: f64) -> Self {
        Operand::Constant(DVector::from_element(1, c))
    }
}

impl From<Vec<f64>> for Operand {
    fn from(c: Vec<f64>) -> Self {
        Operand::Constant(DVector::from_vec(c))
    }
}

impl From<DVector<f64>> for Operand {
    fn from(c: DVector<f64>) -> Self {
        Operand::Constant(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_dispatch() {
        let x = Variable::new(2.0, "x");
        let node: Operand = (&x).into();
        let c: Operand = 3.0.into();
        assert!(!node.is_constant());
        assert!(c.is_constant());
        assert_eq!(c.value()[0], 3.0);
        assert_eq!(node.len(), 1);
        let promoted = c.into_variable();
        assert!(promoted.is_constant());
        assert_eq!(promoted.value()[0], 3.0);
        assert_eq!(Operand::from(vec![1.0, 2.0]).len(), 2);
    }

    #[test]
    fn test_normalized() {
        let c: Operand = Variable::constant(2.0).into();
        assert!(!c.is_constant());
        assert_eq!(c.normalized(), Operand::constant(2.0));
        let x: Operand = Variable::new(2.0, "x").into();
        assert!(!x.normalized().is_constant());
    }
}

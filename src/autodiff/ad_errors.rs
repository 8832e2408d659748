use std::fmt;

/// Error types raised by the forward-mode engine
#[derive(Debug, Clone, PartialEq)]
pub enum AdError {
    /// operand value/derivative arrays cannot be broadcast against each other
    ShapeError(String),
    /// a function or operator was evaluated outside of its real-valued domain
    DomainError(String),
    /// the requested name is not an independent variable of the expression
    UnknownVariableError(String),
}

impl fmt::Display for AdError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AdError::ShapeError(msg) => write!(f, "Shape error: {}", msg),
            AdError::DomainError(msg) => write!(f, "Domain error: {}", msg),
            AdError::UnknownVariableError(name) => {
                write!(f, "Unknown variable: '{}' is not part of this expression", name)
            }
        }
    }
}

impl std::error::Error for AdError {}

pub type AdResult<T> = Result<T, AdError>;

impl AdError {
    pub fn is_domain(&self) -> bool {
        matches!(self, AdError::DomainError(_))
    }
    pub fn is_shape(&self) -> bool {
        matches!(self, AdError::ShapeError(_))
    }
    pub fn is_unknown_variable(&self) -> bool {
        matches!(self, AdError::UnknownVariableError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = AdError::DomainError("log of non-positive value".to_string());
        assert_eq!(e.to_string(), "Domain error: log of non-positive value");
        let e = AdError::UnknownVariableError("z".to_string());
        assert!(e.to_string().contains("'z'"));
        assert!(e.is_unknown_variable());
        assert!(!e.is_domain());
    }

    #[test]
    fn test_boxed_error() {
        let boxed: Box<dyn std::error::Error> =
            Box::new(AdError::ShapeError("lengths 2 and 3".to_string()));
        assert_eq!(boxed.to_string(), "Shape error: lengths 2 and 3");
    }
}

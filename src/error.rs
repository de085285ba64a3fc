use thiserror::Error;

/// Errors raised by the planning engine.
///
/// Unreachable goals and plans cut short by a depth bound are not errors;
/// they come back as data from the planner.
#[derive(Error, Debug)]
pub enum GoapError {
    /// An action or goal was invoked on a state that does not satisfy its prerequisites
    #[error("Prerequisites not met for {0}")]
    PrerequisitesUnmet(String),

    /// Action costs must be finite and non-negative
    #[error("Action cost must be non-negative, got {0}")]
    InvalidActionCost(f64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GoapError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_prerequisites_unmet_display() {
        let err = GoapError::PrerequisitesUnmet("Action(work)".to_string());
        assert_eq!(format!("{}", err), "Prerequisites not met for Action(work)");
    }

    #[test]
    fn test_invalid_action_cost_display() {
        let err = GoapError::InvalidActionCost(-1.0);
        assert_eq!(format!("{}", err), "Action cost must be non-negative, got -1");
    }

    #[test]
    fn test_io_error_source() {
        let err: GoapError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert!(matches!(err, GoapError::Io(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_trait() {
        let err = GoapError::PrerequisitesUnmet("x".into());
        let _ = err.source(); // Should be None
    }
}

use thiserror::Error;

// Unified error type for kryda.
//
// Numerical breakdown is deliberately NOT an error: it terminates a solve
// with a `ConvergedReason::DivergedBreakdown` verdict while leaving the
// partially-updated solution available for inspection.

#[derive(Error, Debug)]
pub enum KError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("sequencing error: {0}")]
    Sequencing(&'static str),
    #[error("resource error: {0}")]
    Resource(String),
    #[error("nonconforming sizes: expected {expected}, found {found}")]
    NonconformingSizes { expected: usize, found: usize },
}

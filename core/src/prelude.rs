use crate::candidate::Candidate;

/// Common error type for the classification core.
///
/// An empty candidate batch is not an error: every stage produces a complete,
/// zero-filled result for it.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid candidate #{index}: {reason}")]
    Validation { index: usize, reason: String },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("malformed candidate record at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;

/// A pure transform over one closed batch of candidates.
///
/// Stages hold only their immutable configuration, so executing the same
/// batch twice yields identical output.
pub trait BatchStage {
    type Output;

    fn name(&self) -> &'static str;
    fn execute(&self, candidates: &[Candidate]) -> CoreResult<Self::Output>;
}

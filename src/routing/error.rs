//! Pattern compilation errors.

use thiserror::Error;

/// A route pattern that cannot be compiled.
///
/// Indexes are character offsets into the pattern string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("missing parameter name at {index}")]
    MissingName { index: usize },

    #[error("pattern cannot start with \"?\" at {index}")]
    PatternStartsWithQuestion { index: usize },

    #[error("capturing groups are not allowed at {index}")]
    CapturingGroup { index: usize },

    #[error("unbalanced pattern at {index}")]
    UnbalancedPattern { index: usize },

    #[error("missing pattern at {index}")]
    MissingPattern { index: usize },

    #[error("dangling escape at {index}")]
    DanglingEscape { index: usize },

    #[error("unexpected {found} at {index}, expected {expected}")]
    UnexpectedToken {
        found: &'static str,
        index: usize,
        expected: &'static str,
    },

    #[error("must have text between two parameters, missing text after \"{after}\"")]
    MissingTextBetweenParameters { after: String },

    #[error("can not repeat \"{name}\" without a prefix and suffix")]
    RepeatWithoutAffix { name: String },

    #[error("invalid regular expression {source_pattern:?}: {message}")]
    Regex {
        source_pattern: String,
        message: String,
    },
}

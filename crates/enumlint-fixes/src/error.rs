//! Errors raised while turning a diagnostic into an edit.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixError {
    /// The diagnostic was produced by a different rule.
    #[error("diagnostic '{code}' is not fixable by this provider")]
    NotFixable { code: String },

    #[error("diagnostic has no '{0}' property")]
    MissingProperty(&'static str),

    #[error("diagnostic property '{name}' has malformed value '{value}'")]
    MalformedProperty { name: &'static str, value: String },

    /// The text no longer has the flagged member at the diagnostic offset.
    #[error("no enum member '{member}' at offset {offset}; the document changed")]
    StaleTarget { member: String, offset: u32 },

    #[error("cannot pick a value above {max_value}")]
    ValueOverflow { max_value: i64 },

    /// A text change fell outside the document or had its ends reversed.
    #[error("text change does not fit the document")]
    InvalidEdit,

    #[error("fix-all did not converge after {0} passes")]
    TooManyPasses(u32),
}

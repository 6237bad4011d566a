//! Error types for the oracle, the tree engine and the PGN codec.

/// Failures reported by a [`crate::board::PositionOracle`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The position string could not be decoded
    #[error("invalid position '{fen}': {reason}")]
    InvalidPosition { fen: String, reason: String },

    /// No unique legal move matches the SAN text
    #[error("illegal move '{san}' in position '{fen}'")]
    IllegalMove { san: String, fen: String },
}

/// Errors surfaced by [`crate::engine::TreeEngine`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("illegal move '{san}' in position '{fen}'")]
    IllegalMove { san: String, fen: String },

    #[error("invalid position '{fen}': {reason}")]
    InvalidPosition { fen: String, reason: String },

    /// Handle does not refer to a live node (deleted, or from another game)
    #[error("unknown move node")]
    UnknownNode,

    /// Variation does not start from the cursor's position
    #[error("variation not found at the current position")]
    UnknownVariation,

    /// Comment text a `{...}` comment cannot carry back unchanged
    #[error("comment '{text}' cannot be stored: {reason}")]
    InvalidComment { text: String, reason: String },

    #[error("tag '{key}' cannot be set: {reason}")]
    InvalidTag { key: String, reason: String },
}

impl From<OracleError> for TreeError {
    fn from(e: OracleError) -> Self {
        match e {
            OracleError::InvalidPosition { fen, reason } => TreeError::InvalidPosition { fen, reason },
            OracleError::IllegalMove { san, fen } => TreeError::IllegalMove { san, fen },
        }
    }
}

/// Malformed notation text. Offsets are byte offsets into the parsed text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("unparseable tag pair at offset {offset}: {line}")]
    BadTag { offset: usize, line: String },

    #[error("unbalanced variation parenthesis at offset {offset}")]
    UnbalancedVariation { offset: usize },

    #[error("unterminated comment starting at offset {offset}")]
    UnterminatedComment { offset: usize },

    #[error("unexpected token '{token}' at offset {offset}")]
    UnexpectedToken { offset: usize, token: String },

    #[error("variation at offset {offset} has no moves")]
    EmptyVariation { offset: usize },

    #[error("illegal move '{san}' at offset {offset}")]
    IllegalMove { offset: usize, san: String },

    #[error("invalid FEN tag '{fen}': {reason}")]
    InvalidPosition { fen: String, reason: String },
}

pub type TreeResult<T> = Result<T, TreeError>;
pub type NotationResult<T> = Result<T, NotationError>;

// Generation Errors
//
// Every failure names the block it is about. Generation is all-or-nothing:
// the first error aborts the pass and no text is returned.

/// Errors that abort a generation pass
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Block '{block_id}' has unknown type '{block_type}'")]
    UnknownBlockType { block_id: String, block_type: String },

    #[error("Block '{block_id}' slot '{slot}' references missing block '{missing_id}'")]
    DanglingReference {
        block_id: String,
        slot: String,
        missing_id: String,
    },

    #[error("Root block '{0}' does not exist")]
    MissingRoot(String),

    #[error("Block '{0}' is reached more than once (shared or cyclic connection)")]
    SharedBlock(String),

    #[error("Block '{block_id}' produced identifier '{identifier}' twice")]
    DuplicateIdentifier { block_id: String, identifier: String },

    #[error("Block '{block_id}' in slot '{slot}' of block '{parent_id}' is a statement, expected an expression")]
    ExpectedExpression {
        block_id: String,
        parent_id: String,
        slot: String,
    },

    #[error("Duplicate block id: {0}")]
    DuplicateBlockId(String),
}

impl GenerateError {
    /// The first offending block
    pub fn block_id(&self) -> &str {
        match self {
            GenerateError::UnknownBlockType { block_id, .. }
            | GenerateError::DanglingReference { block_id, .. }
            | GenerateError::DuplicateIdentifier { block_id, .. }
            | GenerateError::ExpectedExpression { block_id, .. } => block_id,
            GenerateError::MissingRoot(id)
            | GenerateError::SharedBlock(id)
            | GenerateError::DuplicateBlockId(id) => id,
        }
    }
}

/// Result type for generation
pub type GenerateResult<T> = Result<T, GenerateError>;

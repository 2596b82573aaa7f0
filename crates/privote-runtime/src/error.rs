//! Error types for privote

use crate::types::Nullifier;
use thiserror::Error;

/// Result type alias for privote operations
pub type Result<T> = std::result::Result<T, VoteError>;

/// Main error type for the voting core
#[derive(Debug, Error)]
pub enum VoteError {
    /// Malformed or missing submission fields
    #[error("Validation error: {0}")]
    Validation(String),

    /// The nullifier has already been consumed by an accepted vote
    #[error("Vote already cast for nullifier {nullifier}")]
    DuplicateVote { nullifier: Nullifier },

    /// The witness does not satisfy the vote statement
    #[error("Proof generation failed: {0}")]
    ProofGeneration(String),

    /// The proof does not verify against the stated public inputs
    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    /// Administrative operation disallowed in the current mode
    #[error("Operation forbidden: {0}")]
    OperationForbidden(String),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by an external signer
    #[error("Signer error: {0}")]
    Signer(String),
}

impl VoteError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn duplicate_vote(nullifier: Nullifier) -> Self {
        Self::DuplicateVote { nullifier }
    }

    pub fn proof_generation(msg: impl Into<String>) -> Self {
        Self::ProofGeneration(msg.into())
    }

    pub fn invalid_proof(msg: impl Into<String>) -> Self {
        Self::InvalidProof(msg.into())
    }

    pub fn operation_forbidden(msg: impl Into<String>) -> Self {
        Self::OperationForbidden(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn signer(msg: impl Into<String>) -> Self {
        Self::Signer(msg.into())
    }

    /// A duplicate vote is an expected outcome, not a fault.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateVote { .. })
    }
}

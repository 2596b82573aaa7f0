//! privote runtime
//!
//! Shared types, error handling, configuration and the oracle interfaces used
//! by every privote component.

pub mod config;
pub mod error;
pub mod oracle;
pub mod types;

// Re-export core types for convenience
pub use config::{LedgerConfig, Mode, ProverConfig};
pub use error::{Result, VoteError};
pub use oracle::{Hasher, ProofOracle, Witness};
pub use types::{
    Commitment, Field, IntoField, LedgerEntry, Nullifier, Proof, Proposal, PublicInputs, Receipt,
    Results, TxHash, VoterSecret,
};

#[cfg(test)]
mod tests {
    use super::*;
    use halo2curves::pasta::Fp;

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = VoterSecret::from(12345u64);
        let debug_str = format!("{:?}", secret);
        assert_eq!(debug_str, "VoterSecret(<redacted>)");
        assert!(!debug_str.contains(&secret.to_hex()));
    }

    #[test]
    fn test_nullifier_debug_trait() {
        let nullifier = Nullifier::new(Fp::from(7));
        let debug_str = format!("{:?}", nullifier);
        assert!(debug_str.starts_with("Nullifier(0x07"));
    }

    #[test]
    fn test_proof_accessors() {
        let public_inputs =
            PublicInputs::new(1, Nullifier::new(Fp::from(2)), Commitment::new(Fp::from(3)));
        let proof = Proof::new(vec![0xaa; 4], public_inputs);

        assert_eq!(proof.size(), 4);
        assert_eq!(proof.as_bytes(), &[0xaa; 4]);
        assert_eq!(proof.to_hex(), "0xaaaaaaaa");
        assert_eq!(proof.public_inputs(), &public_inputs);
        assert_eq!(proof.into_bytes(), vec![0xaa; 4]);
    }

    #[test]
    fn test_mode_default_is_development() {
        assert_eq!(Mode::default(), Mode::Development);
        assert!(!Mode::default().is_production());
    }
}

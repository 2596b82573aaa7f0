//! Interfaces to the cryptographic collaborators
//!
//! The ledger and the voting session only ever talk to a [`Hasher`] and a
//! [`ProofOracle`]. Swapping the hash function or the proving backend does not
//! touch either of them.

use crate::{
    error::Result,
    types::{Commitment, Nullifier, Proof, PublicInputs, VoterSecret},
};
use halo2curves::pasta::Fp;

/// Deterministic one-way function over sequences of field elements.
///
/// Equal sequences (same values, same order) must hash to equal outputs.
pub trait Hasher: Send + Sync {
    fn hash(&self, values: &[Fp]) -> Result<Fp>;
}

/// Private half of the vote statement. Never leaves the voter's client.
#[derive(Debug, Clone)]
pub struct Witness {
    pub vote: u64,
    pub secret: VoterSecret,
}

impl Witness {
    pub fn new(vote: u64, secret: VoterSecret) -> Self {
        Self { vote, secret }
    }
}

/// Proving and verification of the vote statement:
///
/// - `vote` is 0 or 1
/// - `nullifier == hash(secret, proposal_id)`
/// - `commitment == hash(vote, secret)`
///
/// Only the public inputs are ever needed to verify.
pub trait ProofOracle: Send + Sync {
    /// Fails with `ProofGeneration` if the witness does not satisfy the statement.
    fn prove(&self, witness: &Witness, public_inputs: &PublicInputs) -> Result<Proof>;

    fn verify(&self, proof: &Proof, public_inputs: &PublicInputs) -> bool;
}

pub fn nullifier(hasher: &dyn Hasher, secret: &VoterSecret, proposal_id: u64) -> Result<Nullifier> {
    hasher.hash(&[secret.expose(), Fp::from(proposal_id)]).map(Nullifier::new)
}

pub fn commitment(hasher: &dyn Hasher, vote: u64, secret: &VoterSecret) -> Result<Commitment> {
    hasher.hash(&[Fp::from(vote), secret.expose()]).map(Commitment::new)
}

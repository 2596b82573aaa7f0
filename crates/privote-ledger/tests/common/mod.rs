//! Shared fixtures for ledger tests.
#![allow(dead_code)]

use blake2::{digest::consts::U32, Blake2b, Digest};
use privote_circuit::{Halo2Oracle, PoseidonHasher};
use privote_runtime::{
    oracle, Commitment, Nullifier, Proof, ProofOracle, PublicInputs, Result, VoteError,
    VoterSecret, Witness,
};
use std::{
    sync::{Arc, OnceLock},
    thread,
    time::Duration,
};

/// Proof oracle that binds a digest to the public inputs. It checks the same
/// witness relations as the circuit without the cost of proving.
#[derive(Debug, Default)]
pub struct DigestOracle {
    hasher: PoseidonHasher,
    verify_delay: Option<Duration>,
}

impl DigestOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps inside `verify` to widen race windows.
    pub fn with_verify_delay(delay: Duration) -> Self {
        Self { hasher: PoseidonHasher::new(), verify_delay: Some(delay) }
    }

    fn digest(public_inputs: &PublicInputs) -> Vec<u8> {
        let mut hasher = Blake2b::<U32>::new();
        for value in public_inputs.to_strings() {
            hasher.update(value.as_bytes());
        }
        hasher.finalize().to_vec()
    }
}

impl ProofOracle for DigestOracle {
    fn prove(&self, witness: &Witness, public_inputs: &PublicInputs) -> Result<Proof> {
        if witness.vote > 1 {
            return Err(VoteError::proof_generation("vote must be 0 or 1"));
        }
        let proposal_id = public_inputs.proposal_id;
        let nullifier = oracle::nullifier(&self.hasher, &witness.secret, proposal_id)?;
        let commitment = oracle::commitment(&self.hasher, witness.vote, &witness.secret)?;
        if nullifier != public_inputs.nullifier || commitment != public_inputs.commitment {
            return Err(VoteError::proof_generation("witness does not match public inputs"));
        }
        Ok(Proof::new(Self::digest(public_inputs), *public_inputs))
    }

    fn verify(&self, proof: &Proof, public_inputs: &PublicInputs) -> bool {
        if let Some(delay) = self.verify_delay {
            thread::sleep(delay);
        }
        proof.as_bytes() == Self::digest(public_inputs).as_slice()
    }
}

pub fn hasher() -> PoseidonHasher {
    PoseidonHasher::new()
}

/// Public inputs and proof for an honest voter.
pub fn honest_statement(
    oracle: &dyn ProofOracle,
    secret: u64,
    vote: u64,
    proposal_id: u64,
) -> (Nullifier, Commitment, Proof) {
    let hasher = hasher();
    let secret = VoterSecret::from(secret);
    let nullifier = oracle::nullifier(&hasher, &secret, proposal_id).unwrap();
    let commitment = oracle::commitment(&hasher, vote, &secret).unwrap();
    let public_inputs = PublicInputs::new(proposal_id, nullifier, commitment);
    let proof = oracle.prove(&Witness::new(vote, secret), &public_inputs).unwrap();
    (nullifier, commitment, proof)
}

/// Key generation is slow, so every test in a binary shares one oracle.
pub fn halo2_oracle() -> Arc<Halo2Oracle> {
    static ORACLE: OnceLock<Arc<Halo2Oracle>> = OnceLock::new();
    ORACLE.get_or_init(|| Arc::new(Halo2Oracle::in_memory(9).unwrap())).clone()
}

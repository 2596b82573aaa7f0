//! Integration tests for real halo2 proofs of the vote statement

use privote_circuit::{
    keys::{CircuitManifest, ParamsCache},
    Halo2Oracle, PoseidonHasher,
};
use privote_runtime::{
    oracle, Commitment, Nullifier, Proof, ProofOracle, ProverConfig, PublicInputs, VoteError,
    VoterSecret, Witness,
};
use std::{fs, sync::OnceLock};
use tempfile::TempDir;

const K: u32 = 9;

fn shared_oracle() -> &'static Halo2Oracle {
    static ORACLE: OnceLock<Halo2Oracle> = OnceLock::new();
    ORACLE.get_or_init(|| Halo2Oracle::in_memory(K).expect("oracle setup failed"))
}

fn statement(secret: u64, vote: u64, proposal_id: u64) -> (Witness, PublicInputs) {
    let hasher = PoseidonHasher::new();
    let secret = VoterSecret::from(secret);
    let nullifier = oracle::nullifier(&hasher, &secret, proposal_id).unwrap();
    let commitment = oracle::commitment(&hasher, vote, &secret).unwrap();

    (Witness::new(vote, secret), PublicInputs::new(proposal_id, nullifier, commitment))
}

#[test]
fn test_vote_proof_round_trip() {
    let oracle = shared_oracle();
    let (witness, public_inputs) = statement(12345, 1, 1);

    let proof = oracle.prove(&witness, &public_inputs).unwrap();

    assert!(proof.size() > 0);
    assert_eq!(proof.public_inputs(), &public_inputs);
    assert!(oracle.verify(&proof, &public_inputs));
}

#[test]
fn test_altering_any_public_input_fails_verification() {
    let oracle = shared_oracle();
    let (witness, public_inputs) = statement(12345, 0, 1);
    let proof = oracle.prove(&witness, &public_inputs).unwrap();

    let mut wrong_proposal = public_inputs;
    wrong_proposal.proposal_id = 2;
    assert!(!oracle.verify(&proof, &wrong_proposal));

    let (_, other) = statement(999, 0, 1);
    let mut wrong_nullifier = public_inputs;
    wrong_nullifier.nullifier = other.nullifier;
    assert!(!oracle.verify(&proof, &wrong_nullifier));

    let (_, flipped) = statement(12345, 1, 1);
    let mut wrong_commitment = public_inputs;
    wrong_commitment.commitment = flipped.commitment;
    assert!(!oracle.verify(&proof, &wrong_commitment));
}

#[test]
fn test_corrupted_proof_bytes_fail_verification() {
    let oracle = shared_oracle();
    let (witness, public_inputs) = statement(111, 1, 3);
    let proof = oracle.prove(&witness, &public_inputs).unwrap();

    let mut bytes = proof.into_bytes();
    bytes[40] ^= 0x01;
    let corrupted = Proof::new(bytes, public_inputs);
    assert!(!oracle.verify(&corrupted, &public_inputs));

    let truncated = Proof::new(vec![0u8; 16], public_inputs);
    assert!(!oracle.verify(&truncated, &public_inputs));
}

#[test]
fn test_proof_with_trailing_bytes_fails_verification() {
    let oracle = shared_oracle();
    let (witness, public_inputs) = statement(112, 0, 3);
    let proof = oracle.prove(&witness, &public_inputs).unwrap();
    assert!(oracle.verify(&proof, &public_inputs));

    let mut bytes = proof.into_bytes();
    bytes.extend_from_slice(&[0u8; 32]);
    let padded = Proof::new(bytes, public_inputs);
    assert!(!oracle.verify(&padded, &public_inputs));
}

#[test]
fn test_non_boolean_vote_is_rejected_before_proving() {
    let oracle = shared_oracle();
    let (witness, public_inputs) = statement(12345, 2, 1);

    let err = oracle.prove(&witness, &public_inputs).unwrap_err();
    assert!(matches!(err, VoteError::ProofGeneration(_)));
}

#[test]
fn test_nullifier_mismatch_is_rejected() {
    let oracle = shared_oracle();
    let (witness, mut public_inputs) = statement(12345, 1, 1);
    public_inputs.nullifier = Nullifier::new(public_inputs.commitment.as_field());

    let err = oracle.prove(&witness, &public_inputs).unwrap_err();
    assert!(err.to_string().contains("nullifier"));
}

#[test]
fn test_commitment_mismatch_is_rejected() {
    let oracle = shared_oracle();
    let (witness, mut public_inputs) = statement(12345, 1, 1);
    public_inputs.commitment = Commitment::new(public_inputs.nullifier.as_field());

    let err = oracle.prove(&witness, &public_inputs).unwrap_err();
    assert!(err.to_string().contains("commitment"));
}

#[test]
fn test_setup_with_cache_dir() {
    let temp_dir = TempDir::new().unwrap();
    let config = ProverConfig::new(K, temp_dir.path());

    let oracle = Halo2Oracle::setup(&config).unwrap();
    assert_eq!(oracle.k(), K);

    let cache = ParamsCache::open(temp_dir.path()).unwrap();
    assert!(cache.params_path(K).exists());
    let manifest = fs::read_to_string(cache.manifest_path()).unwrap();
    let manifest: CircuitManifest = serde_json::from_str(&manifest).unwrap();
    assert_eq!(manifest, CircuitManifest::vote("private_vote", K));

    // Proofs from an oracle built on the cached params verify with another
    // oracle built on the same params.
    let (witness, public_inputs) = statement(222, 1, 1);
    let proof = oracle.prove(&witness, &public_inputs).unwrap();
    let reloaded = Halo2Oracle::setup(&config).unwrap();
    assert!(reloaded.verify(&proof, &public_inputs));
}

//! privote circuit
//!
//! Poseidon hashing and halo2 proofs for the private vote statement. Provides
//! the [`PoseidonHasher`] and [`Halo2Oracle`] implementations of the runtime's
//! oracle interfaces.

pub mod circuit;
pub mod hash;
pub mod keys;
pub mod prover;

pub use circuit::VoteCircuit;
pub use hash::{poseidon_hash, PoseidonHasher, MAX_HASH_INPUTS};
pub use keys::{CircuitManifest, ParamsCache};
pub use prover::Halo2Oracle;

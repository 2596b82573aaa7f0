//! Poseidon hashing over the Pallas base field
//!
//! Uses the `P128Pow5T3` parameters (width 3, rate 2) from `halo2_gadgets`, the
//! same instance the vote circuit constrains in-circuit. Each input length maps
//! to its own `ConstantLength<L>` domain, so sequences of different lengths are
//! domain-separated by the capacity element.

use halo2_gadgets::poseidon::primitives::{self as poseidon, ConstantLength, P128Pow5T3};
use halo2curves::pasta::Fp;
use privote_runtime::{Hasher, Result, VoteError};

pub const WIDTH: usize = 3;
pub const RATE: usize = 2;

/// Longest sequence accepted by [`PoseidonHasher`].
pub const MAX_HASH_INPUTS: usize = 4;

pub fn poseidon_hash<const L: usize>(message: [Fp; L]) -> Fp {
    poseidon::Hash::<Fp, P128Pow5T3, ConstantLength<L>, WIDTH, RATE>::init().hash(message)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PoseidonHasher;

impl PoseidonHasher {
    pub fn new() -> Self {
        Self
    }
}

impl Hasher for PoseidonHasher {
    fn hash(&self, values: &[Fp]) -> Result<Fp> {
        match *values {
            [a] => Ok(poseidon_hash([a])),
            [a, b] => Ok(poseidon_hash([a, b])),
            [a, b, c] => Ok(poseidon_hash([a, b, c])),
            [a, b, c, d] => Ok(poseidon_hash([a, b, c, d])),
            [] => Err(VoteError::validation("cannot hash an empty sequence")),
            _ => Err(VoteError::validation(format!(
                "cannot hash {} values, at most {} are supported",
                values.len(),
                MAX_HASH_INPUTS
            ))),
        }
    }
}

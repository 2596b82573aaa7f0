//! Vote Circuit
//!
//! Proves knowledge of a voter secret and a boolean vote behind a public
//! nullifier and commitment.
//!
//! ## Circuit Overview
//!
//! Public Inputs (instance column):
//! - row 0: proposal_id
//! - row 1: nullifier = Poseidon(secret, proposal_id)
//! - row 2: commitment = Poseidon(vote, secret)
//!
//! Private Witnesses:
//! - secret: the voter's long-lived secret
//! - vote: the vote value (0 or 1)
//!
//! Constraints:
//! 1. vote is boolean: vote * (1 - vote) == 0
//! 2. nullifier == Poseidon(secret, proposal_id), via the Pow5 chip
//! 3. commitment == Poseidon(vote, secret), via the Pow5 chip
//! 4. the loaded proposal_id equals the public one

use crate::hash::{RATE, WIDTH};
use halo2_gadgets::poseidon::{
    primitives::{ConstantLength, P128Pow5T3},
    Hash, Pow5Chip, Pow5Config,
};
use halo2_proofs::{
    arithmetic::Field,
    circuit::{AssignedCell, Layouter, SimpleFloorPlanner, Value},
    plonk::{Advice, Circuit, Column, ConstraintSystem, Error, Expression, Instance, Selector},
    poly::Rotation,
};
use halo2curves::pasta::Fp;

pub const PROPOSAL_ID_ROW: usize = 0;
pub const NULLIFIER_ROW: usize = 1;
pub const COMMITMENT_ROW: usize = 2;

pub const NUM_PUBLIC_INPUTS: usize = 3;
pub const NUM_PRIVATE_WITNESSES: usize = 2;

#[derive(Clone, Debug)]
pub struct VoteConfig {
    witness: [Column<Advice>; WIDTH],
    instance: Column<Instance>,
    s_vote_boolean: Selector,
    poseidon: Pow5Config<Fp, WIDTH, RATE>,
}

#[derive(Clone, Debug)]
pub struct VoteCircuit {
    pub secret: Value<Fp>,
    pub vote: Value<Fp>,
    pub proposal_id: Value<Fp>,
}

impl Default for VoteCircuit {
    fn default() -> Self {
        Self { secret: Value::unknown(), vote: Value::unknown(), proposal_id: Value::unknown() }
    }
}

impl VoteCircuit {
    /// Builds a circuit from raw values without checking them.
    ///
    /// An out-of-range vote yields a circuit that fails verification, which is
    /// how the constraint tests exercise the boolean gate.
    pub fn new(secret: Fp, vote: u64, proposal_id: u64) -> Self {
        Self {
            secret: Value::known(secret),
            vote: Value::known(Fp::from(vote)),
            proposal_id: Value::known(Fp::from(proposal_id)),
        }
    }

    fn hash_pair(
        config: &VoteConfig,
        mut layouter: impl Layouter<Fp>,
        message: [AssignedCell<Fp, Fp>; 2],
    ) -> Result<AssignedCell<Fp, Fp>, Error> {
        let chip = Pow5Chip::construct(config.poseidon.clone());
        let hasher = Hash::<_, _, P128Pow5T3, ConstantLength<2>, WIDTH, RATE>::init(
            chip,
            layouter.namespace(|| "init"),
        )?;
        hasher.hash(layouter.namespace(|| "hash"), message)
    }
}

impl Circuit<Fp> for VoteCircuit {
    type Config = VoteConfig;
    type FloorPlanner = SimpleFloorPlanner;

    fn without_witnesses(&self) -> Self {
        Self::default()
    }

    fn configure(meta: &mut ConstraintSystem<Fp>) -> Self::Config {
        let state = [meta.advice_column(), meta.advice_column(), meta.advice_column()];
        let partial_sbox = meta.advice_column();
        let rc_a = [meta.fixed_column(), meta.fixed_column(), meta.fixed_column()];
        let rc_b = [meta.fixed_column(), meta.fixed_column(), meta.fixed_column()];
        meta.enable_constant(rc_b[0]);

        let instance = meta.instance_column();
        meta.enable_equality(instance);
        for col in &state {
            meta.enable_equality(*col);
        }

        let s_vote_boolean = meta.selector();

        // Vote boolean gate: vote * (1 - vote) == 0
        meta.create_gate("vote_boolean", |meta| {
            let s = meta.query_selector(s_vote_boolean);
            let vote = meta.query_advice(state[2], Rotation::cur());

            vec![s * vote.clone() * (Expression::Constant(Fp::ONE) - vote)]
        });

        let poseidon = Pow5Chip::configure::<P128Pow5T3>(meta, state, partial_sbox, rc_a, rc_b);

        VoteConfig { witness: state, instance, s_vote_boolean, poseidon }
    }

    fn synthesize(
        &self,
        config: Self::Config,
        mut layouter: impl Layouter<Fp>,
    ) -> Result<(), Error> {
        let (secret, proposal_id, vote) = layouter.assign_region(
            || "load witness",
            |mut region| {
                config.s_vote_boolean.enable(&mut region, 0)?;

                let secret =
                    region.assign_advice(|| "secret", config.witness[0], 0, || self.secret)?;
                let proposal_id = region.assign_advice(
                    || "proposal_id",
                    config.witness[1],
                    0,
                    || self.proposal_id,
                )?;
                let vote = region.assign_advice(|| "vote", config.witness[2], 0, || self.vote)?;

                Ok((secret, proposal_id, vote))
            },
        )?;

        layouter.constrain_instance(proposal_id.cell(), config.instance, PROPOSAL_ID_ROW)?;

        let nullifier = Self::hash_pair(
            &config,
            layouter.namespace(|| "nullifier"),
            [secret.clone(), proposal_id],
        )?;
        layouter.constrain_instance(nullifier.cell(), config.instance, NULLIFIER_ROW)?;

        let commitment =
            Self::hash_pair(&config, layouter.namespace(|| "commitment"), [vote, secret])?;
        layouter.constrain_instance(commitment.cell(), config.instance, COMMITMENT_ROW)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::poseidon_hash;
    use halo2_proofs::dev::MockProver;

    const K: u32 = 9;

    fn public_inputs(secret: Fp, vote: u64, proposal_id: u64) -> Vec<Fp> {
        vec![
            Fp::from(proposal_id),
            poseidon_hash([secret, Fp::from(proposal_id)]),
            poseidon_hash([Fp::from(vote), secret]),
        ]
    }

    #[test]
    fn test_vote_yes_satisfies_circuit() {
        let secret = Fp::from(12345);
        let circuit = VoteCircuit::new(secret, 1, 1);

        let prover = MockProver::run(K, &circuit, vec![public_inputs(secret, 1, 1)]).unwrap();
        assert_eq!(prover.verify(), Ok(()));
    }

    #[test]
    fn test_vote_no_satisfies_circuit() {
        let secret = Fp::from(12345);
        let circuit = VoteCircuit::new(secret, 0, 1);

        let prover = MockProver::run(K, &circuit, vec![public_inputs(secret, 0, 1)]).unwrap();
        assert_eq!(prover.verify(), Ok(()));
    }

    #[test]
    fn test_non_boolean_vote_fails() {
        let secret = Fp::from(12345);
        let circuit = VoteCircuit::new(secret, 2, 1);

        let prover = MockProver::run(K, &circuit, vec![public_inputs(secret, 2, 1)]).unwrap();
        assert!(prover.verify().is_err());
    }

    #[test]
    fn test_wrong_nullifier_fails() {
        let secret = Fp::from(12345);
        let circuit = VoteCircuit::new(secret, 1, 1);

        let mut instance = public_inputs(secret, 1, 1);
        instance[NULLIFIER_ROW] = poseidon_hash([secret, Fp::from(2)]);

        let prover = MockProver::run(K, &circuit, vec![instance]).unwrap();
        assert!(prover.verify().is_err());
    }

    #[test]
    fn test_wrong_commitment_fails() {
        let secret = Fp::from(12345);
        let circuit = VoteCircuit::new(secret, 1, 1);

        let mut instance = public_inputs(secret, 1, 1);
        instance[COMMITMENT_ROW] = poseidon_hash([Fp::from(0), secret]);

        let prover = MockProver::run(K, &circuit, vec![instance]).unwrap();
        assert!(prover.verify().is_err());
    }

    #[test]
    fn test_wrong_proposal_id_fails() {
        let secret = Fp::from(12345);
        let circuit = VoteCircuit::new(secret, 1, 1);

        let mut instance = public_inputs(secret, 1, 1);
        instance[PROPOSAL_ID_ROW] = Fp::from(2);

        let prover = MockProver::run(K, &circuit, vec![instance]).unwrap();
        assert!(prover.verify().is_err());
    }

    #[test]
    fn test_circuit_default() {
        let circuit = VoteCircuit::default();
        let _without_witnesses = circuit.without_witnesses();
        assert_eq!(NUM_PUBLIC_INPUTS, 3);
        assert_eq!(NUM_PRIVATE_WITNESSES, 2);
    }
}

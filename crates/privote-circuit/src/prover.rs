//! Native halo2 backend for the vote statement
//!
//! Proofs are generated natively with the full halo2_proofs library (IPA over
//! the Pasta cycle, Blake2b transcripts). Keys are generated once per oracle
//! and shared by every prove and verify call.

use crate::{
    circuit::VoteCircuit,
    hash::PoseidonHasher,
    keys::{keygen, CircuitManifest, ParamsCache},
};
use anyhow::Result as AnyResult;
use halo2_proofs::{
    plonk::{create_proof, verify_proof, ProvingKey, SingleVerifier, VerifyingKey},
    poly::commitment::Params,
    transcript::{Blake2bRead, Blake2bWrite, Challenge255},
};
use halo2curves::pasta::{EqAffine, Fp};
use privote_runtime::{
    oracle, Proof, ProofOracle, ProverConfig, PublicInputs, Result, VoteError, Witness,
};
use rand::rngs::OsRng;
use std::{fmt, io::Cursor, time::Instant};
use tracing::{debug, info, warn};

pub const CIRCUIT_NAME: &str = "private_vote";

pub struct Halo2Oracle {
    k: u32,
    params: Params<EqAffine>,
    proving_key: ProvingKey<EqAffine>,
    verifying_key: VerifyingKey<EqAffine>,
    hasher: PoseidonHasher,
}

impl fmt::Debug for Halo2Oracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Halo2Oracle").field("k", &self.k).finish_non_exhaustive()
    }
}

impl Halo2Oracle {
    /// Sets up keys using the params cached under `config.cache_dir()`.
    pub fn setup(config: &ProverConfig) -> AnyResult<Self> {
        let k = config.k();
        let cache = ParamsCache::open(config.cache_dir())?;
        let params = cache.load_or_generate(k)?;

        info!(circuit = CIRCUIT_NAME, k, "generating proving and verification keys");
        let (proving_key, verifying_key) = keygen(&params, &VoteCircuit::default())?;
        cache.write_manifest(&CircuitManifest::vote(CIRCUIT_NAME, k))?;

        Ok(Self { k, params, proving_key, verifying_key, hasher: PoseidonHasher })
    }

    /// Sets up fresh params and keys without any disk cache.
    pub fn in_memory(k: u32) -> AnyResult<Self> {
        let params = Params::<EqAffine>::new(k);
        let (proving_key, verifying_key) = keygen(&params, &VoteCircuit::default())?;

        Ok(Self { k, params, proving_key, verifying_key, hasher: PoseidonHasher })
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    /// Checks the statement natively.
    ///
    /// `create_proof` happily produces a proof for an unsatisfied witness, so
    /// rejecting bad witnesses happens here.
    fn check_witness(&self, witness: &Witness, public_inputs: &PublicInputs) -> Result<()> {
        if witness.vote > 1 {
            return Err(VoteError::proof_generation(format!(
                "vote must be 0 or 1, got {}",
                witness.vote
            )));
        }

        let proposal_id = public_inputs.proposal_id;
        let nullifier = oracle::nullifier(&self.hasher, &witness.secret, proposal_id)?;
        if nullifier != public_inputs.nullifier {
            return Err(VoteError::proof_generation(
                "nullifier does not match the secret and proposal",
            ));
        }

        let commitment = oracle::commitment(&self.hasher, witness.vote, &witness.secret)?;
        if commitment != public_inputs.commitment {
            return Err(VoteError::proof_generation(
                "commitment does not match the vote and secret",
            ));
        }

        Ok(())
    }
}

impl ProofOracle for Halo2Oracle {
    fn prove(&self, witness: &Witness, public_inputs: &PublicInputs) -> Result<Proof> {
        self.check_witness(witness, public_inputs)?;

        let circuit =
            VoteCircuit::new(witness.secret.expose(), witness.vote, public_inputs.proposal_id);
        let instance = public_inputs.to_fields();
        let instances: &[&[Fp]] = &[instance.as_slice()];

        let started = Instant::now();
        let mut transcript = Blake2bWrite::<_, EqAffine, Challenge255<_>>::init(vec![]);
        create_proof(
            &self.params,
            &self.proving_key,
            std::slice::from_ref(&circuit),
            &[instances],
            OsRng,
            &mut transcript,
        )
        .map_err(|e| VoteError::proof_generation(format!("Failed to create proof: {:?}", e)))?;
        let proof_bytes = transcript.finalize();

        info!(
            proposal_id = public_inputs.proposal_id,
            size = proof_bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated vote proof"
        );

        Ok(Proof::new(proof_bytes, *public_inputs))
    }

    fn verify(&self, proof: &Proof, public_inputs: &PublicInputs) -> bool {
        let instance = public_inputs.to_fields();
        let instances: &[&[Fp]] = &[instance.as_slice()];

        let proposal_id = public_inputs.proposal_id;
        let strategy = SingleVerifier::new(&self.params);
        let mut reader = Cursor::new(proof.as_bytes());
        let verified = {
            let mut transcript = Blake2bRead::<_, EqAffine, Challenge255<_>>::init(&mut reader);
            verify_proof(&self.params, &self.verifying_key, strategy, &[instances], &mut transcript)
        };

        if let Err(e) = verified {
            warn!(proposal_id, error = ?e, "vote proof rejected");
            return false;
        }

        // A proof is exactly the transcript the verifier consumed.
        let trailing = proof.size() - reader.position() as usize;
        if trailing > 0 {
            warn!(proposal_id, trailing, "vote proof rejected: trailing bytes");
            return false;
        }

        debug!(proposal_id, "vote proof verified");
        true
    }
}

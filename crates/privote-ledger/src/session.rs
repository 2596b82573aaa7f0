//! Voting Session
//!
//! Drives one voter through secret resolution, nullifier and commitment
//! computation, proof generation and submission. Proving happens before the
//! ledger is touched and never holds a ledger lock.

use crate::{
    ledger::{Submission, VoteLedger},
    secrets::SecretStore,
    signer::{self, ContractArtifact, Deployment, Signer},
};
use privote_runtime::{
    oracle, Hasher, Nullifier, ProofOracle, PublicInputs, Receipt, Result, Results, VoteError,
    Witness,
};
use std::{collections::HashSet, fmt, sync::Arc};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastOutcome {
    Accepted(Receipt),
    /// The nullifier was already consumed, possibly by a concurrent session.
    AlreadyVoted { nullifier: Nullifier },
}

impl CastOutcome {
    pub fn receipt(&self) -> Option<&Receipt> {
        match self {
            Self::Accepted(receipt) => Some(receipt),
            Self::AlreadyVoted { .. } => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

pub struct VotingSession {
    ledger: Arc<VoteLedger>,
    hasher: Arc<dyn Hasher>,
    oracle: Arc<dyn ProofOracle>,
    secrets: Box<dyn SecretStore>,
    signer: Option<Arc<dyn Signer>>,
    voted: HashSet<u64>,
}

impl fmt::Debug for VotingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VotingSession")
            .field("ledger", &self.ledger)
            .field("voted", &self.voted)
            .finish_non_exhaustive()
    }
}

impl VotingSession {
    pub fn new(
        ledger: Arc<VoteLedger>,
        hasher: Arc<dyn Hasher>,
        oracle: Arc<dyn ProofOracle>,
        secrets: Box<dyn SecretStore>,
    ) -> Self {
        Self { ledger, hasher, oracle, secrets, signer: None, voted: HashSet::new() }
    }

    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn nullifier_for(&mut self, proposal_id: u64) -> Result<Nullifier> {
        let secret = self.secrets.load_or_create()?;
        oracle::nullifier(self.hasher.as_ref(), &secret, proposal_id)
    }

    /// Casts `vote` on `proposal_id`.
    ///
    /// A consumed nullifier is reported as [`CastOutcome::AlreadyVoted`], not as
    /// an error. Nothing is retried; on any error the ledger is unchanged.
    pub fn cast_vote(&mut self, proposal_id: u64, vote: u64) -> Result<CastOutcome> {
        let secret = self.secrets.load_or_create()?;
        let nullifier = oracle::nullifier(self.hasher.as_ref(), &secret, proposal_id)?;

        if self.ledger.has_voted(&nullifier) {
            debug!(proposal_id, "voter already recorded on the ledger");
            self.voted.insert(proposal_id);
            return Ok(CastOutcome::AlreadyVoted { nullifier });
        }

        let commitment = oracle::commitment(self.hasher.as_ref(), vote, &secret)?;
        let public_inputs = PublicInputs::new(proposal_id, nullifier, commitment);
        let proof = self.oracle.prove(&Witness::new(vote, secret), &public_inputs)?;

        match self.ledger.submit(Submission::new(proposal_id, nullifier, commitment, proof)) {
            Ok(receipt) => {
                info!(proposal_id, tx_hash = %receipt.tx_hash, "vote cast");
                self.voted.insert(proposal_id);
                Ok(CastOutcome::Accepted(receipt))
            }
            Err(VoteError::DuplicateVote { nullifier }) => {
                info!(proposal_id, "lost submission race, vote already cast");
                self.voted.insert(proposal_id);
                Ok(CastOutcome::AlreadyVoted { nullifier })
            }
            Err(e) => Err(e),
        }
    }

    /// Local, non-authoritative record of proposals this session voted on.
    pub fn has_voted_locally(&self, proposal_id: u64) -> bool {
        self.voted.contains(&proposal_id)
    }

    pub fn has_voted(&self, nullifier: &Nullifier) -> bool {
        self.ledger.has_voted(nullifier)
    }

    pub fn results(&self, proposal_id: u64) -> Results {
        self.ledger.results(proposal_id)
    }

    pub fn reset_demo_state(&mut self) -> Result<()> {
        self.ledger.reset()?;
        self.voted.clear();
        Ok(())
    }

    fn signer(&self) -> Result<&dyn Signer> {
        self.signer.as_deref().ok_or_else(|| VoteError::signer("no signer configured"))
    }

    pub fn connect_wallet(&self) -> Result<String> {
        signer::connect(self.signer()?)
    }

    pub fn deploy_contract(
        &self,
        artifact: &ContractArtifact,
        constructor_args: &serde_json::Value,
    ) -> Result<Deployment> {
        signer::deploy(self.signer()?, artifact, constructor_args)
    }
}

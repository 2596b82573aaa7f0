//! Vote Ledger
//!
//! Authoritative store of accepted votes, keyed by nullifier. Each nullifier
//! moves `Unused -> Claimed -> Used`, and `Used` is terminal. A claim is taken
//! under the state lock together with the duplicate check, so two submissions
//! with the same nullifier can never both get past it. Proof verification runs
//! with the lock released; the entry and the tally change together in a single
//! critical section afterwards.
//!
//! Only a recorded entry makes a nullifier a duplicate. A submission that finds
//! its nullifier claimed waits for the claim to resolve: it becomes a duplicate
//! if the holder was accepted, and takes the claim itself otherwise.

use chrono::Utc;
use privote_runtime::{
    Commitment, LedgerConfig, LedgerEntry, Mode, Nullifier, Proof, ProofOracle, PublicInputs,
    Receipt, Result, Results, TxHash, VoteError,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, info, warn};

pub const RESET_FORBIDDEN: &str = "Reset not available in production mode";

/// A vote as it arrives at the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub proposal_id: u64,
    pub nullifier: Nullifier,
    pub commitment: Commitment,
    pub proof: Proof,
}

impl Submission {
    pub fn new(
        proposal_id: u64,
        nullifier: Nullifier,
        commitment: Commitment,
        proof: Proof,
    ) -> Self {
        Self { proposal_id, nullifier, commitment, proof }
    }

    pub fn public_inputs(&self) -> PublicInputs {
        PublicInputs::new(self.proposal_id, self.nullifier, self.commitment)
    }

    fn validate(&self) -> Result<()> {
        if self.proof.as_bytes().is_empty() {
            return Err(VoteError::validation("proof is empty"));
        }
        if self.proof.public_inputs() != &self.public_inputs() {
            return Err(VoteError::validation("proof public inputs do not match the submission"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerStatus {
    pub mode: Mode,
    pub network: String,
    pub entries: usize,
    pub proposals: usize,
}

/// Persistent form of the ledger. Tallies are rebuilt from the entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub entries: Vec<LedgerEntry>,
}

#[derive(Debug, Default)]
struct LedgerState {
    entries: HashMap<Nullifier, LedgerEntry>,
    tallies: BTreeMap<u64, u64>,
    claimed: HashSet<Nullifier>,
}

pub struct VoteLedger {
    config: LedgerConfig,
    oracle: Arc<dyn ProofOracle>,
    state: Mutex<LedgerState>,
    released: Condvar,
}

impl fmt::Debug for VoteLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoteLedger").field("config", &self.config).finish_non_exhaustive()
    }
}

/// Releases a nullifier claim on every exit path of `submit`.
struct Claim<'a> {
    ledger: &'a VoteLedger,
    nullifier: Nullifier,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.ledger.state().claimed.remove(&self.nullifier);
        self.ledger.released.notify_all();
    }
}

impl VoteLedger {
    pub fn new(config: LedgerConfig, oracle: Arc<dyn ProofOracle>) -> Self {
        Self::with_state(config, oracle, LedgerState::default())
    }

    fn with_state(config: LedgerConfig, oracle: Arc<dyn ProofOracle>, state: LedgerState) -> Self {
        Self { config, oracle, state: Mutex::new(state), released: Condvar::new() }
    }

    pub fn from_snapshot(
        config: LedgerConfig,
        oracle: Arc<dyn ProofOracle>,
        snapshot: LedgerSnapshot,
    ) -> Result<Self> {
        let mut state = LedgerState::default();
        for entry in snapshot.entries {
            if state.entries.contains_key(&entry.nullifier) {
                return Err(VoteError::validation(format!(
                    "snapshot contains nullifier {} twice",
                    entry.nullifier
                )));
            }
            *state.tallies.entry(entry.proposal_id).or_insert(0) += 1;
            state.entries.insert(entry.nullifier, entry);
        }

        debug!(entries = state.entries.len(), "restored ledger snapshot");
        Ok(Self::with_state(config, oracle, state))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    // Critical sections never panic, so a poisoned lock still guards a
    // consistent state.
    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks while another submission holds a claim on `nullifier`.
    fn claim(&self, nullifier: Nullifier) -> Result<Claim<'_>> {
        let mut state = self.state();
        while state.claimed.contains(&nullifier) {
            debug!(nullifier = %nullifier, "waiting for in-flight submission");
            state = self.released.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        if state.entries.contains_key(&nullifier) {
            return Err(VoteError::duplicate_vote(nullifier));
        }
        state.claimed.insert(nullifier);
        Ok(Claim { ledger: self, nullifier })
    }

    pub fn submit(&self, submission: Submission) -> Result<Receipt> {
        submission.validate()?;

        let claim = match self.claim(submission.nullifier) {
            Ok(claim) => claim,
            Err(e) => {
                info!(nullifier = %submission.nullifier, "rejected duplicate vote");
                return Err(e);
            }
        };

        let public_inputs = submission.public_inputs();
        if !self.oracle.verify(&submission.proof, &public_inputs) {
            warn!(
                proposal_id = submission.proposal_id,
                nullifier = %submission.nullifier,
                "rejected vote with invalid proof"
            );
            return Err(VoteError::invalid_proof(
                "proof does not verify against the submitted public inputs",
            ));
        }

        let entry = LedgerEntry {
            nullifier: submission.nullifier,
            proposal_id: submission.proposal_id,
            commitment: submission.commitment,
            timestamp: Utc::now(),
        };

        let total = {
            let mut state = self.state();
            state.entries.insert(entry.nullifier, entry.clone());
            let tally = state.tallies.entry(entry.proposal_id).or_insert(0);
            *tally += 1;
            *tally
        };
        drop(claim);

        let receipt = Receipt { tx_hash: TxHash::for_entry(&entry), entry, mode: self.config.mode };
        info!(
            proposal_id = receipt.entry.proposal_id,
            tx_hash = %receipt.tx_hash,
            total,
            "vote recorded"
        );

        Ok(receipt)
    }

    pub fn has_voted(&self, nullifier: &Nullifier) -> bool {
        self.state().entries.contains_key(nullifier)
    }

    /// Current count for a proposal. Unknown proposals count as 0.
    pub fn tally(&self, proposal_id: u64) -> u64 {
        self.state().tallies.get(&proposal_id).copied().unwrap_or(0)
    }

    pub fn results(&self, proposal_id: u64) -> Results {
        Results { proposal_id, total: self.tally(proposal_id) }
    }

    pub fn entry(&self, nullifier: &Nullifier) -> Option<LedgerEntry> {
        self.state().entries.get(nullifier).cloned()
    }

    pub fn status(&self) -> LedgerStatus {
        let state = self.state();
        LedgerStatus {
            mode: self.config.mode,
            network: self.config.network.clone(),
            entries: state.entries.len(),
            proposals: state.tallies.len(),
        }
    }

    /// Entries in acceptance order.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut entries: Vec<LedgerEntry> = self.state().entries.values().cloned().collect();
        entries.sort_by_key(|entry| entry.timestamp);
        LedgerSnapshot { entries }
    }

    /// Clears all entries and tallies. Forbidden in production mode.
    pub fn reset(&self) -> Result<()> {
        if self.config.mode.is_production() {
            warn!("refused ledger reset in production mode");
            return Err(VoteError::operation_forbidden(RESET_FORBIDDEN));
        }

        let mut state = self.state();
        let cleared = state.entries.len();
        state.entries.clear();
        state.tallies.clear();

        info!(cleared, "ledger reset");
        Ok(())
    }
}

//! privote ledger
//!
//! The nullifier ledger that enforces one vote per voter per proposal, and the
//! voting session that drives a voter from secret to accepted vote.
//!
//! # Example
//!
//! ```ignore
//! use privote_circuit::{Halo2Oracle, PoseidonHasher};
//! use privote_ledger::{MemorySecretStore, VoteLedger, VotingSession};
//! use privote_runtime::LedgerConfig;
//! use std::sync::Arc;
//!
//! let oracle = Arc::new(Halo2Oracle::in_memory(9)?);
//! let ledger = Arc::new(VoteLedger::new(LedgerConfig::development(), oracle.clone()));
//! let mut session = VotingSession::new(
//!     ledger.clone(),
//!     Arc::new(PoseidonHasher::new()),
//!     oracle,
//!     Box::new(MemorySecretStore::new()),
//! );
//!
//! let outcome = session.cast_vote(1, 1)?;
//! assert!(outcome.is_accepted());
//! assert_eq!(ledger.tally(1), 1);
//! ```

pub mod ledger;
pub mod secrets;
pub mod session;
pub mod signer;
pub mod wire;

pub use ledger::{LedgerSnapshot, LedgerStatus, Submission, VoteLedger, RESET_FORBIDDEN};
pub use secrets::{FileSecretStore, MemorySecretStore, SecretStore};
pub use session::{CastOutcome, VotingSession};
pub use signer::{ContractArtifact, Deployment, Signer};
pub use wire::{ApiResponse, SubmitRequest};

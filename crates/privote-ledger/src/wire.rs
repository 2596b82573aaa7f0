//! JSON wire shapes for an HTTP boundary
//!
//! ```text
//! Request:  { proposal_id, nullifier: hex64, commitment: hex64,
//!             proof: { proof: hex, publicInputs: [string] } }
//! 200: { success: true, txHash: hex64, mode: "demo"|"production" }
//! 409: { error: "Vote already cast" }
//! 400: { error: "Missing required fields" | "Invalid proposal ID" }
//! ```

use crate::ledger::{LedgerStatus, Submission, VoteLedger};
use chrono::{DateTime, Utc};
use privote_runtime::{
    Commitment, Mode, Nullifier, Proof, PublicInputs, Receipt, Result, Results, VoteError,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const MISSING_FIELDS: &str = "Missing required fields";
pub const INVALID_PROPOSAL_ID: &str = "Invalid proposal ID";
pub const VOTE_ALREADY_CAST: &str = "Vote already cast";
pub const REQUIRED_FIELDS: [&str; 4] = ["proposal_id", "nullifier", "commitment", "proof"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofPayload {
    pub proof: String,
    pub public_inputs: Vec<String>,
}

impl From<&Proof> for ProofPayload {
    fn from(proof: &Proof) -> Self {
        Self { proof: proof.to_hex(), public_inputs: proof.public_inputs().to_strings() }
    }
}

/// Vote submission body. Every field is optional so that missing fields are
/// reported as a validation error rather than a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub proposal_id: Option<Value>,
    pub nullifier: Option<String>,
    pub commitment: Option<String>,
    pub proof: Option<ProofPayload>,
}

impl SubmitRequest {
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| VoteError::serialization(e.to_string()))
    }

    pub fn from_submission(submission: &Submission) -> Self {
        Self {
            proposal_id: Some(Value::from(submission.proposal_id)),
            nullifier: Some(submission.nullifier.to_hex()),
            commitment: Some(submission.commitment.to_hex()),
            proof: Some(ProofPayload::from(&submission.proof)),
        }
    }

    pub fn into_submission(self) -> Result<Submission> {
        let (Some(proposal_id), Some(nullifier), Some(commitment), Some(proof)) =
            (self.proposal_id, self.nullifier, self.commitment, self.proof)
        else {
            return Err(VoteError::validation(MISSING_FIELDS));
        };
        if proposal_id.is_null()
            || nullifier.is_empty()
            || commitment.is_empty()
            || proof.proof.is_empty()
        {
            return Err(VoteError::validation(MISSING_FIELDS));
        }

        let proposal_id =
            proposal_id.as_u64().ok_or_else(|| VoteError::validation(INVALID_PROPOSAL_ID))?;
        let nullifier = Nullifier::from_hex(&nullifier)?;
        let commitment = Commitment::from_hex(&commitment)?;

        let public_inputs = PublicInputs::from_strings(&proof.public_inputs)?;
        if public_inputs.proposal_id != proposal_id {
            return Err(VoteError::validation(INVALID_PROPOSAL_ID));
        }

        let digits = proof.proof.strip_prefix("0x").unwrap_or(&proof.proof);
        let proof_bytes = hex::decode(digits)
            .map_err(|e| VoteError::validation(format!("invalid proof hex: {}", e)))?;

        let proof = Proof::new(proof_bytes, public_inputs);
        Ok(Submission::new(proposal_id, nullifier, commitment, proof))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSuccess {
    pub success: bool,
    pub tx_hash: String,
    pub mode: String,
    pub message: String,
}

impl From<&Receipt> for SubmitSuccess {
    fn from(receipt: &Receipt) -> Self {
        let message = match receipt.mode {
            Mode::Development => "Vote recorded in demo mode",
            Mode::Production => "Vote recorded",
        };
        Self {
            success: true,
            tx_hash: receipt.tx_hash.to_hex(),
            mode: receipt.mode.wire_label().to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>, message: Option<String>) -> Self {
        Self { error: error.into(), message }
    }
}

/// Status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok<T: Serialize>(body: &T) -> Self {
        let body = serde_json::to_value(body).unwrap_or_else(|e| json!({ "error": e.to_string() }));
        Self { status: 200, body }
    }

    pub fn from_result(result: &Result<Receipt>) -> Self {
        match result {
            Ok(receipt) => Self::ok(&SubmitSuccess::from(receipt)),
            Err(e) => Self::from_error(e),
        }
    }

    pub fn from_error(error: &VoteError) -> Self {
        let (status, body) = match error {
            VoteError::Validation(msg) if msg == MISSING_FIELDS => (
                400,
                json!({ "error": MISSING_FIELDS, "required": REQUIRED_FIELDS }),
            ),
            VoteError::Validation(msg) => (400, json!(ErrorBody::new(msg.clone(), None))),
            VoteError::Serialization(msg) => {
                (400, json!(ErrorBody::new("Malformed request body", Some(msg.clone()))))
            }
            VoteError::DuplicateVote { .. } => (
                409,
                json!(ErrorBody::new(
                    VOTE_ALREADY_CAST,
                    Some("This nullifier has already been used".to_string())
                )),
            ),
            VoteError::InvalidProof(msg) => {
                (400, json!(ErrorBody::new("Invalid proof", Some(msg.clone()))))
            }
            VoteError::ProofGeneration(msg) => {
                (400, json!(ErrorBody::new("Proof generation failed", Some(msg.clone()))))
            }
            VoteError::OperationForbidden(msg) => (403, json!(ErrorBody::new(msg.clone(), None))),
            other => (
                500,
                json!(ErrorBody::new("Internal server error", Some(other.to_string()))),
            ),
        };
        Self { status, body }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsResponse {
    pub proposal_id: u64,
    pub total: u64,
    pub mode: String,
}

impl ResultsResponse {
    pub fn new(results: Results, mode: Mode) -> Self {
        Self {
            proposal_id: results.proposal_id,
            total: results.total,
            mode: mode.wire_label().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HasVotedResponse {
    pub has_voted: bool,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub mode: String,
    pub network: String,
    pub entries: usize,
    pub timestamp: DateTime<Utc>,
}

impl From<LedgerStatus> for HealthResponse {
    fn from(status: LedgerStatus) -> Self {
        Self {
            status: "ok",
            mode: status.mode.wire_label().to_string(),
            network: status.network,
            entries: status.entries,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalInfo {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub end_date: String,
    pub total_votes: u64,
}

/// The demo proposal listing with live totals from `ledger`.
pub fn demo_proposals(ledger: &VoteLedger) -> Vec<ProposalInfo> {
    vec![ProposalInfo {
        id: 1,
        title: "Should we increase the community fund allocation by 20%?".to_string(),
        description: "This proposal suggests increasing the community fund from 100,000 tokens \
                      to 120,000 tokens to support more community initiatives and grants."
            .to_string(),
        status: "active".to_string(),
        end_date: "2025-12-31".to_string(),
        total_votes: ledger.tally(1),
    }]
}

/// Handles a raw submission body end to end.
pub fn handle_submit(ledger: &VoteLedger, body: &str) -> ApiResponse {
    let result = SubmitRequest::from_json(body)
        .and_then(SubmitRequest::into_submission)
        .and_then(|submission| ledger.submit(submission));
    ApiResponse::from_result(&result)
}

pub fn handle_results(ledger: &VoteLedger, proposal_id: &str) -> ApiResponse {
    match proposal_id.parse::<u64>() {
        Ok(id) => ApiResponse::ok(&ResultsResponse::new(ledger.results(id), ledger.mode())),
        Err(_) => ApiResponse::from_error(&VoteError::validation(INVALID_PROPOSAL_ID)),
    }
}

pub fn handle_has_voted(ledger: &VoteLedger, nullifier: &str) -> ApiResponse {
    if nullifier.is_empty() {
        return ApiResponse::from_error(&VoteError::validation("Nullifier required"));
    }
    match Nullifier::from_hex(nullifier) {
        Ok(nullifier) => ApiResponse::ok(&HasVotedResponse {
            has_voted: ledger.has_voted(&nullifier),
            mode: ledger.mode().wire_label().to_string(),
        }),
        Err(e) => ApiResponse::from_error(&e),
    }
}

pub fn handle_reset(ledger: &VoteLedger) -> ApiResponse {
    match ledger.reset() {
        Ok(()) => ApiResponse::ok(&json!({
            "success": true,
            "message": "Demo data reset successfully"
        })),
        Err(e) => ApiResponse::from_error(&e),
    }
}

//! External signer capability
//!
//! Wallet connection and contract deployment belong to an external signer
//! (a browser wallet, a node's RPC). The voting core only sees this interface.

use privote_runtime::{Result, VoteError};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Compiled verifier contract handed to the signer for deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractArtifact {
    pub bytecode: String,
    pub abi: serde_json::Value,
}

impl ContractArtifact {
    pub fn new(bytecode: impl Into<String>, abi: serde_json::Value) -> Self {
        Self { bytecode: bytecode.into(), abi }
    }

    fn validate(&self) -> Result<()> {
        let digits = self
            .bytecode
            .strip_prefix("0x")
            .ok_or_else(|| VoteError::validation("bytecode must be 0x-prefixed hex"))?;
        if digits.is_empty() {
            return Err(VoteError::validation("bytecode is empty"));
        }
        hex::decode(digits).map_err(|e| VoteError::validation(format!("invalid bytecode: {}", e)))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub tx_hash: String,
    pub address: Option<String>,
}

pub trait Signer: Send + Sync {
    fn request_accounts(&self) -> Result<Vec<String>>;

    fn deploy_contract(
        &self,
        artifact: &ContractArtifact,
        constructor_args: &serde_json::Value,
    ) -> Result<Deployment>;
}

/// Returns the signer's first account.
pub fn connect(signer: &dyn Signer) -> Result<String> {
    let account = signer
        .request_accounts()?
        .into_iter()
        .next()
        .ok_or_else(|| VoteError::signer("No accounts found"))?;

    info!(account = %account, "signer connected");
    Ok(account)
}

/// Deploys `artifact` through `signer` after connecting to it.
pub fn deploy(
    signer: &dyn Signer,
    artifact: &ContractArtifact,
    constructor_args: &serde_json::Value,
) -> Result<Deployment> {
    artifact.validate()?;
    let account = connect(signer)?;

    let deployment = signer.deploy_contract(artifact, constructor_args)?;
    info!(account = %account, tx_hash = %deployment.tx_hash, "contract deployment submitted");
    Ok(deployment)
}

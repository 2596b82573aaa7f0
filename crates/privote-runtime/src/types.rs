//! Core types for privote
//!
//! Field elements are Pallas base field elements. On the wire every field value
//! is `hex64`: `0x` followed by the 64 hex characters of its 32-byte
//! little-endian representation.

use crate::{
    config::Mode,
    error::{Result, VoteError},
};
use blake2::{digest::consts::U32, Blake2b, Blake2b512, Digest};
use chrono::{DateTime, Utc};
use ff::{Field as _, FromUniformBytes, PrimeField};
use halo2curves::pasta::Fp;
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt,
    hash::{Hash, Hasher as StdHasher},
};

pub type Field = Fp;

type Blake2b256 = Blake2b<U32>;

const BYTES_DOMAIN: &[u8] = b"privote:bytes-to-field";
const TX_DOMAIN: &[u8] = b"privote:tx";

pub fn field_to_hex(value: &Fp) -> String {
    format!("0x{}", hex::encode(value.to_repr()))
}

pub fn field_from_hex(s: &str) -> Result<Fp> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| VoteError::validation(format!("expected 0x-prefixed hex, got {:?}", s)))?;
    if digits.len() != 64 {
        return Err(VoteError::validation(format!(
            "expected 64 hex characters, got {}",
            digits.len()
        )));
    }

    let bytes =
        hex::decode(digits).map_err(|e| VoteError::validation(format!("invalid hex: {}", e)))?;
    let mut repr = <Fp as PrimeField>::Repr::default();
    repr.as_mut().copy_from_slice(&bytes);

    Option::from(Fp::from_repr(repr))
        .ok_or_else(|| VoteError::validation("non-canonical field encoding"))
}

/// Maps an arbitrary byte string to a field element.
///
/// The bytes are expanded with BLAKE2b-512 under a fixed domain prefix and the
/// 64-byte digest is reduced modulo p, so the result is close to uniform.
pub fn field_from_bytes(bytes: &[u8]) -> Fp {
    let digest = Blake2b512::new().chain_update(BYTES_DOMAIN).chain_update(bytes).finalize();
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&digest);
    Fp::from_uniform_bytes(&wide)
}

/// Values that have a canonical field encoding.
pub trait IntoField {
    fn into_field(self) -> Fp;
}

impl IntoField for Fp {
    fn into_field(self) -> Fp {
        self
    }
}

impl IntoField for u64 {
    fn into_field(self) -> Fp {
        Fp::from(self)
    }
}

impl IntoField for &[u8] {
    fn into_field(self) -> Fp {
        field_from_bytes(self)
    }
}

impl IntoField for &str {
    fn into_field(self) -> Fp {
        field_from_bytes(self.as_bytes())
    }
}

/// Serde adapter for `hex64` field values.
pub mod hex64 {
    use super::{field_from_hex, field_to_hex, Fp};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Fp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&field_to_hex(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fp, D::Error> {
        let s = String::deserialize(deserializer)?;
        field_from_hex(&s).map_err(serde::de::Error::custom)
    }
}

macro_rules! field_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq)]
        pub struct $name(Fp);

        impl $name {
            pub fn new(value: Fp) -> Self {
                Self(value)
            }

            pub fn as_field(&self) -> Fp {
                self.0
            }

            pub fn to_hex(&self) -> String {
                field_to_hex(&self.0)
            }

            pub fn from_hex(s: &str) -> Result<Self> {
                field_from_hex(s).map(Self)
            }
        }

        impl From<Fp> for $name {
            fn from(value: Fp) -> Self {
                Self(value)
            }
        }

        impl Hash for $name {
            fn hash<H: StdHasher>(&self, state: &mut H) {
                self.0.to_repr().hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                hex64::serialize(&self.0, serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                hex64::deserialize(deserializer).map(Self)
            }
        }
    };
}

field_newtype! {
    /// Public uniqueness key derived from `hash(secret, proposal_id)`.
    Nullifier
}

field_newtype! {
    /// Hiding commitment to a vote, `hash(vote, secret)`.
    Commitment
}

/// A voter's long-lived secret.
///
/// Deliberately not `Serialize`: the only way out is [`VoterSecret::to_hex`],
/// used by secret stores that persist it locally.
#[derive(Clone, PartialEq, Eq)]
pub struct VoterSecret(Fp);

impl VoterSecret {
    pub fn random() -> Self {
        Self(Fp::random(OsRng))
    }

    pub fn from_field(value: Fp) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> Fp {
        self.0
    }

    pub fn to_hex(&self) -> String {
        field_to_hex(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        field_from_hex(s.trim()).map(Self)
    }
}

impl From<u64> for VoterSecret {
    fn from(value: u64) -> Self {
        Self(Fp::from(value))
    }
}

impl fmt::Debug for VoterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VoterSecret(<redacted>)")
    }
}

/// The statement being voted on. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    id: u64,
    #[serde(with = "hex64")]
    content_hash: Fp,
}

impl Proposal {
    pub fn new(id: u64, content_hash: Fp) -> Self {
        Self { id, content_hash }
    }

    pub fn from_content(id: u64, content: &str) -> Self {
        Self { id, content_hash: content.into_field() }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn content_hash(&self) -> Fp {
        self.content_hash
    }
}

/// Ordered public inputs of the vote statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputs {
    pub proposal_id: u64,
    pub nullifier: Nullifier,
    pub commitment: Commitment,
}

impl PublicInputs {
    pub const LEN: usize = 3;

    pub fn new(proposal_id: u64, nullifier: Nullifier, commitment: Commitment) -> Self {
        Self { proposal_id, nullifier, commitment }
    }

    /// Instance column layout: `[proposal_id, nullifier, commitment]`.
    pub fn to_fields(&self) -> Vec<Fp> {
        vec![Fp::from(self.proposal_id), self.nullifier.as_field(), self.commitment.as_field()]
    }

    pub fn to_strings(&self) -> Vec<String> {
        vec![self.proposal_id.to_string(), self.nullifier.to_hex(), self.commitment.to_hex()]
    }

    pub fn from_strings(values: &[String]) -> Result<Self> {
        match values {
            [proposal_id, nullifier, commitment] => {
                let proposal_id = proposal_id
                    .parse::<u64>()
                    .map_err(|_| VoteError::validation("Invalid proposal ID"))?;
                Ok(Self {
                    proposal_id,
                    nullifier: Nullifier::from_hex(nullifier)?,
                    commitment: Commitment::from_hex(commitment)?,
                })
            }
            _ => Err(VoteError::validation(format!(
                "expected {} public inputs, got {}",
                Self::LEN,
                values.len()
            ))),
        }
    }
}

/// A proof artifact together with the public inputs it claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    proof_data: Vec<u8>,
    public_inputs: PublicInputs,
}

impl Proof {
    pub fn new(proof_data: Vec<u8>, public_inputs: PublicInputs) -> Self {
        Self { proof_data, public_inputs }
    }

    pub fn size(&self) -> usize {
        self.proof_data.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.proof_data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.proof_data
    }

    pub fn public_inputs(&self) -> &PublicInputs {
        &self.public_inputs
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.proof_data))
    }
}

/// An accepted vote. Created once per nullifier and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub nullifier: Nullifier,
    pub proposal_id: u64,
    pub commitment: Commitment,
    pub timestamp: DateTime<Utc>,
}

/// Transaction identifier handed back in a [`Receipt`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub fn for_entry(entry: &LedgerEntry) -> Self {
        let digest = Blake2b256::new()
            .chain_update(TX_DOMAIN)
            .chain_update(entry.nullifier.as_field().to_repr())
            .chain_update(entry.proposal_id.to_le_bytes())
            .chain_update(entry.commitment.as_field().to_repr())
            .chain_update(entry.timestamp.timestamp_millis().to_le_bytes())
            .finalize();

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.to_hex())
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub entry: LedgerEntry,
    pub mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Results {
    pub proposal_id: u64,
    pub total: u64,
}

//! Core wallet data model: outpoints, script descriptors, unspent outputs,
//! spend targets, and the transient transaction shape handed to signing.
//!
//! All monetary values are in becks (1 BECK = 10^8 becks).
//! All value arithmetic is integer; floating point never appears.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::SEQUENCE_FINAL;

/// A 32-byte identifier.
///
/// Used for transaction IDs inside [`OutPoint`] and for script payloads
/// (public key hashes and script hashes) inside [`ScriptDescriptor`].
/// The engine never computes hashes itself; identifiers arrive opaque
/// from the storage collaborator.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash (32 zero bytes).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a Hash256 from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Reference to a specific output of a previous transaction.
///
/// Ordered (txid first, then index) so candidate lists have a total order
/// independent of map iteration; selection relies on this for determinism.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct OutPoint {
    /// Transaction ID containing the referenced output.
    pub txid: Hash256,
    /// Index of the output within the transaction.
    pub index: u64,
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.index)
    }
}

/// The shape of an output's locking script, as classified by the chain
/// scanner. The kind determines serialized size; value routing is opaque.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    /// Pay-to-pubkey-hash. Spendable with one signature and one public key.
    PubkeyHash,
    /// Pay-to-script-hash wrapping a single-key redeem script.
    ScriptHash,
    /// Anything the scanner could not classify. Cannot be sized, so it can
    /// appear in stored coins but never in a built transaction.
    NonStandard,
}

impl ScriptKind {
    /// Short lowercase label used in log output and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PubkeyHash => "p2pkh",
            Self::ScriptHash => "p2sh",
            Self::NonStandard => "nonstandard",
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque destination: a script kind plus its 32-byte payload.
///
/// Equality and hashing cover both fields; request validation uses them to
/// reject duplicate destinations within one spend.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScriptDescriptor {
    /// Script shape, which fixes the output's serialized size.
    pub kind: ScriptKind,
    /// Hash payload (pubkey hash or script hash). Opaque to the engine.
    pub payload: Hash256,
}

impl fmt::Display for ScriptDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.payload)
    }
}

/// An unspent output as reported by the storage collaborator, together with
/// the wallet metadata selection relies on.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UnspentOutput {
    /// Identifier of this output on chain.
    pub outpoint: OutPoint,
    /// Value in becks.
    pub value: u64,
    /// The locking script of this output.
    pub script: ScriptDescriptor,
    /// Number of confirmations; 0 means still unconfirmed.
    pub confirmations: u64,
    /// Whether this output was created by a coinbase transaction.
    pub from_coinbase: bool,
    /// Whether this output is change from one of our own transactions.
    /// Unconfirmed change may be spent when policy allows; other
    /// unconfirmed outputs never are.
    pub is_change: bool,
    /// Manually excluded from selection by the user (coin control).
    pub manually_locked: bool,
    /// Tracked for balance display only; spendable only on explicit request.
    pub watch_only: bool,
}

impl UnspentOutput {
    /// Check if this output has at least one confirmation.
    pub fn is_confirmed(&self) -> bool {
        self.confirmations > 0
    }

    /// Check if this output has matured and can be spent.
    ///
    /// Coinbase outputs require [`COINBASE_MATURITY`](crate::constants::COINBASE_MATURITY)
    /// confirmations. Non-coinbase outputs are always mature.
    pub fn is_mature(&self) -> bool {
        if !self.from_coinbase {
            return true;
        }
        self.confirmations >= crate::constants::COINBASE_MATURITY
    }
}

/// One requested payment within a spend.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SpendTarget {
    /// Destination script.
    pub script: ScriptDescriptor,
    /// Requested value in becks. Must be positive and above dust.
    pub value: u64,
    /// Deduct this target's share of the fee from its value instead of
    /// adding the fee on top of the inputs.
    pub subtract_fee: bool,
}

/// A planned transaction input: the outpoint to spend plus its sequence.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlannedInput {
    /// The unspent output this input consumes.
    pub outpoint: OutPoint,
    /// Sequence number. Below [`SEQUENCE_FINAL`] signals replaceability.
    pub sequence: u32,
}

impl PlannedInput {
    /// Whether this input opts in to replacement signaling.
    pub fn signals_replacement(&self) -> bool {
        self.sequence < SEQUENCE_FINAL
    }
}

/// A planned transaction output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PlannedOutput {
    /// Value in becks.
    pub value: u64,
    /// Destination script.
    pub script: ScriptDescriptor,
}

/// The transient, unsigned transaction produced by assembly.
///
/// Inputs and outputs are in their final order; the signing collaborator
/// consumes this shape as-is. The engine owns no serialization format, so
/// `vsize` is the size model's estimate, not a measured encoding.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CandidateTransaction {
    /// Inputs, in selection order.
    pub inputs: Vec<PlannedInput>,
    /// Outputs: requested targets in request order, then change (if any).
    pub outputs: Vec<PlannedOutput>,
    /// Estimated size in virtual bytes.
    pub vsize: u64,
}

impl CandidateTransaction {
    /// Sum of all output values. Returns None on overflow.
    pub fn total_output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.value))
    }
}

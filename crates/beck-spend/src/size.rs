//! Serialized-size model for candidate transactions.
//!
//! Sizes are exact for the supported legacy script kinds, where serialized
//! bytes and virtual bytes coincide, so the fee policy can price a
//! transaction before it exists. Signature sizes use the canonical
//! worst-case encoding; a signed transaction may come in a byte or two
//! under the estimate, never over.

use beck_core::error::SizeError;
use beck_core::types::ScriptKind;

/// Fixed envelope: 4-byte version plus 4-byte locktime.
pub const TX_ENVELOPE_SIZE: u64 = 8;

/// Pay-to-pubkey-hash input: 36-byte outpoint, 1-byte script length,
/// 107-byte signature script (signature, public key, pushes), 4-byte
/// sequence.
pub const P2PKH_INPUT_SIZE: u64 = 148;

/// Pay-to-pubkey-hash output: 8-byte value, 1-byte script length,
/// 25-byte locking script.
pub const P2PKH_OUTPUT_SIZE: u64 = 34;

/// Script-hash input under the wallet's single-key redeem shape:
/// 36-byte outpoint, 1-byte script length, 133-byte signature script
/// (signature, public key, redeem script, pushes), 4-byte sequence.
pub const P2SH_INPUT_SIZE: u64 = 174;

/// Script-hash output: 8-byte value, 1-byte script length, 23-byte
/// locking script.
pub const P2SH_OUTPUT_SIZE: u64 = 32;

/// Serialized length of the compact integer encoding of `n`.
fn compact_size_len(n: usize) -> u64 {
    match n {
        0..=0xFC => 1,
        0xFD..=0xFFFF => 3,
        0x1_0000..=0xFFFF_FFFF => 5,
        _ => 9,
    }
}

/// Marginal size of one input spending an output of the given kind.
pub fn input_size(kind: ScriptKind) -> Result<u64, SizeError> {
    match kind {
        ScriptKind::PubkeyHash => Ok(P2PKH_INPUT_SIZE),
        ScriptKind::ScriptHash => Ok(P2SH_INPUT_SIZE),
        ScriptKind::NonStandard => Err(SizeError::UnsupportedScriptType(kind)),
    }
}

/// Marginal size of one output locking to the given kind.
pub fn output_size(kind: ScriptKind) -> Result<u64, SizeError> {
    match kind {
        ScriptKind::PubkeyHash => Ok(P2PKH_OUTPUT_SIZE),
        ScriptKind::ScriptHash => Ok(P2SH_OUTPUT_SIZE),
        ScriptKind::NonStandard => Err(SizeError::UnsupportedScriptType(kind)),
    }
}

/// Estimated size in virtual bytes of a transaction with the given input
/// and output script kinds: envelope, both count prefixes, and every
/// marginal contribution.
pub fn transaction_vsize(
    inputs: &[ScriptKind],
    outputs: &[ScriptKind],
) -> Result<u64, SizeError> {
    let mut vsize =
        TX_ENVELOPE_SIZE + compact_size_len(inputs.len()) + compact_size_len(outputs.len());
    for kind in inputs {
        vsize += input_size(*kind)?;
    }
    for kind in outputs {
        vsize += output_size(*kind)?;
    }
    Ok(vsize)
}

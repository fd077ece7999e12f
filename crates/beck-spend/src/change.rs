//! Change allocation: surplus handling, drop-to-fee, and fee deduction
//! from subtract-fee targets.
//!
//! The allocator runs once per build, after selection. Adding a change
//! output grows the transaction and therefore the fee, so the change value
//! is re-priced with the output included; if that re-pricing pushes it
//! under the dust threshold the output is dropped again. One fixed-size
//! output can only be added once, so the loop terminates after a single
//! extra pass.

use tracing::warn;

use beck_core::types::{ScriptKind, SpendTarget};

use crate::error::SpendError;
use crate::fee::FeePolicy;
use crate::select::{CoinSelection, SelectionTarget};
use crate::size;

/// What happened to the surplus above target plus fee.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeDecision {
    /// A change output is created. `fee` prices the transaction with the
    /// change output included.
    Change { value: u64, fee: u64 },
    /// No change output. `surplus` becks fold into the fee; `fee` is the
    /// full amount the transaction pays, fold included.
    Folded { surplus: u64, fee: u64 },
}

impl ChangeDecision {
    /// Total fee the transaction will pay.
    pub fn fee(&self) -> u64 {
        match self {
            Self::Change { fee, .. } => *fee,
            Self::Folded { fee, .. } => *fee,
        }
    }

    /// Value of the change output, if one is created.
    pub fn change_value(&self) -> Option<u64> {
        match self {
            Self::Change { value, .. } => Some(*value),
            Self::Folded { .. } => None,
        }
    }

    /// Surplus folded into the fee; zero when change is created.
    pub fn folded_surplus(&self) -> u64 {
        match self {
            Self::Change { .. } => 0,
            Self::Folded { surplus, .. } => *surplus,
        }
    }
}

/// Decide whether the selection's surplus becomes a change output or
/// folds into the fee.
///
/// In subtract-fee mode the fee comes out of the recipients, so the
/// change output (if any) is exactly the raw surplus and no re-pricing
/// pass is needed.
pub fn decide_change(
    selection: &CoinSelection,
    target: &SelectionTarget,
    change_kind: ScriptKind,
    policy: &FeePolicy,
) -> Result<ChangeDecision, SpendError> {
    let input_kinds = selection.input_kinds();
    let base_vsize = size::transaction_vsize(&input_kinds, &target.output_kinds)?;
    let fee_no_change = policy.required_fee(base_vsize);
    // Never create a zero-value output, even on zero-fee networks where
    // the dust threshold itself is zero.
    let dust = policy.dust_threshold(change_kind)?.max(1);

    let after_targets = selection
        .total_value
        .checked_sub(target.value)
        .ok_or_else(|| {
            SpendError::InternalInvariantViolation(format!(
                "selection total {} below target {}",
                selection.total_value, target.value
            ))
        })?;

    if target.fee_from_recipients {
        let surplus = after_targets;
        if surplus < dust {
            if surplus > 0 {
                warn!(surplus, dust, "change: surplus below dust, folding into fee");
            }
            return Ok(ChangeDecision::Folded {
                surplus,
                fee: fee_no_change.saturating_add(surplus),
            });
        }
        let fee_with_change =
            policy.required_fee(vsize_with_change(&input_kinds, target, change_kind)?);
        return Ok(ChangeDecision::Change {
            value: surplus,
            fee: fee_with_change,
        });
    }

    let surplus = after_targets.checked_sub(fee_no_change).ok_or_else(|| {
        SpendError::InternalInvariantViolation(format!(
            "selection cannot pay its own fee: {after_targets} < {fee_no_change}"
        ))
    })?;
    if surplus < dust {
        if surplus > 0 {
            warn!(surplus, dust, "change: surplus below dust, folding into fee");
        }
        return Ok(ChangeDecision::Folded {
            surplus,
            fee: fee_no_change.saturating_add(surplus),
        });
    }

    let fee_with_change =
        policy.required_fee(vsize_with_change(&input_kinds, target, change_kind)?);
    match after_targets.checked_sub(fee_with_change) {
        Some(change_value) if change_value >= dust => Ok(ChangeDecision::Change {
            value: change_value,
            fee: fee_with_change,
        }),
        _ => {
            // The change output cannot pay for its own size; drop it and
            // fold the whole surplus.
            warn!(surplus, dust, "change: re-priced change is dust, folding into fee");
            Ok(ChangeDecision::Folded {
                surplus,
                fee: fee_no_change.saturating_add(surplus),
            })
        }
    }
}

/// Size of the candidate with a change output of `change_kind` appended.
fn vsize_with_change(
    input_kinds: &[ScriptKind],
    target: &SelectionTarget,
    change_kind: ScriptKind,
) -> Result<u64, SpendError> {
    let mut output_kinds = Vec::with_capacity(target.output_kinds.len() + 1);
    output_kinds.extend_from_slice(&target.output_kinds);
    output_kinds.push(change_kind);
    Ok(size::transaction_vsize(input_kinds, &output_kinds)?)
}

/// Deduct `fee` from the targets flagged `subtract_fee`, pro-rata by
/// requested value, and return the final value of every target in request
/// order.
///
/// Floor division leaves a remainder of at most one beck per flagged
/// target; the whole remainder lands on the first flagged target, so the
/// split is deterministic. Targets without the flag keep their requested
/// values. With no flagged targets the fee is borne by the inputs and
/// every value passes through unchanged.
pub fn apply_fee_deduction(
    targets: &[SpendTarget],
    fee: u64,
    policy: &FeePolicy,
) -> Result<Vec<u64>, SpendError> {
    let mut values: Vec<u64> = targets.iter().map(|t| t.value).collect();
    let flagged: Vec<usize> = targets
        .iter()
        .enumerate()
        .filter(|(_, t)| t.subtract_fee)
        .map(|(i, _)| i)
        .collect();
    if flagged.is_empty() || fee == 0 {
        return Ok(values);
    }

    let flagged_total = flagged
        .iter()
        .try_fold(0u64, |acc, &i| acc.checked_add(targets[i].value))
        .ok_or_else(|| {
            SpendError::InternalInvariantViolation("flagged target sum overflow".into())
        })?;

    let mut deducted = 0u64;
    for &i in &flagged {
        let share =
            ((fee as u128) * (targets[i].value as u128) / (flagged_total as u128)) as u64;
        values[i] = match targets[i].value.checked_sub(share) {
            Some(left) => left,
            None => {
                let dust = policy.dust_threshold(targets[i].script.kind)?;
                return Err(SpendError::PostFeeDust { index: i, value: 0, dust });
            }
        };
        deducted = deducted.saturating_add(share);
    }

    // Rounding remainder goes to the first flagged target.
    let first = flagged[0];
    let remainder = fee - deducted;
    values[first] = match values[first].checked_sub(remainder) {
        Some(left) => left,
        None => {
            let dust = policy.dust_threshold(targets[first].script.kind)?;
            return Err(SpendError::PostFeeDust { index: first, value: 0, dust });
        }
    };

    for &i in &flagged {
        let dust = policy.dust_threshold(targets[i].script.kind)?;
        if values[i] < dust {
            return Err(SpendError::PostFeeDust {
                index: i,
                value: values[i],
                dust,
            });
        }
    }
    Ok(values)
}

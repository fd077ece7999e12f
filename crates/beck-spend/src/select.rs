//! Coin selection: eligibility filtering, bounded exact-match search, and
//! greedy accumulation with a fee fixed-point.
//!
//! Selection is pure over a snapshot of candidates; reservation of the
//! chosen coins happens later, in assembly. Two requests given the same
//! snapshot, targets, and policy always pick the same coins in the same
//! order.

use tracing::debug;

use beck_core::constants::{
    EXACT_MATCH_MAX_INPUTS, EXACT_MATCH_MAX_TRIES, EXACT_MATCH_WINDOW, MAX_INPUTS,
};
use beck_core::types::{ScriptKind, UnspentOutput};

use crate::error::SpendError;
use crate::fee::FeePolicy;
use crate::size;

/// What selection must cover.
#[derive(Clone, Debug)]
pub struct SelectionTarget {
    /// Sum of requested target values in becks.
    pub value: u64,
    /// Script kinds of the requested outputs, change excluded.
    pub output_kinds: Vec<ScriptKind>,
    /// Whether the fee comes out of the recipients' values. When set,
    /// inputs only need to cover `value`; the fee is priced during change
    /// allocation and deducted from the flagged targets.
    pub fee_from_recipients: bool,
}

/// Per-request eligibility switches. Everything else (manual locks,
/// coinbase maturity, unsizable scripts) is always enforced.
#[derive(Clone, Copy, Debug, Default)]
pub struct Eligibility {
    /// Permit watch-only coins.
    pub allow_watch_only: bool,
    /// Permit our own unconfirmed change. Unconfirmed coins from third
    /// parties are never eligible.
    pub spend_unconfirmed_change: bool,
}

/// Outcome of selection: the chosen coins plus the no-change fee baseline
/// the change allocator starts from.
#[derive(Clone, Debug)]
pub struct CoinSelection {
    /// Chosen coins, in final input order.
    pub selected: Vec<UnspentOutput>,
    /// Summed value of the chosen coins.
    pub total_value: u64,
    /// Fee for the candidate as priced without a change output. Zero when
    /// the fee is borne by the recipients.
    pub fee_no_change: u64,
    /// Whether the bounded exact-match search produced this selection.
    pub exact_match: bool,
}

impl CoinSelection {
    /// Script kinds of the selected coins, in input order.
    pub fn input_kinds(&self) -> Vec<ScriptKind> {
        self.selected.iter().map(|coin| coin.script.kind).collect()
    }
}

/// Deterministic coin selector.
pub struct CoinSelector;

impl CoinSelector {
    /// Select coins covering `target` from `candidates`.
    ///
    /// Tries a bounded exact-match search first (a hit means a changeless
    /// transaction), then falls back to greedy accumulation over the
    /// descending-value order.
    ///
    /// # Errors
    ///
    /// - [`SpendError::NoEligibleInputs`] if filtering removed every candidate
    /// - [`SpendError::InsufficientFunds`] if the eligible coins cannot cover
    ///   the target plus the fee for the attempted input count
    pub fn select(
        candidates: &[UnspentOutput],
        eligibility: Eligibility,
        target: &SelectionTarget,
        policy: &FeePolicy,
    ) -> Result<CoinSelection, SpendError> {
        let mut eligible: Vec<&UnspentOutput> = candidates
            .iter()
            .filter(|coin| Self::is_eligible(coin, eligibility))
            .collect();
        if eligible.is_empty() {
            return Err(SpendError::NoEligibleInputs {
                candidates: candidates.len(),
            });
        }

        // Largest first; outpoint breaks value ties so the order is total.
        eligible.sort_by(|a, b| {
            b.value
                .cmp(&a.value)
                .then_with(|| a.outpoint.cmp(&b.outpoint))
        });

        if let Some(selection) = Self::find_exact_match(&eligible, target, policy)? {
            debug!(
                inputs = selection.selected.len(),
                total = selection.total_value,
                "exact-match selection, changeless"
            );
            return Ok(selection);
        }
        debug!("no exact match, accumulating greedily");
        Self::accumulate(&eligible, target, policy)
    }

    /// A coin is eligible when it is not manually locked, its script can
    /// be sized, it has matured, its confirmation state passes the
    /// unconfirmed-change rule, and watch-only status is permitted.
    fn is_eligible(coin: &UnspentOutput, eligibility: Eligibility) -> bool {
        if coin.manually_locked {
            return false;
        }
        if coin.watch_only && !eligibility.allow_watch_only {
            return false;
        }
        if coin.script.kind == ScriptKind::NonStandard {
            return false;
        }
        if !coin.is_mature() {
            return false;
        }
        if !coin.is_confirmed() {
            return eligibility.spend_unconfirmed_change && coin.is_change;
        }
        true
    }

    /// Fee for a candidate spending `input_kinds` with no change output.
    fn fee_without_change(
        input_kinds: &[ScriptKind],
        target: &SelectionTarget,
        policy: &FeePolicy,
    ) -> Result<u64, SpendError> {
        if target.fee_from_recipients {
            return Ok(0);
        }
        let vsize = size::transaction_vsize(input_kinds, &target.output_kinds)?;
        Ok(policy.required_fee(vsize))
    }

    /// Bounded search for a combination whose value exactly equals the
    /// target plus its own no-change fee. Smaller combinations are
    /// preferred; candidate order breaks remaining ties.
    fn find_exact_match(
        sorted: &[&UnspentOutput],
        target: &SelectionTarget,
        policy: &FeePolicy,
    ) -> Result<Option<CoinSelection>, SpendError> {
        let window = &sorted[..sorted.len().min(EXACT_MATCH_WINDOW)];
        // Upper bound on any combination's needed total, for pruning.
        let widest = vec![ScriptKind::ScriptHash; EXACT_MATCH_MAX_INPUTS];
        let max_fee = Self::fee_without_change(&widest, target, policy)?;

        let mut search = ExactSearch {
            window,
            max_needed: target.value.saturating_add(max_fee),
            target,
            policy,
            tries: 0,
        };
        let mut combo = Vec::with_capacity(EXACT_MATCH_MAX_INPUTS);
        for combo_size in 1..=EXACT_MATCH_MAX_INPUTS.min(window.len()) {
            let found = search.descend(0, combo_size, &mut combo, 0)?;
            if found.is_some() {
                return Ok(found);
            }
            if search.tries >= EXACT_MATCH_MAX_TRIES {
                break;
            }
        }
        Ok(None)
    }

    /// Greedy accumulation in descending-value order. The fee depends on
    /// the input count, so sufficiency is re-checked after every added
    /// coin with a freshly priced fee.
    fn accumulate(
        sorted: &[&UnspentOutput],
        target: &SelectionTarget,
        policy: &FeePolicy,
    ) -> Result<CoinSelection, SpendError> {
        let mut selected: Vec<UnspentOutput> = Vec::new();
        let mut input_kinds: Vec<ScriptKind> = Vec::new();
        let mut total = 0u64;
        let mut needed = target.value;

        for coin in sorted {
            if selected.len() == MAX_INPUTS {
                break;
            }
            total = total.saturating_add(coin.value);
            input_kinds.push(coin.script.kind);
            selected.push((*coin).clone());

            let fee = Self::fee_without_change(&input_kinds, target, policy)?;
            needed = target.value.saturating_add(fee);
            if total >= needed {
                debug!(
                    inputs = selected.len(),
                    total,
                    fee,
                    "greedy selection sufficient"
                );
                return Ok(CoinSelection {
                    selected,
                    total_value: total,
                    fee_no_change: fee,
                    exact_match: false,
                });
            }
        }

        Err(SpendError::InsufficientFunds {
            have: total,
            need: needed,
        })
    }
}

/// Shared state for the bounded exact-match walk: the candidate window,
/// the pruning bound, and the node budget.
struct ExactSearch<'s, 'c> {
    window: &'s [&'c UnspentOutput],
    /// No combination needs more than this; larger running sums prune.
    max_needed: u64,
    target: &'s SelectionTarget,
    policy: &'s FeePolicy,
    /// Nodes visited so far, capped at `EXACT_MATCH_MAX_TRIES`.
    tries: usize,
}

impl<'c> ExactSearch<'_, 'c> {
    /// Depth-first walk over combinations of exactly `want` coins from
    /// `window[start..]`, sharing the node budget across calls.
    fn descend(
        &mut self,
        start: usize,
        want: usize,
        combo: &mut Vec<&'c UnspentOutput>,
        sum: u64,
    ) -> Result<Option<CoinSelection>, SpendError> {
        if self.tries >= EXACT_MATCH_MAX_TRIES {
            return Ok(None);
        }
        self.tries += 1;

        if combo.len() == want {
            let kinds: Vec<ScriptKind> = combo.iter().map(|coin| coin.script.kind).collect();
            let fee = CoinSelector::fee_without_change(&kinds, self.target, self.policy)?;
            if sum == self.target.value.saturating_add(fee) {
                return Ok(Some(CoinSelection {
                    selected: combo.iter().map(|coin| (*coin).clone()).collect(),
                    total_value: sum,
                    fee_no_change: fee,
                    exact_match: true,
                }));
            }
            return Ok(None);
        }

        for i in start..self.window.len() {
            // Not enough candidates left to complete the combination.
            if self.window.len() - i < want - combo.len() {
                break;
            }
            let Some(new_sum) = sum.checked_add(self.window[i].value) else {
                continue;
            };
            // Overshoot: no completion of this prefix can come back down.
            if new_sum > self.max_needed {
                continue;
            }
            combo.push(self.window[i]);
            let found = self.descend(i + 1, want, combo, new_sum)?;
            combo.pop();
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }
}

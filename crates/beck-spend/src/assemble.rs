//! Transaction assembly: the end-to-end pipeline from a spend request to
//! a priced candidate transaction with reserved inputs.
//!
//! Stages run in a fixed order: validate the request, snapshot and select
//! coins, allocate change, check invariants, then reserve the chosen
//! inputs. Reservation is the last step, so no failure path leaves coins
//! held and every error may be retried without cleanup.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use beck_core::constants::{MAX_MONEY, MAX_OUTPUTS, SEQUENCE_FINAL, SEQUENCE_REPLACEABLE};
use beck_core::traits::{ChangeSource, FeeEstimator};
use beck_core::types::{
    CandidateTransaction, OutPoint, PlannedInput, PlannedOutput, ScriptDescriptor, ScriptKind,
    SpendTarget, UnspentOutput,
};
use beck_core::view::{CoinView, OutputFilter};

use crate::change::{self, ChangeDecision};
use crate::error::{RequestError, SpendError};
use crate::fee::{FeePolicy, FeePolicyConfig};
use crate::select::{CoinSelector, Eligibility, SelectionTarget};
use crate::size;

/// A complete description of the spend to build.
#[derive(Clone, Debug)]
pub struct SpendRequest {
    /// Destinations and values, in the order outputs will appear.
    pub targets: Vec<SpendTarget>,
    /// Fee policy for this spend.
    pub fee: FeePolicyConfig,
    /// Send change here instead of asking the change source for a script.
    pub change_to: Option<ScriptDescriptor>,
    /// Let selection spend watch-only coins.
    pub allow_watch_only: bool,
    /// Let selection spend unconfirmed change outputs.
    pub spend_unconfirmed_change: bool,
    /// Mark every input replaceable before confirmation.
    pub replaceable: bool,
}

impl SpendRequest {
    /// A request with default fee policy and flags.
    pub fn new(targets: Vec<SpendTarget>) -> Self {
        Self {
            targets,
            fee: FeePolicyConfig::default(),
            change_to: None,
            allow_watch_only: false,
            spend_unconfirmed_change: false,
            replaceable: false,
        }
    }
}

/// Non-fatal notes attached to a successful build.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpendWarning {
    /// The surplus was too small for a change output and was paid as fee
    /// instead. Carries the folded amount in becks.
    SurplusFoldedIntoFee(u64),
}

impl fmt::Display for SpendWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurplusFoldedIntoFee(surplus) => {
                write!(f, "surplus of {surplus} becks folded into the fee")
            }
        }
    }
}

/// A successfully assembled spend.
///
/// The inputs are already reserved in the view when this is returned.
/// If the transaction is abandoned, pass [`reserved_inputs`] to
/// [`CoinView::release`] to give the coins back.
///
/// [`reserved_inputs`]: Self::reserved_inputs
#[derive(Clone, Debug)]
pub struct SelectionResult {
    /// The unsigned transaction shape.
    pub transaction: CandidateTransaction,
    /// The coins backing each input, in input order.
    pub inputs: Vec<UnspentOutput>,
    /// Total fee the transaction pays, in becks.
    pub fee: u64,
    /// The change output, if one was created. Also present as the last
    /// entry of `transaction.outputs`.
    pub change: Option<PlannedOutput>,
    /// Summed value of the inputs.
    pub total_input: u64,
    /// Summed value of the outputs.
    pub total_output: u64,
    /// Non-fatal notes.
    pub warnings: Vec<SpendWarning>,
}

impl SelectionResult {
    /// Outpoints reserved on behalf of this spend.
    pub fn reserved_inputs(&self) -> Vec<OutPoint> {
        self.inputs.iter().map(|coin| coin.outpoint).collect()
    }
}

/// Assemble a spend end to end.
///
/// The fee rate is resolved once up front and used for every pricing
/// decision in the build. Reservation happens only after the candidate
/// passes the value-conservation and dust checks, so a rejected build
/// holds nothing.
///
/// # Errors
///
/// Any [`SpendError`]. After [`SpendError::ReservationConflict`] the
/// caller may simply retry: the next snapshot excludes whatever coins
/// were reserved in the race.
pub fn build_transaction(
    request: &SpendRequest,
    view: &dyn CoinView,
    estimator: &dyn FeeEstimator,
    change_source: &dyn ChangeSource,
) -> Result<SelectionResult, SpendError> {
    let policy = FeePolicy::resolve(&request.fee, estimator);
    debug!(
        targets = request.targets.len(),
        rate = policy.rate(),
        "assemble: validating request"
    );
    let target_value = validate_request(request, &policy)?;
    let fee_from_recipients = request.targets.iter().any(|t| t.subtract_fee);

    let filter = OutputFilter {
        include_unconfirmed: request.spend_unconfirmed_change,
        include_watch_only: request.allow_watch_only,
    };
    let candidates = view.spendable_outputs(filter)?;
    let eligibility = Eligibility {
        allow_watch_only: request.allow_watch_only,
        spend_unconfirmed_change: request.spend_unconfirmed_change,
    };
    let selection_target = SelectionTarget {
        value: target_value,
        output_kinds: request.targets.iter().map(|t| t.script.kind).collect(),
        fee_from_recipients,
    };
    debug!(
        candidates = candidates.len(),
        target = target_value,
        fee_from_recipients,
        "assemble: selecting coins"
    );
    let selection = CoinSelector::select(&candidates, eligibility, &selection_target, &policy)?;
    debug!(
        inputs = selection.selected.len(),
        total = selection.total_value,
        exact = selection.exact_match,
        "assemble: coins selected"
    );

    let change_script = request
        .change_to
        .unwrap_or_else(|| change_source.fresh_change_script());
    let decision =
        change::decide_change(&selection, &selection_target, change_script.kind, &policy)?;
    let fee = decision.fee();
    let folded = decision.folded_surplus();

    let mut warnings = Vec::new();
    if folded > 0 {
        warnings.push(SpendWarning::SurplusFoldedIntoFee(folded));
    }

    // The folded surplus is paid by the inputs, never by the recipients,
    // so only the remainder is deducted in subtract-fee mode.
    let values = change::apply_fee_deduction(&request.targets, fee - folded, &policy)?;

    let sequence = if request.replaceable {
        SEQUENCE_REPLACEABLE
    } else {
        SEQUENCE_FINAL
    };
    let inputs: Vec<PlannedInput> = selection
        .selected
        .iter()
        .map(|coin| PlannedInput {
            outpoint: coin.outpoint,
            sequence,
        })
        .collect();

    let mut outputs: Vec<PlannedOutput> = request
        .targets
        .iter()
        .zip(&values)
        .map(|(target, &value)| PlannedOutput {
            value,
            script: target.script,
        })
        .collect();
    let change = match decision {
        ChangeDecision::Change { value, .. } => Some(PlannedOutput {
            value,
            script: change_script,
        }),
        ChangeDecision::Folded { .. } => None,
    };
    if let Some(ref planned) = change {
        outputs.push(planned.clone());
    }

    let input_kinds = selection.input_kinds();
    let output_kinds: Vec<ScriptKind> = outputs.iter().map(|out| out.script.kind).collect();
    let vsize = size::transaction_vsize(&input_kinds, &output_kinds)?;
    policy.check_absurd(fee, vsize)?;

    let transaction = CandidateTransaction {
        inputs,
        outputs,
        vsize,
    };
    let total_input = selection.total_value;
    let total_output = transaction.total_output_value().ok_or_else(|| {
        SpendError::InternalInvariantViolation("output value sum overflows".into())
    })?;
    check_invariants(&transaction, total_input, total_output, fee, &policy)?;

    let outpoints: Vec<OutPoint> = selection.selected.iter().map(|c| c.outpoint).collect();
    if !view.reserve(&outpoints)? {
        debug!(
            inputs = outpoints.len(),
            "assemble: inputs raced away, nothing reserved"
        );
        return Err(SpendError::ReservationConflict);
    }
    debug!(
        inputs = outpoints.len(),
        fee,
        vsize,
        change = change.is_some(),
        "assemble: spend assembled"
    );

    Ok(SelectionResult {
        transaction,
        inputs: selection.selected,
        fee,
        change,
        total_input,
        total_output,
        warnings,
    })
}

/// Check request-level errors that need no view access. Returns the
/// summed target value.
fn validate_request(request: &SpendRequest, policy: &FeePolicy) -> Result<u64, SpendError> {
    if request.targets.is_empty() {
        return Err(RequestError::EmptyTargets.into());
    }
    if request.targets.len() > MAX_OUTPUTS {
        return Err(RequestError::TooManyTargets {
            count: request.targets.len(),
            max: MAX_OUTPUTS,
        }
        .into());
    }

    let mut seen = HashSet::with_capacity(request.targets.len());
    let mut total: u64 = 0;
    for (index, target) in request.targets.iter().enumerate() {
        if target.value == 0 {
            return Err(RequestError::ZeroValue(index).into());
        }
        let dust = policy.dust_threshold(target.script.kind)?;
        if target.value < dust {
            return Err(RequestError::DustValue {
                index,
                value: target.value,
                dust,
            }
            .into());
        }
        if !seen.insert(target.script) {
            return Err(RequestError::DuplicateDestination(target.script).into());
        }
        total = total
            .checked_add(target.value)
            .filter(|&sum| sum <= MAX_MONEY)
            .ok_or(RequestError::ValueOverflow { max: MAX_MONEY })?;
    }
    Ok(total)
}

/// The candidate must conserve value exactly and carry no dust output.
/// A violation here is a bug in assembly, not a property of the request,
/// and it always fires before anything is reserved.
fn check_invariants(
    transaction: &CandidateTransaction,
    total_input: u64,
    total_output: u64,
    fee: u64,
    policy: &FeePolicy,
) -> Result<(), SpendError> {
    if total_input != total_output.saturating_add(fee) {
        error!(
            total_input,
            total_output, fee, "assemble: value conservation violated"
        );
        return Err(SpendError::InternalInvariantViolation(format!(
            "inputs {total_input} != outputs {total_output} + fee {fee}"
        )));
    }
    for output in &transaction.outputs {
        let dust = policy.dust_threshold(output.script.kind)?;
        if output.value < dust {
            error!(
                value = output.value,
                dust, "assemble: dust output in candidate"
            );
            return Err(SpendError::InternalInvariantViolation(format!(
                "candidate output of {} becks is below dust {}",
                output.value, dust
            )));
        }
    }
    Ok(())
}

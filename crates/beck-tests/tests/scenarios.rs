//! End-to-end wallet scenarios for the Beck spend engine.
//!
//! Each test drives the full pipeline (validate, select, allocate change,
//! reserve) through the public API against an in-memory coin view, and
//! checks the resulting transaction shape, fee, reservations, and
//! warnings against hand-computed values.
//!
//! Size model reference used throughout: a pay-to-pubkey-hash input is
//! 148 vbytes, an output 34, the fixed envelope 8 plus count varints, so
//! 1-in/1-out = 192, 1-in/2-out = 226, 3-in/1-out = 488, 3-in/2-out = 522.

use std::collections::HashSet;
use std::sync::Arc;

use beck_core::constants::{COIN, SEQUENCE_FINAL, SEQUENCE_REPLACEABLE};
use beck_core::view::{CoinView, MemoryCoinView};
use beck_spend::assemble::{SpendRequest, SpendWarning};
use beck_spend::error::SpendError;
use beck_tests::helpers::*;

// ======================================================================
// Scenario 1: Small surplus folds into the fee
// Three 1000-beck coins paying 2500 at 1000 becks/kvB: the 12-beck
// surplus over the 488 no-change fee is below dust, so the fee is 500.
// ======================================================================

#[test]
fn scenario_fold_small_surplus() {
    let view = view_of(&[1000, 1000, 1000]);
    let mut request = request_to(0xAA, 2500, 1000);
    request.fee.relay_floor_rate = 1000;

    let result = build(&request, &view).unwrap();
    assert_eq!(result.fee, 500);
    assert!(result.change.is_none());
    assert_eq!(result.transaction.outputs.len(), 1);
    assert_eq!(result.transaction.outputs[0].value, 2500);
    assert_eq!(result.warnings, vec![SpendWarning::SurplusFoldedIntoFee(12)]);
    assert_eq!(result.total_input, result.total_output + result.fee);
    assert_eq!(view.reserved_count(), 3);
}

// ======================================================================
// Scenario 2: The same spend at a tenth of the rate keeps its change
// Fee drops to 53 with the change output included, leaving 447 becks of
// change above the 45-beck dust bar.
// ======================================================================

#[test]
fn scenario_change_above_dust() {
    let view = view_of(&[1000, 1000, 1000]);
    let request = request_to(0xAA, 2500, 100);

    let result = build(&request, &view).unwrap();
    assert_eq!(result.fee, 53);
    let change = result.change.as_ref().unwrap();
    assert_eq!(change.value, 447);
    assert_eq!(change.script, pkh_script(CHANGE_SEED));
    assert_eq!(result.transaction.outputs.len(), 2);
    assert!(result.warnings.is_empty());
    assert_eq!(result.total_input, 3000);
    assert_eq!(result.total_output, 2947);
}

// ======================================================================
// Scenario 3: Exact match spends one coin and creates no change
// A 10_192-beck coin covers 10_000 plus the 192-beck single-input fee
// exactly; larger and smaller coins stay untouched.
// ======================================================================

#[test]
fn scenario_exact_match_changeless() {
    let view = view_of(&[20_000, 10_192, 7_000]);
    let result = build(&request_to(0xAA, 10_000, 1000), &view).unwrap();

    assert_eq!(result.inputs.len(), 1);
    assert_eq!(result.inputs[0].value, 10_192);
    assert_eq!(result.fee, 192);
    assert!(result.change.is_none());
    assert!(result.warnings.is_empty());
    assert_eq!(view.reserved_count(), 1);
    assert!(view.is_reserved(&result.inputs[0].outpoint));
}

// ======================================================================
// Scenario 4: Sweeping a coin pays the fee from the recipient
// One 1000-beck coin, target 1000 with subtract-fee at 300 becks/kvB:
// the recipient receives 942 and the transaction pays 58.
// ======================================================================

#[test]
fn scenario_sweep_pays_fee_from_recipient() {
    let view = view_of(&[1000]);
    let mut request = request_to(0xAA, 1000, 300);
    request.targets[0].subtract_fee = true;

    let result = build(&request, &view).unwrap();
    assert_eq!(result.fee, 58);
    assert_eq!(result.transaction.outputs.len(), 1);
    assert_eq!(result.transaction.outputs[0].value, 942);
    assert!(result.change.is_none());
    assert_eq!(result.total_input, 1000);
    assert_eq!(view.reserved_count(), 1);
}

// ======================================================================
// Scenario 5: An absurd rate is a hard stop, never silently capped
// Sweeping at 100_000 becks/kvB (a thousand times the floor) would pay
// 19_200 against a ceiling of 2000. Nothing is reserved.
// ======================================================================

#[test]
fn scenario_absurd_rate_is_never_capped() {
    let view = view_of(&[COIN]);
    let mut request = request_to(0xAA, COIN, 100_000);
    request.targets[0].subtract_fee = true;

    let err = build(&request, &view).unwrap_err();
    assert_eq!(
        err,
        SpendError::AbsurdFee {
            fee: 19_200,
            ceiling: 2000
        }
    );
    assert_eq!(view.reserved_count(), 0);
}

// ======================================================================
// Scenario 6: The fee splits across subtract-fee targets pro rata
// Fee 26 over values 4000 and 6000 splits 10.4/15.6; shares floor to
// 10 and 15 and the rounding beck lands on the first flagged target.
// ======================================================================

#[test]
fn scenario_fee_split_pro_rata() {
    let view = view_of(&[20_000]);
    let mut request = SpendRequest::new(vec![target(0xAA, 4000), target(0xBB, 6000)]);
    request.targets[0].subtract_fee = true;
    request.targets[1].subtract_fee = true;
    request.fee = explicit_rate(100);

    let result = build(&request, &view).unwrap();
    assert_eq!(result.fee, 26);
    assert_eq!(result.transaction.outputs[0].value, 3989);
    assert_eq!(result.transaction.outputs[1].value, 5985);
    assert_eq!(result.change.as_ref().unwrap().value, 10_000);
    assert_eq!(result.total_input, result.total_output + result.fee);
}

// ======================================================================
// Scenario 7: Multiple plain targets share one coin
// ======================================================================

#[test]
fn scenario_two_targets_one_coin() {
    let view = view_of(&[100_000]);
    let mut request = SpendRequest::new(vec![target(0xAA, 20_000), target(0xBB, 30_000)]);
    request.fee = explicit_rate(1000);

    let result = build(&request, &view).unwrap();
    // 1-in/3-out is 260 vbytes.
    assert_eq!(result.fee, 260);
    assert_eq!(result.transaction.outputs[0].value, 20_000);
    assert_eq!(result.transaction.outputs[1].value, 30_000);
    assert_eq!(result.change.as_ref().unwrap().value, 49_740);
    assert_eq!(result.total_input, 100_000);
}

// ======================================================================
// Scenario 8: A requested change destination overrides the change source
// ======================================================================

#[test]
fn scenario_change_to_override() {
    let view = view_of(&[100_000]);
    let mut request = request_to(0xAA, 30_000, 1000);
    request.change_to = Some(pkh_script(0x77));

    let result = build(&request, &view).unwrap();
    assert_eq!(result.change.as_ref().unwrap().script, pkh_script(0x77));
}

// ======================================================================
// Scenario 9: Replaceability is signaled through input sequences
// ======================================================================

#[test]
fn scenario_replaceable_inputs_signal() {
    let view = view_of(&[100_000]);
    let mut request = request_to(0xAA, 30_000, 1000);
    request.replaceable = true;
    let result = build(&request, &view).unwrap();
    for input in &result.transaction.inputs {
        assert_eq!(input.sequence, SEQUENCE_REPLACEABLE);
        assert!(input.signals_replacement());
    }

    let view = view_of(&[100_000]);
    let result = build(&request_to(0xAA, 30_000, 1000), &view).unwrap();
    for input in &result.transaction.inputs {
        assert_eq!(input.sequence, SEQUENCE_FINAL);
        assert!(!input.signals_replacement());
    }
}

// ======================================================================
// Scenario 10: Reserved coins never appear in a later snapshot
// Two spends from the same view pick disjoint coins; a third finds the
// cupboard bare.
// ======================================================================

#[test]
fn scenario_reserved_coins_stay_excluded() {
    let view = view_of(&[50_000, 40_000]);

    let first = build(&request_to(0xAA, 10_000, 1000), &view).unwrap();
    assert_eq!(first.inputs[0].value, 50_000);

    let second = build(&request_to(0xBB, 10_000, 1000), &view).unwrap();
    assert_eq!(second.inputs[0].value, 40_000);
    assert_ne!(first.inputs[0].outpoint, second.inputs[0].outpoint);

    let err = build(&request_to(0xCC, 10_000, 1000), &view).unwrap_err();
    assert_eq!(err, SpendError::NoEligibleInputs { candidates: 0 });
    assert_eq!(view.reserved_count(), 2);
}

// ======================================================================
// Scenario 11: Releasing a reservation makes the coin spendable again
// ======================================================================

#[test]
fn scenario_release_makes_coins_spendable_again() {
    let view = view_of(&[50_000]);

    let first = build(&request_to(0xAA, 10_000, 1000), &view).unwrap();
    view.release(&first.reserved_inputs()).unwrap();
    assert_eq!(view.reserved_count(), 0);

    let second = build(&request_to(0xBB, 10_000, 1000), &view).unwrap();
    assert_eq!(second.inputs[0].outpoint, first.inputs[0].outpoint);
    assert_eq!(view.reserved_count(), 1);
}

// ======================================================================
// Scenario 12: Watch-only coins require an explicit opt-in
// ======================================================================

#[test]
fn scenario_watch_only_needs_opt_in() {
    let mut watched = coin(1, 50_000);
    watched.watch_only = true;
    let view = MemoryCoinView::with_coins(vec![watched]);

    let err = build(&request_to(0xAA, 10_000, 1000), &view).unwrap_err();
    assert_eq!(err, SpendError::NoEligibleInputs { candidates: 0 });

    let mut request = request_to(0xAA, 10_000, 1000);
    request.allow_watch_only = true;
    let result = build(&request, &view).unwrap();
    assert_eq!(result.inputs[0].value, 50_000);
}

// ======================================================================
// Scenario 13: Unconfirmed change requires an explicit opt-in
// ======================================================================

#[test]
fn scenario_unconfirmed_change_needs_opt_in() {
    let mut fresh_change = coin(1, 50_000);
    fresh_change.confirmations = 0;
    fresh_change.is_change = true;
    let view = MemoryCoinView::with_coins(vec![fresh_change]);

    let err = build(&request_to(0xAA, 10_000, 1000), &view).unwrap_err();
    assert_eq!(err, SpendError::NoEligibleInputs { candidates: 0 });

    let mut request = request_to(0xAA, 10_000, 1000);
    request.spend_unconfirmed_change = true;
    let result = build(&request, &view).unwrap();
    assert_eq!(result.inputs[0].value, 50_000);
}

// ======================================================================
// Scenario 14: Insufficient funds reports the shortfall
// ======================================================================

#[test]
fn scenario_insufficient_funds_reports_need() {
    let view = view_of(&[1000, 500]);
    let err = build(&request_to(0xAA, 5000, 1000), &view).unwrap_err();
    assert_eq!(
        err,
        SpendError::InsufficientFunds {
            have: 1500,
            need: 5340
        }
    );
    assert_eq!(view.reserved_count(), 0);
}

// ======================================================================
// Scenario 15: Concurrent builders end up with disjoint coins
// Four threads race to spend from the same view; losers of the
// reservation race retry against a fresh snapshot and settle on the
// remaining coins.
// ======================================================================

#[test]
fn scenario_concurrent_builders_get_disjoint_coins() {
    let view = Arc::new(view_of(&[100_000, 90_000, 80_000, 70_000]));
    let mut handles = Vec::new();

    for i in 0..4u8 {
        let view = Arc::clone(&view);
        handles.push(std::thread::spawn(move || {
            let request = request_to(0xA0 + i, 50_000, 1000);
            for _ in 0..8 {
                match build(&request, view.as_ref()) {
                    Err(SpendError::ReservationConflict) => continue,
                    other => return other,
                }
            }
            Err(SpendError::ReservationConflict)
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        let result = handle.join().unwrap().unwrap();
        assert_eq!(result.inputs.len(), 1);
        assert!(seen.insert(result.inputs[0].outpoint));
    }
    assert_eq!(view.reserved_count(), 4);
}

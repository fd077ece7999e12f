//! Shared test helpers for the spend engine integration tests.

use beck_core::traits::{ChangeSource, FeeEstimator};
use beck_core::types::{Hash256, OutPoint, ScriptDescriptor, ScriptKind, SpendTarget, UnspentOutput};
use beck_core::view::{CoinView, MemoryCoinView};
use beck_spend::assemble::{build_transaction, SelectionResult, SpendRequest};
use beck_spend::error::SpendError;
use beck_spend::fee::{FeeMode, FeePolicyConfig, FeeRateSpec};

/// Pay-to-pubkey-hash script descriptor from a seed byte.
pub fn pkh_script(seed: u8) -> ScriptDescriptor {
    ScriptDescriptor {
        kind: ScriptKind::PubkeyHash,
        payload: Hash256([seed; 32]),
    }
}

/// Pay-to-script-hash script descriptor from a seed byte.
pub fn sh_script(seed: u8) -> ScriptDescriptor {
    ScriptDescriptor {
        kind: ScriptKind::ScriptHash,
        payload: Hash256([seed; 32]),
    }
}

/// A confirmed, spendable coin with a unique outpoint per seed.
pub fn coin(seed: u8, value: u64) -> UnspentOutput {
    UnspentOutput {
        outpoint: OutPoint {
            txid: Hash256([seed; 32]),
            index: 0,
        },
        value,
        script: pkh_script(seed),
        confirmations: 6,
        from_coinbase: false,
        is_change: false,
        manually_locked: false,
        watch_only: false,
    }
}

/// An in-memory view holding one coin per value, seeded 1, 2, 3, ...
pub fn view_of(values: &[u64]) -> MemoryCoinView {
    let coins = values
        .iter()
        .enumerate()
        .map(|(i, &value)| coin(i as u8 + 1, value))
        .collect();
    MemoryCoinView::with_coins(coins)
}

/// A target paying `value` to the pubkey-hash script for `seed`.
pub fn target(seed: u8, value: u64) -> SpendTarget {
    SpendTarget {
        script: pkh_script(seed),
        value,
        subtract_fee: false,
    }
}

/// An explicit per-kilobyte fee policy at `rate` becks per 1000 vbytes,
/// with the default relay floor and sanity bounds.
pub fn explicit_rate(rate: u64) -> FeePolicyConfig {
    FeePolicyConfig {
        rate: FeeRateSpec::Explicit {
            rate,
            mode: FeeMode::PerKilobyte,
        },
        ..FeePolicyConfig::default()
    }
}

/// A single-target request paying `value` to script `seed` at an explicit
/// per-kilobyte `rate`.
pub fn request_to(seed: u8, value: u64, rate: u64) -> SpendRequest {
    let mut request = SpendRequest::new(vec![target(seed, value)]);
    request.fee = explicit_rate(rate);
    request
}

/// Fee estimator returning a fixed rate for every confirmation target.
pub struct FixedEstimator(pub u64);

impl FeeEstimator for FixedEstimator {
    fn fee_rate(&self, _target_blocks: u64) -> u64 {
        self.0
    }
}

/// Change source handing out the pubkey-hash script for a fixed seed.
pub struct SeededChangeSource(pub u8);

impl ChangeSource for SeededChangeSource {
    fn fresh_change_script(&self) -> ScriptDescriptor {
        pkh_script(self.0)
    }
}

/// Change scripts land on seed `0xC0` unless a test overrides them.
pub const CHANGE_SEED: u8 = 0xC0;

/// Build a spend with a zero-rate estimator and the default change source.
pub fn build(request: &SpendRequest, view: &dyn CoinView) -> Result<SelectionResult, SpendError> {
    build_transaction(request, view, &FixedEstimator(0), &SeededChangeSource(CHANGE_SEED))
}

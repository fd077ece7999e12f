//! Fee policy: required fees, dust thresholds, and the absurdity guard.
//!
//! All pricing is pure integer arithmetic over a [`FeePolicy`] resolved once
//! per build. Rates are becks per 1000 virtual bytes; fees round up, so a
//! computed fee is never below what the rate implies.

use serde::{Deserialize, Serialize};

use beck_core::constants::{
    ABSURD_FEE_MULTIPLIER, DEFAULT_CONFIRM_TARGET, DEFAULT_MAX_FEE, DEFAULT_RELAY_FLOOR_RATE,
    DUST_SPEND_MULTIPLIER,
};
use beck_core::error::SizeError;
use beck_core::traits::FeeEstimator;
use beck_core::types::ScriptKind;

use crate::error::SpendError;
use crate::size;

/// How a rate value turns into a fee.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeeMode {
    /// `rate` is becks per 1000 virtual bytes; the fee scales with size.
    PerKilobyte,
    /// `rate` is also the minimum total: a transaction under a kilobyte
    /// pays `rate` in full, larger ones scale per kilobyte as usual.
    TotalAtLeast,
}

/// Where the fee-rate comes from.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeeRateSpec {
    /// Ask the injected estimator for this confirmation target. Estimated
    /// rates always behave per-kilobyte.
    Estimate {
        /// Desired confirmation depth in blocks.
        target_blocks: u64,
    },
    /// Caller-chosen rate with an explicit mode.
    Explicit { rate: u64, mode: FeeMode },
}

/// Caller-facing fee policy configuration.
///
/// The multipliers and ceilings are deliberately configuration rather than
/// hard-coded: embedding applications tune them per deployment, and tests
/// pin them explicitly.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeePolicyConfig {
    /// Rate source for this spend.
    pub rate: FeeRateSpec,
    /// Relay floor in becks per 1000 virtual bytes. Every computed fee is
    /// at least the floor fee for the transaction's size.
    pub relay_floor_rate: u64,
    /// An output below this multiple of its own future spend cost is dust.
    pub dust_multiplier: u64,
    /// A fee above this multiple of the relay-floor fee is absurd.
    pub absurd_multiplier: u64,
    /// Absolute fee ceiling in becks, whatever the rate arithmetic says.
    pub max_fee: u64,
}

impl Default for FeePolicyConfig {
    fn default() -> Self {
        Self {
            rate: FeeRateSpec::Estimate {
                target_blocks: DEFAULT_CONFIRM_TARGET,
            },
            relay_floor_rate: DEFAULT_RELAY_FLOOR_RATE,
            dust_multiplier: DUST_SPEND_MULTIPLIER,
            absurd_multiplier: ABSURD_FEE_MULTIPLIER,
            max_fee: DEFAULT_MAX_FEE,
        }
    }
}

/// A fee policy with its rate resolved, ready to price transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeePolicy {
    rate: u64,
    mode: FeeMode,
    relay_floor_rate: u64,
    dust_multiplier: u64,
    absurd_multiplier: u64,
    max_fee: u64,
}

impl FeePolicy {
    /// Resolve a configuration against the estimator. The estimator is
    /// consulted only for [`FeeRateSpec::Estimate`] requests.
    pub fn resolve(config: &FeePolicyConfig, estimator: &dyn FeeEstimator) -> Self {
        let (rate, mode) = match config.rate {
            FeeRateSpec::Estimate { target_blocks } => {
                (estimator.fee_rate(target_blocks), FeeMode::PerKilobyte)
            }
            FeeRateSpec::Explicit { rate, mode } => (rate, mode),
        };
        Self {
            rate,
            mode,
            relay_floor_rate: config.relay_floor_rate,
            dust_multiplier: config.dust_multiplier,
            absurd_multiplier: config.absurd_multiplier,
            max_fee: config.max_fee,
        }
    }

    /// The resolved rate in becks per 1000 virtual bytes.
    pub fn rate(&self) -> u64 {
        self.rate
    }

    /// Fee in becks required for a transaction of `vsize` virtual bytes.
    pub fn required_fee(&self, vsize: u64) -> u64 {
        let scaled = rate_fee(self.rate, vsize);
        let fee = match self.mode {
            FeeMode::PerKilobyte => scaled,
            FeeMode::TotalAtLeast => scaled.max(self.rate),
        };
        fee.max(self.floor_fee(vsize))
    }

    /// Fee for `vsize` virtual bytes at the relay floor.
    pub fn floor_fee(&self, vsize: u64) -> u64 {
        rate_fee(self.relay_floor_rate, vsize)
    }

    /// Smallest value at which an output of `kind` is worth creating: the
    /// dust multiplier times the cost of later spending it as one input.
    ///
    /// The spend cost is priced at the higher of the active rate and the
    /// relay floor, so a fee spike raises the dust bar instead of leaving
    /// uneconomic outputs behind.
    pub fn dust_threshold(&self, kind: ScriptKind) -> Result<u64, SizeError> {
        let spend_rate = self.rate.max(self.relay_floor_rate);
        let spend_cost = rate_fee(spend_rate, size::input_size(kind)?);
        Ok(spend_cost.saturating_mul(self.dust_multiplier))
    }

    /// Whether an output of `value` becks locking to `kind` is dust.
    pub fn is_dust(&self, value: u64, kind: ScriptKind) -> Result<bool, SizeError> {
        Ok(value < self.dust_threshold(kind)?)
    }

    /// Reject fees no sane request produces: above the absurd multiple of
    /// the relay-floor fee for the same size, or above the absolute
    /// ceiling. A hard stop; the fee is never capped to fit.
    ///
    /// When the relay floor or the multiplier is zero the proportional
    /// test is disabled and only the absolute ceiling applies.
    pub fn check_absurd(&self, fee: u64, vsize: u64) -> Result<(), SpendError> {
        let multiple = self
            .floor_fee(vsize)
            .saturating_mul(self.absurd_multiplier);
        let ceiling = if multiple == 0 {
            self.max_fee
        } else {
            multiple.min(self.max_fee)
        };
        if fee > ceiling {
            return Err(SpendError::AbsurdFee { fee, ceiling });
        }
        Ok(())
    }
}

/// `ceil(vsize * rate / 1000)` with a u128 intermediate to prevent
/// overflow, saturating at `u64::MAX`.
fn rate_fee(rate: u64, vsize: u64) -> u64 {
    let fee = ((rate as u128) * (vsize as u128)).div_ceil(1000);
    fee.min(u64::MAX as u128) as u64
}

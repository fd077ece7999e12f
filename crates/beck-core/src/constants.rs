//! Policy constants. All monetary values in becks (1 BECK = 10^8 becks).

pub const COIN: u64 = 100_000_000;

/// Maximum total supply. Request validation rejects spends whose summed
/// targets exceed this, which also rules out u64 overflow downstream.
pub const MAX_MONEY: u64 = 21_000_000 * COIN;

/// Confirmations a coinbase output needs before it may be spent.
pub const COINBASE_MATURITY: u64 = 100;

pub const MAX_INPUTS: usize = 1000;
pub const MAX_OUTPUTS: usize = 1000;

/// Sequence value that opts an input out of replacement signaling.
pub const SEQUENCE_FINAL: u32 = 0xFFFF_FFFF;

/// Sequence value that signals the transaction may be replaced before
/// confirmation. One below the non-signaling maximum, so locktime
/// semantics are unaffected.
pub const SEQUENCE_REPLACEABLE: u32 = 0xFFFF_FFFD;

/// Default relay floor in becks per 1000 virtual bytes. Every computed fee
/// is at least the floor fee for the transaction's size.
///
/// # Examples
///
/// ```
/// use beck_core::constants::DEFAULT_RELAY_FLOOR_RATE;
/// assert!(DEFAULT_RELAY_FLOOR_RATE > 0);
/// ```
pub const DEFAULT_RELAY_FLOOR_RATE: u64 = 100;

/// Dust multiplier: an output is dust when its value is below this multiple
/// of the fee needed to later spend it as a minimal input.
pub const DUST_SPEND_MULTIPLIER: u64 = 3;

/// Absurd-fee multiplier: a computed fee above this multiple of the
/// relay-floor fee for the same size is treated as a bug, not a payment.
pub const ABSURD_FEE_MULTIPLIER: u64 = 100;

/// Absolute fee ceiling: no single transaction may pay more than this,
/// whatever the rate arithmetic says.
///
/// # Examples
///
/// ```
/// use beck_core::constants::{COIN, DEFAULT_MAX_FEE};
/// assert_eq!(DEFAULT_MAX_FEE, COIN);
/// ```
pub const DEFAULT_MAX_FEE: u64 = COIN;

/// Default confirmation target passed to the fee estimator when a request
/// does not choose one.
pub const DEFAULT_CONFIRM_TARGET: u64 = 6;

/// Exact-match search looks at no more than this many of the largest
/// eligible candidates.
pub const EXACT_MATCH_WINDOW: usize = 32;

/// Exact-match search considers combinations of at most this many inputs.
pub const EXACT_MATCH_MAX_INPUTS: usize = 4;

/// Hard cap on nodes visited by the exact-match search. Keeps worst-case
/// selection latency bounded on wallets with thousands of coins.
pub const EXACT_MATCH_MAX_TRIES: usize = 10_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_money_within_u64() {
        // Room left for fee arithmetic above MAX_MONEY without overflow.
        assert!(MAX_MONEY < u64::MAX / 2);
    }

    #[test]
    fn replaceable_sequence_below_final() {
        assert!(SEQUENCE_REPLACEABLE < SEQUENCE_FINAL);
    }

    #[test]
    fn exact_match_bounds_sane() {
        assert!(EXACT_MATCH_MAX_INPUTS <= EXACT_MATCH_WINDOW);
        assert!(EXACT_MATCH_MAX_TRIES > EXACT_MATCH_WINDOW);
    }
}

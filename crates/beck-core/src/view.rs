//! UTXO set view: snapshot listing plus soft reservations.
//!
//! Provides the [`CoinView`] trait the spend engine selects against, and the
//! [`MemoryCoinView`] reference implementation. Reservations are soft wallet
//! state, not chain state: they exist so concurrent spend builds never pick
//! the same output, and they vanish with the process.
//!
//! Checking availability and marking a reservation happen inside a single
//! critical section. A reservation attempt that loses a race fails as a
//! whole and marks nothing.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ViewError;
use crate::types::{OutPoint, UnspentOutput};

/// Storage-side filter for snapshot listings.
///
/// Policy-side eligibility (manual locks, coinbase maturity, the
/// unconfirmed-change rule) is the selector's job; the view only controls
/// which classes of coins appear in the snapshot at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct OutputFilter {
    /// Include outputs with zero confirmations.
    pub include_unconfirmed: bool,
    /// Include watch-only outputs.
    pub include_watch_only: bool,
}

impl OutputFilter {
    /// Filter that includes every class of coin.
    pub fn permissive() -> Self {
        Self {
            include_unconfirmed: true,
            include_watch_only: true,
        }
    }
}

/// Wallet balance broken down by spendability.
///
/// Every coin is counted in exactly one bucket. Precedence when several
/// apply: reserved, then manually locked, then watch-only, then immature
/// coinbase, then unconfirmed (own change included), then spendable.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BalanceSummary {
    /// Confirmed, mature, unlocked, ready to select.
    pub spendable: u64,
    /// Zero confirmations, including our own unconfirmed change.
    pub unconfirmed: u64,
    /// Coinbase outputs still short of maturity.
    pub immature: u64,
    /// Manually excluded by the user.
    pub locked: u64,
    /// Watch-only holdings.
    pub watch_only: u64,
    /// Currently reserved by an in-flight spend.
    pub reserved: u64,
}

impl BalanceSummary {
    /// Total value across all buckets.
    pub fn total(&self) -> u64 {
        self.spendable
            .saturating_add(self.unconfirmed)
            .saturating_add(self.immature)
            .saturating_add(self.locked)
            .saturating_add(self.watch_only)
            .saturating_add(self.reserved)
    }
}

/// Read-and-reserve interface over the wallet's unspent outputs.
///
/// Implementations must be thread-safe: one instance is shared by every
/// concurrent spend build. Reserved outputs are invisible to
/// [`spendable_outputs`](CoinView::spendable_outputs), so a build that
/// starts after another finished reserving simply sees fewer candidates.
pub trait CoinView: Send + Sync {
    /// Snapshot of unreserved outputs matching `filter`, sorted by
    /// outpoint. The sort keeps snapshots deterministic regardless of the
    /// backend's iteration order.
    fn spendable_outputs(&self, filter: OutputFilter) -> Result<Vec<UnspentOutput>, ViewError>;

    /// Atomically reserve all of `outpoints`.
    ///
    /// Returns `Ok(false)` and marks nothing if any of them is unknown,
    /// already reserved, or manually locked. Returns `Ok(true)` with all
    /// of them marked otherwise.
    fn reserve(&self, outpoints: &[OutPoint]) -> Result<bool, ViewError>;

    /// Release reservations. Unknown or unreserved outpoints are ignored,
    /// so releasing twice is harmless.
    fn release(&self, outpoints: &[OutPoint]) -> Result<(), ViewError>;

    /// Whether an unreserved coin with this outpoint is visible at all.
    ///
    /// Default implementation scans a permissive snapshot; backends with
    /// an index should override.
    fn contains(&self, outpoint: &OutPoint) -> Result<bool, ViewError> {
        Ok(self
            .spendable_outputs(OutputFilter::permissive())?
            .iter()
            .any(|coin| coin.outpoint == *outpoint))
    }
}

/// Interior state guarded by the view's mutex.
struct ViewInner {
    /// All known unspent outputs, reserved or not.
    coins: HashMap<OutPoint, UnspentOutput>,
    /// Outpoints currently held by in-flight spends.
    reserved: HashSet<OutPoint>,
}

/// In-memory [`CoinView`] over a `HashMap`, guarded by one mutex.
///
/// This is the production view for a single wallet process: the UTXO set of
/// one wallet fits in memory, and the mutex gives the indivisible
/// check-and-reserve the reservation contract requires. Persistence is the
/// storage collaborator's concern; this view is rebuilt from it at startup.
pub struct MemoryCoinView {
    inner: Mutex<ViewInner>,
}

impl MemoryCoinView {
    /// Create an empty view.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ViewInner {
                coins: HashMap::new(),
                reserved: HashSet::new(),
            }),
        }
    }

    /// Create a view pre-populated with `coins`.
    pub fn with_coins(coins: Vec<UnspentOutput>) -> Self {
        let view = Self::new();
        {
            let mut inner = view.inner.lock();
            for coin in coins {
                inner.coins.insert(coin.outpoint, coin);
            }
        }
        view
    }

    /// Insert or replace a coin. Replacing does not disturb an existing
    /// reservation on the same outpoint.
    pub fn insert(&self, coin: UnspentOutput) {
        let mut inner = self.inner.lock();
        inner.coins.insert(coin.outpoint, coin);
    }

    /// Remove a coin (spent or reorged away), dropping any reservation.
    pub fn remove(&self, outpoint: &OutPoint) -> Option<UnspentOutput> {
        let mut inner = self.inner.lock();
        inner.reserved.remove(outpoint);
        inner.coins.remove(outpoint)
    }

    /// Set or clear the manual lock on a coin. Returns false if the coin
    /// is unknown.
    pub fn set_locked(&self, outpoint: &OutPoint, locked: bool) -> bool {
        let mut inner = self.inner.lock();
        match inner.coins.get_mut(outpoint) {
            Some(coin) => {
                coin.manually_locked = locked;
                true
            }
            None => false,
        }
    }

    /// Number of coins in the view, reserved included.
    pub fn coin_count(&self) -> usize {
        self.inner.lock().coins.len()
    }

    /// Number of outstanding reservations.
    pub fn reserved_count(&self) -> usize {
        self.inner.lock().reserved.len()
    }

    /// Whether this outpoint is currently reserved.
    pub fn is_reserved(&self, outpoint: &OutPoint) -> bool {
        self.inner.lock().reserved.contains(outpoint)
    }

    /// Balance breakdown across all coins in the view.
    pub fn balance(&self) -> BalanceSummary {
        let inner = self.inner.lock();
        let mut summary = BalanceSummary::default();
        for (outpoint, coin) in &inner.coins {
            let bucket = if inner.reserved.contains(outpoint) {
                &mut summary.reserved
            } else if coin.manually_locked {
                &mut summary.locked
            } else if coin.watch_only {
                &mut summary.watch_only
            } else if !coin.is_mature() {
                &mut summary.immature
            } else if !coin.is_confirmed() {
                &mut summary.unconfirmed
            } else {
                &mut summary.spendable
            };
            *bucket = bucket.saturating_add(coin.value);
        }
        summary
    }
}

impl Default for MemoryCoinView {
    fn default() -> Self {
        Self::new()
    }
}

impl CoinView for MemoryCoinView {
    fn spendable_outputs(&self, filter: OutputFilter) -> Result<Vec<UnspentOutput>, ViewError> {
        let inner = self.inner.lock();
        let mut coins: Vec<UnspentOutput> = inner
            .coins
            .iter()
            .filter(|(outpoint, _)| !inner.reserved.contains(*outpoint))
            .map(|(_, coin)| coin)
            .filter(|coin| filter.include_unconfirmed || coin.is_confirmed())
            .filter(|coin| filter.include_watch_only || !coin.watch_only)
            .cloned()
            .collect();
        coins.sort_by_key(|coin| coin.outpoint);
        Ok(coins)
    }

    fn reserve(&self, outpoints: &[OutPoint]) -> Result<bool, ViewError> {
        let mut inner = self.inner.lock();
        for outpoint in outpoints {
            let available = match inner.coins.get(outpoint) {
                Some(coin) => !coin.manually_locked && !inner.reserved.contains(outpoint),
                None => false,
            };
            if !available {
                return Ok(false);
            }
        }
        for outpoint in outpoints {
            inner.reserved.insert(*outpoint);
        }
        Ok(true)
    }

    fn release(&self, outpoints: &[OutPoint]) -> Result<(), ViewError> {
        let mut inner = self.inner.lock();
        for outpoint in outpoints {
            inner.reserved.remove(outpoint);
        }
        Ok(())
    }
}

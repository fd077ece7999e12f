//! Collaborator contracts for services the spend engine consumes but does
//! not implement: fee-rate estimation and change-script derivation.
//!
//! Implementations live in the embedding application (node RPC bridge,
//! key manager). Everything here is `Send + Sync` so one instance can be
//! shared across concurrent spend requests.

use crate::constants::DEFAULT_CONFIRM_TARGET;
use crate::types::ScriptDescriptor;

/// Source of fee-rate estimates.
///
/// The engine treats the returned rate as opaque and possibly stale; a
/// stale-but-present value is always usable. Implementations must return
/// promptly from cached state and never block on I/O.
pub trait FeeEstimator: Send + Sync {
    /// Estimated fee-rate in becks per 1000 virtual bytes for confirmation
    /// within `target_blocks` blocks.
    fn fee_rate(&self, target_blocks: u64) -> u64;

    /// Estimate for the default confirmation target.
    fn default_fee_rate(&self) -> u64 {
        self.fee_rate(DEFAULT_CONFIRM_TARGET)
    }
}

/// Source of fresh change destinations.
///
/// Backed by the key manager in production. The engine calls this at most
/// once per build, when the request does not supply a custom change
/// destination. The script kind is needed to price the change output
/// before deciding whether to create it, so a derived script may go
/// unused when the surplus folds into the fee.
pub trait ChangeSource: Send + Sync {
    /// Derive a fresh, previously unused change script.
    fn fresh_change_script(&self) -> ScriptDescriptor;
}

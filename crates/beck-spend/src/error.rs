//! Spend assembly error types.

use beck_core::error::{SizeError, ViewError};
use beck_core::types::ScriptDescriptor;
use thiserror::Error;

/// Defects in the request itself, caught before selection starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The target list is empty.
    #[error("no spend targets")]
    EmptyTargets,

    /// The same destination script appears more than once.
    #[error("duplicate destination: {0}")]
    DuplicateDestination(ScriptDescriptor),

    /// A target requests zero becks.
    #[error("zero-value target at index {0}")]
    ZeroValue(usize),

    /// A target requests less than the dust threshold for its script.
    #[error("target {index} below dust: {value} < {dust}")]
    DustValue {
        /// Position in the request's target list.
        index: usize,
        /// Requested value in becks.
        value: u64,
        /// Dust threshold for the target's script kind.
        dust: u64,
    },

    /// More targets than a single transaction may carry.
    #[error("too many targets: {count} > {max}")]
    TooManyTargets { count: usize, max: usize },

    /// The summed target values exceed the value domain.
    #[error("requested total exceeds {max}")]
    ValueOverflow { max: u64 },
}

/// Why a spend could not be built.
///
/// No variant leaves reservations behind: the engine reserves inputs only
/// on the success path, so every error may be retried without cleanup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpendError {
    /// The request was malformed; nothing was attempted.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    /// Eligible coins exist but cannot cover the targets plus fee.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Summed value of every eligible coin, in becks.
        have: u64,
        /// Targets plus the fee at the largest attempted input count.
        need: u64,
    },

    /// Policy filters excluded every coin the view reported.
    #[error("no eligible inputs among {candidates} candidates")]
    NoEligibleInputs {
        /// Coins in the snapshot before eligibility filtering.
        candidates: usize,
    },

    /// A subtract-fee target's value fell below dust after deduction.
    #[error("target {index} is dust after fee deduction: {value} < {dust}")]
    PostFeeDust {
        /// Position in the request's target list.
        index: usize,
        /// Value left after the fee share was deducted.
        value: u64,
        /// Dust threshold for the target's script kind.
        dust: u64,
    },

    /// The computed fee exceeds the sanity ceiling. A hard stop; the fee
    /// is never silently capped.
    #[error("absurd fee: {fee} exceeds ceiling {ceiling}")]
    AbsurdFee { fee: u64, ceiling: u64 },

    /// A script kind the size model cannot price.
    #[error(transparent)]
    UnsupportedScript(#[from] SizeError),

    /// A concurrent spend reserved one of the chosen inputs first.
    /// Retry-safe: a fresh attempt sees the raced coins as unavailable.
    #[error("selected inputs were reserved by a concurrent spend")]
    ReservationConflict,

    /// The storage view failed.
    #[error(transparent)]
    View(#[from] ViewError),

    /// A conservation or dust invariant failed after assembly. Always a
    /// bug; the candidate transaction is discarded.
    #[error("internal invariant violation: {0}")]
    InternalInvariantViolation(String),
}

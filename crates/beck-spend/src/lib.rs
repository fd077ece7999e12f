//! # beck-spend — coin selection and fee computation for Beck.
//!
//! Turns a spend request into a fully priced candidate transaction backed
//! by reserved coins. Selection is deterministic over a snapshot of the
//! coin view; fees follow a per-kilobyte policy with a relay floor, dust
//! pricing, and an absurdity ceiling.
//!
//! # Modules
//!
//! - [`error`] — `SpendError` and `RequestError` enums
//! - [`size`] — Virtual-size model for supported script kinds
//! - [`fee`] — Fee policy: rates, floors, dust, absurdity
//! - [`select`] — Eligibility filtering and deterministic coin selection
//! - [`change`] — Change allocation and subtract-fee deduction
//! - [`assemble`] — The end-to-end build pipeline

pub mod assemble;
pub mod change;
pub mod error;
pub mod fee;
pub mod select;
pub mod size;

// Re-exports for convenient access
pub use assemble::{build_transaction, SelectionResult, SpendRequest, SpendWarning};
pub use change::{apply_fee_deduction, decide_change, ChangeDecision};
pub use error::{RequestError, SpendError};
pub use fee::{FeeMode, FeePolicy, FeePolicyConfig, FeeRateSpec};
pub use select::{CoinSelection, CoinSelector, Eligibility, SelectionTarget};

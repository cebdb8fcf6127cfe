//! SSV Rewards Distribution
//!
//! Splits an integer reward pool across participants in proportion to
//! their points, checks that the pool is consumed exactly, and merges
//! independently computed ledgers.
//!
//! ## Flow
//!
//! 1. **Distribute**: `distribute(weights, total, policy)` floors every
//!    proportional share and hands the rounding remainder out according to
//!    the [`RemainderPolicy`].
//! 2. **Verify**: `ensure_conserved(ledger, total, context)` aborts with
//!    `ConservationViolation` when the amounts do not sum to the total.
//! 3. **Merge**: `merge` / `merge_all` sum ledgers per participant; the
//!    merged ledger is re-verified against the sum of the input totals.

mod conservation;
mod engine;
mod merge;

pub use conservation::{ensure_conserved, verify};
pub use engine::{distribute, RemainderPolicy};
pub use merge::{merge, merge_all, merge_verified};

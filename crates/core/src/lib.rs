//! SSV Rewards Core Types
//!
//! This crate defines the fundamental data structures shared by every
//! reward workflow: participant identities, exact token amounts, ledgers,
//! calendar months and the boundary conversion from floating token
//! amounts into integer base units.

mod error;
mod fixed;
mod ledger;
mod month;
mod types;

pub use error::*;
pub use fixed::*;
pub use ledger::*;
pub use month::*;
pub use types::*;

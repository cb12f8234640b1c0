//! Coin model shared by the contracts and the keeper
//!
//! Coins are immutable single-use values identified by the hash of their
//! parent, puzzle hash and amount. Spends reveal a puzzle and a solution;
//! bundles group spends that must confirm together.

pub mod bytes;
pub mod coin;
pub mod condition;
pub mod error;
pub mod lineage;
pub mod program;

pub use bytes::*;
pub use coin::*;
pub use condition::*;
pub use error::*;
pub use lineage::*;
pub use program::*;

/// Amount of every singleton coin
pub const SINGLETON_AMOUNT: u64 = 1;

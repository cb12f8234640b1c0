//! Contract family for coin-based pairs
//!
//! Router, pair, reserve and liquidity token logic, plus the wallet,
//! settlement, launcher, singleton and token layers they are built from.
//! Running a puzzle is deterministic: the same coin and solution always
//! produce the same conditions.

pub mod error;
pub mod launcher;
pub mod pair;
pub mod puzzle;
pub mod reserve;
pub mod router;
pub mod settlement;
pub mod singleton;
pub mod standard;
pub mod token;

pub use error::*;
pub use launcher::{LaunchMetadata, LauncherSolution};
pub use pair::{liquidity_asset_id, PairPuzzle, PairSolution, ReserveCoins};
pub use puzzle::*;
pub use reserve::ReserveSolution;
pub use router::{RouterPuzzle, RouterSolution};
pub use settlement::{settlement_puzzle_hash, NotarizedPayment, Payment, SettlementSolution};
pub use singleton::{lineage_proof_for_spend, SingletonSolution};
pub use standard::StandardSolution;

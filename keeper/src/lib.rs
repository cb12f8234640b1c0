//! Coinpair keeper
//!
//! Off-chain side of the pair contracts: reconstructs pair and router state
//! from the ledger, locates reserves, prices offers and builds the bundles
//! that settle them.

pub mod config;
pub mod error;
pub mod genesis;
pub mod ledger;
pub mod mempool;
pub mod offer;
pub mod offer_builder;
pub mod offer_queue;
pub mod reserves;
pub mod settler;
pub mod sync;
pub mod tx_builder;

pub use error::{SettleError, SettleResult};
pub use ledger::{CoinRecord, LedgerClient, LedgerError, MemoryLedger, Rejection, SubmitOutcome};
pub use offer::{Offer, OfferIntent};
pub use offer_builder::{OfferBuilder, WalletCoin};
pub use reserves::{locate_reserves, PairReserves, ReserveCoin};
pub use settler::Settler;
pub use sync::{PairSnapshot, RouterSnapshot, SingletonSnapshot};
pub use tx_builder::{build_settlement, Settlement};

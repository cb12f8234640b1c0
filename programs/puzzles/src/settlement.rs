//! Settlement coins: the meeting point of an offer and its counterparty
//!
//! Anyone may spend a settlement coin. Each notarized payment it makes is
//! announced under the settlement puzzle hash, which is what an offer
//! asserts to make sure it gets paid.

use coinpair_common::{sha256, Asset, Bytes32, Condition, Program};
use serde::{Deserialize, Serialize};

use crate::error::PuzzleResult;
use crate::puzzle::{curry_hash, Puzzle};
use crate::standard::check_wallet_condition;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub puzzle_hash: Bytes32,
    pub amount: u64,
}

/// Payments bound to the nonce of the offer that requested them
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarizedPayment {
    pub nonce: Bytes32,
    pub payments: Vec<Payment>,
}

impl NotarizedPayment {
    /// Announcement message for this payment set
    pub fn message(&self) -> Bytes32 {
        let mut parts: Vec<Vec<u8>> = vec![self.nonce.as_bytes().to_vec()];
        for p in &self.payments {
            parts.push(p.puzzle_hash.as_bytes().to_vec());
            parts.push(p.amount.to_be_bytes().to_vec());
        }
        let refs: Vec<&[u8]> = parts.iter().map(|p| p.as_slice()).collect();
        sha256(&refs)
    }

    pub fn total(&self) -> u64 {
        self.payments
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.amount))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSolution {
    pub notarized_payments: Vec<NotarizedPayment>,
}

pub fn puzzle_hash() -> Bytes32 {
    curry_hash(b"settlement", &[])
}

/// Puzzle hash of settlement coins holding `asset`
pub fn settlement_puzzle_hash(asset: Asset) -> Bytes32 {
    Puzzle::for_asset(asset, Puzzle::Settlement).puzzle_hash()
}

pub(crate) fn run(solution: &Program) -> PuzzleResult<Vec<Condition>> {
    let solution: SettlementSolution = solution.to_value()?;

    let mut conditions = Vec::new();
    for np in &solution.notarized_payments {
        conditions.push(Condition::CreatePuzzleAnnouncement { message: np.message() });
        for p in &np.payments {
            conditions.push(Condition::create_coin(p.puzzle_hash, p.amount, Asset::Native));
        }
    }

    for condition in &conditions {
        check_wallet_condition(condition, "settlement")?;
    }
    Ok(conditions)
}

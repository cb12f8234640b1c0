//! Assets and the conditions a spend can emit

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bytes::{sha256, Bytes32};

/// What a coin's amount is denominated in.
///
/// Every coin's amount also counts as native units, so a token coin of
/// amount `n` carries `n` native units alongside `n` tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Asset {
    Native,
    Token(Bytes32),
}

impl Asset {
    pub fn token_id(&self) -> Option<Bytes32> {
        match self {
            Asset::Native => None,
            Asset::Token(id) => Some(*id),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => write!(f, "native"),
            Asset::Token(id) => write!(f, "token:{}", id),
        }
    }
}

/// Output of running a puzzle against its solution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    CreateCoin {
        puzzle_hash: Bytes32,
        amount: u64,
        asset: Asset,
    },
    CreateCoinAnnouncement {
        message: Bytes32,
    },
    AssertCoinAnnouncement {
        announcement_id: Bytes32,
    },
    CreatePuzzleAnnouncement {
        message: Bytes32,
    },
    AssertPuzzleAnnouncement {
        announcement_id: Bytes32,
    },
    /// Valid only if `coin_id` is spent in the same bundle
    AssertConcurrentSpend {
        coin_id: Bytes32,
    },
    MintToken {
        asset_id: Bytes32,
        amount: u64,
    },
    BurnToken {
        asset_id: Bytes32,
        amount: u64,
    },
    /// Emitted by a singleton's inner puzzle; the singleton layer turns it
    /// into the successor coin
    RecreateSelf {
        inner_puzzle_hash: Bytes32,
    },
}

impl Condition {
    pub fn create_coin(puzzle_hash: Bytes32, amount: u64, asset: Asset) -> Self {
        Condition::CreateCoin {
            puzzle_hash,
            amount,
            asset,
        }
    }
}

/// Id of an announcement made by coin `coin_id`
pub fn coin_announcement_id(coin_id: &Bytes32, message: &Bytes32) -> Bytes32 {
    sha256(&[coin_id.as_bytes(), message.as_bytes()])
}

/// Id of an announcement made by any coin with puzzle hash `puzzle_hash`
pub fn puzzle_announcement_id(puzzle_hash: &Bytes32, message: &Bytes32) -> Bytes32 {
    sha256(&[puzzle_hash.as_bytes(), message.as_bytes()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announcement_id_binds_source_and_message() {
        let source = Bytes32::new([1u8; 32]);
        let message = Bytes32::new([2u8; 32]);
        assert_eq!(
            puzzle_announcement_id(&source, &message),
            sha256(&[source.as_bytes(), message.as_bytes()])
        );
        assert_ne!(
            coin_announcement_id(&source, &message),
            coin_announcement_id(&message, &source)
        );
    }

    #[test]
    fn test_asset_ordering_puts_native_first() {
        let token = Asset::Token(Bytes32::zero());
        assert!(Asset::Native < token);
        assert_eq!(token.token_id(), Some(Bytes32::zero()));
        assert_eq!(Asset::Native.token_id(), None);
    }
}

//! Token layer
//!
//! Wraps a native-style inner puzzle so that the coins it creates stay
//! denominated in the same token and locked under the same layer.

use coinpair_common::{Asset, Bytes32, Coin, Condition, Program};

use crate::error::{PuzzleError, PuzzleResult};
use crate::puzzle::{curry_hash, Puzzle};

pub fn puzzle_hash(asset_id: &Bytes32, inner_puzzle_hash: &Bytes32) -> Bytes32 {
    curry_hash(b"token", &[asset_id.as_bytes(), inner_puzzle_hash.as_bytes()])
}

pub(crate) fn run(
    asset_id: &Bytes32,
    inner: &Puzzle,
    coin: &Coin,
    solution: &Program,
) -> PuzzleResult<Vec<Condition>> {
    match inner {
        Puzzle::Standard { .. } | Puzzle::Settlement | Puzzle::Reserve { .. } => {}
        _ => return Err(PuzzleError::NotSpendable("token inner")),
    }

    let conditions = inner.run(coin, solution)?;
    Ok(conditions
        .into_iter()
        .map(|c| match c {
            Condition::CreateCoin {
                puzzle_hash: inner_hash,
                amount,
                ..
            } => Condition::create_coin(
                puzzle_hash(asset_id, &inner_hash),
                amount,
                Asset::Token(*asset_id),
            ),
            other => other,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standard::StandardSolution;

    #[test]
    fn test_token_layer_rewraps_outputs() {
        let asset_id = Bytes32::new([8u8; 32]);
        let owner = Puzzle::standard(Bytes32::new([1u8; 32]));
        let puzzle = Puzzle::token(asset_id, owner.clone());
        let coin = Coin::new(Bytes32::zero(), puzzle.puzzle_hash(), 100);

        let recipient = Bytes32::new([2u8; 32]);
        let solution = Program::from_value(&StandardSolution {
            conditions: vec![Condition::create_coin(recipient, 100, Asset::Native)],
        })
        .unwrap();

        let conditions = puzzle.run(&coin, &solution).unwrap();
        assert_eq!(
            conditions,
            vec![Condition::create_coin(
                puzzle_hash(&asset_id, &recipient),
                100,
                Asset::Token(asset_id)
            )]
        );
    }

    #[test]
    fn test_token_layer_rejects_nested_tokens() {
        let inner = Puzzle::token(Bytes32::new([1u8; 32]), Puzzle::Settlement);
        let puzzle = Puzzle::token(Bytes32::new([2u8; 32]), inner);
        let coin = Coin::new(Bytes32::zero(), puzzle.puzzle_hash(), 1);
        assert_eq!(
            puzzle.run(&coin, &Program::default()),
            Err(PuzzleError::NotSpendable("token inner"))
        );
    }
}

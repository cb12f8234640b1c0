//! Launching the router and new pairs

use coinpair_common::{
    coin_announcement_id, Asset, Bytes32, Coin, Condition, Program, SpendBundle, SINGLETON_AMOUNT,
};
use coinpair_puzzles::launcher::puzzle_hash as launcher_puzzle_hash;
use coinpair_puzzles::{
    make_spend, LaunchMetadata, LauncherSolution, PairPuzzle, Puzzle, PuzzleError, RouterPuzzle, RouterSolution,
    SingletonSolution, StandardSolution,
};

use crate::error::{SettleError, SettleResult};
use crate::offer_builder::WalletCoin;
use crate::sync::RouterSnapshot;

fn check_funding(funding: &WalletCoin, needed: u64) -> SettleResult<()> {
    if funding.asset != Asset::Native || funding.coin.amount < needed {
        return Err(SettleError::UnsupportedOffer(format!(
            "funding coin {} must be native and hold at least {}",
            funding.coin.coin_id(),
            needed
        )));
    }
    Ok(())
}

/// Bundle launching a new router from `funding`; returns it with the router's launcher id.
///
/// The funding coin creates the launcher and asserts the launcher's
/// announcement, so the launch cannot be redirected.
pub fn launch_router(funding: &WalletCoin) -> SettleResult<(SpendBundle, Bytes32)> {
    check_funding(funding, SINGLETON_AMOUNT)?;

    let launcher = Coin::new(funding.coin.coin_id(), launcher_puzzle_hash(), SINGLETON_AMOUNT);
    let launcher_id = launcher.coin_id();

    let eve = RouterPuzzle::default().full_puzzle(launcher_id);
    let solution = LauncherSolution {
        singleton_puzzle_hash: eve.puzzle_hash(),
        amount: SINGLETON_AMOUNT,
        metadata: LaunchMetadata::Router,
    };
    let message = solution.message()?;

    let mut conditions = vec![
        Condition::create_coin(launcher_puzzle_hash(), SINGLETON_AMOUNT, Asset::Native),
        Condition::AssertCoinAnnouncement {
            announcement_id: coin_announcement_id(&launcher_id, &message),
        },
    ];
    let change = funding.coin.amount - SINGLETON_AMOUNT;
    if change > 0 {
        conditions.push(Condition::create_coin(
            Puzzle::standard(funding.owner).puzzle_hash(),
            change,
            Asset::Native,
        ));
    }

    let bundle = SpendBundle::new(
        vec![
            make_spend(funding.coin, &funding.puzzle(), &StandardSolution { conditions })?,
            make_spend(launcher, &Puzzle::Launcher, &solution)?,
        ],
        vec![],
    );

    log::info!("Launching router {}", launcher_id);
    Ok((bundle, launcher_id))
}

/// Bundle registering `token_id` with the router and launching its pair.
///
/// `funding` pays for the pair's launcher coin. Returns the bundle and the
/// new pair's launcher id.
pub fn create_pair(
    router: &RouterSnapshot,
    token_id: Bytes32,
    funding: &WalletCoin,
) -> SettleResult<(SpendBundle, Bytes32)> {
    if let Some(existing) = router.find_pair(&token_id) {
        return Err(SettleError::PairExists {
            token_id,
            pair_launcher_id: existing,
        });
    }
    check_funding(funding, SINGLETON_AMOUNT)?;

    let router_spend = make_spend(
        router.coin,
        &router.inner.full_puzzle(router.launcher_id),
        &SingletonSolution {
            lineage_proof: router.lineage_proof,
            inner_solution: Program::from_value(&RouterSolution { token_id }).map_err(PuzzleError::from)?,
        },
    )?;

    let pair_launcher = RouterPuzzle::pair_launcher_coin(router.coin.coin_id());
    let pair_launcher_id = pair_launcher.coin_id();
    let eve = PairPuzzle::genesis(pair_launcher_id, token_id);
    let launcher_spend = make_spend(
        pair_launcher,
        &Puzzle::Launcher,
        &LauncherSolution {
            singleton_puzzle_hash: eve.puzzle_hash(),
            amount: SINGLETON_AMOUNT,
            metadata: LaunchMetadata::Pair { token_id },
        },
    )?;

    let mut conditions = vec![Condition::AssertConcurrentSpend {
        coin_id: router.coin.coin_id(),
    }];
    let change = funding.coin.amount - SINGLETON_AMOUNT;
    if change > 0 {
        conditions.push(Condition::create_coin(
            Puzzle::standard(funding.owner).puzzle_hash(),
            change,
            Asset::Native,
        ));
    }
    let funding_spend = make_spend(funding.coin, &funding.puzzle(), &StandardSolution { conditions })?;

    let created = SpendBundle::new(vec![router_spend, launcher_spend, funding_spend], vec![]);
    let bundle = SpendBundle::aggregate(router.pending.iter().chain(std::iter::once(&created)));

    log::info!(
        "Creating pair {} for token {} (router {})",
        pair_launcher_id,
        token_id,
        router.launcher_id
    );
    Ok((bundle, pair_launcher_id))
}

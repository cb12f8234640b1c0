//! In-memory ledger
//!
//! Validates bundles with the same contract interpreter the chain would use
//! and keeps coin records, spends and a mempool. Used for local runs of the
//! keeper (backed by a JSON snapshot) and by tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use coinpair_common::{
    coin_announcement_id, puzzle_announcement_id, sha256, Asset, Bytes32, Coin, CoinSpend, Condition,
    SpendBundle,
};
use coinpair_puzzles::{run_spend, PuzzleError};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{CoinRecord, LedgerClient, LedgerError, Rejection, SubmitOutcome};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct LedgerState {
    height: u32,
    /// Counter making farmed coins unique
    farmed: u64,
    coins: HashMap<Bytes32, CoinRecord>,
    spends: HashMap<Bytes32, CoinSpend>,
    children: HashMap<Bytes32, Vec<Bytes32>>,
    mempool: Vec<SpendBundle>,
}

/// What confirming a bundle changes
struct BundleEffects {
    removals: Vec<CoinSpend>,
    additions: Vec<(Coin, Asset)>,
}

impl LedgerState {
    fn insert_coin(&mut self, coin: Coin, asset: Asset, height: u32) {
        let coin_id = coin.coin_id();
        self.children.entry(coin.parent_coin_info).or_default().push(coin_id);
        self.coins.insert(
            coin_id,
            CoinRecord {
                coin,
                asset,
                confirmed_height: height,
                spent_height: None,
            },
        );
    }

    fn check_bundle(&self, bundle: &SpendBundle) -> Result<BundleEffects, Rejection> {
        if bundle.coin_spends.is_empty() {
            return Err(Rejection::Empty);
        }

        let mut removal_ids = HashSet::new();
        for cs in &bundle.coin_spends {
            let coin_id = cs.coin.coin_id();
            if !removal_ids.insert(coin_id) {
                return Err(Rejection::DuplicateSpend { coin_id });
            }
            if self.coins.get(&coin_id).map_or(false, |r| r.is_spent()) {
                return Err(Rejection::DoubleSpend { coin_id });
            }
        }

        let mut additions: Vec<(Coin, Asset)> = Vec::new();
        let mut addition_assets: HashMap<Bytes32, Asset> = HashMap::new();
        let mut announcements = HashSet::new();
        let mut asserted = Vec::new();
        let mut concurrent = Vec::new();
        let mut supply_delta: BTreeMap<Bytes32, i128> = BTreeMap::new();
        let mut spent: Vec<(Coin, Asset)> = Vec::new();

        for cs in &bundle.coin_spends {
            let coin_id = cs.coin.coin_id();
            let (puzzle, conditions) =
                run_spend(cs).map_err(|error| Rejection::Puzzle { coin_id, error })?;
            spent.push((cs.coin, puzzle.asset()));

            for condition in conditions {
                match condition {
                    Condition::CreateCoin {
                        puzzle_hash,
                        amount,
                        asset,
                    } => {
                        let coin = Coin::new(coin_id, puzzle_hash, amount);
                        let id = coin.coin_id();
                        if addition_assets.insert(id, asset).is_some() || self.coins.contains_key(&id) {
                            return Err(Rejection::DuplicateOutput { coin_id: id });
                        }
                        additions.push((coin, asset));
                    }
                    Condition::CreateCoinAnnouncement { message } => {
                        announcements.insert(coin_announcement_id(&coin_id, &message));
                    }
                    Condition::CreatePuzzleAnnouncement { message } => {
                        announcements.insert(puzzle_announcement_id(&cs.coin.puzzle_hash, &message));
                    }
                    Condition::AssertCoinAnnouncement { announcement_id }
                    | Condition::AssertPuzzleAnnouncement { announcement_id } => asserted.push(announcement_id),
                    Condition::AssertConcurrentSpend { coin_id } => concurrent.push(coin_id),
                    Condition::MintToken { asset_id, amount } => {
                        *supply_delta.entry(asset_id).or_default() += amount as i128;
                    }
                    Condition::BurnToken { asset_id, amount } => {
                        *supply_delta.entry(asset_id).or_default() -= amount as i128;
                    }
                    Condition::RecreateSelf { .. } => {
                        return Err(Rejection::Puzzle {
                            coin_id,
                            error: PuzzleError::RestrictedCondition("top-level"),
                        })
                    }
                }
            }
        }

        let mut native_in: u128 = 0;
        let mut token_in: BTreeMap<Bytes32, i128> = BTreeMap::new();
        for (coin, revealed) in &spent {
            let coin_id = coin.coin_id();
            let held = match self.coins.get(&coin_id) {
                Some(record) => record.asset,
                None => *addition_assets
                    .get(&coin_id)
                    .ok_or(Rejection::UnknownCoin { coin_id })?,
            };
            if held != *revealed {
                return Err(Rejection::AssetMismatch {
                    coin_id,
                    held,
                    revealed: *revealed,
                });
            }

            native_in += coin.amount as u128;
            if let Asset::Token(asset_id) = held {
                *token_in.entry(asset_id).or_default() += coin.amount as i128;
            }
        }

        for announcement_id in asserted {
            if !announcements.contains(&announcement_id) {
                return Err(Rejection::MissingAnnouncement { announcement_id });
            }
        }
        for coin_id in concurrent {
            if !removal_ids.contains(&coin_id) {
                return Err(Rejection::MissingConcurrentSpend { coin_id });
            }
        }

        let native_out: u128 = additions.iter().map(|(c, _)| c.amount as u128).sum();
        if native_out > native_in {
            return Err(Rejection::NativeDeficit {
                inputs: native_in,
                outputs: native_out,
            });
        }

        let mut token_out: BTreeMap<Bytes32, i128> = BTreeMap::new();
        for (coin, asset) in &additions {
            if let Asset::Token(asset_id) = asset {
                *token_out.entry(*asset_id).or_default() += coin.amount as i128;
            }
        }
        let assets: HashSet<Bytes32> = token_in
            .keys()
            .chain(token_out.keys())
            .chain(supply_delta.keys())
            .copied()
            .collect();
        for asset_id in assets {
            let inputs = token_in.get(&asset_id).copied().unwrap_or(0)
                + supply_delta.get(&asset_id).copied().unwrap_or(0);
            let outputs = token_out.get(&asset_id).copied().unwrap_or(0);
            if inputs != outputs {
                return Err(Rejection::TokenImbalance {
                    asset_id,
                    inputs,
                    outputs,
                });
            }
        }

        Ok(BundleEffects {
            removals: bundle.coin_spends.clone(),
            additions,
        })
    }

    fn apply(&mut self, effects: BundleEffects, height: u32) {
        // Additions first so ephemeral coins exist before they are marked spent
        for (coin, asset) in effects.additions {
            self.insert_coin(coin, asset, height);
        }
        for spend in effects.removals {
            let coin_id = spend.coin.coin_id();
            if let Some(record) = self.coins.get_mut(&coin_id) {
                record.spent_height = Some(height);
            }
            self.spends.insert(coin_id, spend);
        }
    }
}

/// Ledger held entirely in memory
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
    /// Confirm every accepted bundle immediately instead of queueing it
    auto_farm: bool,
}

impl MemoryLedger {
    /// Ledger that confirms each accepted bundle in its own block
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            auto_farm: true,
        }
    }

    /// Ledger that keeps accepted bundles in a mempool until [`Self::farm_block`]
    pub fn with_mempool() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            auto_farm: false,
        }
    }

    pub async fn height(&self) -> u32 {
        self.state.read().await.height
    }

    pub async fn mempool_len(&self) -> usize {
        self.state.read().await.mempool.len()
    }

    /// Create a coin out of nothing, as a block reward would
    pub async fn create_coin(&self, puzzle_hash: Bytes32, amount: u64, asset: Asset) -> Coin {
        let mut state = self.state.write().await;
        state.farmed += 1;
        let parent = sha256(&[b"farm", &state.farmed.to_be_bytes()]);
        let coin = Coin::new(parent, puzzle_hash, amount);
        let height = state.height;
        state.insert_coin(coin, asset, height);
        coin
    }

    /// Confirm every mempool item that is still valid; returns how many were confirmed
    pub async fn farm_block(&self) -> usize {
        let mut state = self.state.write().await;
        let pending = std::mem::take(&mut state.mempool);
        state.height += 1;
        let height = state.height;

        let mut confirmed = 0;
        for bundle in pending {
            match state.check_bundle(&bundle) {
                Ok(effects) => {
                    state.apply(effects, height);
                    confirmed += 1;
                }
                Err(rejection) => {
                    log::warn!("Dropping mempool item {}: {}", bundle.name(), rejection);
                }
            }
        }

        log::debug!("Farmed block {} with {} bundles", height, confirmed);
        confirmed
    }

    /// Unspent coins locked with `puzzle_hash`
    pub async fn unspent_coins(&self, puzzle_hash: &Bytes32) -> Vec<CoinRecord> {
        let state = self.state.read().await;
        let mut records: Vec<CoinRecord> = state
            .coins
            .values()
            .filter(|r| r.coin.puzzle_hash == *puzzle_hash && !r.is_spent())
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.confirmed_height, r.coin.coin_id()));
        records
    }

    /// Total amount of unspent coins locked with `puzzle_hash`
    pub async fn balance(&self, puzzle_hash: &Bytes32) -> u64 {
        self.unspent_coins(puzzle_hash).await.iter().map(|r| r.coin.amount).sum()
    }

    /// Write the full ledger state as JSON
    pub async fn save_snapshot(&self, path: &Path) -> Result<(), LedgerError> {
        let state = self.state.read().await;
        let json = serde_json::to_string_pretty(&*state).map_err(|e| LedgerError::Snapshot(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| LedgerError::Snapshot(format!("failed to write {}: {}", path.display(), e)))
    }

    /// Load a ledger previously written with [`Self::save_snapshot`]
    pub fn load_snapshot(path: &Path, auto_farm: bool) -> Result<Self, LedgerError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Snapshot(format!("failed to read {}: {}", path.display(), e)))?;
        let state: LedgerState =
            serde_json::from_str(&json).map_err(|e| LedgerError::Snapshot(e.to_string()))?;
        Ok(Self {
            state: RwLock::new(state),
            auto_farm,
        })
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn get_coin_record(&self, coin_id: &Bytes32) -> Result<Option<CoinRecord>, LedgerError> {
        Ok(self.state.read().await.coins.get(coin_id).cloned())
    }

    async fn get_coin_spend(&self, coin_id: &Bytes32) -> Result<Option<CoinSpend>, LedgerError> {
        Ok(self.state.read().await.spends.get(coin_id).cloned())
    }

    async fn get_coin_records_by_parent(&self, parent_id: &Bytes32) -> Result<Vec<CoinRecord>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .children
            .get(parent_id)
            .map(|ids| ids.iter().filter_map(|id| state.coins.get(id).cloned()).collect())
            .unwrap_or_default())
    }

    async fn get_all_mempool_items(&self) -> Result<Vec<SpendBundle>, LedgerError> {
        Ok(self.state.read().await.mempool.clone())
    }

    async fn submit_transaction(&self, bundle: &SpendBundle) -> Result<SubmitOutcome, LedgerError> {
        let mut state = self.state.write().await;

        let effects = match state.check_bundle(bundle) {
            Ok(effects) => effects,
            Err(rejection) => {
                log::debug!("Rejected bundle {}: {}", bundle.name(), rejection);
                return Ok(SubmitOutcome::Rejected(rejection));
            }
        };
        let bundle_name = bundle.name();

        if self.auto_farm {
            state.height += 1;
            let height = state.height;
            state.apply(effects, height);
            return Ok(SubmitOutcome::Accepted { bundle_name });
        }

        // A pending item may only be replaced by a bundle that contains all of it
        let removals: HashSet<Bytes32> = bundle.removals().into_iter().collect();
        let mut replaced = Vec::new();
        for (index, item) in state.mempool.iter().enumerate() {
            if let Some(coin_id) = item.removals().into_iter().find(|id| removals.contains(id)) {
                let superset = item.coin_spends.iter().all(|cs| bundle.coin_spends.contains(cs));
                if !superset {
                    return Ok(SubmitOutcome::Rejected(Rejection::DoubleSpend { coin_id }));
                }
                replaced.push(index);
            }
        }
        for index in replaced.into_iter().rev() {
            let item = state.mempool.remove(index);
            log::debug!("Bundle {} replaces mempool item {}", bundle_name, item.name());
        }
        state.mempool.push(bundle.clone());

        Ok(SubmitOutcome::Accepted { bundle_name })
    }
}

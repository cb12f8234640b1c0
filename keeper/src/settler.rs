//! Sync, build and submit against one ledger
//!
//! The settler is the keeper's entry point: every operation starts from a
//! fresh sync, so a rejected submission only needs a retry.

use std::sync::Arc;
use std::time::Duration;

use coinpair_common::{Bytes32, SpendBundle};

use crate::error::{SettleError, SettleResult};
use crate::genesis;
use crate::ledger::{LedgerClient, Rejection, SubmitOutcome};
use crate::mempool::MempoolLocator;
use crate::offer::Offer;
use crate::offer_builder::WalletCoin;
use crate::sync::{self, PairSnapshot, RouterSnapshot};
use crate::tx_builder::{build_settlement, Settlement};

pub struct Settler<L> {
    ledger: Arc<L>,
    mempool: Option<MempoolLocator<L>>,
}

impl<L: LedgerClient> Settler<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger, mempool: None }
    }

    /// Settler that chains new transitions onto pending mempool spends
    pub fn with_mempool(ledger: Arc<L>, cache_ttl: Duration) -> Self {
        let mempool = MempoolLocator::new(ledger.clone(), cache_ttl);
        Self {
            ledger,
            mempool: Some(mempool),
        }
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub async fn sync_pair(&self, launcher_id: Bytes32) -> SettleResult<PairSnapshot> {
        sync::sync_pair(self.ledger.as_ref(), self.mempool.as_ref(), launcher_id, None).await
    }

    pub async fn sync_pairs(&self, launcher_ids: &[Bytes32]) -> Vec<(Bytes32, SettleResult<PairSnapshot>)> {
        sync::sync_pairs(self.ledger.as_ref(), self.mempool.as_ref(), launcher_ids).await
    }

    pub async fn sync_router(&self, launcher_id: Bytes32) -> SettleResult<RouterSnapshot> {
        sync::sync_router(self.ledger.as_ref(), self.mempool.as_ref(), launcher_id).await
    }

    /// Submit a bundle; a conflict with another spend surfaces as `StaleReference`
    pub async fn submit(&self, bundle: &SpendBundle) -> SettleResult<Bytes32> {
        match self.ledger.submit_transaction(bundle).await? {
            SubmitOutcome::Accepted { bundle_name } => {
                if let Some(mempool) = &self.mempool {
                    mempool.invalidate().await;
                }
                Ok(bundle_name)
            }
            SubmitOutcome::Rejected(Rejection::DoubleSpend { coin_id }) => {
                log::warn!("Bundle {} lost a race for coin {}", bundle.name(), coin_id);
                Err(SettleError::StaleReference { coin_id })
            }
            SubmitOutcome::Rejected(rejection) => Err(SettleError::Rejected(rejection)),
        }
    }

    /// Build the settlement for `offer` against a freshly synced pair
    pub async fn prepare(&self, pair_launcher_id: Bytes32, offer: &Offer) -> SettleResult<Settlement> {
        let snapshot = self.sync_pair(pair_launcher_id).await?;
        build_settlement(&snapshot, offer)
    }

    /// Sync the pair, settle `offer` against it and submit the result
    pub async fn settle(&self, pair_launcher_id: Bytes32, offer: &Offer) -> SettleResult<Settlement> {
        let settlement = self.prepare(pair_launcher_id, offer).await?;
        let bundle_name = self.submit(&settlement.bundle).await?;

        log::info!(
            "Settled {:?} on pair {} in bundle {}: state {}",
            settlement.intent,
            pair_launcher_id,
            bundle_name,
            settlement.transition.after
        );
        Ok(settlement)
    }

    /// Launch a router funded by `funding`; returns its launcher id
    pub async fn launch_router(&self, funding: &WalletCoin) -> SettleResult<Bytes32> {
        let (bundle, launcher_id) = genesis::launch_router(funding)?;
        self.submit(&bundle).await?;
        Ok(launcher_id)
    }

    /// Register `token_id` with the router and launch its pair; returns the pair's launcher id
    pub async fn create_pair(
        &self,
        router_launcher_id: Bytes32,
        token_id: Bytes32,
        funding: &WalletCoin,
    ) -> SettleResult<Bytes32> {
        let router = self.sync_router(router_launcher_id).await?;
        let (bundle, pair_launcher_id) = genesis::create_pair(&router, token_id, funding)?;
        self.submit(&bundle).await?;
        Ok(pair_launcher_id)
    }

    /// Pair registered for `token_id` under the router, if any
    pub async fn find_pair(&self, router_launcher_id: Bytes32, token_id: &Bytes32) -> SettleResult<Option<Bytes32>> {
        Ok(self.sync_router(router_launcher_id).await?.find_pair(token_id))
    }
}

//! Mempool locator
//!
//! Lets a new transition build on a pair coin that a pending bundle has
//! already spent. Mempool snapshots are cached for a short TTL so syncing
//! many pairs in one round costs one fetch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use coinpair_common::{Bytes32, CoinSpend, SpendBundle};
use tokio::sync::RwLock;

use crate::ledger::{LedgerClient, LedgerError};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10);

struct CachedItems {
    items: Vec<SpendBundle>,
    fetched_at: Instant,
}

pub struct MempoolLocator<L> {
    ledger: Arc<L>,
    ttl: Duration,
    cache: RwLock<Option<CachedItems>>,
}

impl<L: LedgerClient> MempoolLocator<L> {
    pub fn new(ledger: Arc<L>, ttl: Duration) -> Self {
        Self {
            ledger,
            ttl,
            cache: RwLock::new(None),
        }
    }

    /// Pending bundles, from cache if still fresh
    pub async fn items(&self) -> Result<Vec<SpendBundle>, LedgerError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    return Ok(cached.items.clone());
                }
            }
        }

        let items = self.ledger.get_all_mempool_items().await?;
        log::debug!("Fetched {} mempool items", items.len());

        *self.cache.write().await = Some(CachedItems {
            items: items.clone(),
            fetched_at: Instant::now(),
        });
        Ok(items)
    }

    /// Pending bundle spending a coin whose parent is `parent_id`
    pub async fn find_by_parent(
        &self,
        parent_id: &Bytes32,
    ) -> Result<Option<(SpendBundle, CoinSpend)>, LedgerError> {
        Ok(self.items().await?.into_iter().find_map(|bundle| {
            let spend = bundle
                .coin_spends
                .iter()
                .find(|cs| cs.coin.parent_coin_info == *parent_id)
                .cloned()?;
            Some((bundle, spend))
        }))
    }

    /// Pending bundle spending `coin_id`
    pub async fn find_spend_of(&self, coin_id: &Bytes32) -> Result<Option<(SpendBundle, CoinSpend)>, LedgerError> {
        Ok(self.items().await?.into_iter().find_map(|bundle| {
            let spend = bundle.spend_of(coin_id).cloned()?;
            Some((bundle, spend))
        }))
    }

    /// Drop the cached snapshot; the next lookup refetches
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }
}

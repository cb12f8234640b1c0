//! Coinpair Keeper
//!
//! Off-chain service that keeps pair state in sync and settles offers
//! dropped into its inbox against the matching pair.

use anyhow::{Context, Result};
use coinpair_common::Bytes32;
use coinpair_keeper::config::Config;
use coinpair_keeper::ledger::MemoryLedger;
use coinpair_keeper::offer_queue::{mark_rejected, OfferQueue};
use coinpair_keeper::{Offer, SettleError, Settler};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Coinpair Keeper");

    // Load configuration
    let config = Config::load().unwrap_or_else(|_| {
        log::warn!("Failed to load config, using default local config");
        Config::default_local()
    });

    let offer_dir = config.offer_dir_path();
    std::fs::create_dir_all(&offer_dir)
        .context(format!("Failed to create offer inbox {}", offer_dir.display()))?;
    if let Some(parent) = config.ledger_snapshot_path().parent() {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create snapshot directory {}", parent.display()))?;
    }

    log::info!("Ledger snapshot: {}", config.ledger_snapshot_path().display());
    log::info!("Offer inbox: {}", offer_dir.display());
    if let Some(router) = config.router_launcher_id {
        log::info!("Following router {}", router);
    }

    let mut queue = OfferQueue::new();

    // Main event loop
    let mut interval = time::interval(Duration::from_secs(config.poll_interval_secs.max(1)));

    loop {
        interval.tick().await;

        if let Err(e) = run_round(&config, &mut queue).await {
            log::error!("Error in keeper round: {:#}", e);
        }

        if !queue.is_empty() {
            log::debug!("Offers still queued: {}", queue.len());
        }
    }
}

/// Load the ledger, sync every pair and settle whatever is in the inbox
async fn run_round(config: &Config, queue: &mut OfferQueue) -> Result<()> {
    let ledger = Arc::new(load_ledger(config)?);
    let settler = if config.use_mempool {
        Settler::with_mempool(ledger.clone(), config.mempool_cache_ttl())
    } else {
        Settler::new(ledger.clone())
    };

    let pairs = known_pairs(&settler, config).await;
    let mut pair_for_asset: HashMap<Bytes32, Bytes32> = HashMap::new();
    for (launcher_id, result) in settler.sync_pairs(&pairs).await {
        match result {
            Ok(snapshot) => {
                log::info!(
                    "Pair {} (token {}): {}{}",
                    launcher_id,
                    snapshot.token_id(),
                    snapshot.state(),
                    if snapshot.is_pending() { " [pending]" } else { "" }
                );
                pair_for_asset.insert(snapshot.token_id(), launcher_id);
                pair_for_asset.insert(snapshot.inner.liquidity_asset_id(), launcher_id);
            }
            Err(e) => log::warn!("Failed to sync pair {}: {}", launcher_id, e),
        }
    }

    let added = queue
        .scan_inbox(&config.offer_dir_path())
        .context("Failed to scan offer inbox")?;
    if added > 0 {
        log::info!("Found {} new offers", added);
    }

    let mut settled = 0;
    let mut retry = Vec::new();
    while let Some(pending) = queue.pop() {
        match settle_offer_file(&settler, &pair_for_asset, &pending.path).await {
            Ok(()) => {
                settled += 1;
                std::fs::remove_file(&pending.path)
                    .context(format!("Failed to remove settled offer {}", pending.path.display()))?;
            }
            Err(e) if e.is_stale() => {
                log::info!("Offer {} raced another spend, retrying next round", pending.path.display());
                retry.push(pending);
            }
            Err(e) => {
                log::warn!("Rejected offer {}: {}", pending.path.display(), e);
                let moved = mark_rejected(&pending.path)
                    .context(format!("Failed to move rejected offer {}", pending.path.display()))?;
                log::debug!("Moved to {}", moved.display());
            }
        }
    }
    for pending in retry {
        queue.push(pending);
    }

    if config.use_mempool {
        let confirmed = ledger.farm_block().await;
        log::debug!("Confirmed {} pending bundles", confirmed);
    }

    if settled > 0 || config.use_mempool {
        ledger
            .save_snapshot(&config.ledger_snapshot_path())
            .await
            .context("Failed to persist ledger snapshot")?;
    }
    if settled > 0 {
        log::info!("Settled {} offers", settled);
    }

    Ok(())
}

/// Read, match and settle one offer file
async fn settle_offer_file(
    settler: &Settler<MemoryLedger>,
    pair_for_asset: &HashMap<Bytes32, Bytes32>,
    path: &Path,
) -> Result<(), SettleError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| SettleError::MalformedOffer(format!("unreadable offer file: {}", e)))?;
    let offer = Offer::decode(&text)?;

    let pair = offer
        .summary()?
        .keys()
        .filter_map(|asset| asset.token_id())
        .find_map(|id| pair_for_asset.get(&id).copied())
        .ok_or_else(|| SettleError::UnsupportedOffer("no known pair trades the offered assets".to_string()))?;

    settler.settle(pair, &offer).await?;
    Ok(())
}

/// Pairs from the config plus every pair registered with the router
async fn known_pairs(settler: &Settler<MemoryLedger>, config: &Config) -> Vec<Bytes32> {
    let mut pairs = config.pairs.clone();

    if let Some(router_id) = config.router_launcher_id {
        match settler.sync_router(router_id).await {
            Ok(router) => {
                log::info!("Router {} has {} pairs", router_id, router.inner.pair_count());
                pairs.extend(router.inner.pairs.values().copied());
            }
            Err(e) => log::warn!("Failed to sync router {}: {}", router_id, e),
        }
    }

    pairs.sort();
    pairs.dedup();
    pairs
}

/// Local ledger from its snapshot, or an empty one if none exists yet
fn load_ledger(config: &Config) -> Result<MemoryLedger> {
    let path = config.ledger_snapshot_path();
    if !path.exists() {
        log::warn!("No ledger snapshot at {}, starting empty", path.display());
        return Ok(if config.use_mempool {
            MemoryLedger::with_mempool()
        } else {
            MemoryLedger::new()
        });
    }

    MemoryLedger::load_snapshot(&path, !config.use_mempool)
        .context(format!("Failed to load ledger snapshot {}", path.display()))
}

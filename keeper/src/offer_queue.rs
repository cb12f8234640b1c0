//! Queue of offer files waiting to be settled (oldest first)

use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Extension of offer files in the inbox
pub const OFFER_EXTENSION: &str = "offer";

/// Extension given to offers that were refused
pub const REJECTED_EXTENSION: &str = "rejected";

/// An offer file found in the inbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOffer {
    pub path: PathBuf,
    /// Milliseconds since the epoch when the file was last written
    pub received_at: u64,
}

/// Arrival-ordered offer queue (min-heap on `received_at`)
pub struct OfferQueue {
    queue: PriorityQueue<PathBuf, Reverse<u64>>,
    /// Map for O(1) lookups
    map: HashMap<PathBuf, PendingOffer>,
}

impl OfferQueue {
    pub fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
            map: HashMap::new(),
        }
    }

    /// Push or update an offer
    pub fn push(&mut self, offer: PendingOffer) {
        let path = offer.path.clone();
        let received_at = offer.received_at;

        self.map.insert(path.clone(), offer);
        self.queue.push(path, Reverse(received_at));
    }

    /// Pop the oldest offer
    pub fn pop(&mut self) -> Option<PendingOffer> {
        let (path, _priority) = self.queue.pop()?;
        self.map.remove(&path)
    }

    pub fn peek(&self) -> Option<&PendingOffer> {
        let (path, _priority) = self.queue.peek()?;
        self.map.get(path)
    }

    pub fn remove(&mut self, path: &Path) -> Option<PendingOffer> {
        self.queue.remove(path);
        self.map.remove(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.map.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.map.clear();
    }

    /// Queue every `*.offer` file in `dir` not already queued; returns how many were added
    pub fn scan_inbox(&mut self, dir: &Path) -> std::io::Result<usize> {
        let mut added = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(OFFER_EXTENSION) || self.contains(&path) {
                continue;
            }

            let received_at = std::fs::metadata(&path)?
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);
            self.push(PendingOffer { path, received_at });
            added += 1;
        }
        Ok(added)
    }
}

impl Default for OfferQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Move a refused offer aside so it is not picked up again
pub fn mark_rejected(path: &Path) -> std::io::Result<PathBuf> {
    let target = path.with_extension(REJECTED_EXTENSION);
    std::fs::rename(path, &target)?;
    Ok(target)
}

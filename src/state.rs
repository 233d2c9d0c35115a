//! Blockchain synchronization state snapshot
//!
//! A `BlockchainState` is the single current view of how far the wallet has
//! synchronized with the chain. It is produced by the sync engine and
//! persisted as one replaceable row; there is no history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A condition that currently prevents synchronization from making progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Impediment {
    /// Device storage is unavailable or full
    Storage,
    /// No usable network connection
    Network,
}

impl fmt::Display for Impediment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Impediment::Storage => write!(f, "storage"),
            Impediment::Network => write!(f, "network"),
        }
    }
}

/// Snapshot of blockchain synchronization progress.
///
/// Heights beyond `best_chain_height` (chainlock, masternode list) are
/// carried through the store untouched; only `replaying` is ever corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainState {
    /// Timestamp of the best block on the local chain
    pub best_chain_date: DateTime<Utc>,
    /// Height of the best block on the local chain
    pub best_chain_height: u32,
    /// True while historical blocks are being rescanned (e.g. after a restore)
    pub replaying: bool,
    /// Conditions currently blocking sync progress
    pub impediments: BTreeSet<Impediment>,
    /// Height of the most recent chainlock
    pub chainlock_height: u32,
    /// Height at which the masternode list was last updated
    pub mnlist_height: u32,
    /// Sync completion percentage, 0-100
    pub percentage_sync: u32,
}

impl Default for BlockchainState {
    fn default() -> Self {
        Self {
            best_chain_date: DateTime::UNIX_EPOCH,
            best_chain_height: 0,
            replaying: false,
            impediments: BTreeSet::new(),
            chainlock_height: 0,
            mnlist_height: 0,
            percentage_sync: 0,
        }
    }
}

impl BlockchainState {
    /// Apply the single business rule of the store: a replay cannot still be
    /// in progress once sync has reached 100%.
    pub fn normalize(mut self) -> Self {
        if self.replaying && self.percentage_sync == 100 {
            self.replaying = false;
        }
        self
    }

    /// Fully caught up: sync complete and nothing blocking it.
    pub fn is_synced(&self) -> bool {
        self.percentage_sync == 100 && self.impediments.is_empty()
    }

    /// Whether anything currently blocks sync progress.
    pub fn is_impeded(&self) -> bool {
        !self.impediments.is_empty()
    }
}

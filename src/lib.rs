//! chainstate - persistent blockchain synchronization state for light wallets
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## State Management
//! - [`state`] - The `BlockchainState` snapshot and its normalization rule
//! - [`store`] - Single-slot persistence (SQLite) with sync, async, and
//!   observable read paths
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! An external sync engine pushes snapshots into the store with
//! [`store::StateStore::save`]; observers either read one-shot
//! ([`store::StateStore::load_sync`], [`store::SqliteStateStore::get`]) or
//! follow the live stream ([`store::StateStore::subscribe`]).

#![forbid(unsafe_code)]

// ============================================================================
// State Management
// ============================================================================
pub mod state;
pub mod store;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

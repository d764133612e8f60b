//! Persistence for the calculator's last-used inputs.
//!
//! The calculator only sees the [`SettingsStore`] trait: a flat namespace of
//! text keys and values. `clear` wipes the whole namespace, not just the
//! keys the calculator writes.

mod memory;
mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

pub use memory::MemorySettingsStore;
pub use sqlite::SqliteSettingsStore;

/// Keys written by the calculator.
pub mod keys {
    pub const DIRECTION: &str = "direction";
    pub const LEVERAGE: &str = "leverage";
    pub const CHANGE: &str = "change";
    pub const ENTRY: &str = "entry";
    pub const EXIT: &str = "exit";
}

/// Key-value store for persisted settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove every entry in the namespace.
    async fn clear(&self) -> Result<()>;

    /// All entries, sorted by key.
    async fn entries(&self) -> Result<Vec<(String, String)>>;
}

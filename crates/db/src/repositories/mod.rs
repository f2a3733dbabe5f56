use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use snapbill_core::analytics::BillTotal;
use snapbill_core::domain::bill::{Bill, SaleLine};
use snapbill_core::domain::inventory::{InventoryItem, ItemId};
use snapbill_core::domain::owner::OwnerId;

pub mod bill;
pub mod inventory;
pub mod memory;

pub use bill::SqlBillRepository;
pub use inventory::SqlInventoryRepository;
pub use memory::{InMemoryBillRepository, InMemoryInventoryRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Owner-scoped catalogue, in insertion order.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn list_for_owner(&self, owner: &OwnerId) -> Result<Vec<InventoryItem>, RepositoryError>;
    async fn find(
        &self,
        owner: &OwnerId,
        id: &ItemId,
    ) -> Result<Option<InventoryItem>, RepositoryError>;
    /// Inserts or replaces by `(owner, master id)`. Replacement keeps the
    /// item's original list position.
    async fn upsert(&self, item: InventoryItem) -> Result<(), RepositoryError>;
    async fn delete(&self, owner: &OwnerId, id: &ItemId) -> Result<bool, RepositoryError>;
    async fn count_for_owner(&self, owner: &OwnerId) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait BillRepository: Send + Sync {
    /// Writes the bill and all of its sale lines, or nothing.
    async fn commit(&self, bill: &Bill) -> Result<(), RepositoryError>;
    /// Newest first.
    async fn list_for_owner(
        &self,
        owner: &OwnerId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Bill>, RepositoryError>;
    async fn totals_since(
        &self,
        owner: &OwnerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<BillTotal>, RepositoryError>;
    /// Chronological, ties in insertion order.
    async fn sale_lines_since(
        &self,
        owner: &OwnerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<SaleLine>, RepositoryError>;
}

/// Fixed-width UTC text so lexical order matches chronological order.
pub fn encode_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp `{raw}`: {error}")))
}

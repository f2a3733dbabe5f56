use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use snapbill_core::analytics::BillTotal;
use snapbill_core::domain::bill::{Bill, SaleLine};
use snapbill_core::domain::inventory::{InventoryItem, ItemId};
use snapbill_core::domain::owner::OwnerId;

use super::{BillRepository, InventoryRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryInventoryRepository {
    items: RwLock<HashMap<String, Vec<InventoryItem>>>,
}

#[async_trait::async_trait]
impl InventoryRepository for InMemoryInventoryRepository {
    async fn list_for_owner(&self, owner: &OwnerId) -> Result<Vec<InventoryItem>, RepositoryError> {
        let items = self.items.read().await;
        Ok(items.get(owner.as_str()).cloned().unwrap_or_default())
    }

    async fn find(
        &self,
        owner: &OwnerId,
        id: &ItemId,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        let items = self.items.read().await;
        Ok(items
            .get(owner.as_str())
            .and_then(|owned| owned.iter().find(|item| &item.id == id))
            .cloned())
    }

    async fn upsert(&self, item: InventoryItem) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        let owned = items.entry(item.owner_id.0.clone()).or_default();
        match owned.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => owned.push(item),
        }
        Ok(())
    }

    async fn delete(&self, owner: &OwnerId, id: &ItemId) -> Result<bool, RepositoryError> {
        let mut items = self.items.write().await;
        let Some(owned) = items.get_mut(owner.as_str()) else {
            return Ok(false);
        };
        let before = owned.len();
        owned.retain(|item| &item.id != id);
        Ok(owned.len() != before)
    }

    async fn count_for_owner(&self, owner: &OwnerId) -> Result<u64, RepositoryError> {
        let items = self.items.read().await;
        Ok(items.get(owner.as_str()).map(|owned| owned.len() as u64).unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryBillRepository {
    state: RwLock<BillState>,
}

#[derive(Default)]
struct BillState {
    bills: Vec<Bill>,
    sale_lines: Vec<SaleLine>,
}

#[async_trait::async_trait]
impl BillRepository for InMemoryBillRepository {
    async fn commit(&self, bill: &Bill) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if state.bills.iter().any(|existing| existing.id == bill.id) {
            return Err(RepositoryError::Decode(format!("bill {} already exists", bill.id.0)));
        }
        state.sale_lines.extend(bill.sale_lines());
        state.bills.push(bill.clone());
        Ok(())
    }

    async fn list_for_owner(
        &self,
        owner: &OwnerId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Bill>, RepositoryError> {
        let state = self.state.read().await;
        let mut owned =
            state.bills.iter().enumerate().filter(|(_, bill)| &bill.owner_id == owner).collect::<Vec<_>>();
        owned.sort_by(|(left_index, left), (right_index, right)| {
            right.billed_at.cmp(&left.billed_at).then(right_index.cmp(left_index))
        });

        Ok(owned
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(_, bill)| bill.clone())
            .collect())
    }

    async fn totals_since(
        &self,
        owner: &OwnerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<BillTotal>, RepositoryError> {
        let state = self.state.read().await;
        let mut totals = state
            .bills
            .iter()
            .filter(|bill| &bill.owner_id == owner && bill.billed_at >= since)
            .map(|bill| BillTotal { total_amount: bill.total_amount, billed_at: bill.billed_at })
            .collect::<Vec<_>>();
        totals.sort_by_key(|total| total.billed_at);
        Ok(totals)
    }

    async fn sale_lines_since(
        &self,
        owner: &OwnerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<SaleLine>, RepositoryError> {
        let state = self.state.read().await;
        let mut lines = state
            .sale_lines
            .iter()
            .filter(|line| &line.owner_id == owner && line.sold_at >= since)
            .cloned()
            .collect::<Vec<_>>();
        lines.sort_by_key(|line| line.sold_at);
        Ok(lines)
    }
}

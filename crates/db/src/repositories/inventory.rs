use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use snapbill_core::domain::inventory::{normalize_category, InventoryItem, ItemId};
use snapbill_core::domain::owner::OwnerId;

use super::{encode_timestamp, InventoryRepository, RepositoryError};
use crate::DbPool;

pub struct SqlInventoryRepository {
    pool: DbPool,
}

impl SqlInventoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Stored as a JSON array; legacy rows holding a bare string decode to a
/// single name.
fn decode_names(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(names) => names,
        Err(_) => vec![raw.to_string()],
    }
}

fn item_from_row(row: &SqliteRow) -> Result<InventoryItem, RepositoryError> {
    let names_json: String = row.try_get("names_json")?;
    let category: String = row.try_get("category")?;

    Ok(InventoryItem {
        id: ItemId(row.try_get("master_id")?),
        owner_id: OwnerId(row.try_get("owner_id")?),
        names: decode_names(&names_json),
        price: row.try_get("price")?,
        unit: row.try_get("unit")?,
        category: normalize_category(Some(&category)),
    })
}

#[async_trait::async_trait]
impl InventoryRepository for SqlInventoryRepository {
    async fn list_for_owner(&self, owner: &OwnerId) -> Result<Vec<InventoryItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT owner_id, master_id, names_json, price, unit, category
             FROM inventory_item WHERE owner_id = ? ORDER BY rowid ASC",
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    async fn find(
        &self,
        owner: &OwnerId,
        id: &ItemId,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        let row = sqlx::query(
            "SELECT owner_id, master_id, names_json, price, unit, category
             FROM inventory_item WHERE owner_id = ? AND master_id = ?",
        )
        .bind(owner.as_str())
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn upsert(&self, item: InventoryItem) -> Result<(), RepositoryError> {
        let names_json = serde_json::to_string(&item.names)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;
        let now = encode_timestamp(Utc::now());

        sqlx::query(
            "INSERT INTO inventory_item (owner_id, master_id, names_json, price, unit, category,
                                         created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(owner_id, master_id) DO UPDATE SET
                 names_json = excluded.names_json,
                 price = excluded.price,
                 unit = excluded.unit,
                 category = excluded.category,
                 updated_at = excluded.updated_at",
        )
        .bind(item.owner_id.as_str())
        .bind(&item.id.0)
        .bind(names_json)
        .bind(item.price)
        .bind(&item.unit)
        .bind(&item.category)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, owner: &OwnerId, id: &ItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM inventory_item WHERE owner_id = ? AND master_id = ?")
            .bind(owner.as_str())
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_for_owner(&self, owner: &OwnerId) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query("SELECT COUNT(*) AS count FROM inventory_item WHERE owner_id = ?")
                .bind(owner.as_str())
                .fetch_one(&self.pool)
                .await?
                .try_get("count")?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use snapbill_core::domain::inventory::{InventoryItem, ItemId};
    use snapbill_core::domain::owner::OwnerId;

    use super::{decode_names, SqlInventoryRepository};
    use crate::repositories::InventoryRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlInventoryRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlInventoryRepository::new(pool)
    }

    fn item(owner: &str, id: &str, names: &[&str], price: f64) -> InventoryItem {
        InventoryItem {
            id: ItemId(id.to_string()),
            owner_id: OwnerId(owner.to_string()),
            names: names.iter().map(|name| name.to_string()).collect(),
            price,
            unit: "kg".to_string(),
            category: "Anaj".to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_and_list_keep_insertion_order_and_name_order() {
        let repo = setup().await;
        repo.upsert(item("shop-1", "101", &["Chawal", "Rice", "चावल"], 50.0)).await.expect("save");
        repo.upsert(item("shop-1", "102", &["Dal"], 90.0)).await.expect("save");
        repo.upsert(item("shop-2", "101", &["Atta"], 40.0)).await.expect("save other owner");

        let items = repo.list_for_owner(&OwnerId("shop-1".to_string())).await.expect("list");

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].names, vec!["Chawal", "Rice", "चावल"]);
        assert_eq!(items[1].display_name(), "Dal");
    }

    #[tokio::test]
    async fn upsert_replaces_by_master_id_in_place() {
        let repo = setup().await;
        let owner = OwnerId("shop-1".to_string());
        repo.upsert(item("shop-1", "101", &["Chawal"], 0.0)).await.expect("save");
        repo.upsert(item("shop-1", "102", &["Dal"], 90.0)).await.expect("save");
        repo.upsert(item("shop-1", "101", &["Chawal"], 55.0)).await.expect("reprice");

        let items = repo.list_for_owner(&owner).await.expect("list");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id.0, "101");
        assert_eq!(items[0].price, 55.0);
        assert_eq!(repo.count_for_owner(&owner).await.expect("count"), 2);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let repo = setup().await;
        let owner = OwnerId("shop-1".to_string());
        repo.upsert(item("shop-1", "101", &["Chawal"], 50.0)).await.expect("save");

        assert!(repo.delete(&owner, &ItemId("101".to_string())).await.expect("delete"));
        assert!(!repo.delete(&owner, &ItemId("101".to_string())).await.expect("delete again"));
        assert!(repo.find(&owner, &ItemId("101".to_string())).await.expect("find").is_none());
    }

    #[test]
    fn bare_string_names_decode_to_one_name() {
        assert_eq!(decode_names("Chawal"), vec!["Chawal".to_string()]);
        assert_eq!(decode_names("[\"Dal\",\"दाल\"]"), vec!["Dal".to_string(), "दाल".to_string()]);
    }
}

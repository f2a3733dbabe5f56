use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use snapbill_core::analytics::BillTotal;
use snapbill_core::domain::bill::{Bill, BillId, BillItem, SaleLine};
use snapbill_core::domain::owner::OwnerId;

use super::{decode_timestamp, encode_timestamp, BillRepository, RepositoryError};
use crate::DbPool;

pub struct SqlBillRepository {
    pool: DbPool,
}

impl SqlBillRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn bill_from_row(row: &SqliteRow) -> Result<Bill, RepositoryError> {
    let items_json: String = row.try_get("items_json")?;
    let items = serde_json::from_str::<Vec<BillItem>>(&items_json)
        .map_err(|error| RepositoryError::Decode(format!("bill items: {error}")))?;
    let total_items: i64 = row.try_get("total_items")?;
    let billed_at: String = row.try_get("billed_at")?;

    Ok(Bill {
        id: BillId(row.try_get("id")?),
        owner_id: OwnerId(row.try_get("owner_id")?),
        total_amount: row.try_get("total_amount")?,
        total_items: u32::try_from(total_items)
            .map_err(|_| RepositoryError::Decode(format!("invalid total_items {total_items}")))?,
        items,
        customer_name: row.try_get("customer_name")?,
        customer_phone: row.try_get("customer_phone")?,
        payment_method: row.try_get("payment_method")?,
        billed_at: decode_timestamp(&billed_at)?,
    })
}

fn sale_line_from_row(row: &SqliteRow) -> Result<SaleLine, RepositoryError> {
    let sold_at: String = row.try_get("sold_at")?;
    let hour_of_day: i64 = row.try_get("hour_of_day")?;

    Ok(SaleLine {
        owner_id: OwnerId(row.try_get("owner_id")?),
        bill_id: BillId(row.try_get("bill_id")?),
        item_name: row.try_get("item_name")?,
        category: row.try_get("category")?,
        quantity: row.try_get("quantity")?,
        unit: row.try_get("unit")?,
        price_per_unit: row.try_get("price_per_unit")?,
        line_total: row.try_get("line_total")?,
        sold_at: decode_timestamp(&sold_at)?,
        hour_of_day: u8::try_from(hour_of_day)
            .map_err(|_| RepositoryError::Decode(format!("invalid hour_of_day {hour_of_day}")))?,
    })
}

#[async_trait::async_trait]
impl BillRepository for SqlBillRepository {
    async fn commit(&self, bill: &Bill) -> Result<(), RepositoryError> {
        let items_json = serde_json::to_string(&bill.items)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;
        let billed_at = encode_timestamp(bill.billed_at);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO bill (id, owner_id, total_amount, total_items, items_json,
                               customer_name, customer_phone, payment_method, billed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&bill.id.0)
        .bind(bill.owner_id.as_str())
        .bind(bill.total_amount)
        .bind(i64::from(bill.total_items))
        .bind(&items_json)
        .bind(&bill.customer_name)
        .bind(&bill.customer_phone)
        .bind(&bill.payment_method)
        .bind(&billed_at)
        .execute(&mut *tx)
        .await?;

        for line in bill.sale_lines() {
            sqlx::query(
                "INSERT INTO sale_line (bill_id, owner_id, item_name, category, quantity, unit,
                                        price_per_unit, line_total, sold_at, hour_of_day)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&line.bill_id.0)
            .bind(line.owner_id.as_str())
            .bind(&line.item_name)
            .bind(&line.category)
            .bind(line.quantity)
            .bind(&line.unit)
            .bind(line.price_per_unit)
            .bind(line.line_total)
            .bind(encode_timestamp(line.sold_at))
            .bind(i64::from(line.hour_of_day))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_for_owner(
        &self,
        owner: &OwnerId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Bill>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, owner_id, total_amount, total_items, items_json, customer_name,
                    customer_phone, payment_method, billed_at
             FROM bill WHERE owner_id = ?
             ORDER BY billed_at DESC, rowid DESC
             LIMIT ? OFFSET ?",
        )
        .bind(owner.as_str())
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(bill_from_row).collect()
    }

    async fn totals_since(
        &self,
        owner: &OwnerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<BillTotal>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT total_amount, billed_at FROM bill
             WHERE owner_id = ? AND billed_at >= ?
             ORDER BY billed_at ASC, rowid ASC",
        )
        .bind(owner.as_str())
        .bind(encode_timestamp(since))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<BillTotal, RepositoryError> {
                let billed_at: String = row.try_get("billed_at")?;
                Ok(BillTotal {
                    total_amount: row.try_get("total_amount")?,
                    billed_at: decode_timestamp(&billed_at)?,
                })
            })
            .collect()
    }

    async fn sale_lines_since(
        &self,
        owner: &OwnerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<SaleLine>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT bill_id, owner_id, item_name, category, quantity, unit, price_per_unit,
                    line_total, sold_at, hour_of_day
             FROM sale_line
             WHERE owner_id = ? AND sold_at >= ?
             ORDER BY sold_at ASC, id ASC",
        )
        .bind(owner.as_str())
        .bind(encode_timestamp(since))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(sale_line_from_row).collect()
    }
}

// src/db/entry_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::like_pattern,
    models::entry::{
        Entry, EntryFilter, EntryProduct, EntryProductUpdate, EntryStatus, EntryUpdate, NewEntry,
        NewEntryProduct,
    },
};

#[derive(Clone)]
pub struct EntryRepository {
    pool: PgPool,
}

impl EntryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  ENTRADAS
    // =========================================================================

    pub async fn create_entry(&self, new: &NewEntry) -> Result<Entry, AppError> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (
                key, author_id, supplier_id, client_id, tax_id, invoice_number, status_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
            .bind(&new.key)
            .bind(new.author_id)
            .bind(new.supplier_id)
            .bind(new.client_id)
            .bind(&new.tax_id)
            .bind(&new.invoice_number)
            .bind(new.status_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(entry)
    }

    pub async fn get_entry(&self, id: Uuid) -> Result<Option<Entry>, AppError> {
        let entry = sqlx::query_as::<_, Entry>("SELECT * FROM entries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    pub async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>, AppError> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT * FROM entries
            WHERE ($1::uuid IS NULL OR status_id = $1)
              AND ($2::uuid IS NULL OR supplier_id = $2)
              AND ($3::uuid IS NULL OR client_id = $3)
              AND ($4::bool IS NULL OR is_reviewed = $4)
              AND ($5::bool IS NULL OR is_classify = $5)
              AND ($6::text IS NULL OR key ILIKE $6 ESCAPE '\' OR invoice_number ILIKE $6 ESCAPE '\')
            ORDER BY created_at DESC
            "#,
        )
            .bind(filter.status_id)
            .bind(filter.supplier_id)
            .bind(filter.client_id)
            .bind(filter.is_reviewed)
            .bind(filter.is_classify)
            .bind(filter.search.as_deref().map(like_pattern))
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    pub async fn update_entry(&self, id: Uuid, update: &EntryUpdate) -> Result<Option<Entry>, AppError> {
        let rollup = update.rollup;

        let entry = sqlx::query_as::<_, Entry>(
            r#"
            UPDATE entries SET
                status_id = COALESCE($2, status_id),
                is_reviewed = COALESCE($3, is_reviewed),
                is_classify = COALESCE($4, is_classify),
                subtotal = COALESCE($5, subtotal),
                packing_price = COALESCE($6, packing_price),
                other_price = COALESCE($7, other_price),
                total = COALESCE($8, total),
                net_weight = COALESCE($9, net_weight),
                lumps = COALESCE($10, lumps),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(update.status_id)
            .bind(update.is_reviewed)
            .bind(update.is_classify)
            .bind(rollup.map(|r| r.subtotal))
            .bind(rollup.map(|r| r.packing_price))
            .bind(rollup.map(|r| r.other_price))
            .bind(rollup.map(|r| r.total))
            .bind(update.net_weight)
            .bind(update.lumps)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    // =========================================================================
    //  STATUS
    // =========================================================================

    pub async fn get_status(&self, id: Uuid) -> Result<Option<EntryStatus>, AppError> {
        let status = sqlx::query_as::<_, EntryStatus>("SELECT id, name FROM entry_statuses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(status)
    }

    pub async fn find_status_by_name(&self, name: &str) -> Result<Option<EntryStatus>, AppError> {
        let status = sqlx::query_as::<_, EntryStatus>("SELECT id, name FROM entry_statuses WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(status)
    }

    pub async fn list_statuses(&self) -> Result<Vec<EntryStatus>, AppError> {
        let statuses = sqlx::query_as::<_, EntryStatus>("SELECT id, name FROM entry_statuses ORDER BY position ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(statuses)
    }

    // =========================================================================
    //  PRODUTOS DA ENTRADA
    // =========================================================================

    pub async fn find_entry_product(
        &self,
        entry_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<EntryProduct>, AppError> {
        let row = sqlx::query_as::<_, EntryProduct>(
            "SELECT * FROM entry_products WHERE entry_id = $1 AND product_id = $2 LIMIT 1",
        )
            .bind(entry_id)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn create_entry_product(&self, new: &NewEntryProduct) -> Result<EntryProduct, AppError> {
        let row = sqlx::query_as::<_, EntryProduct>(
            r#"
            INSERT INTO entry_products (
                entry_id, product_id, unit_price, is_damaged, is_outrank, is_shortage, lot, batch
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
            .bind(new.entry_id)
            .bind(new.product_id)
            .bind(new.unit_price)
            .bind(new.is_damaged)
            .bind(new.is_outrank)
            .bind(new.is_shortage)
            .bind(&new.lot)
            .bind(&new.batch)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn list_entry_products(&self, entry_id: Uuid) -> Result<Vec<EntryProduct>, AppError> {
        let rows = sqlx::query_as::<_, EntryProduct>(
            "SELECT * FROM entry_products WHERE entry_id = $1 ORDER BY created_at ASC",
        )
            .bind(entry_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn update_entry_product(
        &self,
        id: Uuid,
        update: &EntryProductUpdate,
    ) -> Result<Option<EntryProduct>, AppError> {
        let row = sqlx::query_as::<_, EntryProduct>(
            r#"
            UPDATE entry_products SET
                unit_price = COALESCE($2, unit_price),
                is_damaged = COALESCE($3, is_damaged),
                is_outrank = COALESCE($4, is_outrank),
                is_shortage = COALESCE($5, is_shortage),
                lot = COALESCE(TRIM($6), lot),
                batch = COALESCE(TRIM($7), batch),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(update.unit_price)
            .bind(update.is_damaged)
            .bind(update.is_outrank)
            .bind(update.is_shortage)
            .bind(&update.lot)
            .bind(&update.batch)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn link_classification(
        &self,
        entry_product_id: Uuid,
        classification_id: Uuid,
    ) -> Result<Option<EntryProduct>, AppError> {
        let row = sqlx::query_as::<_, EntryProduct>(
            r#"
            UPDATE entry_products
            SET id_classification = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(entry_product_id)
            .bind(classification_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }
}

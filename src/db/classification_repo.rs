// src/db/classification_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::classification::{Classification, NewClassification},
};

#[derive(Clone)]
pub struct ClassificationRepository {
    pool: PgPool,
}

impl ClassificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_classification(&self, id: Uuid) -> Result<Option<Classification>, AppError> {
        let row = sqlx::query_as::<_, Classification>("SELECT * FROM classifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn find_active_classification(
        &self,
        product_id: Uuid,
    ) -> Result<Option<Classification>, AppError> {
        let row = sqlx::query_as::<_, Classification>(
            r#"
            SELECT * FROM classifications
            WHERE product_id = $1 AND deprecated = FALSE
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn list_classifications(&self, product_id: Uuid) -> Result<Vec<Classification>, AppError> {
        let rows = sqlx::query_as::<_, Classification>(
            "SELECT * FROM classifications WHERE product_id = $1 ORDER BY created_at ASC",
        )
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn create_classification(&self, new: &NewClassification) -> Result<Classification, AppError> {
        let f = &new.fields;

        let row = sqlx::query_as::<_, Classification>(
            r#"
            INSERT INTO classifications (
                key, entry_id, product_id,
                tariff_fraction, lumps, item, comments, origin_country, origin_seller,
                quantity, net_weight, parts, unit_type_id, unit_weight_id,
                deprecated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, FALSE)
            RETURNING *
            "#,
        )
            .bind(&new.key)
            .bind(new.entry_id)
            .bind(new.product_id)
            .bind(&f.tariff_fraction)
            .bind(f.lumps)
            .bind(&f.item)
            .bind(&f.comments)
            .bind(&f.origin_country)
            .bind(&f.origin_seller)
            .bind(f.quantity)
            .bind(f.net_weight)
            .bind(f.parts)
            .bind(f.unit_type_id)
            .bind(f.unit_weight_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn deprecate_classification(&self, id: Uuid) -> Result<Option<Classification>, AppError> {
        let row = sqlx::query_as::<_, Classification>(
            "UPDATE classifications SET deprecated = TRUE WHERE id = $1 RETURNING *",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn update_tariff_fraction(
        &self,
        id: Uuid,
        tariff_fraction: Option<&str>,
    ) -> Result<Option<Classification>, AppError> {
        let row = sqlx::query_as::<_, Classification>(
            "UPDATE classifications SET tariff_fraction = $2 WHERE id = $1 RETURNING *",
        )
            .bind(id)
            .bind(tariff_fraction)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }
}

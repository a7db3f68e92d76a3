// src/db/catalog_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{
        like_pattern, Client, NewParty, NewProduct, Product, ProductFilter, ProductFlag,
        ProductUpdate, Supplier, UnitType, UnitWeight,
    },
};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  FORNECEDORES & CLIENTES
    // =========================================================================

    pub async fn create_supplier(&self, new: &NewParty) -> Result<Supplier, AppError> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (name, tax_id, country)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
            .bind(&new.name)
            .bind(&new.tax_id)
            .bind(&new.country)
            .fetch_one(&self.pool)
            .await?;

        Ok(supplier)
    }

    pub async fn list_suppliers(&self, search: Option<&str>) -> Result<Vec<Supplier>, AppError> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT * FROM suppliers
            WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\' OR tax_id ILIKE $1 ESCAPE '\')
            ORDER BY name ASC
            "#,
        )
            .bind(search.map(like_pattern))
            .fetch_all(&self.pool)
            .await?;

        Ok(suppliers)
    }

    pub async fn get_supplier(&self, id: Uuid) -> Result<Option<Supplier>, AppError> {
        let supplier = sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(supplier)
    }

    pub async fn create_client(&self, new: &NewParty) -> Result<Client, AppError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (name, tax_id, country)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
            .bind(&new.name)
            .bind(&new.tax_id)
            .bind(&new.country)
            .fetch_one(&self.pool)
            .await?;

        Ok(client)
    }

    pub async fn list_clients(&self, search: Option<&str>) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT * FROM clients
            WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\' OR tax_id ILIKE $1 ESCAPE '\')
            ORDER BY name ASC
            "#,
        )
            .bind(search.map(like_pattern))
            .fetch_all(&self.pool)
            .await?;

        Ok(clients)
    }

    pub async fn get_client(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    // =========================================================================
    //  PRODUTOS
    // =========================================================================

    pub async fn create_product(&self, new: &NewProduct) -> Result<Product, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                supplier_id, unit_type_id, name, brand, model, serial_number, weight, unit_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
            .bind(new.supplier_id)
            .bind(new.unit_type_id)
            .bind(&new.name)
            .bind(&new.brand)
            .bind(&new.model)
            .bind(&new.serial_number)
            .bind(new.weight)
            .bind(new.unit_price)
            .fetch_one(&self.pool)
            .await?;

        Ok(product)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE ($1 OR is_active = TRUE)
              AND ($2::uuid IS NULL OR supplier_id = $2)
              AND (
                $3::text IS NULL
                OR name ILIKE $3 ESCAPE '\'
                OR brand ILIKE $3 ESCAPE '\'
                OR model ILIKE $3 ESCAPE '\'
                OR serial_number ILIKE $3 ESCAPE '\'
              )
            ORDER BY name ASC
            "#,
        )
            .bind(filter.include_inactive)
            .bind(filter.supplier_id)
            .bind(filter.search.as_deref().map(like_pattern))
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    // COALESCE mantém a coluna quando o campo não veio no patch.
    pub async fn update_product(&self, id: Uuid, update: &ProductUpdate) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                unit_type_id = COALESCE($2, unit_type_id),
                name = COALESCE($3, name),
                brand = COALESCE($4, brand),
                model = COALESCE($5, model),
                serial_number = COALESCE($6, serial_number),
                weight = COALESCE($7, weight),
                unit_price = COALESCE($8, unit_price),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(update.unit_type_id)
            .bind(&update.name)
            .bind(&update.brand)
            .bind(&update.model)
            .bind(&update.serial_number)
            .bind(update.weight)
            .bind(update.unit_price)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    pub async fn deactivate_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            "UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    pub async fn set_product_flag(&self, id: Uuid, flag: ProductFlag) -> Result<Option<Product>, AppError> {
        let sql = match flag {
            ProductFlag::Reviewed => {
                "UPDATE products SET is_reviewed = TRUE, updated_at = NOW() WHERE id = $1 RETURNING *"
            }
            ProductFlag::Classified => {
                "UPDATE products SET is_classify = TRUE, updated_at = NOW() WHERE id = $1 RETURNING *"
            }
        };

        let product = sqlx::query_as::<_, Product>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    // =========================================================================
    //  UNIDADES
    // =========================================================================

    pub async fn create_unit_type(&self, name: &str, abbreviation: &str) -> Result<UnitType, AppError> {
        let unit = sqlx::query_as::<_, UnitType>(
            "INSERT INTO unit_types (name, abbreviation) VALUES ($1, $2) RETURNING *",
        )
            .bind(name)
            .bind(abbreviation)
            .fetch_one(&self.pool)
            .await?;

        Ok(unit)
    }

    pub async fn list_unit_types(&self) -> Result<Vec<UnitType>, AppError> {
        let units = sqlx::query_as::<_, UnitType>("SELECT * FROM unit_types ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(units)
    }

    pub async fn create_unit_weight(&self, name: &str, abbreviation: &str) -> Result<UnitWeight, AppError> {
        let unit = sqlx::query_as::<_, UnitWeight>(
            "INSERT INTO unit_weights (name, abbreviation) VALUES ($1, $2) RETURNING *",
        )
            .bind(name)
            .bind(abbreviation)
            .fetch_one(&self.pool)
            .await?;

        Ok(unit)
    }

    pub async fn list_unit_weights(&self) -> Result<Vec<UnitWeight>, AppError> {
        let units = sqlx::query_as::<_, UnitWeight>("SELECT * FROM unit_weights ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(units)
    }
}

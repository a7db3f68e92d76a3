// src/db/pg_store.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    store::{CatalogStore, ClassificationStore, EntryStore},
    CatalogRepository, ClassificationRepository, EntryRepository,
};
use crate::{
    common::error::AppError,
    models::{
        catalog::{
            Client, NewParty, NewProduct, Product, ProductFilter, ProductFlag, ProductUpdate,
            Supplier, UnitType, UnitWeight,
        },
        classification::{Classification, NewClassification},
        entry::{
            Entry, EntryFilter, EntryProduct, EntryProductUpdate, EntryStatus, EntryUpdate,
            NewEntry, NewEntryProduct,
        },
    },
};

/// `RecordStore` sobre Postgres: um repositório por grupo de tabelas.
#[derive(Clone)]
pub struct PgRecordStore {
    catalog: CatalogRepository,
    entries: EntryRepository,
    classifications: ClassificationRepository,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            catalog: CatalogRepository::new(pool.clone()),
            entries: EntryRepository::new(pool.clone()),
            classifications: ClassificationRepository::new(pool),
        }
    }
}

#[async_trait]
impl CatalogStore for PgRecordStore {
    async fn create_supplier(&self, new: NewParty) -> Result<Supplier, AppError> {
        self.catalog.create_supplier(&new).await
    }

    async fn list_suppliers(&self, search: Option<&str>) -> Result<Vec<Supplier>, AppError> {
        self.catalog.list_suppliers(search).await
    }

    async fn get_supplier(&self, id: Uuid) -> Result<Option<Supplier>, AppError> {
        self.catalog.get_supplier(id).await
    }

    async fn create_client(&self, new: NewParty) -> Result<Client, AppError> {
        self.catalog.create_client(&new).await
    }

    async fn list_clients(&self, search: Option<&str>) -> Result<Vec<Client>, AppError> {
        self.catalog.list_clients(search).await
    }

    async fn get_client(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        self.catalog.get_client(id).await
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product, AppError> {
        self.catalog.create_product(&new).await
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        self.catalog.get_product(id).await
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        self.catalog.list_products(filter).await
    }

    async fn update_product(&self, id: Uuid, update: &ProductUpdate) -> Result<Product, AppError> {
        self.catalog
            .update_product(id, update)
            .await?
            .ok_or(AppError::not_found("Produto", id))
    }

    async fn deactivate_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.catalog
            .deactivate_product(id)
            .await?
            .ok_or(AppError::not_found("Produto", id))
    }

    async fn set_product_flag(&self, id: Uuid, flag: ProductFlag) -> Result<Product, AppError> {
        self.catalog
            .set_product_flag(id, flag)
            .await?
            .ok_or(AppError::not_found("Produto", id))
    }

    async fn create_unit_type(&self, name: &str, abbreviation: &str) -> Result<UnitType, AppError> {
        self.catalog.create_unit_type(name, abbreviation).await
    }

    async fn list_unit_types(&self) -> Result<Vec<UnitType>, AppError> {
        self.catalog.list_unit_types().await
    }

    async fn create_unit_weight(&self, name: &str, abbreviation: &str) -> Result<UnitWeight, AppError> {
        self.catalog.create_unit_weight(name, abbreviation).await
    }

    async fn list_unit_weights(&self) -> Result<Vec<UnitWeight>, AppError> {
        self.catalog.list_unit_weights().await
    }
}

#[async_trait]
impl EntryStore for PgRecordStore {
    async fn create_entry(&self, new: NewEntry) -> Result<Entry, AppError> {
        self.entries.create_entry(&new).await
    }

    async fn get_entry(&self, id: Uuid) -> Result<Option<Entry>, AppError> {
        self.entries.get_entry(id).await
    }

    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>, AppError> {
        self.entries.list_entries(filter).await
    }

    async fn update_entry(&self, id: Uuid, update: &EntryUpdate) -> Result<Entry, AppError> {
        self.entries
            .update_entry(id, update)
            .await?
            .ok_or(AppError::not_found("Entrada", id))
    }

    async fn get_status(&self, id: Uuid) -> Result<Option<EntryStatus>, AppError> {
        self.entries.get_status(id).await
    }

    async fn find_status_by_name(&self, name: &str) -> Result<Option<EntryStatus>, AppError> {
        self.entries.find_status_by_name(name).await
    }

    async fn list_statuses(&self) -> Result<Vec<EntryStatus>, AppError> {
        self.entries.list_statuses().await
    }

    async fn find_entry_product(
        &self,
        entry_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<EntryProduct>, AppError> {
        self.entries.find_entry_product(entry_id, product_id).await
    }

    async fn create_entry_product(&self, new: NewEntryProduct) -> Result<EntryProduct, AppError> {
        self.entries.create_entry_product(&new).await
    }

    async fn list_entry_products(&self, entry_id: Uuid) -> Result<Vec<EntryProduct>, AppError> {
        self.entries.list_entry_products(entry_id).await
    }

    async fn update_entry_product(
        &self,
        id: Uuid,
        update: &EntryProductUpdate,
    ) -> Result<EntryProduct, AppError> {
        self.entries
            .update_entry_product(id, update)
            .await?
            .ok_or(AppError::not_found("Produto da entrada", id))
    }

    async fn link_classification(
        &self,
        entry_product_id: Uuid,
        classification_id: Uuid,
    ) -> Result<EntryProduct, AppError> {
        self.entries
            .link_classification(entry_product_id, classification_id)
            .await?
            .ok_or(AppError::not_found("Produto da entrada", entry_product_id))
    }
}

#[async_trait]
impl ClassificationStore for PgRecordStore {
    async fn get_classification(&self, id: Uuid) -> Result<Option<Classification>, AppError> {
        self.classifications.get_classification(id).await
    }

    async fn find_active_classification(
        &self,
        product_id: Uuid,
    ) -> Result<Option<Classification>, AppError> {
        self.classifications.find_active_classification(product_id).await
    }

    async fn list_classifications(&self, product_id: Uuid) -> Result<Vec<Classification>, AppError> {
        self.classifications.list_classifications(product_id).await
    }

    async fn create_classification(
        &self,
        new: NewClassification,
    ) -> Result<Classification, AppError> {
        self.classifications.create_classification(&new).await
    }

    async fn deprecate_classification(&self, id: Uuid) -> Result<Classification, AppError> {
        self.classifications
            .deprecate_classification(id)
            .await?
            .ok_or(AppError::not_found("Classificação", id))
    }

    async fn update_tariff_fraction(
        &self,
        id: Uuid,
        tariff_fraction: Option<&str>,
    ) -> Result<Classification, AppError> {
        self.classifications
            .update_tariff_fraction(id, tariff_fraction)
            .await?
            .ok_or(AppError::not_found("Classificação", id))
    }
}

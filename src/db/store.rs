// src/db/store.rs

use async_trait::async_trait;
use uuid::Uuid;

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

// O "store remoto" que o núcleo consome. Não há transação entre chamadas:
// cada método é uma ida e volta independente, última escrita vence.
// Buscas que podem não achar nada devolvem `Option` (não é erro).

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create_supplier(&self, new: NewParty) -> Result<Supplier, AppError>;
    async fn list_suppliers(&self, search: Option<&str>) -> Result<Vec<Supplier>, AppError>;
    async fn get_supplier(&self, id: Uuid) -> Result<Option<Supplier>, AppError>;

    async fn create_client(&self, new: NewParty) -> Result<Client, AppError>;
    async fn list_clients(&self, search: Option<&str>) -> Result<Vec<Client>, AppError>;
    async fn get_client(&self, id: Uuid) -> Result<Option<Client>, AppError>;

    async fn create_product(&self, new: NewProduct) -> Result<Product, AppError>;
    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, AppError>;
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError>;
    async fn update_product(&self, id: Uuid, update: &ProductUpdate) -> Result<Product, AppError>;
    async fn deactivate_product(&self, id: Uuid) -> Result<Product, AppError>;
    async fn set_product_flag(&self, id: Uuid, flag: ProductFlag) -> Result<Product, AppError>;

    async fn create_unit_type(&self, name: &str, abbreviation: &str) -> Result<UnitType, AppError>;
    async fn list_unit_types(&self) -> Result<Vec<UnitType>, AppError>;
    async fn create_unit_weight(&self, name: &str, abbreviation: &str) -> Result<UnitWeight, AppError>;
    async fn list_unit_weights(&self) -> Result<Vec<UnitWeight>, AppError>;
}

#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn create_entry(&self, new: NewEntry) -> Result<Entry, AppError>;
    async fn get_entry(&self, id: Uuid) -> Result<Option<Entry>, AppError>;
    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>, AppError>;
    async fn update_entry(&self, id: Uuid, update: &EntryUpdate) -> Result<Entry, AppError>;

    async fn get_status(&self, id: Uuid) -> Result<Option<EntryStatus>, AppError>;
    async fn find_status_by_name(&self, name: &str) -> Result<Option<EntryStatus>, AppError>;
    async fn list_statuses(&self) -> Result<Vec<EntryStatus>, AppError>;

    async fn find_entry_product(
        &self,
        entry_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<EntryProduct>, AppError>;
    async fn create_entry_product(&self, new: NewEntryProduct) -> Result<EntryProduct, AppError>;
    async fn list_entry_products(&self, entry_id: Uuid) -> Result<Vec<EntryProduct>, AppError>;
    async fn update_entry_product(
        &self,
        id: Uuid,
        update: &EntryProductUpdate,
    ) -> Result<EntryProduct, AppError>;
    async fn link_classification(
        &self,
        entry_product_id: Uuid,
        classification_id: Uuid,
    ) -> Result<EntryProduct, AppError>;
}

#[async_trait]
pub trait ClassificationStore: Send + Sync {
    async fn get_classification(&self, id: Uuid) -> Result<Option<Classification>, AppError>;
    /// `product_id = P && deprecated = false`
    async fn find_active_classification(
        &self,
        product_id: Uuid,
    ) -> Result<Option<Classification>, AppError>;
    async fn list_classifications(&self, product_id: Uuid) -> Result<Vec<Classification>, AppError>;
    async fn create_classification(
        &self,
        new: NewClassification,
    ) -> Result<Classification, AppError>;
    async fn deprecate_classification(&self, id: Uuid) -> Result<Classification, AppError>;
    /// Atualiza somente a coluna `tariff_fraction`.
    async fn update_tariff_fraction(
        &self,
        id: Uuid,
        tariff_fraction: Option<&str>,
    ) -> Result<Classification, AppError>;
}

/// Capacidade completa injetada nos serviços.
pub trait RecordStore: CatalogStore + EntryStore + ClassificationStore {}

impl<T> RecordStore for T where T: CatalogStore + EntryStore + ClassificationStore {}

// src/db/memory_store.rs

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::store::{CatalogStore, ClassificationStore, EntryStore};
use crate::{
    common::error::AppError,
    models::{
        catalog::{
            contains_ignore_case, Client, NewParty, NewProduct, Product, ProductFilter, ProductFlag,
            ProductUpdate, Supplier, UnitType, UnitWeight,
        },
        classification::{Classification, NewClassification},
        entry::{
            Entry, EntryFilter, EntryProduct, EntryProductUpdate, EntryStatus, EntryStatusKind,
            EntryUpdate, NewEntry, NewEntryProduct,
        },
    },
};

/// Operações do store que podem receber falha injetada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    CreateEntryProduct,
    UpdateEntryProduct,
    LinkClassification,
    CreateClassification,
    DeprecateClassification,
    UpdateTariffFraction,
    SetProductFlag,
    UpdateEntry,
}

#[derive(Debug, Clone, Copy)]
struct InjectedFailure {
    op: StoreOp,
    // `None` falha para qualquer alvo.
    target: Option<Uuid>,
}

#[derive(Default)]
struct Tables {
    suppliers: Vec<Supplier>,
    clients: Vec<Client>,
    products: Vec<Product>,
    unit_types: Vec<UnitType>,
    unit_weights: Vec<UnitWeight>,
    statuses: Vec<EntryStatus>,
    entries: Vec<Entry>,
    entry_products: Vec<EntryProduct>,
    classifications: Vec<Classification>,
}

/// `RecordStore` em memória, com a mesma semântica de "última escrita vence"
/// do Postgres e sem transações.
pub struct MemoryRecordStore {
    tables: Mutex<Tables>,
    failures: Mutex<Vec<InjectedFailure>>,
    writes: AtomicUsize,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        let statuses = EntryStatusKind::ALL
            .iter()
            .map(|kind| EntryStatus {
                id: Uuid::new_v4(),
                name: kind.name().to_string(),
            })
            .collect();

        Self {
            tables: Mutex::new(Tables {
                statuses,
                ..Tables::default()
            }),
            failures: Mutex::new(Vec::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Quantas escritas bem-sucedidas o store aceitou.
    #[cfg(test)]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub async fn fail_on(&self, op: StoreOp, target: Option<Uuid>) {
        self.failures.lock().await.push(InjectedFailure { op, target });
    }

    async fn check(&self, op: StoreOp, target: Uuid) -> Result<(), AppError> {
        let failures = self.failures.lock().await;
        let hit = failures
            .iter()
            .any(|f| f.op == op && f.target.is_none_or(|t| t == target));
        if hit {
            return Err(AppError::RemoteOperationFailed(format!(
                "{:?} falhou para {}",
                op, target
            )));
        }
        Ok(())
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogStore for MemoryRecordStore {
    async fn create_supplier(&self, new: NewParty) -> Result<Supplier, AppError> {
        let supplier = Supplier {
            id: Uuid::new_v4(),
            name: new.name,
            tax_id: new.tax_id,
            country: new.country,
            created_at: Utc::now(),
        };
        self.tables.lock().await.suppliers.push(supplier.clone());
        self.wrote();
        Ok(supplier)
    }

    async fn list_suppliers(&self, search: Option<&str>) -> Result<Vec<Supplier>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .suppliers
            .iter()
            .filter(|s| party_matches(&s.name, s.tax_id.as_deref(), search))
            .cloned()
            .collect())
    }

    async fn get_supplier(&self, id: Uuid) -> Result<Option<Supplier>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.suppliers.iter().find(|s| s.id == id).cloned())
    }

    async fn create_client(&self, new: NewParty) -> Result<Client, AppError> {
        let client = Client {
            id: Uuid::new_v4(),
            name: new.name,
            tax_id: new.tax_id,
            country: new.country,
            created_at: Utc::now(),
        };
        self.tables.lock().await.clients.push(client.clone());
        self.wrote();
        Ok(client)
    }

    async fn list_clients(&self, search: Option<&str>) -> Result<Vec<Client>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .clients
            .iter()
            .filter(|c| party_matches(&c.name, c.tax_id.as_deref(), search))
            .cloned()
            .collect())
    }

    async fn get_client(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.clients.iter().find(|c| c.id == id).cloned())
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product, AppError> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            supplier_id: new.supplier_id,
            unit_type_id: new.unit_type_id,
            name: new.name,
            brand: new.brand,
            model: new.model,
            serial_number: new.serial_number,
            weight: new.weight,
            unit_price: new.unit_price,
            is_active: true,
            is_reviewed: false,
            is_classify: false,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.products.push(product.clone());
        self.wrote();
        Ok(product)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.products.iter().find(|p| p.id == id).cloned())
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .products
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn update_product(&self, id: Uuid, update: &ProductUpdate) -> Result<Product, AppError> {
        let mut tables = self.tables.lock().await;
        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(AppError::not_found("Produto", id))?;

        if let Some(unit_type_id) = update.unit_type_id {
            product.unit_type_id = Some(unit_type_id);
        }
        if let Some(name) = &update.name {
            product.name = name.clone();
        }
        if let Some(brand) = &update.brand {
            product.brand = Some(brand.clone());
        }
        if let Some(model) = &update.model {
            product.model = Some(model.clone());
        }
        if let Some(serial_number) = &update.serial_number {
            product.serial_number = Some(serial_number.clone());
        }
        if let Some(weight) = update.weight {
            product.weight = weight;
        }
        if let Some(unit_price) = update.unit_price {
            product.unit_price = unit_price;
        }
        product.updated_at = Utc::now();

        let updated = product.clone();
        drop(tables);
        self.wrote();
        Ok(updated)
    }

    async fn deactivate_product(&self, id: Uuid) -> Result<Product, AppError> {
        let mut tables = self.tables.lock().await;
        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(AppError::not_found("Produto", id))?;
        product.is_active = false;
        product.updated_at = Utc::now();

        let updated = product.clone();
        drop(tables);
        self.wrote();
        Ok(updated)
    }

    async fn set_product_flag(&self, id: Uuid, flag: ProductFlag) -> Result<Product, AppError> {
        self.check(StoreOp::SetProductFlag, id).await?;

        let mut tables = self.tables.lock().await;
        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(AppError::not_found("Produto", id))?;
        match flag {
            ProductFlag::Reviewed => product.is_reviewed = true,
            ProductFlag::Classified => product.is_classify = true,
        }
        product.updated_at = Utc::now();

        let updated = product.clone();
        drop(tables);
        self.wrote();
        Ok(updated)
    }

    async fn create_unit_type(&self, name: &str, abbreviation: &str) -> Result<UnitType, AppError> {
        let unit = UnitType {
            id: Uuid::new_v4(),
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
        };
        self.tables.lock().await.unit_types.push(unit.clone());
        self.wrote();
        Ok(unit)
    }

    async fn list_unit_types(&self) -> Result<Vec<UnitType>, AppError> {
        Ok(self.tables.lock().await.unit_types.clone())
    }

    async fn create_unit_weight(&self, name: &str, abbreviation: &str) -> Result<UnitWeight, AppError> {
        let unit = UnitWeight {
            id: Uuid::new_v4(),
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
        };
        self.tables.lock().await.unit_weights.push(unit.clone());
        self.wrote();
        Ok(unit)
    }

    async fn list_unit_weights(&self) -> Result<Vec<UnitWeight>, AppError> {
        Ok(self.tables.lock().await.unit_weights.clone())
    }
}

#[async_trait]
impl EntryStore for MemoryRecordStore {
    async fn create_entry(&self, new: NewEntry) -> Result<Entry, AppError> {
        let now = Utc::now();
        let entry = Entry {
            id: Uuid::new_v4(),
            key: new.key,
            author_id: new.author_id,
            supplier_id: new.supplier_id,
            client_id: new.client_id,
            tax_id: new.tax_id,
            invoice_number: new.invoice_number,
            status_id: new.status_id,
            is_reviewed: false,
            is_classify: false,
            subtotal: Decimal::ZERO,
            packing_price: Decimal::ZERO,
            other_price: Decimal::ZERO,
            total: Decimal::ZERO,
            net_weight: Decimal::ZERO,
            lumps: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.entries.push(entry.clone());
        self.wrote();
        Ok(entry)
    }

    async fn get_entry(&self, id: Uuid) -> Result<Option<Entry>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.entries.iter().find(|e| e.id == id).cloned())
    }

    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>, AppError> {
        let tables = self.tables.lock().await;
        // Mais recentes primeiro, como no Postgres.
        Ok(tables
            .entries
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn update_entry(&self, id: Uuid, update: &EntryUpdate) -> Result<Entry, AppError> {
        self.check(StoreOp::UpdateEntry, id).await?;

        let mut tables = self.tables.lock().await;
        let entry = tables
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(AppError::not_found("Entrada", id))?;
        update.apply(entry);
        entry.updated_at = Utc::now();

        let updated = entry.clone();
        drop(tables);
        self.wrote();
        Ok(updated)
    }

    async fn get_status(&self, id: Uuid) -> Result<Option<EntryStatus>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.statuses.iter().find(|s| s.id == id).cloned())
    }

    async fn find_status_by_name(&self, name: &str) -> Result<Option<EntryStatus>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.statuses.iter().find(|s| s.name == name).cloned())
    }

    async fn list_statuses(&self) -> Result<Vec<EntryStatus>, AppError> {
        Ok(self.tables.lock().await.statuses.clone())
    }

    async fn find_entry_product(
        &self,
        entry_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<EntryProduct>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .entry_products
            .iter()
            .find(|ep| ep.entry_id == entry_id && ep.product_id == product_id)
            .cloned())
    }

    async fn create_entry_product(&self, new: NewEntryProduct) -> Result<EntryProduct, AppError> {
        self.check(StoreOp::CreateEntryProduct, new.product_id).await?;

        let now = Utc::now();
        let row = EntryProduct {
            id: Uuid::new_v4(),
            entry_id: new.entry_id,
            product_id: new.product_id,
            unit_price: new.unit_price,
            is_damaged: new.is_damaged,
            is_outrank: new.is_outrank,
            is_shortage: new.is_shortage,
            lot: new.lot,
            batch: new.batch,
            id_classification: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.entry_products.push(row.clone());
        self.wrote();
        Ok(row)
    }

    async fn list_entry_products(&self, entry_id: Uuid) -> Result<Vec<EntryProduct>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .entry_products
            .iter()
            .filter(|ep| ep.entry_id == entry_id)
            .cloned()
            .collect())
    }

    async fn update_entry_product(
        &self,
        id: Uuid,
        update: &EntryProductUpdate,
    ) -> Result<EntryProduct, AppError> {
        self.check(StoreOp::UpdateEntryProduct, id).await?;

        let mut tables = self.tables.lock().await;
        let row = tables
            .entry_products
            .iter_mut()
            .find(|ep| ep.id == id)
            .ok_or(AppError::not_found("Produto da entrada", id))?;
        update.apply(row);
        row.updated_at = Utc::now();

        let updated = row.clone();
        drop(tables);
        self.wrote();
        Ok(updated)
    }

    async fn link_classification(
        &self,
        entry_product_id: Uuid,
        classification_id: Uuid,
    ) -> Result<EntryProduct, AppError> {
        self.check(StoreOp::LinkClassification, entry_product_id).await?;

        let mut tables = self.tables.lock().await;
        let row = tables
            .entry_products
            .iter_mut()
            .find(|ep| ep.id == entry_product_id)
            .ok_or(AppError::not_found("Produto da entrada", entry_product_id))?;
        row.id_classification = Some(classification_id);
        row.updated_at = Utc::now();

        let updated = row.clone();
        drop(tables);
        self.wrote();
        Ok(updated)
    }
}

#[async_trait]
impl ClassificationStore for MemoryRecordStore {
    async fn get_classification(&self, id: Uuid) -> Result<Option<Classification>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.classifications.iter().find(|c| c.id == id).cloned())
    }

    async fn find_active_classification(
        &self,
        product_id: Uuid,
    ) -> Result<Option<Classification>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .classifications
            .iter()
            .rev()
            .find(|c| c.product_id == product_id && !c.deprecated)
            .cloned())
    }

    async fn list_classifications(&self, product_id: Uuid) -> Result<Vec<Classification>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .classifications
            .iter()
            .filter(|c| c.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn create_classification(
        &self,
        new: NewClassification,
    ) -> Result<Classification, AppError> {
        self.check(StoreOp::CreateClassification, new.product_id).await?;

        let f = new.fields;
        let row = Classification {
            id: Uuid::new_v4(),
            key: new.key,
            entry_id: new.entry_id,
            product_id: new.product_id,
            tariff_fraction: f.tariff_fraction,
            lumps: f.lumps,
            item: f.item,
            comments: f.comments,
            origin_country: f.origin_country,
            origin_seller: f.origin_seller,
            quantity: f.quantity,
            net_weight: f.net_weight,
            parts: f.parts,
            unit_type_id: f.unit_type_id,
            unit_weight_id: f.unit_weight_id,
            deprecated: false,
            created_at: Utc::now(),
        };
        self.tables.lock().await.classifications.push(row.clone());
        self.wrote();
        Ok(row)
    }

    async fn deprecate_classification(&self, id: Uuid) -> Result<Classification, AppError> {
        self.check(StoreOp::DeprecateClassification, id).await?;

        let mut tables = self.tables.lock().await;
        let row = tables
            .classifications
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(AppError::not_found("Classificação", id))?;
        row.deprecated = true;

        let updated = row.clone();
        drop(tables);
        self.wrote();
        Ok(updated)
    }

    async fn update_tariff_fraction(
        &self,
        id: Uuid,
        tariff_fraction: Option<&str>,
    ) -> Result<Classification, AppError> {
        self.check(StoreOp::UpdateTariffFraction, id).await?;

        let mut tables = self.tables.lock().await;
        let row = tables
            .classifications
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(AppError::not_found("Classificação", id))?;
        row.tariff_fraction = tariff_fraction.map(str::to_string);

        let updated = row.clone();
        drop(tables);
        self.wrote();
        Ok(updated)
    }
}

fn party_matches(name: &str, tax_id: Option<&str>, search: Option<&str>) -> bool {
    match search {
        Some(term) => {
            contains_ignore_case(name, term) || tax_id.is_some_and(|t| contains_ignore_case(t, term))
        }
        None => true,
    }
}

// src/services/entry_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RecordStore,
    models::entry::{
        Entry, EntryFilter, EntryProduct, EntryStatus, EntryStatusKind, NewEntry, NewEntryProduct,
    },
};

/// Dados de criação de uma entrada vindos do handler.
#[derive(Debug, Clone)]
pub struct CreateEntry {
    pub key: String,
    pub author_id: Uuid,
    pub supplier_id: Uuid,
    pub client_id: Uuid,
    pub tax_id: Option<String>,
    pub invoice_number: Option<String>,
}

#[derive(Clone)]
pub struct EntryService {
    store: Arc<dyn RecordStore>,
}

impl EntryService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn create_entry(&self, data: CreateEntry) -> Result<Entry, AppError> {
        if self.store.get_supplier(data.supplier_id).await?.is_none() {
            return Err(AppError::not_found("Fornecedor", data.supplier_id));
        }
        if self.store.get_client(data.client_id).await?.is_none() {
            return Err(AppError::not_found("Cliente", data.client_id));
        }

        // Toda entrada nasce "Open", sem revisão nem classificação.
        let open = resolve_status(self.store.as_ref(), EntryStatusKind::Open).await?;

        let entry = self.store
            .create_entry(NewEntry {
                key: data.key,
                author_id: data.author_id,
                supplier_id: data.supplier_id,
                client_id: data.client_id,
                tax_id: data.tax_id,
                invoice_number: data.invoice_number,
                status_id: open.id,
            })
            .await?;

        tracing::info!("Entrada {} criada ({})", entry.id, entry.key);
        Ok(entry)
    }

    pub async fn get_entry(&self, id: Uuid) -> Result<Entry, AppError> {
        self.store
            .get_entry(id)
            .await?
            .ok_or(AppError::not_found("Entrada", id))
    }

    pub async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>, AppError> {
        self.store.list_entries(filter).await
    }

    pub async fn list_statuses(&self) -> Result<Vec<EntryStatus>, AppError> {
        self.store.list_statuses().await
    }

    /// Anexa um produto à entrada. Idempotente: devolve a linha existente.
    pub async fn attach_product(&self, entry_id: Uuid, product_id: Uuid) -> Result<EntryProduct, AppError> {
        let entry = self.get_entry(entry_id).await?;
        ensure_entry_product(self.store.as_ref(), entry.id, product_id).await
    }
}

/// Busca o produto da entrada para (entrada, produto) ou cria com os padrões.
pub async fn ensure_entry_product(
    store: &dyn RecordStore,
    entry_id: Uuid,
    product_id: Uuid,
) -> Result<EntryProduct, AppError> {
    if let Some(existing) = store.find_entry_product(entry_id, product_id).await? {
        return Ok(existing);
    }

    let product = store
        .get_product(product_id)
        .await?
        .ok_or(AppError::not_found("Produto", product_id))?;

    let created = store
        .create_entry_product(NewEntryProduct::with_defaults(entry_id, product.id, product.unit_price))
        .await?;

    tracing::info!("Produto {} anexado à entrada {}", product_id, entry_id);
    Ok(created)
}

/// Resolve a linha de status pelo nome canônico. A ausência indica banco sem seed.
pub async fn resolve_status(store: &dyn RecordStore, kind: EntryStatusKind) -> Result<EntryStatus, AppError> {
    store
        .find_status_by_name(kind.name())
        .await?
        .ok_or_else(|| anyhow::anyhow!("Status '{}' não cadastrado", kind.name()).into())
}

/// Rejeita identificador de entrada ausente ou nulo.
pub fn require_entry_id(entry_id: Option<Uuid>) -> Result<Uuid, AppError> {
    match entry_id {
        Some(id) if !id.is_nil() => Ok(id),
        _ => Err(AppError::InvalidEntry),
    }
}

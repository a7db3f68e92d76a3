// src/models/entry.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::catalog::contains_ignore_case;

// --- Status (linhas de referência semeadas no banco) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryStatus {
    pub id: Uuid,
    #[schema(example = "In_classify")]
    pub name: String,
}

/// Nomes canônicos dos status usados pelo ciclo de vida da entrada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatusKind {
    Open,
    InClassify,
    Active,
    Finished,
}

impl EntryStatusKind {
    pub const ALL: [EntryStatusKind; 4] = [
        EntryStatusKind::Open,
        EntryStatusKind::InClassify,
        EntryStatusKind::Active,
        EntryStatusKind::Finished,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntryStatusKind::Open => "Open",
            EntryStatusKind::InClassify => "In_classify",
            EntryStatusKind::Active => "Active",
            EntryStatusKind::Finished => "Finished",
        }
    }
}

// --- Entrada (pedimento / operação de importação) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    /// Chave pública de correlação gerada pelo cliente.
    #[schema(example = "ENT-2026-000412")]
    pub key: String,
    pub author_id: Uuid,
    pub supplier_id: Uuid,
    pub client_id: Uuid,
    #[schema(example = "INO010101AAA")]
    pub tax_id: Option<String>,
    #[schema(example = "INV-88231")]
    pub invoice_number: Option<String>,
    pub status_id: Uuid,
    pub is_reviewed: bool,
    pub is_classify: bool,

    // Totais financeiros
    #[schema(example = "1250.00")]
    pub subtotal: Decimal,
    pub packing_price: Decimal,
    pub other_price: Decimal,
    pub total: Decimal,

    // Agregados de classificação
    pub net_weight: Decimal,
    pub lumps: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub key: String,
    pub author_id: Uuid,
    pub supplier_id: Uuid,
    pub client_id: Uuid,
    pub tax_id: Option<String>,
    pub invoice_number: Option<String>,
    pub status_id: Uuid,
}

/// Totais enviados pelo chamador ao concluir revisão/classificação.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRollup {
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub packing_price: Decimal,
    #[serde(default)]
    pub other_price: Decimal,
    #[serde(default)]
    pub total: Decimal,
}

/// Atualização parcial de uma entrada. `None` mantém a coluna intacta.
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    pub status_id: Option<Uuid>,
    pub is_reviewed: Option<bool>,
    pub is_classify: Option<bool>,
    pub rollup: Option<FinancialRollup>,
    pub net_weight: Option<Decimal>,
    pub lumps: Option<Decimal>,
}

impl EntryUpdate {
    pub fn apply(&self, entry: &mut Entry) {
        if let Some(status_id) = self.status_id {
            entry.status_id = status_id;
        }
        if let Some(flag) = self.is_reviewed {
            entry.is_reviewed = flag;
        }
        if let Some(flag) = self.is_classify {
            entry.is_classify = flag;
        }
        if let Some(rollup) = self.rollup {
            entry.subtotal = rollup.subtotal;
            entry.packing_price = rollup.packing_price;
            entry.other_price = rollup.other_price;
            entry.total = rollup.total;
        }
        if let Some(net_weight) = self.net_weight {
            entry.net_weight = net_weight;
        }
        if let Some(lumps) = self.lumps {
            entry.lumps = lumps;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EntryFilter {
    pub status_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub is_reviewed: Option<bool>,
    pub is_classify: Option<bool>,
    /// Busca por chave ou número de fatura.
    pub search: Option<String>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &Entry) -> bool {
        let eq = |wanted: Option<Uuid>, actual: Uuid| wanted.is_none_or(|id| id == actual);
        let flag = |wanted: Option<bool>, actual: bool| wanted.is_none_or(|f| f == actual);

        eq(self.status_id, entry.status_id)
            && eq(self.supplier_id, entry.supplier_id)
            && eq(self.client_id, entry.client_id)
            && flag(self.is_reviewed, entry.is_reviewed)
            && flag(self.is_classify, entry.is_classify)
            && self.search.as_deref().is_none_or(|term| {
                contains_ignore_case(&entry.key, term)
                    || entry
                        .invoice_number
                        .as_deref()
                        .is_some_and(|invoice| contains_ignore_case(invoice, term))
            })
    }
}

// --- Produto da Entrada (tabela de junção) ---
// No máximo um por (entrada, produto): sempre buscar antes de criar.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryProduct {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub product_id: Uuid,
    #[schema(example = "12.50")]
    pub unit_price: Decimal,
    pub is_damaged: bool,
    pub is_outrank: bool,
    pub is_shortage: bool,
    #[schema(example = "L-0042")]
    pub lot: String,
    #[schema(example = "B-7")]
    pub batch: String,
    pub id_classification: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEntryProduct {
    pub entry_id: Uuid,
    pub product_id: Uuid,
    pub unit_price: Decimal,
    pub is_damaged: bool,
    pub is_outrank: bool,
    pub is_shortage: bool,
    pub lot: String,
    pub batch: String,
}

impl NewEntryProduct {
    /// Valores padrão ao anexar um produto pela primeira vez.
    pub fn with_defaults(entry_id: Uuid, product_id: Uuid, unit_price: Decimal) -> Self {
        Self {
            entry_id,
            product_id,
            unit_price,
            is_damaged: false,
            is_outrank: false,
            is_shortage: false,
            lot: String::new(),
            batch: String::new(),
        }
    }
}

/// Sobrescritas específicas da transação editadas na grade de classificação.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryProductUpdate {
    pub unit_price: Option<Decimal>,
    pub is_damaged: Option<bool>,
    pub is_outrank: Option<bool>,
    pub is_shortage: Option<bool>,
    pub lot: Option<String>,
    pub batch: Option<String>,
}

impl EntryProductUpdate {
    pub fn is_empty(&self) -> bool {
        *self == EntryProductUpdate::default()
    }

    pub fn apply(&self, row: &mut EntryProduct) {
        if let Some(price) = self.unit_price {
            row.unit_price = price;
        }
        if let Some(flag) = self.is_damaged {
            row.is_damaged = flag;
        }
        if let Some(flag) = self.is_outrank {
            row.is_outrank = flag;
        }
        if let Some(flag) = self.is_shortage {
            row.is_shortage = flag;
        }
        if let Some(lot) = &self.lot {
            row.lot = lot.trim().to_string();
        }
        if let Some(batch) = &self.batch {
            row.batch = batch.trim().to_string();
        }
    }
}

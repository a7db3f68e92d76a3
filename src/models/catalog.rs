// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Fornecedores e Clientes ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    #[schema(example = "Acme Components LLC")]
    pub name: String,
    #[schema(example = "US-99-1234567")]
    pub tax_id: Option<String>,
    #[schema(example = "US")]
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    #[schema(example = "Importadora del Norte SA de CV")]
    pub name: String,
    #[schema(example = "INO010101AAA")]
    pub tax_id: Option<String>,
    #[schema(example = "MX")]
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Dados de criação compartilhados por fornecedor e cliente.
#[derive(Debug, Clone)]
pub struct NewParty {
    pub name: String,
    pub tax_id: Option<String>,
    pub country: Option<String>,
}

// --- Catálogos de Unidades (somente leitura para o núcleo) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnitType {
    pub id: Uuid,
    #[schema(example = "Pieza")]
    pub name: String,
    #[schema(example = "PZA")]
    pub abbreviation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnitWeight {
    pub id: Uuid,
    #[schema(example = "Kilogramo")]
    pub name: String,
    #[schema(example = "KG")]
    pub abbreviation: String,
}

// --- Produtos ---
// Identidade imutável; descrição mutável; exclusão é lógica (is_active = false).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub unit_type_id: Option<Uuid>,
    #[schema(example = "Válvula de esfera 1/2\"")]
    pub name: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    #[schema(example = "0.35")]
    pub weight: Decimal,
    #[schema(example = "12.50")]
    pub unit_price: Decimal,
    pub is_active: bool,
    pub is_reviewed: bool,
    pub is_classify: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub supplier_id: Uuid,
    pub unit_type_id: Option<Uuid>,
    pub name: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub weight: Decimal,
    pub unit_price: Decimal,
}

/// Atualização parcial dos campos descritivos. `None` mantém o valor atual.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub unit_type_id: Option<Uuid>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub weight: Option<Decimal>,
    pub unit_price: Option<Decimal>,
}

/// Marcações de ciclo de vida propagadas pela entrada ao produto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductFlag {
    Reviewed,
    Classified,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub supplier_id: Option<Uuid>,
    pub search: Option<String>,
    pub include_inactive: bool,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if !self.include_inactive && !product.is_active {
            return false;
        }
        if let Some(supplier_id) = self.supplier_id {
            if product.supplier_id != supplier_id {
                return false;
            }
        }
        match &self.search {
            Some(term) => [
                Some(&product.name),
                product.brand.as_ref(),
                product.model.as_ref(),
                product.serial_number.as_ref(),
            ]
            .into_iter()
            .flatten()
            .any(|text| contains_ignore_case(text, term)),
            None => true,
        }
    }
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Padrão `ILIKE ... ESCAPE '\'` equivalente a `contains_ignore_case`:
/// `%`, `_` e `\` do termo são literais.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("abc"), "%abc%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\x"), "%c:\\\\x%");
    }

    #[test]
    fn wildcards_are_literal_in_memory_search() {
        assert!(contains_ignore_case("Desconto 50%", "50%"));
        assert!(!contains_ignore_case("Desconto 500", "50%"));
        assert!(!contains_ignore_case("AXB", "a_b"));
    }
}

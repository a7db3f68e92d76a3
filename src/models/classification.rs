// src/models/classification.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::field_compare::{loose_decimal, loose_ref, loose_text, FieldValue};

/// Registro versionado dos dados aduaneiros de um produto.
///
/// Por produto existe no máximo uma linha com `deprecated = false`. Uma
/// mudança real nunca altera o histórico: marca a linha atual como obsoleta
/// e cria outra.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub id: Uuid,
    /// Chave pública fornecida pelo chamador.
    #[schema(example = "c1f4e2d0-row-17")]
    pub key: String,
    pub entry_id: Uuid,
    pub product_id: Uuid,
    #[schema(example = "84813001")]
    pub tariff_fraction: Option<String>,
    pub lumps: Option<Decimal>,
    pub item: Option<String>,
    pub comments: Option<String>,
    #[schema(example = "MX")]
    pub origin_country: Option<String>,
    #[schema(example = "US")]
    pub origin_seller: Option<String>,
    pub quantity: Option<Decimal>,
    pub net_weight: Option<Decimal>,
    pub parts: Option<Decimal>,
    pub unit_type_id: Option<Uuid>,
    pub unit_weight_id: Option<Uuid>,
    pub deprecated: bool,
    pub created_at: DateTime<Utc>,
}

impl Classification {
    pub fn fields(&self) -> ClassificationFields {
        ClassificationFields {
            tariff_fraction: self.tariff_fraction.clone(),
            lumps: self.lumps,
            item: self.item.clone(),
            comments: self.comments.clone(),
            origin_country: self.origin_country.clone(),
            origin_seller: self.origin_seller.clone(),
            quantity: self.quantity,
            net_weight: self.net_weight,
            parts: self.parts,
            unit_type_id: self.unit_type_id,
            unit_weight_id: self.unit_weight_id,
        }
    }
}

/// Conjunto normalizado de campos propostos para a classificação.
///
/// Aceita os tipos misturados que chegam dos formulários (`"0"`, `0`, `""`).
/// Os limites de tamanho acompanham as colunas de `classifications`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationFields {
    #[serde(default, deserialize_with = "loose_text")]
    #[schema(value_type = Option<String>, example = "84813001")]
    #[validate(length(max = 20, message = "Fração arancelária com no máximo 20 caracteres."))]
    pub tariff_fraction: Option<String>,
    #[serde(default, deserialize_with = "loose_decimal")]
    pub lumps: Option<Decimal>,
    #[serde(default, deserialize_with = "loose_text")]
    #[validate(length(max = 100, message = "Item com no máximo 100 caracteres."))]
    pub item: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub comments: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    #[validate(length(max = 50, message = "País de origem com no máximo 50 caracteres."))]
    pub origin_country: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    #[validate(length(max = 50, message = "País vendedor com no máximo 50 caracteres."))]
    pub origin_seller: Option<String>,
    #[serde(default, deserialize_with = "loose_decimal")]
    pub quantity: Option<Decimal>,
    #[serde(default, deserialize_with = "loose_decimal")]
    pub net_weight: Option<Decimal>,
    #[serde(default, deserialize_with = "loose_decimal")]
    pub parts: Option<Decimal>,
    #[serde(default, deserialize_with = "loose_ref")]
    pub unit_type_id: Option<Uuid>,
    #[serde(default, deserialize_with = "loose_ref")]
    pub unit_weight_id: Option<Uuid>,
}

/// Nome de cada campo comparável, na ordem do formulário.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ClassificationField {
    TariffFraction,
    Lumps,
    Item,
    Comments,
    OriginCountry,
    OriginSeller,
    Quantity,
    NetWeight,
    Parts,
    UnitType,
    UnitWeight,
}

impl ClassificationFields {
    pub fn values(&self) -> [(ClassificationField, FieldValue<'_>); 11] {
        [
            (ClassificationField::TariffFraction, FieldValue::from(&self.tariff_fraction)),
            (ClassificationField::Lumps, FieldValue::from(&self.lumps)),
            (ClassificationField::Item, FieldValue::label(&self.item)),
            (ClassificationField::Comments, FieldValue::label(&self.comments)),
            (ClassificationField::OriginCountry, FieldValue::label(&self.origin_country)),
            (ClassificationField::OriginSeller, FieldValue::label(&self.origin_seller)),
            (ClassificationField::Quantity, FieldValue::from(&self.quantity)),
            (ClassificationField::NetWeight, FieldValue::from(&self.net_weight)),
            (ClassificationField::Parts, FieldValue::from(&self.parts)),
            (ClassificationField::UnitType, FieldValue::from(&self.unit_type_id)),
            (ClassificationField::UnitWeight, FieldValue::from(&self.unit_weight_id)),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct NewClassification {
    pub key: String,
    pub entry_id: Uuid,
    pub product_id: Uuid,
    pub fields: ClassificationFields,
}

// --- Visão desnormalizada: uma linha por produto da entrada ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRow {
    pub entry_product_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub supplier_name: Option<String>,

    pub lot: String,
    pub batch: String,
    pub unit_price: Decimal,
    pub is_damaged: bool,
    pub is_outrank: bool,
    pub is_shortage: bool,

    pub classification: Option<Classification>,
    pub unit_type: Option<String>,
    pub unit_weight: Option<String>,

    /// Fração não nula, lote e partida preenchidos.
    pub complete: bool,
}

// src/services/unit_catalog.rs

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RecordStore,
    models::{
        catalog::{UnitType, UnitWeight},
        classification::ClassificationFields,
    },
};

/// Catálogos de unidades carregados uma vez por operação.
#[derive(Debug, Clone, Default)]
pub struct UnitCatalog {
    unit_types: HashMap<Uuid, UnitType>,
    unit_weights: HashMap<Uuid, UnitWeight>,
}

impl UnitCatalog {
    pub async fn load(store: &dyn RecordStore) -> Result<Self, AppError> {
        let (unit_types, unit_weights) =
            tokio::try_join!(store.list_unit_types(), store.list_unit_weights())?;

        Ok(Self {
            unit_types: unit_types.into_iter().map(|u| (u.id, u)).collect(),
            unit_weights: unit_weights.into_iter().map(|u| (u.id, u)).collect(),
        })
    }

    pub fn unit_type(&self, id: Uuid) -> Option<&UnitType> {
        self.unit_types.get(&id)
    }

    pub fn unit_weight(&self, id: Uuid) -> Option<&UnitWeight> {
        self.unit_weights.get(&id)
    }

    pub fn unit_type_label(&self, id: Option<Uuid>) -> Option<String> {
        id.and_then(|id| self.unit_type(id))
            .map(|u| u.abbreviation.clone())
    }

    pub fn unit_weight_label(&self, id: Option<Uuid>) -> Option<String> {
        id.and_then(|id| self.unit_weight(id))
            .map(|u| u.abbreviation.clone())
    }

    /// Recusa referências de unidade que não existem nos catálogos.
    pub fn check_refs(&self, fields: &ClassificationFields) -> Result<(), AppError> {
        if let Some(id) = fields.unit_type_id {
            if self.unit_type(id).is_none() {
                return Err(AppError::not_found("Tipo de unidade", id));
            }
        }
        if let Some(id) = fields.unit_weight_id {
            if self.unit_weight(id).is_none() {
                return Err(AppError::not_found("Unidade de peso", id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CatalogStore, MemoryRecordStore};

    #[tokio::test]
    async fn resolves_labels_and_rejects_unknown_refs() {
        let store = MemoryRecordStore::new();
        let piece = store.create_unit_type("Pieza", "PZA").await.unwrap();
        let kilo = store.create_unit_weight("Kilogramo", "KG").await.unwrap();

        let catalog = UnitCatalog::load(&store).await.unwrap();
        assert_eq!(catalog.unit_type_label(Some(piece.id)).as_deref(), Some("PZA"));
        assert_eq!(catalog.unit_weight_label(Some(kilo.id)).as_deref(), Some("KG"));
        assert_eq!(catalog.unit_type_label(None), None);

        let ok = ClassificationFields {
            unit_type_id: Some(piece.id),
            unit_weight_id: Some(kilo.id),
            ..Default::default()
        };
        assert!(catalog.check_refs(&ok).is_ok());

        let unknown = ClassificationFields {
            unit_weight_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(matches!(
            catalog.check_refs(&unknown),
            Err(AppError::NotFound { .. })
        ));
    }
}

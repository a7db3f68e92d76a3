// Fixtures compartilhadas pelos testes dos serviços.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    db::{CatalogStore, EntryStore, MemoryRecordStore},
    models::{
        catalog::{NewParty, NewProduct, Product, UnitType, UnitWeight},
        entry::{Entry, EntryStatusKind, NewEntry},
    },
};

pub struct Fixture {
    pub store: Arc<MemoryRecordStore>,
    pub supplier_id: Uuid,
    pub client_id: Uuid,
    pub unit_type: UnitType,
    pub unit_weight: UnitWeight,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryRecordStore::new());

        let supplier = store
            .create_supplier(NewParty {
                name: "Acme Components LLC".into(),
                tax_id: Some("US-99-1234567".into()),
                country: Some("US".into()),
            })
            .await
            .unwrap();
        let client = store
            .create_client(NewParty {
                name: "Importadora del Norte".into(),
                tax_id: Some("INO010101AAA".into()),
                country: Some("MX".into()),
            })
            .await
            .unwrap();
        let unit_type = store.create_unit_type("Pieza", "PZA").await.unwrap();
        let unit_weight = store.create_unit_weight("Kilogramo", "KG").await.unwrap();

        Self {
            store,
            supplier_id: supplier.id,
            client_id: client.id,
            unit_type,
            unit_weight,
        }
    }

    pub async fn product(&self, name: &str) -> Product {
        self.store
            .create_product(NewProduct {
                supplier_id: self.supplier_id,
                unit_type_id: Some(self.unit_type.id),
                name: name.into(),
                brand: Some("Acme".into()),
                model: None,
                serial_number: None,
                weight: Decimal::new(35, 2),
                unit_price: Decimal::new(1250, 2),
            })
            .await
            .unwrap()
    }

    pub async fn entry(&self, key: &str) -> Entry {
        let open = self
            .store
            .find_status_by_name(EntryStatusKind::Open.name())
            .await
            .unwrap()
            .unwrap();
        self.store
            .create_entry(NewEntry {
                key: key.into(),
                author_id: Uuid::new_v4(),
                supplier_id: self.supplier_id,
                client_id: self.client_id,
                tax_id: None,
                invoice_number: Some(format!("INV-{}", key)),
                status_id: open.id,
            })
            .await
            .unwrap()
    }
}

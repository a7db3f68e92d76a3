// src/services/catalog_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RecordStore,
    models::catalog::{
        Client, NewParty, NewProduct, Product, ProductFilter, ProductUpdate, Supplier, UnitType,
        UnitWeight,
    },
};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn RecordStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    // --- FORNECEDORES / CLIENTES ---
    pub async fn create_supplier(&self, new: NewParty) -> Result<Supplier, AppError> {
        let supplier = self.store.create_supplier(new).await?;
        tracing::info!("Fornecedor {} cadastrado ({})", supplier.id, supplier.name);
        Ok(supplier)
    }

    pub async fn list_suppliers(&self, search: Option<&str>) -> Result<Vec<Supplier>, AppError> {
        self.store.list_suppliers(search).await
    }

    pub async fn create_client(&self, new: NewParty) -> Result<Client, AppError> {
        let client = self.store.create_client(new).await?;
        tracing::info!("Cliente {} cadastrado ({})", client.id, client.name);
        Ok(client)
    }

    pub async fn list_clients(&self, search: Option<&str>) -> Result<Vec<Client>, AppError> {
        self.store.list_clients(search).await
    }

    // --- PRODUTOS ---
    pub async fn create_product(&self, new: NewProduct) -> Result<Product, AppError> {
        if self.store.get_supplier(new.supplier_id).await?.is_none() {
            return Err(AppError::not_found("Fornecedor", new.supplier_id));
        }
        self.check_unit_type(new.unit_type_id).await?;

        if new.unit_price < Decimal::ZERO || new.weight < Decimal::ZERO {
            return Err(AppError::incomplete("Preço e peso não podem ser negativos."));
        }

        let product = self.store.create_product(new).await?;
        tracing::info!("Produto {} cadastrado ({})", product.id, product.name);
        Ok(product)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.store
            .get_product(id)
            .await?
            .ok_or(AppError::not_found("Produto", id))
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        self.store.list_products(filter).await
    }

    pub async fn update_product(&self, id: Uuid, update: &ProductUpdate) -> Result<Product, AppError> {
        self.check_unit_type(update.unit_type_id).await?;
        let negative = [update.unit_price, update.weight]
            .into_iter()
            .flatten()
            .any(|v| v < Decimal::ZERO);
        if negative {
            return Err(AppError::incomplete("Preço e peso não podem ser negativos."));
        }
        self.store.update_product(id, update).await
    }

    /// Exclusão lógica: o produto some das listagens mas o histórico continua.
    pub async fn deactivate_product(&self, id: Uuid) -> Result<Product, AppError> {
        let product = self.store.deactivate_product(id).await?;
        tracing::info!("Produto {} desativado", id);
        Ok(product)
    }

    // --- UNIDADES ---
    pub async fn create_unit_type(&self, name: &str, abbreviation: &str) -> Result<UnitType, AppError> {
        self.store.create_unit_type(name.trim(), abbreviation.trim()).await
    }

    pub async fn list_unit_types(&self) -> Result<Vec<UnitType>, AppError> {
        self.store.list_unit_types().await
    }

    pub async fn create_unit_weight(&self, name: &str, abbreviation: &str) -> Result<UnitWeight, AppError> {
        self.store.create_unit_weight(name.trim(), abbreviation.trim()).await
    }

    pub async fn list_unit_weights(&self) -> Result<Vec<UnitWeight>, AppError> {
        self.store.list_unit_weights().await
    }

    async fn check_unit_type(&self, id: Option<Uuid>) -> Result<(), AppError> {
        let Some(id) = id else { return Ok(()) };
        let known = self.store.list_unit_types().await?;
        if known.iter().any(|u| u.id == id) {
            Ok(())
        } else {
            Err(AppError::not_found("Tipo de unidade", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::Fixture;

    fn service(fx: &Fixture) -> CatalogService {
        CatalogService::new(fx.store.clone())
    }

    fn new_product(fx: &Fixture, name: &str) -> NewProduct {
        NewProduct {
            supplier_id: fx.supplier_id,
            unit_type_id: Some(fx.unit_type.id),
            name: name.into(),
            brand: Some("Bosch".into()),
            model: Some("GSR-120".into()),
            serial_number: None,
            weight: Decimal::new(12, 1),
            unit_price: Decimal::new(8990, 2),
        }
    }

    #[tokio::test]
    async fn product_requires_known_supplier_and_unit() {
        let fx = Fixture::new().await;
        let svc = service(&fx);

        let mut orphan = new_product(&fx, "Parafusadeira");
        orphan.supplier_id = Uuid::new_v4();
        assert!(matches!(svc.create_product(orphan).await, Err(AppError::NotFound { .. })));

        let mut bad_unit = new_product(&fx, "Parafusadeira");
        bad_unit.unit_type_id = Some(Uuid::new_v4());
        assert!(matches!(svc.create_product(bad_unit).await, Err(AppError::NotFound { .. })));

        let created = svc.create_product(new_product(&fx, "Parafusadeira")).await.unwrap();
        assert!(created.is_active);
        assert!(!created.is_reviewed && !created.is_classify);
    }

    #[tokio::test]
    async fn update_keeps_untouched_fields() {
        let fx = Fixture::new().await;
        let svc = service(&fx);
        let product = svc.create_product(new_product(&fx, "Furadeira")).await.unwrap();

        let updated = svc
            .update_product(
                product.id,
                &ProductUpdate {
                    unit_price: Some(Decimal::new(7990, 2)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.unit_price, Decimal::new(7990, 2));
        assert_eq!(updated.name, "Furadeira");
        assert_eq!(updated.brand.as_deref(), Some("Bosch"));

        let negative = svc
            .update_product(
                product.id,
                &ProductUpdate {
                    weight: Some(Decimal::new(-1, 0)),
                    ..Default::default()
                },
            )
            .await;
        assert!(negative.is_err());
    }

    #[tokio::test]
    async fn deactivated_products_leave_default_listing() {
        let fx = Fixture::new().await;
        let svc = service(&fx);
        let keep = svc.create_product(new_product(&fx, "Serra")).await.unwrap();
        let gone = svc.create_product(new_product(&fx, "Lixadeira")).await.unwrap();

        svc.deactivate_product(gone.id).await.unwrap();

        let active = svc.list_products(&ProductFilter::default()).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, keep.id);

        let all = svc
            .list_products(&ProductFilter {
                include_inactive: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn suppliers_are_searchable() {
        let fx = Fixture::new().await;
        let svc = service(&fx);
        svc.create_supplier(NewParty {
            name: "Herramientas Monterrey".into(),
            tax_id: None,
            country: Some("MX".into()),
        })
        .await
        .unwrap();

        let found = svc.list_suppliers(Some("monterrey")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(svc.list_suppliers(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unit_names_are_trimmed() {
        let fx = Fixture::new().await;
        let svc = service(&fx);
        let unit = svc.create_unit_type("  Caja ", " CJ ").await.unwrap();
        assert_eq!(unit.name, "Caja");
        assert_eq!(unit.abbreviation, "CJ");
        assert_eq!(svc.list_unit_types().await.unwrap().len(), 2);
    }
}

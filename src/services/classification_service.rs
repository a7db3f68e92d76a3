// src/services/classification_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{AppError, OperationStatus},
        field_compare::{fields_equal, FieldValue},
    },
    db::RecordStore,
    models::{
        classification::{
            Classification, ClassificationField, ClassificationFields, ClassificationRow,
            NewClassification,
        },
        entry::{EntryProduct, EntryProductUpdate},
    },
    services::{
        entry_service::{ensure_entry_product, require_entry_id},
        unit_catalog::UnitCatalog,
    },
};

// =============================================================================
//  DECISÃO (pura)
// =============================================================================

/// O que fazer com a classificação de um produto diante dos campos propostos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ReconcileAction {
    /// Nada mudou: reaproveita a classificação ativa (se houver).
    Unchanged,
    /// Só a fração mudou e antes estava vazia/zero: corrige no lugar.
    TariffCompletion,
    /// Mudança real: a ativa vira obsoleta e nasce uma nova versão.
    NewVersion,
}

/// Campos em que a proposta difere da classificação atual.
pub fn changed_fields(
    current: &ClassificationFields,
    proposed: &ClassificationFields,
) -> Vec<ClassificationField> {
    current
        .values()
        .iter()
        .zip(proposed.values().iter())
        .filter(|((_, a), (_, b))| !fields_equal(a, b))
        .map(|((field, _), _)| *field)
        .collect()
}

/// Regras avaliadas em ordem; a primeira que casa vence.
pub fn decide(current: Option<&Classification>, proposed: &ClassificationFields) -> ReconcileAction {
    let Some(current) = current else {
        let meaningful = proposed.values().iter().any(|(_, value)| !value.is_blank());
        return if meaningful {
            ReconcileAction::NewVersion
        } else {
            ReconcileAction::Unchanged
        };
    };

    let changed = changed_fields(&current.fields(), proposed);
    if changed.is_empty() {
        return ReconcileAction::Unchanged;
    }

    let tariff_was_blank = FieldValue::from(&current.tariff_fraction).is_blank();
    if changed == [ClassificationField::TariffFraction] && tariff_was_blank {
        return ReconcileAction::TariffCompletion;
    }

    ReconcileAction::NewVersion
}

// =============================================================================
//  REQUISIÇÕES & RELATÓRIOS
// =============================================================================

#[derive(Debug, Clone)]
pub struct SaveClassification {
    /// Chave pública gerada pelo cliente para a nova versão.
    pub key: String,
    pub entry_id: Option<Uuid>,
    pub product_id: Uuid,
    pub fields: ClassificationFields,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub status: OperationStatus,
    pub message: String,
    pub product_id: Uuid,
    pub action: Option<ReconcileAction>,
    pub reused: bool,
    pub updated_tariff_only: bool,
    pub entry_product_id: Option<Uuid>,
    pub classification_id: Option<Uuid>,
    pub changed_fields: Vec<ClassificationField>,
}

impl ReconcileReport {
    fn failed(product_id: Uuid, err: &AppError) -> Self {
        Self {
            status: err.status(),
            message: err.report_message(),
            product_id,
            action: None,
            reused: false,
            updated_tariff_only: false,
            entry_product_id: None,
            classification_id: None,
            changed_fields: Vec::new(),
        }
    }
}

/// Uma linha editada na grade, ainda não salva.
#[derive(Debug, Clone)]
pub struct StagedRow {
    pub key: String,
    pub product_id: Uuid,
    pub overrides: Option<EntryProductUpdate>,
    pub fields: ClassificationFields,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub unchanged: usize,
    pub tariff_completed: usize,
    pub versioned: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchSaveReport {
    pub status: OperationStatus,
    pub message: String,
    pub summary: BatchSummary,
    pub rows: Vec<ReconcileReport>,
}

// =============================================================================
//  SERVIÇO
// =============================================================================

#[derive(Clone)]
pub struct ClassificationService {
    store: Arc<dyn RecordStore>,
}

impl ClassificationService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Salva a classificação de um produto dentro de uma entrada.
    ///
    /// Nunca devolve `Err`: falhas do store viram relatório com
    /// `status: error`. Não há rollback entre a escrita do produto da entrada
    /// e a da classificação.
    pub async fn save(&self, request: SaveClassification) -> ReconcileReport {
        self.save_with_overrides(request, None).await
    }

    async fn save_with_overrides(
        &self,
        request: SaveClassification,
        overrides: Option<&EntryProductUpdate>,
    ) -> ReconcileReport {
        let product_id = request.product_id;

        match self.reconcile(request, overrides).await {
            Ok(report) => {
                tracing::info!(
                    "Classificação do produto {} salva: {:?}",
                    product_id,
                    report.action
                );
                report
            }
            Err(e) => {
                match e.status() {
                    OperationStatus::Warning => {
                        tracing::warn!("Classificação do produto {} recusada: {}", product_id, e)
                    }
                    _ => tracing::error!("Falha ao salvar classificação do produto {}: {}", product_id, e),
                }
                ReconcileReport::failed(product_id, &e)
            }
        }
    }

    async fn reconcile(
        &self,
        request: SaveClassification,
        overrides: Option<&EntryProductUpdate>,
    ) -> Result<ReconcileReport, AppError> {
        let store = self.store.as_ref();
        let entry_id = require_entry_id(request.entry_id)?;

        // 1. Validação e referências de unidade (somente leitura)
        request.fields.validate()?;
        UnitCatalog::load(store).await?.check_refs(&request.fields)?;

        // 2. Produto da entrada: sempre primeiro e de forma independente
        let mut entry_product = ensure_entry_product(store, entry_id, request.product_id).await?;
        if let Some(overrides) = overrides.filter(|o| !o.is_empty()) {
            entry_product = store.update_entry_product(entry_product.id, overrides).await?;
        }

        // 3. Estado atual lido do store a cada chamada
        let current = store.find_active_classification(request.product_id).await?;
        let action = decide(current.as_ref(), &request.fields);
        let changed = current
            .as_ref()
            .map(|c| changed_fields(&c.fields(), &request.fields))
            .unwrap_or_default();

        let mut report = ReconcileReport {
            status: OperationStatus::Success,
            message: String::new(),
            product_id: request.product_id,
            action: Some(action),
            reused: false,
            updated_tariff_only: false,
            entry_product_id: Some(entry_product.id),
            classification_id: None,
            changed_fields: changed,
        };

        match (action, current) {
            (ReconcileAction::Unchanged, None) => {
                report.message = "Nenhum dado de classificação informado.".into();
            }
            (ReconcileAction::Unchanged, Some(active)) => {
                self.link(store, &entry_product, active.id).await?;
                report.reused = true;
                report.classification_id = Some(active.id);
                report.message = "Classificação sem alterações.".into();
            }
            (ReconcileAction::TariffCompletion, Some(active)) => {
                let patched = store
                    .update_tariff_fraction(active.id, request.fields.tariff_fraction.as_deref())
                    .await?;
                self.link(store, &entry_product, patched.id).await?;
                report.reused = true;
                report.updated_tariff_only = true;
                report.classification_id = Some(patched.id);
                report.message = "Fração arancelária completada.".into();
            }
            (_, current) => {
                if let Some(old) = &current {
                    store.deprecate_classification(old.id).await?;
                }
                let created = store
                    .create_classification(NewClassification {
                        key: request.key,
                        entry_id,
                        product_id: request.product_id,
                        fields: request.fields,
                    })
                    .await?;
                store.link_classification(entry_product.id, created.id).await?;

                report.action = Some(ReconcileAction::NewVersion);
                report.classification_id = Some(created.id);
                report.message = match current {
                    Some(_) => "Nova versão da classificação criada.".into(),
                    None => "Classificação criada.".into(),
                };
            }
        }

        Ok(report)
    }

    // Religa só quando aponta para outra linha; o resultado é o mesmo.
    async fn link(
        &self,
        store: &dyn RecordStore,
        entry_product: &EntryProduct,
        classification_id: Uuid,
    ) -> Result<(), AppError> {
        if entry_product.id_classification != Some(classification_id) {
            store.link_classification(entry_product.id, classification_id).await?;
        }
        Ok(())
    }

    /// Salva de uma vez as linhas editadas na grade. Cada linha é
    /// independente: a falha de uma não interrompe as seguintes.
    pub async fn save_rows(&self, entry_id: Option<Uuid>, rows: Vec<StagedRow>) -> BatchSaveReport {
        let entry_id = match require_entry_id(entry_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Lote de classificação recusado: {}", e);
                return BatchSaveReport {
                    status: e.status(),
                    message: e.report_message(),
                    summary: BatchSummary::default(),
                    rows: Vec::new(),
                };
            }
        };

        let mut summary = BatchSummary::default();
        let mut reports = Vec::with_capacity(rows.len());

        for row in rows {
            let report = self.save_row(entry_id, row).await;
            match (report.status, report.action) {
                (OperationStatus::Success, Some(ReconcileAction::Unchanged)) => summary.unchanged += 1,
                (OperationStatus::Success, Some(ReconcileAction::TariffCompletion)) => {
                    summary.tariff_completed += 1
                }
                (OperationStatus::Success, Some(ReconcileAction::NewVersion)) => summary.versioned += 1,
                _ => summary.failed += 1,
            }
            reports.push(report);
        }

        let saved = reports.len() - summary.failed;
        let (status, message) = if summary.failed == 0 {
            (OperationStatus::Success, format!("{} linha(s) salvas.", saved))
        } else if saved == 0 {
            (OperationStatus::Error, "Nenhuma linha pôde ser salva.".to_string())
        } else {
            (
                OperationStatus::Warning,
                format!("{} linha(s) salvas, {} com falha. Tente novamente as pendentes.", saved, summary.failed),
            )
        };

        tracing::info!("Lote da entrada {}: {:?}", entry_id, summary);
        BatchSaveReport { status, message, summary, rows: reports }
    }

    async fn save_row(&self, entry_id: Uuid, row: StagedRow) -> ReconcileReport {
        let request = SaveClassification {
            key: row.key,
            entry_id: Some(entry_id),
            product_id: row.product_id,
            fields: row.fields,
        };
        self.save_with_overrides(request, row.overrides.as_ref()).await
    }

    /// Visão desnormalizada: uma linha por produto da entrada.
    pub async fn rows(&self, entry_id: Uuid) -> Result<Vec<ClassificationRow>, AppError> {
        let store = self.store.as_ref();
        if store.get_entry(entry_id).await?.is_none() {
            return Err(AppError::not_found("Entrada", entry_id));
        }

        let units = UnitCatalog::load(store).await?;
        let entry_products = store.list_entry_products(entry_id).await?;
        let mut supplier_names: HashMap<Uuid, Option<String>> = HashMap::new();
        let mut rows = Vec::with_capacity(entry_products.len());

        for ep in entry_products {
            let product = store
                .get_product(ep.product_id)
                .await?
                .ok_or(AppError::not_found("Produto", ep.product_id))?;

            let supplier_name = match supplier_names.get(&product.supplier_id) {
                Some(name) => name.clone(),
                None => {
                    let name = store.get_supplier(product.supplier_id).await?.map(|s| s.name);
                    supplier_names.insert(product.supplier_id, name.clone());
                    name
                }
            };

            let classification = match ep.id_classification {
                Some(id) => store.get_classification(id).await?,
                None => None,
            };

            rows.push(ClassificationRow {
                entry_product_id: ep.id,
                product_id: product.id,
                product_name: product.name,
                brand: product.brand,
                model: product.model,
                serial_number: product.serial_number,
                supplier_name,
                complete: is_complete(&ep, classification.as_ref()),
                unit_type: units.unit_type_label(classification.as_ref().and_then(|c| c.unit_type_id)),
                unit_weight: units.unit_weight_label(classification.as_ref().and_then(|c| c.unit_weight_id)),
                lot: ep.lot,
                batch: ep.batch,
                unit_price: ep.unit_price,
                is_damaged: ep.is_damaged,
                is_outrank: ep.is_outrank,
                is_shortage: ep.is_shortage,
                classification,
            });
        }

        Ok(rows)
    }

    /// Histórico completo (inclusive versões obsoletas) de um produto.
    pub async fn history(&self, product_id: Uuid) -> Result<Vec<Classification>, AppError> {
        self.store.list_classifications(product_id).await
    }
}

/// Dados completos para fechar a classificação: fração não nula, lote e
/// partida preenchidos.
pub fn is_complete(entry_product: &EntryProduct, classification: Option<&Classification>) -> bool {
    let tariff_ok = classification
        .is_some_and(|c| !FieldValue::from(&c.tariff_fraction).is_blank());
    tariff_ok && !entry_product.lot.trim().is_empty() && !entry_product.batch.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{memory_store::StoreOp, ClassificationStore, EntryStore};
    use crate::services::test_support::Fixture;
    use rust_decimal::Decimal;

    fn service(fx: &Fixture) -> ClassificationService {
        ClassificationService::new(fx.store.clone())
    }

    fn base_fields(fx: &Fixture) -> ClassificationFields {
        ClassificationFields {
            tariff_fraction: Some("0".into()),
            lumps: Some(Decimal::new(2, 0)),
            item: Some("A".into()),
            comments: None,
            origin_country: Some("MX".into()),
            origin_seller: Some("US".into()),
            quantity: Some(Decimal::new(10, 0)),
            net_weight: Some(Decimal::new(35, 1)),
            parts: None,
            unit_type_id: Some(fx.unit_type.id),
            unit_weight_id: Some(fx.unit_weight.id),
        }
    }

    fn request(entry_id: Uuid, product_id: Uuid, fields: ClassificationFields) -> SaveClassification {
        SaveClassification {
            key: Uuid::new_v4().to_string(),
            entry_id: Some(entry_id),
            product_id,
            fields,
        }
    }

    async fn active_count(fx: &Fixture, product_id: Uuid) -> usize {
        fx.store
            .list_classifications(product_id)
            .await
            .unwrap()
            .iter()
            .filter(|c| !c.deprecated)
            .count()
    }

    #[tokio::test]
    async fn first_save_creates_entry_product_and_classification() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;

        let report = service(&fx)
            .save(request(entry.id, product.id, base_fields(&fx)))
            .await;

        assert_eq!(report.status, OperationStatus::Success);
        assert!(!report.reused);
        assert_eq!(report.action, Some(ReconcileAction::NewVersion));

        let ep = fx.store.find_entry_product(entry.id, product.id).await.unwrap().unwrap();
        let active = fx.store.find_active_classification(product.id).await.unwrap().unwrap();
        assert!(!active.deprecated);
        assert_eq!(ep.id_classification, Some(active.id));
        assert_eq!(report.classification_id, Some(active.id));
    }

    #[tokio::test]
    async fn unchanged_save_is_idempotent() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;
        let svc = service(&fx);
        svc.save(request(entry.id, product.id, base_fields(&fx))).await;

        // Mesmos valores, mas com os tipos frouxos do formulário.
        let mut same = base_fields(&fx);
        same.tariff_fraction = None;
        same.origin_country = Some(" MX".into());

        for _ in 0..2 {
            let report = svc.save(request(entry.id, product.id, same.clone())).await;
            assert_eq!(report.status, OperationStatus::Success);
            assert!(report.reused);
            assert_eq!(report.action, Some(ReconcileAction::Unchanged));
        }
        assert_eq!(fx.store.list_classifications(product.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn completing_a_blank_tariff_patches_in_place() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;
        let svc = service(&fx);
        let first = svc.save(request(entry.id, product.id, base_fields(&fx))).await;

        let mut fields = base_fields(&fx);
        fields.tariff_fraction = Some("84813001".into());
        let report = svc.save(request(entry.id, product.id, fields)).await;

        assert!(report.reused);
        assert!(report.updated_tariff_only);
        assert_eq!(report.classification_id, first.classification_id);

        let all = fx.store.list_classifications(product.id).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].deprecated);
        assert_eq!(all[0].tariff_fraction.as_deref(), Some("84813001"));
    }

    #[tokio::test]
    async fn changing_a_filled_tariff_creates_a_new_version() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;
        let svc = service(&fx);

        let mut fields = base_fields(&fx);
        fields.tariff_fraction = Some("5".into());
        let first = svc.save(request(entry.id, product.id, fields.clone())).await;

        fields.tariff_fraction = Some("7".into());
        let second = svc.save(request(entry.id, product.id, fields)).await;

        assert!(!second.reused);
        assert_eq!(second.action, Some(ReconcileAction::NewVersion));
        assert_eq!(second.changed_fields, vec![ClassificationField::TariffFraction]);

        let old = fx
            .store
            .get_classification(first.classification_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(old.deprecated);

        let ep = fx.store.find_entry_product(entry.id, product.id).await.unwrap().unwrap();
        let active = fx.store.find_active_classification(product.id).await.unwrap().unwrap();
        assert_eq!(active.tariff_fraction.as_deref(), Some("7"));
        assert_eq!(ep.id_classification, Some(active.id));
        assert_eq!(fx.store.list_classifications(product.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn tariff_plus_other_change_is_a_new_version() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;
        let svc = service(&fx);
        svc.save(request(entry.id, product.id, base_fields(&fx))).await;

        let mut fields = base_fields(&fx);
        fields.tariff_fraction = Some("84813001".into());
        fields.quantity = Some(Decimal::new(11, 0));
        let report = svc.save(request(entry.id, product.id, fields)).await;

        assert_eq!(report.action, Some(ReconcileAction::NewVersion));
        assert!(!report.updated_tariff_only);
    }

    #[tokio::test]
    async fn at_most_one_active_classification_per_product() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let other_entry = fx.entry("E2").await;
        let product = fx.product("P").await;
        let svc = service(&fx);

        let mut fields = base_fields(&fx);
        let steps: [(Uuid, Option<&str>, i64); 5] = [
            (entry.id, Some("0"), 10),
            (entry.id, Some("84813001"), 10),
            (other_entry.id, Some("84813001"), 12),
            (entry.id, Some("84813001"), 12),
            (other_entry.id, Some("84819099"), 12),
        ];
        for (entry_id, tariff, quantity) in steps {
            fields.tariff_fraction = tariff.map(str::to_string);
            fields.quantity = Some(Decimal::new(quantity, 0));
            let report = svc.save(request(entry_id, product.id, fields.clone())).await;
            assert_eq!(report.status, OperationStatus::Success);
            assert!(active_count(&fx, product.id).await <= 1);
        }
        assert_eq!(active_count(&fx, product.id).await, 1);
    }

    #[tokio::test]
    async fn empty_proposal_without_history_writes_nothing() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;

        let report = service(&fx)
            .save(request(entry.id, product.id, ClassificationFields::default()))
            .await;

        assert_eq!(report.status, OperationStatus::Success);
        assert_eq!(report.action, Some(ReconcileAction::Unchanged));
        assert!(!report.reused);
        assert!(report.entry_product_id.is_some());
        assert!(fx.store.list_classifications(product.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_entry_is_reported_not_raised() {
        let fx = Fixture::new().await;
        let product = fx.product("P").await;

        let mut req = request(Uuid::nil(), product.id, base_fields(&fx));
        let report = service(&fx).save(req.clone()).await;
        assert_eq!(report.status, OperationStatus::Error);

        req.entry_id = None;
        let report = service(&fx).save(req).await;
        assert_eq!(report.status, OperationStatus::Error);
        assert_eq!(report.entry_product_id, None);
    }

    #[tokio::test]
    async fn unknown_unit_reference_writes_nothing() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;

        let mut fields = base_fields(&fx);
        fields.unit_weight_id = Some(Uuid::new_v4());
        let report = service(&fx).save(request(entry.id, product.id, fields)).await;

        assert_eq!(report.status, OperationStatus::Error);
        assert!(fx.store.find_entry_product(entry.id, product.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn editing_free_text_creates_a_new_version() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;
        let svc = service(&fx);

        let mut fields = base_fields(&fx);
        fields.tariff_fraction = Some("84813001".into());
        fields.item = Some("007".into());
        fields.origin_country = Some("01".into());
        svc.save(request(entry.id, product.id, fields.clone())).await;

        fields.item = Some("7".into());
        fields.origin_country = Some("1.0".into());
        let report = svc.save(request(entry.id, product.id, fields)).await;

        assert_eq!(report.status, OperationStatus::Success);
        assert_eq!(report.action, Some(ReconcileAction::NewVersion));
        assert!(!report.reused);
        assert_eq!(
            report.changed_fields,
            vec![ClassificationField::Item, ClassificationField::OriginCountry]
        );
        let active = fx.store.find_active_classification(product.id).await.unwrap().unwrap();
        assert_eq!(active.item.as_deref(), Some("7"));
        assert_eq!(active.origin_country.as_deref(), Some("1.0"));
    }

    #[tokio::test]
    async fn oversized_text_is_refused_before_any_write() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;

        let mut fields = base_fields(&fx);
        fields.tariff_fraction = Some("8".repeat(21));
        let writes_before = fx.store.write_count();
        let report = service(&fx).save(request(entry.id, product.id, fields)).await;

        assert_eq!(report.status, OperationStatus::Error);
        assert!(report.message.contains("tariffFraction") || report.message.contains("tariff_fraction"));
        assert_eq!(fx.store.write_count(), writes_before);
    }

    #[tokio::test]
    async fn staged_row_with_unknown_unit_keeps_overrides_unwritten() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;
        let svc = service(&fx);
        let ep = ensure_entry_product(fx.store.as_ref(), entry.id, product.id).await.unwrap();

        let mut fields = base_fields(&fx);
        fields.unit_type_id = Some(Uuid::new_v4());
        let writes_before = fx.store.write_count();
        let report = svc
            .save_rows(
                Some(entry.id),
                vec![StagedRow {
                    key: "row-1".into(),
                    product_id: product.id,
                    overrides: Some(EntryProductUpdate {
                        lot: Some("L-9".into()),
                        batch: Some("B-9".into()),
                        ..Default::default()
                    }),
                    fields,
                }],
            )
            .await;

        assert_eq!(report.status, OperationStatus::Error);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(fx.store.write_count(), writes_before);
        let after = fx.store.find_entry_product(entry.id, product.id).await.unwrap().unwrap();
        assert_eq!(after.id, ep.id);
        assert!(after.lot.is_empty());
        assert!(after.batch.is_empty());
    }

    #[tokio::test]
    async fn partial_failure_keeps_entry_product_without_rollback() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;
        fx.store.fail_on(StoreOp::CreateClassification, None).await;

        let report = service(&fx)
            .save(request(entry.id, product.id, base_fields(&fx)))
            .await;

        assert_eq!(report.status, OperationStatus::Error);
        let ep = fx.store.find_entry_product(entry.id, product.id).await.unwrap().unwrap();
        assert_eq!(ep.id_classification, None);
    }

    #[tokio::test]
    async fn batch_save_applies_overrides_and_isolates_failures() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let good = fx.product("Good").await;
        let bad = fx.product("Bad").await;
        fx.store.fail_on(StoreOp::CreateClassification, Some(bad.id)).await;

        let overrides = EntryProductUpdate {
            lot: Some(" L-1 ".into()),
            batch: Some("B-1".into()),
            ..Default::default()
        };
        let rows = vec![
            StagedRow {
                key: "row-1".into(),
                product_id: bad.id,
                overrides: Some(overrides.clone()),
                fields: base_fields(&fx),
            },
            StagedRow {
                key: "row-2".into(),
                product_id: good.id,
                overrides: Some(overrides),
                fields: base_fields(&fx),
            },
        ];

        let report = service(&fx).save_rows(Some(entry.id), rows).await;

        assert_eq!(report.status, OperationStatus::Warning);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.versioned, 1);
        assert_eq!(report.rows[0].status, OperationStatus::Error);
        assert_eq!(report.rows[1].status, OperationStatus::Success);

        let ep = fx.store.find_entry_product(entry.id, good.id).await.unwrap().unwrap();
        assert_eq!(ep.lot, "L-1");
        assert_eq!(ep.batch, "B-1");
    }

    #[tokio::test]
    async fn rows_view_joins_product_classification_and_units() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("Válvula").await;
        let svc = service(&fx);

        let mut fields = base_fields(&fx);
        fields.tariff_fraction = Some("84813001".into());
        svc.save_rows(
            Some(entry.id),
            vec![StagedRow {
                key: "row-1".into(),
                product_id: product.id,
                overrides: Some(EntryProductUpdate {
                    lot: Some("L-1".into()),
                    batch: Some("B-1".into()),
                    ..Default::default()
                }),
                fields,
            }],
        )
        .await;

        let rows = svc.rows(entry.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.product_name, "Válvula");
        assert_eq!(row.supplier_name.as_deref(), Some("Acme Components LLC"));
        assert_eq!(row.unit_type.as_deref(), Some("PZA"));
        assert_eq!(row.unit_weight.as_deref(), Some("KG"));
        assert!(row.complete);
    }

    #[test]
    fn decide_follows_rule_order() {
        let fx_fields = ClassificationFields {
            tariff_fraction: Some("5".into()),
            item: Some("A".into()),
            ..Default::default()
        };
        assert_eq!(decide(None, &fx_fields), ReconcileAction::NewVersion);
        assert_eq!(decide(None, &ClassificationFields::default()), ReconcileAction::Unchanged);

        let zero_tariff = ClassificationFields {
            tariff_fraction: Some("0".into()),
            lumps: Some(Decimal::ZERO),
            ..Default::default()
        };
        assert_eq!(decide(None, &zero_tariff), ReconcileAction::Unchanged);
    }
}

// src/services/workflow_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::task::JoinSet;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::{AppError, OperationStatus},
    db::RecordStore,
    models::{
        catalog::ProductFlag,
        entry::{Entry, EntryProduct, EntryStatusKind, EntryUpdate, FinancialRollup},
    },
    services::{
        classification_service::is_complete,
        entry_service::{require_entry_id, resolve_status},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Transition {
    Review,
    Classify,
    Finish,
}

/// Resultado individual da marcação de um produto (revisado/classificado).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdateOutcome {
    pub product_id: Uuid,
    pub ok: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowReport {
    pub status: OperationStatus,
    pub message: String,
    pub transition: Transition,
    pub entry: Option<Entry>,
    /// Produtos que impediram a classificação (dados incompletos).
    pub incomplete_products: Vec<String>,
    pub product_updates: Vec<ProductUpdateOutcome>,
}

impl WorkflowReport {
    fn from_error(transition: Transition, err: AppError) -> Self {
        let status = err.status();
        let message = err.report_message();
        let incomplete_products = match err {
            AppError::ValidationIncomplete { products, .. } => products,
            _ => Vec::new(),
        };
        Self {
            status,
            message,
            transition,
            entry: None,
            incomplete_products,
            product_updates: Vec::new(),
        }
    }
}

struct Completed {
    entry: Entry,
    message: &'static str,
    product_updates: Vec<ProductUpdateOutcome>,
}

/// Ciclo de vida da entrada: Open → Reviewed → Classified → Finished.
///
/// Cada transição é monotônica. Guardas recusadas voltam como `warning`;
/// falhas do store como `error`. Nenhuma chamada devolve `Err`.
#[derive(Clone)]
pub struct EntryWorkflow {
    store: Arc<dyn RecordStore>,
}

impl EntryWorkflow {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn finalize_review(&self, entry_id: Option<Uuid>, rollup: FinancialRollup) -> WorkflowReport {
        let result = self.try_finalize_review(entry_id, rollup).await;
        self.report(Transition::Review, entry_id, result)
    }

    pub async fn finalize_classification(
        &self,
        entry_id: Option<Uuid>,
        rollup: FinancialRollup,
    ) -> WorkflowReport {
        let result = self.try_finalize_classification(entry_id, rollup).await;
        self.report(Transition::Classify, entry_id, result)
    }

    pub async fn finalize_entry(&self, entry_id: Option<Uuid>) -> WorkflowReport {
        let result = self.try_finalize_entry(entry_id).await;
        self.report(Transition::Finish, entry_id, result)
    }

    fn report(
        &self,
        transition: Transition,
        entry_id: Option<Uuid>,
        result: Result<Completed, AppError>,
    ) -> WorkflowReport {
        match result {
            Ok(done) => {
                tracing::info!("Entrada {}: {:?} concluída", done.entry.id, transition);
                WorkflowReport {
                    status: OperationStatus::Success,
                    message: done.message.to_string(),
                    transition,
                    entry: Some(done.entry),
                    incomplete_products: Vec::new(),
                    product_updates: done.product_updates,
                }
            }
            Err(e) => {
                match e.status() {
                    OperationStatus::Warning => {
                        tracing::warn!("Entrada {:?}: {:?} recusada: {}", entry_id, transition, e)
                    }
                    _ => tracing::error!("Entrada {:?}: falha em {:?}: {}", entry_id, transition, e),
                }
                WorkflowReport::from_error(transition, e)
            }
        }
    }

    async fn load(&self, entry_id: Option<Uuid>) -> Result<(Entry, Vec<EntryProduct>), AppError> {
        let id = require_entry_id(entry_id)?;
        let entry = self.store
            .get_entry(id)
            .await?
            .ok_or(AppError::not_found("Entrada", id))?;
        let entry_products = self.store.list_entry_products(id).await?;
        Ok((entry, entry_products))
    }

    // --- Open → Reviewed ---
    async fn try_finalize_review(
        &self,
        entry_id: Option<Uuid>,
        rollup: FinancialRollup,
    ) -> Result<Completed, AppError> {
        let (entry, entry_products) = self.load(entry_id).await?;

        if entry.is_reviewed {
            return Err(AppError::incomplete("A entrada já foi revisada."));
        }
        if entry_products.is_empty() {
            return Err(AppError::incomplete("A entrada não possui produtos para revisar."));
        }

        let next = resolve_status(self.store.as_ref(), EntryStatusKind::InClassify).await?;
        let entry = self.store
            .update_entry(
                entry.id,
                &EntryUpdate {
                    status_id: Some(next.id),
                    is_reviewed: Some(true),
                    rollup: Some(rollup),
                    ..Default::default()
                },
            )
            .await?;

        let product_updates = self.mark_products(&entry_products, ProductFlag::Reviewed).await;

        Ok(Completed {
            entry,
            message: "Revisão concluída.",
            product_updates,
        })
    }

    // --- Reviewed → Classified ---
    async fn try_finalize_classification(
        &self,
        entry_id: Option<Uuid>,
        rollup: FinancialRollup,
    ) -> Result<Completed, AppError> {
        let (entry, entry_products) = self.load(entry_id).await?;

        if !entry.is_reviewed {
            return Err(AppError::incomplete("A entrada precisa ser revisada antes da classificação."));
        }
        if entry.is_classify {
            return Err(AppError::incomplete("A entrada já foi classificada."));
        }
        if entry_products.is_empty() {
            return Err(AppError::incomplete("A entrada não possui produtos para classificar."));
        }

        // 1. Todos os produtos precisam estar completos
        let mut incomplete = Vec::new();
        let mut net_weight = Decimal::ZERO;
        let mut lumps = Decimal::ZERO;

        for ep in &entry_products {
            let classification = match ep.id_classification {
                Some(id) => self.store.get_classification(id).await?,
                None => None,
            };

            if is_complete(ep, classification.as_ref()) {
                if let Some(c) = &classification {
                    net_weight += c.net_weight.unwrap_or_default();
                    lumps += c.lumps.unwrap_or_default();
                }
            } else {
                let name = self.store
                    .get_product(ep.product_id)
                    .await?
                    .map(|p| p.name)
                    .unwrap_or_else(|| ep.product_id.to_string());
                incomplete.push(name);
            }
        }

        if !incomplete.is_empty() {
            return Err(AppError::ValidationIncomplete {
                message: format!(
                    "{} produto(s) sem fração arancelária, lote ou partida.",
                    incomplete.len()
                ),
                products: incomplete,
            });
        }

        // 2. Avança o status e grava totais e agregados
        let next = resolve_status(self.store.as_ref(), EntryStatusKind::Active).await?;
        let entry = self.store
            .update_entry(
                entry.id,
                &EntryUpdate {
                    status_id: Some(next.id),
                    is_classify: Some(true),
                    rollup: Some(rollup),
                    net_weight: Some(net_weight),
                    lumps: Some(lumps),
                    ..Default::default()
                },
            )
            .await?;

        let product_updates = self.mark_products(&entry_products, ProductFlag::Classified).await;

        Ok(Completed {
            entry,
            message: "Classificação concluída.",
            product_updates,
        })
    }

    // --- Classified → Finished ---
    async fn try_finalize_entry(&self, entry_id: Option<Uuid>) -> Result<Completed, AppError> {
        let (entry, entry_products) = self.load(entry_id).await?;

        let current = self.store.get_status(entry.status_id).await?;
        let current_name = current.as_ref().map(|s| s.name.as_str());

        if current_name == Some(EntryStatusKind::Finished.name()) {
            return Err(AppError::incomplete("A entrada já foi finalizada."));
        }
        if current_name != Some(EntryStatusKind::Active.name()) || !entry.is_classify {
            return Err(AppError::incomplete("A entrada precisa estar classificada para ser finalizada."));
        }
        if entry_products.is_empty() {
            return Err(AppError::incomplete("A entrada não possui produtos."));
        }

        let finished = resolve_status(self.store.as_ref(), EntryStatusKind::Finished).await?;
        let entry = self.store
            .update_entry(
                entry.id,
                &EntryUpdate {
                    status_id: Some(finished.id),
                    ..Default::default()
                },
            )
            .await?;

        Ok(Completed {
            entry,
            message: "Entrada finalizada.",
            product_updates: Vec::new(),
        })
    }

    /// Dispara todas as marcações em paralelo e espera todas terminarem.
    /// Falhas individuais são registradas e nunca abortam o lote.
    async fn mark_products(&self, entry_products: &[EntryProduct], flag: ProductFlag) -> Vec<ProductUpdateOutcome> {
        let mut outcomes: Vec<ProductUpdateOutcome> = entry_products
            .iter()
            .map(|ep| ProductUpdateOutcome {
                product_id: ep.product_id,
                ok: false,
                error: Some("tarefa interrompida".to_string()),
            })
            .collect();

        let mut tasks = JoinSet::new();
        for (index, ep) in entry_products.iter().enumerate() {
            let store = Arc::clone(&self.store);
            let product_id = ep.product_id;
            tasks.spawn(async move { (index, store.set_product_flag(product_id, flag).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(_))) => {
                    outcomes[index].ok = true;
                    outcomes[index].error = None;
                }
                Ok((index, Err(e))) => {
                    tracing::error!(
                        "Falha ao marcar produto {} como {:?}: {}",
                        outcomes[index].product_id,
                        flag,
                        e
                    );
                    outcomes[index].error = Some(e.to_string());
                }
                Err(join_err) => {
                    tracing::error!("Tarefa de marcação de produto abortada: {}", join_err);
                }
            }
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{memory_store::StoreOp, CatalogStore, EntryStore};
    use crate::models::{classification::ClassificationFields, entry::EntryProductUpdate};
    use crate::services::{
        classification_service::{ClassificationService, SaveClassification},
        entry_service::ensure_entry_product,
        test_support::Fixture,
    };

    fn workflow(fx: &Fixture) -> EntryWorkflow {
        EntryWorkflow::new(fx.store.clone())
    }

    fn rollup() -> FinancialRollup {
        FinancialRollup {
            subtotal: Decimal::new(100000, 2),
            packing_price: Decimal::new(5000, 2),
            other_price: Decimal::new(2500, 2),
            total: Decimal::new(107500, 2),
        }
    }

    async fn classify(fx: &Fixture, entry_id: Uuid, product_id: Uuid, tariff: &str) {
        let report = ClassificationService::new(fx.store.clone())
            .save(SaveClassification {
                key: Uuid::new_v4().to_string(),
                entry_id: Some(entry_id),
                product_id,
                fields: ClassificationFields {
                    tariff_fraction: Some(tariff.to_string()),
                    lumps: Some(Decimal::new(2, 0)),
                    net_weight: Some(Decimal::new(35, 1)),
                    ..Default::default()
                },
            })
            .await;
        assert_eq!(report.status, OperationStatus::Success);
    }

    async fn fill_lot_and_batch(fx: &Fixture, entry_id: Uuid, product_id: Uuid) {
        let ep = ensure_entry_product(fx.store.as_ref(), entry_id, product_id).await.unwrap();
        fx.store
            .update_entry_product(
                ep.id,
                &EntryProductUpdate {
                    lot: Some("L-1".into()),
                    batch: Some("B-1".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    async fn status_name(fx: &Fixture, entry: &Entry) -> String {
        fx.store.get_status(entry.status_id).await.unwrap().unwrap().name
    }

    #[tokio::test]
    async fn review_requires_products() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;

        let report = workflow(&fx).finalize_review(Some(entry.id), rollup()).await;
        assert_eq!(report.status, OperationStatus::Warning);

        let entry = fx.store.get_entry(entry.id).await.unwrap().unwrap();
        assert!(!entry.is_reviewed);
    }

    #[tokio::test]
    async fn review_is_monotonic() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;
        ensure_entry_product(fx.store.as_ref(), entry.id, product.id).await.unwrap();
        let wf = workflow(&fx);

        let first = wf.finalize_review(Some(entry.id), rollup()).await;
        assert_eq!(first.status, OperationStatus::Success);
        let reviewed = first.entry.unwrap();
        assert!(reviewed.is_reviewed);
        assert_eq!(reviewed.total, rollup().total);
        assert_eq!(status_name(&fx, &reviewed).await, "In_classify");
        assert!(first.product_updates.iter().all(|u| u.ok));
        assert!(fx.store.get_product(product.id).await.unwrap().unwrap().is_reviewed);

        let writes_before = fx.store.write_count();
        let second = wf.finalize_review(Some(entry.id), rollup()).await;
        assert_eq!(second.status, OperationStatus::Warning);
        assert!(second.product_updates.is_empty());
        assert_eq!(fx.store.write_count(), writes_before);
    }

    #[tokio::test]
    async fn classification_before_review_is_refused_without_writes() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;
        classify(&fx, entry.id, product.id, "84813001").await;
        fill_lot_and_batch(&fx, entry.id, product.id).await;

        let writes_before = fx.store.write_count();
        let report = workflow(&fx).finalize_classification(Some(entry.id), rollup()).await;

        assert_eq!(report.status, OperationStatus::Warning);
        assert_eq!(fx.store.write_count(), writes_before);
    }

    #[tokio::test]
    async fn classification_lists_incomplete_products() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let done = fx.product("Completo").await;
        let missing_tariff = fx.product("Sem fração").await;
        let missing_lot = fx.product("Sem lote").await;

        classify(&fx, entry.id, done.id, "84813001").await;
        fill_lot_and_batch(&fx, entry.id, done.id).await;
        classify(&fx, entry.id, missing_tariff.id, "0").await;
        fill_lot_and_batch(&fx, entry.id, missing_tariff.id).await;
        classify(&fx, entry.id, missing_lot.id, "84819099").await;

        let wf = workflow(&fx);
        assert_eq!(wf.finalize_review(Some(entry.id), rollup()).await.status, OperationStatus::Success);

        let report = wf.finalize_classification(Some(entry.id), rollup()).await;
        assert_eq!(report.status, OperationStatus::Warning);
        assert_eq!(report.incomplete_products.len(), 2);
        assert!(report.incomplete_products.contains(&"Sem fração".to_string()));
        assert!(report.incomplete_products.contains(&"Sem lote".to_string()));

        let entry = fx.store.get_entry(entry.id).await.unwrap().unwrap();
        assert!(!entry.is_classify);
    }

    #[tokio::test]
    async fn full_lifecycle_reaches_finished() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let a = fx.product("A").await;
        let b = fx.product("B").await;
        for product in [&a, &b] {
            classify(&fx, entry.id, product.id, "84813001").await;
            fill_lot_and_batch(&fx, entry.id, product.id).await;
        }
        let wf = workflow(&fx);

        // Finalizar antes de classificar é recusado.
        assert_eq!(wf.finalize_entry(Some(entry.id)).await.status, OperationStatus::Warning);

        assert_eq!(wf.finalize_review(Some(entry.id), rollup()).await.status, OperationStatus::Success);
        let classified = wf.finalize_classification(Some(entry.id), rollup()).await;
        assert_eq!(classified.status, OperationStatus::Success);
        let entry_after = classified.entry.unwrap();
        assert!(entry_after.is_classify);
        assert_eq!(status_name(&fx, &entry_after).await, "Active");
        assert_eq!(entry_after.net_weight, Decimal::new(70, 1));
        assert_eq!(entry_after.lumps, Decimal::new(4, 0));
        assert!(fx.store.get_product(a.id).await.unwrap().unwrap().is_classify);

        let finished = wf.finalize_entry(Some(entry.id)).await;
        assert_eq!(finished.status, OperationStatus::Success);
        assert_eq!(status_name(&fx, &finished.entry.unwrap()).await, "Finished");

        let again = wf.finalize_entry(Some(entry.id)).await;
        assert_eq!(again.status, OperationStatus::Warning);
    }

    #[tokio::test]
    async fn classification_is_monotonic() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;
        classify(&fx, entry.id, product.id, "84813001").await;
        fill_lot_and_batch(&fx, entry.id, product.id).await;
        let wf = workflow(&fx);
        assert_eq!(wf.finalize_review(Some(entry.id), rollup()).await.status, OperationStatus::Success);
        assert_eq!(wf.finalize_classification(Some(entry.id), rollup()).await.status, OperationStatus::Success);

        let writes_before = fx.store.write_count();
        let again = wf.finalize_classification(Some(entry.id), rollup()).await;

        assert_eq!(again.status, OperationStatus::Warning);
        assert!(again.entry.is_none());
        assert!(again.product_updates.is_empty());
        assert_eq!(fx.store.write_count(), writes_before);
    }

    #[tokio::test]
    async fn classification_requires_products() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        // Revisada por fora do fluxo, sem nenhum produto anexado.
        fx.store
            .update_entry(
                entry.id,
                &EntryUpdate {
                    is_reviewed: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let writes_before = fx.store.write_count();
        let report = workflow(&fx).finalize_classification(Some(entry.id), rollup()).await;

        assert_eq!(report.status, OperationStatus::Warning);
        assert!(report.incomplete_products.is_empty());
        assert_eq!(fx.store.write_count(), writes_before);
        assert!(!fx.store.get_entry(entry.id).await.unwrap().unwrap().is_classify);
    }

    #[tokio::test]
    async fn finishing_a_reviewed_entry_is_refused_without_writes() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;
        classify(&fx, entry.id, product.id, "84813001").await;
        fill_lot_and_batch(&fx, entry.id, product.id).await;
        let wf = workflow(&fx);
        let reviewed = wf.finalize_review(Some(entry.id), rollup()).await.entry.unwrap();
        assert_eq!(status_name(&fx, &reviewed).await, "In_classify");

        let writes_before = fx.store.write_count();
        let report = wf.finalize_entry(Some(entry.id)).await;

        assert_eq!(report.status, OperationStatus::Warning);
        assert_eq!(fx.store.write_count(), writes_before);
        let entry = fx.store.get_entry(entry.id).await.unwrap().unwrap();
        assert_eq!(status_name(&fx, &entry).await, "In_classify");
    }

    #[tokio::test]
    async fn product_flag_failures_do_not_fail_the_transition() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let ok = fx.product("Ok").await;
        let broken = fx.product("Quebrado").await;
        ensure_entry_product(fx.store.as_ref(), entry.id, ok.id).await.unwrap();
        ensure_entry_product(fx.store.as_ref(), entry.id, broken.id).await.unwrap();
        fx.store.fail_on(StoreOp::SetProductFlag, Some(broken.id)).await;

        let report = workflow(&fx).finalize_review(Some(entry.id), rollup()).await;

        assert_eq!(report.status, OperationStatus::Success);
        assert_eq!(report.product_updates.len(), 2);
        let failed: Vec<_> = report.product_updates.iter().filter(|u| !u.ok).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].product_id, broken.id);
        assert!(fx.store.get_product(ok.id).await.unwrap().unwrap().is_reviewed);
    }

    #[tokio::test]
    async fn primary_write_failure_is_an_error() {
        let fx = Fixture::new().await;
        let entry = fx.entry("E").await;
        let product = fx.product("P").await;
        ensure_entry_product(fx.store.as_ref(), entry.id, product.id).await.unwrap();
        fx.store.fail_on(StoreOp::UpdateEntry, Some(entry.id)).await;

        let report = workflow(&fx).finalize_review(Some(entry.id), rollup()).await;
        assert_eq!(report.status, OperationStatus::Error);
        assert!(!fx.store.get_product(product.id).await.unwrap().unwrap().is_reviewed);
    }

    #[tokio::test]
    async fn missing_entry_identity_is_an_error() {
        let fx = Fixture::new().await;
        let report = workflow(&fx).finalize_review(None, rollup()).await;
        assert_eq!(report.status, OperationStatus::Error);
    }
}

// src/handlers/classification.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        classification::{Classification, ClassificationFields, ClassificationRow},
        entry::EntryProductUpdate,
    },
    services::classification_service::{
        BatchSaveReport, ReconcileReport, SaveClassification, StagedRow,
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveClassificationPayload {
    /// Chave pública da nova versão. Gerada no servidor se ausente.
    #[validate(length(min = 1, max = 64))]
    pub key: Option<String>,

    #[validate(required(message = "O campo 'productId' é obrigatório."))]
    pub product_id: Option<Uuid>,

    #[serde(default)]
    #[validate(nested)]
    pub fields: ClassificationFields,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StagedRowPayload {
    #[validate(length(min = 1, max = 64))]
    pub key: Option<String>,
    pub product_id: Uuid,
    /// Lote, partida e marcações editados na grade.
    pub overrides: Option<EntryProductUpdate>,
    #[serde(default)]
    #[validate(nested)]
    pub fields: ClassificationFields,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchSavePayload {
    #[validate(nested)]
    pub rows: Vec<StagedRowPayload>,
}

impl BatchSavePayload {
    fn validate_not_empty(&self) -> Result<(), ValidationError> {
        if self.rows.is_empty() {
            let mut err = ValidationError::new("length");
            err.message = Some("Nenhuma linha para salvar.".into());
            return Err(err);
        }
        Ok(())
    }
}

fn key_or_new(key: Option<String>) -> String {
    key.map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[utoipa::path(
    get,
    path = "/api/entries/{entry_id}/classification",
    tag = "Classification",
    params(("entry_id" = Uuid, Path, description = "ID da Entrada")),
    responses(
        (status = 200, description = "Linhas de classificação da entrada", body = Vec<ClassificationRow>),
        (status = 404, description = "Entrada não encontrada")
    )
)]
pub async fn list_rows(
    State(app_state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.classification_service.rows(entry_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/entries/{entry_id}/classification",
    tag = "Classification",
    request_body = SaveClassificationPayload,
    params(("entry_id" = Uuid, Path, description = "ID da Entrada")),
    responses(
        (status = 200, description = "Classificação reconciliada", body = ReconcileReport),
        (status = 500, description = "Falha na reconciliação", body = ReconcileReport)
    )
)]
pub async fn save_classification(
    State(app_state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<SaveClassificationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let Some(product_id) = payload.product_id else {
        return Err(AppError::incomplete("O campo 'productId' é obrigatório."));
    };

    let report = app_state
        .classification_service
        .save(SaveClassification {
            key: key_or_new(payload.key),
            entry_id: Some(entry_id),
            product_id,
            fields: payload.fields,
        })
        .await;

    Ok((report.status.http_status(), Json(report)))
}

#[utoipa::path(
    post,
    path = "/api/entries/{entry_id}/classification/batch",
    tag = "Classification",
    request_body = BatchSavePayload,
    params(("entry_id" = Uuid, Path, description = "ID da Entrada")),
    responses(
        (status = 200, description = "Todas as linhas salvas", body = BatchSaveReport),
        (status = 422, description = "Algumas linhas falharam", body = BatchSaveReport),
        (status = 500, description = "Nenhuma linha salva", body = BatchSaveReport)
    )
)]
pub async fn save_batch(
    State(app_state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<BatchSavePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    payload.validate_not_empty().map_err(|e| {
        let mut errors = validator::ValidationErrors::new();
        errors.add("rows", e);
        AppError::ValidationError(errors)
    })?;

    let rows = payload
        .rows
        .into_iter()
        .map(|row| StagedRow {
            key: key_or_new(row.key),
            product_id: row.product_id,
            overrides: row.overrides,
            fields: row.fields,
        })
        .collect();

    let report = app_state
        .classification_service
        .save_rows(Some(entry_id), rows)
        .await;

    Ok((report.status.http_status(), Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/products/{product_id}/classifications",
    tag = "Classification",
    params(("product_id" = Uuid, Path, description = "ID do Produto")),
    responses((status = 200, description = "Versões de classificação do produto", body = Vec<Classification>))
)]
pub async fn product_history(
    State(app_state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.classification_service.history(product_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn blank_keys_are_replaced() {
        assert_eq!(key_or_new(Some(" CL-1 ".into())), "CL-1");
        assert!(Uuid::parse_str(&key_or_new(Some("  ".into()))).is_ok());
        assert!(Uuid::parse_str(&key_or_new(None)).is_ok());
    }

    #[test]
    fn payload_accepts_loose_field_values() {
        let payload: SaveClassificationPayload = serde_json::from_value(serde_json::json!({
            "productId": Uuid::new_v4(),
            "fields": { "tariffFraction": 84813001, "quantity": "12", "lumps": "", "unitTypeId": "" }
        }))
        .unwrap();

        assert_eq!(payload.fields.tariff_fraction.as_deref(), Some("84813001"));
        assert_eq!(payload.fields.quantity, Some(rust_decimal::Decimal::new(12, 0)));
        assert_eq!(payload.fields.lumps, None);
        assert_eq!(payload.fields.unit_type_id, None);
    }

    #[tokio::test]
    async fn nil_entry_yields_error_report() {
        let state = AppState::in_memory();
        let response = save_classification(
            State(state),
            Path(Uuid::nil()),
            Json(SaveClassificationPayload {
                key: None,
                product_id: Some(Uuid::new_v4()),
                fields: ClassificationFields::default(),
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn empty_batch_is_a_bad_request() {
        let state = AppState::in_memory();
        let response = save_batch(
            State(state),
            Path(Uuid::new_v4()),
            Json(BatchSavePayload { rows: Vec::new() }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_row_field_is_a_bad_request() {
        let state = AppState::in_memory();
        let response = save_batch(
            State(state),
            Path(Uuid::new_v4()),
            Json(BatchSavePayload {
                rows: vec![StagedRowPayload {
                    key: None,
                    product_id: Uuid::new_v4(),
                    overrides: None,
                    fields: ClassificationFields {
                        item: Some("x".repeat(101)),
                        ..Default::default()
                    },
                }],
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rows_of_unknown_entry_are_not_found() {
        let state = AppState::in_memory();
        let response = list_rows(State(state), Path(Uuid::new_v4())).await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

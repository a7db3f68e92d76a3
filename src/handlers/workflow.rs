// src/handlers/workflow.rs

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
    models::entry::FinancialRollup,
    services::workflow_service::WorkflowReport,
};

fn validate_rollup(rollup: &FinancialRollup) -> Result<(), ValidationError> {
    let values = [rollup.subtotal, rollup.packing_price, rollup.other_price, rollup.total];
    if values.iter().any(|v| v.is_sign_negative()) {
        let mut err = ValidationError::new("range");
        err.message = Some("Os valores financeiros não podem ser negativos.".into());
        return Err(err);
    }
    Ok(())
}

/// Totais recalculados pelo cliente no momento da transição.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionPayload {
    #[serde(flatten)]
    #[validate(custom(function = "validate_rollup"))]
    pub rollup: FinancialRollup,
}

#[utoipa::path(
    post,
    path = "/api/entries/{entry_id}/review",
    tag = "Workflow",
    request_body = TransitionPayload,
    params(("entry_id" = Uuid, Path, description = "ID da Entrada")),
    responses(
        (status = 200, description = "Revisão concluída", body = WorkflowReport),
        (status = 422, description = "Transição recusada", body = WorkflowReport),
        (status = 500, description = "Falha na transição", body = WorkflowReport)
    )
)]
pub async fn finalize_review(
    State(app_state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<TransitionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let report = app_state.workflow.finalize_review(Some(entry_id), payload.rollup).await;
    Ok((report.status.http_status(), Json(report)))
}

#[utoipa::path(
    post,
    path = "/api/entries/{entry_id}/classify",
    tag = "Workflow",
    request_body = TransitionPayload,
    params(("entry_id" = Uuid, Path, description = "ID da Entrada")),
    responses(
        (status = 200, description = "Classificação concluída", body = WorkflowReport),
        (status = 422, description = "Transição recusada ou produtos incompletos", body = WorkflowReport),
        (status = 500, description = "Falha na transição", body = WorkflowReport)
    )
)]
pub async fn finalize_classification(
    State(app_state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<TransitionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let report = app_state
        .workflow
        .finalize_classification(Some(entry_id), payload.rollup)
        .await;
    Ok((report.status.http_status(), Json(report)))
}

#[utoipa::path(
    post,
    path = "/api/entries/{entry_id}/finish",
    tag = "Workflow",
    params(("entry_id" = Uuid, Path, description = "ID da Entrada")),
    responses(
        (status = 200, description = "Entrada finalizada", body = WorkflowReport),
        (status = 422, description = "Transição recusada", body = WorkflowReport),
        (status = 500, description = "Falha na transição", body = WorkflowReport)
    )
)]
pub async fn finalize_entry(
    State(app_state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> impl IntoResponse {
    let report = app_state.workflow.finalize_entry(Some(entry_id)).await;
    (report.status.http_status(), Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use rust_decimal::Decimal;

    #[test]
    fn negative_totals_are_rejected() {
        let payload = TransitionPayload {
            rollup: FinancialRollup {
                total: Decimal::new(-1, 0),
                ..Default::default()
            },
        };
        assert!(payload.validate().is_err());
        assert!(TransitionPayload::default().validate().is_ok());
    }

    #[test]
    fn rollup_fields_are_read_from_the_top_level() {
        let payload: TransitionPayload = serde_json::from_value(serde_json::json!({
            "subtotal": 100.5,
            "total": 110
        }))
        .unwrap();
        assert_eq!(payload.rollup.subtotal, Decimal::new(1005, 1));
        assert_eq!(payload.rollup.total, Decimal::new(110, 0));
        assert_eq!(payload.rollup.packing_price, Decimal::ZERO);
    }

    #[tokio::test]
    async fn review_of_unknown_entry_is_an_error_report() {
        let state = AppState::in_memory();
        let response = finalize_review(
            State(state),
            Path(Uuid::new_v4()),
            Json(TransitionPayload::default()),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

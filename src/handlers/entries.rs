// src/handlers/entries.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::entry::{Entry, EntryFilter, EntryProduct, EntryStatus},
    services::entry_service::CreateEntry,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryPayload {
    #[validate(length(min = 1, max = 64, message = "A chave da entrada é obrigatória."))]
    pub key: String,

    #[validate(required(message = "O campo 'authorId' é obrigatório."))]
    pub author_id: Option<Uuid>,

    #[validate(required(message = "O campo 'supplierId' é obrigatório."))]
    pub supplier_id: Option<Uuid>,

    #[validate(required(message = "O campo 'clientId' é obrigatório."))]
    pub client_id: Option<Uuid>,

    pub tax_id: Option<String>,
    pub invoice_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachProductPayload {
    #[validate(required(message = "O campo 'productId' é obrigatório."))]
    pub product_id: Option<Uuid>,
}

#[utoipa::path(
    post,
    path = "/api/entries",
    tag = "Entries",
    request_body = CreateEntryPayload,
    responses(
        (status = 201, description = "Entrada criada com status Open", body = Entry),
        (status = 404, description = "Fornecedor não encontrado")
    )
)]
pub async fn create_entry(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateEntryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (Some(author_id), Some(supplier_id), Some(client_id)) =
        (payload.author_id, payload.supplier_id, payload.client_id)
    else {
        return Err(AppError::incomplete("Autor, fornecedor e cliente são obrigatórios."));
    };

    let entry = app_state
        .entry_service
        .create_entry(CreateEntry {
            key: payload.key.trim().to_string(),
            author_id,
            supplier_id,
            client_id,
            tax_id: payload.tax_id,
            invoice_number: payload.invoice_number,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    get,
    path = "/api/entries",
    tag = "Entries",
    params(EntryFilter),
    responses((status = 200, description = "Entradas (mais recentes primeiro)", body = Vec<Entry>))
)]
pub async fn list_entries(
    State(app_state): State<AppState>,
    Query(filter): Query<EntryFilter>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.entry_service.list_entries(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/entries/statuses",
    tag = "Entries",
    responses((status = 200, description = "Status na ordem do ciclo de vida", body = Vec<EntryStatus>))
)]
pub async fn list_statuses(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.entry_service.list_statuses().await?))
}

#[utoipa::path(
    get,
    path = "/api/entries/{entry_id}",
    tag = "Entries",
    params(("entry_id" = Uuid, Path, description = "ID da Entrada")),
    responses(
        (status = 200, description = "Entrada", body = Entry),
        (status = 404, description = "Entrada não encontrada")
    )
)]
pub async fn get_entry(
    State(app_state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.entry_service.get_entry(entry_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/entries/{entry_id}/products",
    tag = "Entries",
    request_body = AttachProductPayload,
    params(("entry_id" = Uuid, Path, description = "ID da Entrada")),
    responses(
        (status = 200, description = "Produto anexado (ou já existente)", body = EntryProduct),
        (status = 404, description = "Entrada ou produto não encontrado")
    )
)]
pub async fn attach_product(
    State(app_state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<AttachProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let Some(product_id) = payload.product_id else {
        return Err(AppError::incomplete("O campo 'productId' é obrigatório."));
    };

    let entry_product = app_state.entry_service.attach_product(entry_id, product_id).await?;
    Ok(Json(entry_product))
}

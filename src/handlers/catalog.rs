// src/handlers/catalog.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    models::catalog::{
        Client, NewParty, NewProduct, Product, ProductFilter, ProductUpdate, Supplier, UnitType,
        UnitWeight,
    },
};

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePartyPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub tax_id: Option<String>,
    #[validate(length(equal = 2, message = "Use o código de país com 2 letras."))]
    pub country: Option<String>,
}

impl From<CreatePartyPayload> for NewParty {
    fn from(p: CreatePartyPayload) -> Self {
        NewParty {
            name: p.name.trim().to_string(),
            tax_id: p.tax_id,
            country: p.country.map(|c| c.to_uppercase()),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(required(message = "O campo 'supplierId' é obrigatório."))]
    pub supplier_id: Option<Uuid>,
    pub unit_type_id: Option<Uuid>,

    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub weight: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUnitPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(length(min = 1, max = 10, message = "Abreviação entre 1 e 10 caracteres."))]
    pub abbreviation: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub supplier_id: Option<Uuid>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

// ---
// Fornecedores
// ---
#[utoipa::path(
    post,
    path = "/api/catalog/suppliers",
    tag = "Catalog",
    request_body = CreatePartyPayload,
    responses(
        (status = 201, description = "Fornecedor cadastrado", body = Supplier),
        (status = 400, description = "Payload inválido")
    )
)]
pub async fn create_supplier(
    State(app_state): State<AppState>,
    Json(payload): Json<CreatePartyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let supplier = app_state.catalog_service.create_supplier(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

#[utoipa::path(
    get,
    path = "/api/catalog/suppliers",
    tag = "Catalog",
    params(SearchQuery),
    responses((status = 200, description = "Fornecedores", body = Vec<Supplier>))
)]
pub async fn list_suppliers(
    State(app_state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let suppliers = app_state.catalog_service.list_suppliers(query.search.as_deref()).await?;
    Ok(Json(suppliers))
}

// ---
// Clientes
// ---
#[utoipa::path(
    post,
    path = "/api/catalog/clients",
    tag = "Catalog",
    request_body = CreatePartyPayload,
    responses(
        (status = 201, description = "Cliente cadastrado", body = Client),
        (status = 400, description = "Payload inválido")
    )
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    Json(payload): Json<CreatePartyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let client = app_state.catalog_service.create_client(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

#[utoipa::path(
    get,
    path = "/api/catalog/clients",
    tag = "Catalog",
    params(SearchQuery),
    responses((status = 200, description = "Clientes", body = Vec<Client>))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let clients = app_state.catalog_service.list_clients(query.search.as_deref()).await?;
    Ok(Json(clients))
}

// ---
// Produtos
// ---
#[utoipa::path(
    post,
    path = "/api/catalog/products",
    tag = "Catalog",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto cadastrado", body = Product),
        (status = 404, description = "Fornecedor ou unidade não encontrado")
    )
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let Some(supplier_id) = payload.supplier_id else {
        return Err(AppError::incomplete("O campo 'supplierId' é obrigatório."));
    };

    let product = app_state
        .catalog_service
        .create_product(NewProduct {
            supplier_id,
            unit_type_id: payload.unit_type_id,
            name: payload.name.trim().to_string(),
            brand: payload.brand,
            model: payload.model,
            serial_number: payload.serial_number,
            weight: payload.weight,
            unit_price: payload.unit_price,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    get,
    path = "/api/catalog/products",
    tag = "Catalog",
    params(ProductQuery),
    responses((status = 200, description = "Produtos", body = Vec<Product>))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = ProductFilter {
        supplier_id: query.supplier_id,
        search: query.search,
        include_inactive: query.include_inactive,
    };
    Ok(Json(app_state.catalog_service.list_products(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/catalog/products/{product_id}",
    tag = "Catalog",
    params(("product_id" = Uuid, Path, description = "ID do Produto")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.catalog_service.get_product(product_id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/catalog/products/{product_id}",
    tag = "Catalog",
    request_body = ProductUpdate,
    params(("product_id" = Uuid, Path, description = "ID do Produto")),
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<ProductUpdate>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.catalog_service.update_product(product_id, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/catalog/products/{product_id}",
    tag = "Catalog",
    params(("product_id" = Uuid, Path, description = "ID do Produto")),
    responses(
        (status = 200, description = "Produto desativado", body = Product),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn deactivate_product(
    State(app_state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.catalog_service.deactivate_product(product_id).await?))
}

// ---
// Unidades
// ---
#[utoipa::path(
    post,
    path = "/api/catalog/unit-types",
    tag = "Catalog",
    request_body = CreateUnitPayload,
    responses((status = 201, description = "Tipo de unidade criado", body = UnitType))
)]
pub async fn create_unit_type(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateUnitPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let unit = app_state
        .catalog_service
        .create_unit_type(&payload.name, &payload.abbreviation)
        .await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

#[utoipa::path(
    get,
    path = "/api/catalog/unit-types",
    tag = "Catalog",
    responses((status = 200, description = "Tipos de unidade", body = Vec<UnitType>))
)]
pub async fn list_unit_types(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.catalog_service.list_unit_types().await?))
}

#[utoipa::path(
    post,
    path = "/api/catalog/unit-weights",
    tag = "Catalog",
    request_body = CreateUnitPayload,
    responses((status = 201, description = "Unidade de peso criada", body = UnitWeight))
)]
pub async fn create_unit_weight(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateUnitPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let unit = app_state
        .catalog_service
        .create_unit_weight(&payload.name, &payload.abbreviation)
        .await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

#[utoipa::path(
    get,
    path = "/api/catalog/unit-weights",
    tag = "Catalog",
    responses((status = 200, description = "Unidades de peso", body = Vec<UnitWeight>))
)]
pub async fn list_unit_weights(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.catalog_service.list_unit_weights().await?))
}

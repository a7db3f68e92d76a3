//src/main.rs

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings).await?;

    // Migrações só existem para o backend postgres
    if let Some(pool) = &app_state.db_pool {
        sqlx::migrate!().run(pool).await?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    }

    let catalog_routes = Router::new()
        .route("/suppliers"
               ,post(handlers::catalog::create_supplier)
               .get(handlers::catalog::list_suppliers)
        )
        .route("/clients"
               ,post(handlers::catalog::create_client)
               .get(handlers::catalog::list_clients)
        )
        .route("/products"
               ,post(handlers::catalog::create_product)
               .get(handlers::catalog::list_products)
        )
        .route("/products/{product_id}"
               ,get(handlers::catalog::get_product)
               .patch(handlers::catalog::update_product)
               .delete(handlers::catalog::deactivate_product)
        )
        .route("/unit-types"
               ,post(handlers::catalog::create_unit_type)
               .get(handlers::catalog::list_unit_types)
        )
        .route("/unit-weights"
               ,post(handlers::catalog::create_unit_weight)
               .get(handlers::catalog::list_unit_weights)
        );

    let entry_routes = Router::new()
        .route("/"
               ,post(handlers::entries::create_entry)
               .get(handlers::entries::list_entries)
        )
        .route("/statuses", get(handlers::entries::list_statuses))
        .route("/{entry_id}", get(handlers::entries::get_entry))
        .route("/{entry_id}/products", post(handlers::entries::attach_product))
        // Classificação
        .route("/{entry_id}/classification"
               ,get(handlers::classification::list_rows)
               .post(handlers::classification::save_classification)
        )
        .route("/{entry_id}/classification/batch", post(handlers::classification::save_batch))
        // Ciclo de vida
        .route("/{entry_id}/review", post(handlers::workflow::finalize_review))
        .route("/{entry_id}/classify", post(handlers::workflow::finalize_classification))
        .route("/{entry_id}/finish", post(handlers::workflow::finalize_entry));

    let product_routes = Router::new()
        .route("/{product_id}/classifications", get(handlers::classification::product_history));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/catalog", catalog_routes)
        .nest("/api/entries", entry_routes)
        .nest("/api/products", product_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

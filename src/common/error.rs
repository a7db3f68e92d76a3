use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

// Erro único da aplicação. Repositórios, stores e serviços devolvem
// `Result<_, AppError>`; só as fronteiras (reconciliação e workflow) o
// convertem em relatório com `status`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Entrada inválida: identificador ausente ou vazio")]
    InvalidEntry,

    #[error("{entity} não encontrado(a): {id}")]
    NotFound { entity: &'static str, id: Uuid },

    // Guarda de ciclo de vida recusada. Não é exceção: vira `warning`.
    #[error("{message}")]
    ValidationIncomplete {
        message: String,
        products: Vec<String>,
    },

    // Falha de uma operação no store remoto que não veio do Postgres
    // (ex.: store em memória com falha injetada).
    #[error("Falha na operação remota: {0}")]
    RemoteOperationFailed(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn incomplete(message: impl Into<String>) -> Self {
        AppError::ValidationIncomplete {
            message: message.into(),
            products: Vec::new(),
        }
    }

    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        AppError::NotFound { entity, id }
    }

    /// Classifica o erro segundo a taxonomia de relatórios.
    pub fn status(&self) -> OperationStatus {
        match self {
            AppError::ValidationIncomplete { .. } => OperationStatus::Warning,
            _ => OperationStatus::Error,
        }
    }

    /// Mensagem exibida ao usuário. Erros inesperados não vazam detalhes.
    pub fn report_message(&self) -> String {
        match self {
            AppError::ValidationIncomplete { message, .. } => message.clone(),
            AppError::InvalidEntry | AppError::NotFound { .. } => self.to_string(),
            AppError::ValidationError(errors) => {
                let fields: Vec<String> = errors.field_errors().keys().map(|f| f.to_string()).collect();
                format!("Campos inválidos: {}", fields.join(", "))
            }
            _ => "Ocorreu um erro inesperado. Tente novamente.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Success,
    Warning,
    Error,
}

impl OperationStatus {
    pub fn http_status(self) -> StatusCode {
        match self {
            OperationStatus::Success => StatusCode::OK,
            OperationStatus::Warning => StatusCode::UNPROCESSABLE_ENTITY,
            OperationStatus::Error => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::ValidationIncomplete { message, products } => {
                let body = Json(json!({
                    "error": message,
                    "products": products,
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::InvalidEntry => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),

            // DatabaseError, RemoteOperationFailed e InternalServerError viram 500.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.".to_string())
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_refused_guards_are_warnings() {
        assert_eq!(AppError::incomplete("já revisada").status(), OperationStatus::Warning);
        assert_eq!(AppError::InvalidEntry.status(), OperationStatus::Error);
        assert_eq!(
            AppError::RemoteOperationFailed("timeout".into()).status(),
            OperationStatus::Error
        );
    }

    #[test]
    fn unexpected_errors_hide_details_from_users() {
        let err = AppError::RemoteOperationFailed("conexão recusada 10.0.0.3".into());
        assert!(!err.report_message().contains("10.0.0.3"));

        let refused = AppError::incomplete("Entrada já revisada.");
        assert_eq!(refused.report_message(), "Entrada já revisada.");
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro central, com `thiserror` para melhor ergonomia.
//
// Atenção: todas as variantes de autenticação (token inválido, claims
// ausentes, tenant divergente, usuário do token inexistente) viram a MESMA
// resposta 401, sem distinguir o motivo. O motivo real fica só no log.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Payload inválido: {0}")]
    InvalidPayload(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Token sem claims obrigatórias")]
    MissingClaims,

    #[error("Tenant do token diverge do tenant atual do usuário")]
    TenantMismatch,

    #[error("Usuário do token não existe mais")]
    TokenUserNotFound,

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    // Cobre tanto o recurso inexistente quanto o recurso de outro tenant.
    // As duas situações têm que produzir exatamente a mesma resposta.
    #[error("Recurso não encontrado")]
    NotFound,

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Nome de tenant já existe")]
    TenantNameAlreadyExists,

    #[error("Nome de usuário já existe")]
    UsernameAlreadyExists,

    // Violação de unicidade em disputa (chave de idempotência, id de remessa).
    // O cliente pode repetir a operação.
    #[error("Conflito de escrita concorrente")]
    Conflict,

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Verifica se o erro embrulha uma violação de UNIQUE do Postgres.
    /// Usado no laço de retry da sequência de id e como backstop da idempotência.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::DatabaseError(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
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

            AppError::InvalidPayload(msg) => {
                let body = Json(json!({ "error": msg }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::InvalidTransition { from, to } => {
                let body = Json(json!({
                    "error": format!("Transição de status inválida de '{}' para '{}'.", from, to),
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            // Todas as falhas de autenticação colapsam na mesma resposta.
            // O motivo específico vai apenas para o log.
            ref e @ (AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::MissingClaims
            | AppError::TenantMismatch
            | AppError::TokenUserNotFound
            | AppError::JwtError(_)) => {
                tracing::warn!("Falha de autenticação: {}", e);
                (StatusCode::UNAUTHORIZED, "Não autorizado.".to_string())
            }

            AppError::Forbidden(reason) => {
                (StatusCode::FORBIDDEN, format!("Acesso negado: {}.", reason))
            }

            // Mesma mensagem para "não existe" e "pertence a outro tenant".
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "Recurso não encontrado ou acesso negado.".to_string(),
            ),

            AppError::TenantNameAlreadyExists => (
                StatusCode::CONFLICT,
                "Já existe um tenant com este nome.".to_string(),
            ),

            AppError::UsernameAlreadyExists => (
                StatusCode::CONFLICT,
                "Este nome de usuário já está em uso.".to_string(),
            ),

            AppError::Conflict => (
                StatusCode::CONFLICT,
                "Conflito de escrita concorrente. Tente novamente.".to_string(),
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

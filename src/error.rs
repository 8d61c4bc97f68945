use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// API-level failures. Every variant renders as `{"erro": <message>}` with the
/// matching status code; the messages are the ones the original clients show
/// verbatim, so they stay in Portuguese.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Este e-mail já está cadastrado.")]
    DuplicateEmail,

    #[error("E-mail ou senha inválidos.")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Token ausente, inválido ou expirado.")]
    Unauthorized,

    #[error("Acesso negado.")]
    Forbidden(String),

    #[error("Erro no servidor.")]
    Database(#[from] sqlx::Error),

    #[error("Erro no servidor.")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{what} não encontrado com esse ID"))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::DuplicateEmail | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Database(err) = self {
            log::error!("database error: {err}");
        }
        if let ApiError::Internal(detail) = self {
            log::error!("internal error: {detail}");
        }
        let message = match self {
            ApiError::Forbidden(detail) => detail.clone(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "erro": message }))
    }
}

/// Maps a failed insert on `users` to `DuplicateEmail` when the unique email
/// constraint fired, covering the window between the explicit pre-check and
/// the insert.
pub fn map_user_insert_error(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.message().contains("UNIQUE") {
            return ApiError::DuplicateEmail;
        }
    }
    ApiError::Database(err)
}

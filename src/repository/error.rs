// ==========================================
// Aupus Operações - Erros da camada de repositório
// ==========================================
// Ferramenta: thiserror
// ==========================================

use thiserror::Error;

/// Erros da camada de repositório
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== Banco de dados =====
    #[error("registro não encontrado: {entity} id={id}")]
    NotFound { entity: String, id: String },

    #[error("falha ao obter lock do banco: {0}")]
    LockError(String),

    #[error("falha de transação: {0}")]
    DatabaseTransactionError(String),

    #[error("falha de consulta: {0}")]
    DatabaseQueryError(String),

    #[error("violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    // ===== Serialização =====
    #[error("falha de serialização JSON (chave={key}): {message}")]
    SerializationError { key: String, message: String },

    // ===== Validação =====
    #[error("validação falhou: {0}")]
    ValidationError(String),

    // ===== Genéricos =====
    #[error("erro interno: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError {
            key: "Unknown".to_string(),
            message: err.to_string(),
        }
    }
}

/// Alias de Result
pub type RepositoryResult<T> = Result<T, RepositoryError>;

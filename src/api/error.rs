// ==========================================
// Aupus Operações - Erros da camada de API
// ==========================================
// Converte erros técnicos (repositório, cliente HTTP, importação,
// exportação) em mensagens para o usuário
// ==========================================

use crate::client::error::ClientError;
use crate::export::ExportError;
use crate::importer::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    // ===== Entrada / regras =====
    #[error("entrada inválida: {0}")]
    InvalidInput(String),

    #[error("não encontrado: {0}")]
    NotFound(String),

    #[error("regra de negócio violada: {0}")]
    BusinessRuleViolation(String),

    // ===== Sessão =====
    #[error("credenciais inválidas: {0}")]
    InvalidCredentials(String),

    #[error("sessão expirada")]
    SessionExpired,

    #[error("verificação de sessão falhou: {0}")]
    SessionCheckFailed(String),

    // ===== Remoto =====
    #[error("API remota indisponível: {0}")]
    RemoteUnavailable(String),

    #[error("API remota retornou erro: {0}")]
    RemoteError(String),

    // ===== Dados =====
    #[error("erro de banco de dados: {0}")]
    DatabaseError(String),

    #[error("falha de importação: {0}")]
    ImportError(String),

    #[error("falha de exportação: {0}")]
    ExportError(String),

    // ===== Genéricos =====
    #[error("erro interno: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => ApiError::NotFound(format!("{}(id={})", entity, id)),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("registro duplicado: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::LockError(msg)
            | RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::SerializationError { key, message } => {
                ApiError::DatabaseError(format!("chave {}: {}", key, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::MissingBaseUrl => {
                ApiError::RemoteUnavailable("URL base da API não configurada".to_string())
            }
            ClientError::Network(msg) => ApiError::RemoteUnavailable(msg),
            ClientError::InvalidUrl(msg) => ApiError::InvalidInput(msg),
            ClientError::InvalidCredentials(msg) => ApiError::InvalidCredentials(msg),
            ClientError::SessionCheckFailed(msg) => ApiError::SessionCheckFailed(msg),
            ClientError::SessionExpired => ApiError::SessionExpired,
            ClientError::Http { status: 404, message } => ApiError::NotFound(message),
            ClientError::Http { status, message } if (400..500).contains(&status) => {
                ApiError::InvalidInput(message)
            }
            ClientError::Http { status, message } => ApiError::RemoteError(format!("HTTP {}: {}", status, message)),
            ClientError::Decode(msg) => ApiError::RemoteError(msg),
            ClientError::Storage(e) => e.into(),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::ImportError(err.to_string())
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        ApiError::ExportError(err.to_string())
    }
}

impl ApiError {
    /// Chave de mensagem (i18n) para notificação ao usuário
    pub fn message_key(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "erro.entrada_invalida",
            ApiError::NotFound(_) => "erro.nao_encontrado",
            ApiError::BusinessRuleViolation(_) => "erro.regra_negocio",
            ApiError::InvalidCredentials(_) => "erro.credenciais",
            ApiError::SessionExpired => "erro.sessao_expirada",
            ApiError::SessionCheckFailed(_) => "erro.verificacao_sessao",
            ApiError::RemoteUnavailable(_) | ApiError::RemoteError(_) => "erro.remoto",
            ApiError::DatabaseError(_) => "erro.banco",
            ApiError::ImportError(_) => "erro.importacao",
            ApiError::ExportError(_) => "erro.exportacao",
            ApiError::InternalError(_) | ApiError::Other(_) => "erro.interno",
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// Aupus Operações - Erros do cliente HTTP
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// Sub-casos de resposta 401
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedKind {
    /// Login recusado (usuário/senha)
    InvalidCredentials,
    /// Falha transitória ao verificar/renovar a sessão; token mantido
    SessionCheckFailed,
    /// Sessão realmente expirada; token removido e logout sinalizado
    SessionExpired,
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("URL base da API não configurada (AUPUS_API_URL)")]
    MissingBaseUrl,

    #[error("URL inválida: {0}")]
    InvalidUrl(String),

    #[error("falha de rede: {0}")]
    Network(String),

    #[error("credenciais inválidas: {0}")]
    InvalidCredentials(String),

    #[error("falha na verificação da sessão: {0}")]
    SessionCheckFailed(String),

    #[error("sessão expirada")]
    SessionExpired,

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("resposta inválida da API: {0}")]
    Decode(String),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl ClientError {
    /// Sub-caso 401 correspondente, se houver
    pub fn unauthorized_kind(&self) -> Option<UnauthorizedKind> {
        match self {
            ClientError::InvalidCredentials(_) => Some(UnauthorizedKind::InvalidCredentials),
            ClientError::SessionCheckFailed(_) => Some(UnauthorizedKind::SessionCheckFailed),
            ClientError::SessionExpired => Some(UnauthorizedKind::SessionExpired),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

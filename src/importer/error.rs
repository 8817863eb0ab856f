// ==========================================
// Aupus Operações - Erros de importação
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    // ===== Arquivo =====
    #[error("arquivo não encontrado: {0}")]
    FileNotFound(String),

    #[error("formato não suportado: {0} (use .xlsx ou .csv)")]
    UnsupportedFormat(String),

    #[error("falha ao ler arquivo: {0}")]
    FileReadError(String),

    #[error("falha ao ler planilha Excel: {0}")]
    ExcelParseError(String),

    #[error("falha ao ler CSV: {0}")]
    CsvParseError(String),

    // ===== Linha =====
    #[error("linha {row}: campo obrigatório vazio: {field}")]
    CampoObrigatorio { row: usize, field: String },

    #[error("linha {row}, campo {field}: {message}")]
    TypeConversionError {
        row: usize,
        field: String,
        message: String,
    },

    // ===== Persistência =====
    #[error(transparent)]
    Storage(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// Número da linha do arquivo, para erros por linha
    pub fn linha(&self) -> Option<usize> {
        match self {
            ImportError::CampoObrigatorio { row, .. } | ImportError::TypeConversionError { row, .. } => Some(*row),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

pub type ImportResult<T> = Result<T, ImportError>;

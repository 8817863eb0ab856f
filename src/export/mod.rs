// ==========================================
// Aupus Operações - Exportação
// ==========================================
// XLSX (rust_xlsxwriter), XML (montado à mão), PDF (printpdf)
// As funções devolvem os bytes; quem chama decide onde gravar
// ==========================================

pub mod pdf;
pub mod xlsx;
pub mod xml;

use crate::domain::{ControleRecord, Filtros, ProspecRecord};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

pub use pdf::{gerar_pdf_proposta, ResumoProposta};
pub use xlsx::{exportar_controle_xlsx, exportar_prospec_xlsx};
pub use xml::{escape_xml, exportar_prospec_xml};

/// Filtros aplicados antes de exportar
pub type ExportFilters = Filtros;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("falha ao gerar XLSX: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("falha ao gerar PDF: {0}")]
    Pdf(String),

    #[error("nada para exportar: {0}")]
    EmptyInput(String),
}

impl From<printpdf::Error> for ExportError {
    fn from(err: printpdf::Error) -> Self {
        ExportError::Pdf(err.to_string())
    }
}

pub type ExportResult<T> = Result<T, ExportError>;

// ==========================================
// Metadados gravados junto com a exportação
// ==========================================
#[derive(Debug, Clone)]
pub struct ExportMeta {
    pub gerado_em: DateTime<Utc>,
    pub gerado_por: Option<String>,
    /// Snapshot do ConfigManager
    pub config: BTreeMap<String, String>,
}

impl ExportMeta {
    pub fn new(config: BTreeMap<String, String>) -> Self {
        Self {
            gerado_em: Utc::now(),
            gerado_por: None,
            config,
        }
    }

    pub fn com_usuario(mut self, nome: impl Into<String>) -> Self {
        self.gerado_por = Some(nome.into());
        self
    }
}

pub fn filtrar_prospec<'a>(linhas: &'a [ProspecRecord], filtros: &ExportFilters) -> Vec<&'a ProspecRecord> {
    linhas.iter().filter(|l| filtros.aceita_prospec(l)).collect()
}

pub fn filtrar_controle<'a>(
    registros: &'a [ControleRecord],
    filtros: &ExportFilters,
) -> Vec<&'a ControleRecord> {
    registros.iter().filter(|r| filtros.aceita_controle(r)).collect()
}

/// Descrição legível dos filtros (planilha de metadados)
pub(crate) fn descrever_filtros(filtros: &ExportFilters) -> Vec<(String, String)> {
    filtros
        .query_pairs()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StatusProposta;

    #[test]
    fn test_filtrar_prospec() {
        let mut a = ProspecRecord::nova("Padaria Sol", "2025/0001", "111", "Ana", 100.0);
        a.status = StatusProposta::Fechado;
        let b = ProspecRecord::nova("Mercado Lua", "2025/0002", "222", "Bruno", 200.0);
        let linhas = vec![a, b];

        let filtros = ExportFilters {
            status: Some(StatusProposta::Fechado),
            ..Default::default()
        };
        let filtradas = filtrar_prospec(&linhas, &filtros);
        assert_eq!(filtradas.len(), 1);
        assert_eq!(filtradas[0].numero_uc, "111");

        assert_eq!(filtrar_prospec(&linhas, &ExportFilters::default()).len(), 2);
    }

    #[test]
    fn test_descrever_filtros() {
        let filtros = ExportFilters {
            consultor: Some("Ana".to_string()),
            ..Default::default()
        };
        assert_eq!(descrever_filtros(&filtros), vec![("consultor".to_string(), "Ana".to_string())]);
        assert!(descrever_filtros(&ExportFilters::default()).is_empty());
    }
}

// ==========================================
// Aupus Operações - Registro de controle
// ==========================================
// Cópia de uma linha de proposta Fechada + UG atribuída
// ==========================================

use crate::domain::prospec::{ChaveUc, ProspecRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControleRecord {
    #[serde(flatten)]
    pub linha: ProspecRecord,

    #[serde(default)]
    pub ug: Option<String>,

    /// true sse há UG atribuída
    #[serde(default)]
    pub calibrado: bool,
}

impl ControleRecord {
    pub fn from_prospec(linha: &ProspecRecord) -> Self {
        Self {
            linha: linha.clone(),
            ug: None,
            calibrado: false,
        }
    }

    pub fn chave(&self) -> ChaveUc {
        self.linha.chave()
    }

    pub fn atribuir_ug(&mut self, ug: Option<String>) {
        self.ug = ug.filter(|nome| !nome.trim().is_empty());
        self.calibrado = self.ug.is_some();
    }

    pub fn pertence_a(&self, nome_usina: &str) -> bool {
        self.ug.as_deref() == Some(nome_usina)
    }
}

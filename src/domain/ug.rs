// ==========================================
// Aupus Operações - Unidade geradora (UG)
// ==========================================
// media/calibragem/ucsAtribuidas/calibrado são derivados do controle
// (ver engine::ug_aggregation)
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ug {
    pub id: String,
    /// Chave lógica (unicidade não garantida pelo armazenamento)
    pub nome_usina: String,
    #[serde(rename = "potenciaCA", default)]
    pub potencia_ca: f64, // kW
    #[serde(rename = "potenciaCC", default)]
    pub potencia_cc: f64, // kWp
    /// Fração (ex.: 0.19)
    #[serde(default)]
    pub fator_capacidade: f64,

    // ===== Derivados =====
    #[serde(default)]
    pub capacidade: f64, // kWh/mês
    #[serde(default)]
    pub media: f64,
    #[serde(default)]
    pub calibragem: f64,
    #[serde(default)]
    pub ucs_atribuidas: usize,
    #[serde(default)]
    pub calibrado: bool,
}

impl Ug {
    pub fn nova(
        nome_usina: impl Into<String>,
        potencia_ca: f64,
        potencia_cc: f64,
        fator_capacidade: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            nome_usina: nome_usina.into(),
            potencia_ca,
            potencia_cc,
            fator_capacidade,
            capacidade: crate::engine::calculo::capacidade_ug(potencia_cc, fator_capacidade),
            media: 0.0,
            calibragem: 0.0,
            ucs_atribuidas: 0,
            calibrado: false,
        }
    }

    /// Capacidade ainda não comprometida (pode ser negativa)
    pub fn saldo(&self) -> f64 {
        self.capacidade - self.calibragem
    }

    /// Aplica alteração parcial; retorna o nome anterior se houve renomeação
    pub fn aplicar(&mut self, patch: &UgPatch) -> Option<String> {
        if let Some(v) = patch.potencia_ca {
            self.potencia_ca = v;
        }
        if let Some(v) = patch.potencia_cc {
            self.potencia_cc = v;
        }
        if let Some(v) = patch.fator_capacidade {
            self.fator_capacidade = v;
        }
        match &patch.nome_usina {
            Some(nome) if nome != &self.nome_usina => {
                Some(std::mem::replace(&mut self.nome_usina, nome.clone()))
            }
            _ => None,
        }
    }
}

/// Alteração parcial de UG
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UgPatch {
    pub nome_usina: Option<String>,
    #[serde(rename = "potenciaCA")]
    pub potencia_ca: Option<f64>,
    #[serde(rename = "potenciaCC")]
    pub potencia_cc: Option<f64>,
    pub fator_capacidade: Option<f64>,
}

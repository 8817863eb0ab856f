// ==========================================
// Aupus Operações - Linha de proposta (prospec)
// ==========================================
// Uma proposta lógica = N linhas (uma por UC) com o mesmo numeroProposta
// ==========================================

use crate::domain::types::StatusProposta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ChaveUc - chave (proposta, UC)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChaveUc {
    pub numero_proposta: String,
    #[serde(rename = "numeroUC")]
    pub numero_uc: String,
}

impl ChaveUc {
    pub fn new(numero_proposta: impl Into<String>, numero_uc: impl Into<String>) -> Self {
        Self {
            numero_proposta: numero_proposta.into(),
            numero_uc: numero_uc.into(),
        }
    }
}

impl fmt::Display for ChaveUc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.numero_proposta, self.numero_uc)
    }
}

// ==========================================
// ProspecRecord
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProspecRecord {
    pub id: String,
    pub nome_cliente: String,
    pub numero_proposta: String,
    #[serde(rename = "numeroUC")]
    pub numero_uc: String,
    pub consultor: String,
    #[serde(default)]
    pub status: StatusProposta,
    #[serde(default)]
    pub media: f64, // consumo médio (kWh/mês)
    #[serde(default)]
    pub desconto_tarifa: f64, // %
    #[serde(default)]
    pub desconto_bandeira: f64, // %
    pub data_cadastro: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apelido: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribuidora: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
}

impl ProspecRecord {
    /// Cria uma linha nova com id gerado e status Aguardando
    pub fn nova(
        nome_cliente: impl Into<String>,
        numero_proposta: impl Into<String>,
        numero_uc: impl Into<String>,
        consultor: impl Into<String>,
        media: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            nome_cliente: nome_cliente.into(),
            numero_proposta: numero_proposta.into(),
            numero_uc: numero_uc.into(),
            consultor: consultor.into(),
            status: StatusProposta::Aguardando,
            media,
            desconto_tarifa: 0.0,
            desconto_bandeira: 0.0,
            data_cadastro: Utc::now(),
            telefone: None,
            apelido: None,
            distribuidora: None,
            observacoes: None,
        }
    }

    pub fn chave(&self) -> ChaveUc {
        ChaveUc::new(self.numero_proposta.clone(), self.numero_uc.clone())
    }

    /// Aplica uma alteração parcial; retorna o status anterior se ele mudou
    pub fn aplicar(&mut self, patch: &ProspecPatch) -> Option<StatusProposta> {
        if let Some(v) = &patch.nome_cliente {
            self.nome_cliente = v.clone();
        }
        if let Some(v) = &patch.consultor {
            self.consultor = v.clone();
        }
        if let Some(v) = patch.media {
            self.media = v;
        }
        if let Some(v) = patch.desconto_tarifa {
            self.desconto_tarifa = v;
        }
        if let Some(v) = patch.desconto_bandeira {
            self.desconto_bandeira = v;
        }
        if let Some(v) = &patch.telefone {
            self.telefone = Some(v.clone());
        }
        if let Some(v) = &patch.apelido {
            self.apelido = Some(v.clone());
        }
        if let Some(v) = &patch.distribuidora {
            self.distribuidora = Some(v.clone());
        }
        if let Some(v) = &patch.observacoes {
            self.observacoes = Some(v.clone());
        }

        match patch.status {
            Some(novo) if novo != self.status => {
                let anterior = self.status;
                self.status = novo;
                Some(anterior)
            }
            _ => None,
        }
    }
}

// ==========================================
// ProspecPatch - alteração parcial
// ==========================================
// numeroProposta/numeroUC não são editáveis (formam a chave do controle)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProspecPatch {
    pub nome_cliente: Option<String>,
    pub consultor: Option<String>,
    pub status: Option<StatusProposta>,
    pub media: Option<f64>,
    pub desconto_tarifa: Option<f64>,
    pub desconto_bandeira: Option<f64>,
    pub telefone: Option<String>,
    pub apelido: Option<String>,
    pub distribuidora: Option<String>,
    pub observacoes: Option<String>,
}

impl ProspecPatch {
    pub fn status(status: StatusProposta) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

// ==========================================
// Aupus Operações - Tipos de domínio
// ==========================================
// Valores serializados exatamente como no armazenamento JSON
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Status da proposta
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StatusProposta {
    #[default]
    Aguardando,
    Fechado,
}

impl StatusProposta {
    /// Interpreta o status vindo de planilha/CLI (sem diferenciar maiúsculas)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "aguardando" => Some(StatusProposta::Aguardando),
            "fechado" | "fechada" => Some(StatusProposta::Fechado),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusProposta::Aguardando => "Aguardando",
            StatusProposta::Fechado => "Fechado",
        }
    }

    pub fn is_fechado(&self) -> bool {
        matches!(self, StatusProposta::Fechado)
    }
}

impl fmt::Display for StatusProposta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Entidades em cache
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entidade {
    Prospec,
    Controle,
    Ugs,
}

impl Entidade {
    pub const TODAS: [Entidade; 3] = [Entidade::Prospec, Entidade::Controle, Entidade::Ugs];

    pub fn as_str(&self) -> &'static str {
        match self {
            Entidade::Prospec => "prospec",
            Entidade::Controle => "controle",
            Entidade::Ugs => "ugs",
        }
    }
}

impl fmt::Display for Entidade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

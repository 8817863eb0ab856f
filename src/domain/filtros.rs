// ==========================================
// Aupus Operações - Filtros de listagem/exportação
// ==========================================

use crate::domain::{ControleRecord, ProspecRecord, StatusProposta, Ug};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filtros {
    pub status: Option<StatusProposta>,
    pub consultor: Option<String>,
    pub ug: Option<String>,
    /// Busca livre em cliente/proposta/UC (sem diferenciar maiúsculas)
    pub texto: Option<String>,
}

impl Filtros {
    pub fn is_empty(&self) -> bool {
        self == &Filtros::default()
    }

    pub fn aceita_prospec(&self, linha: &ProspecRecord) -> bool {
        if let Some(status) = self.status {
            if linha.status != status {
                return false;
            }
        }
        if let Some(consultor) = &self.consultor {
            if !linha.consultor.eq_ignore_ascii_case(consultor.trim()) {
                return false;
            }
        }
        match &self.texto {
            Some(texto) => {
                let texto = texto.trim().to_lowercase();
                texto.is_empty()
                    || linha.nome_cliente.to_lowercase().contains(&texto)
                    || linha.numero_proposta.to_lowercase().contains(&texto)
                    || linha.numero_uc.to_lowercase().contains(&texto)
            }
            None => true,
        }
    }

    pub fn aceita_controle(&self, registro: &ControleRecord) -> bool {
        if let Some(ug) = &self.ug {
            if registro.ug.as_deref() != Some(ug.as_str()) {
                return false;
            }
        }
        self.aceita_prospec(&registro.linha)
    }

    pub fn aceita_ug(&self, ug: &Ug) -> bool {
        match (&self.ug, &self.texto) {
            (Some(nome), _) => &ug.nome_usina == nome,
            (None, Some(texto)) => ug.nome_usina.to_lowercase().contains(&texto.trim().to_lowercase()),
            (None, None) => true,
        }
    }

    /// Pares chave/valor para consulta remota
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(consultor) = &self.consultor {
            pairs.push(("consultor", consultor.clone()));
        }
        if let Some(ug) = &self.ug {
            pairs.push(("ug", ug.clone()));
        }
        if let Some(texto) = &self.texto {
            pairs.push(("busca", texto.clone()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtros_prospec() {
        let mut linha = ProspecRecord::nova("Padaria Sol", "2025/0001", "111", "Ana", 100.0);
        linha.status = StatusProposta::Fechado;

        assert!(Filtros::default().aceita_prospec(&linha));
        let f = Filtros {
            status: Some(StatusProposta::Aguardando),
            ..Default::default()
        };
        assert!(!f.aceita_prospec(&linha));
        let f = Filtros {
            consultor: Some("ana".to_string()),
            texto: Some("PADARIA".to_string()),
            ..Default::default()
        };
        assert!(f.aceita_prospec(&linha));
    }

    #[test]
    fn test_filtro_ug_no_controle() {
        let linha = ProspecRecord::nova("Padaria Sol", "2025/0001", "111", "Ana", 100.0);
        let mut registro = ControleRecord::from_prospec(&linha);
        let f = Filtros {
            ug: Some("UG A".to_string()),
            ..Default::default()
        };
        assert!(!f.aceita_controle(&registro));
        registro.atribuir_ug(Some("UG A".to_string()));
        assert!(f.aceita_controle(&registro));
    }

    #[test]
    fn test_query_pairs() {
        let f = Filtros {
            status: Some(StatusProposta::Fechado),
            texto: Some("sol".to_string()),
            ..Default::default()
        };
        assert_eq!(
            f.query_pairs(),
            vec![("status", "Fechado".to_string()), ("busca", "sol".to_string())]
        );
        assert!(Filtros::default().is_empty());
    }
}

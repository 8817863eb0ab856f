// ==========================================
// Aupus Operações - Mapeamento de colunas → ProspecRecord
// ==========================================
// Cabeçalhos comparados sem acento, maiúsculas, espaços ou pontuação
// ("Desconto Tarifa" = "desconto_tarifa" = "DescontoTarifa")
// ==========================================

use crate::domain::{ProspecRecord, StatusProposta};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRow;
use std::collections::HashMap;

/// Normaliza um cabeçalho para comparação
pub fn normalizar_cabecalho(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Aceita "1234.5", "1234,5", "1.234,5", "1.500" (milhar) e "20%"
///
/// Valores não finitos ("inf", "NaN") são recusados.
pub fn parse_decimal(valor: &str) -> Option<f64> {
    let limpo = valor.trim().trim_end_matches('%').trim();
    let normalizado = if limpo.contains(',') && limpo.contains('.') {
        limpo.replace('.', "").replace(',', ".")
    } else if agrupado_em_milhar(limpo) {
        limpo.replace('.', "")
    } else {
        limpo.replace(',', ".")
    };
    normalizado.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// "1.500", "12.345", "1.234.567": grupos de 3 dígitos separados por ponto
fn agrupado_em_milhar(s: &str) -> bool {
    let mut grupos = s.split('.');
    let primeiro = match grupos.next() {
        Some(g) => g,
        None => return false,
    };
    if primeiro.is_empty() || primeiro.len() > 3 || !primeiro.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let mut resto = 0;
    for grupo in grupos {
        if grupo.len() != 3 || !grupo.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        resto += 1;
    }
    resto > 0
}

pub struct FieldMapper;

impl FieldMapper {
    pub fn map_row(&self, row: &RawRow) -> ImportResult<ProspecRecord> {
        let campos: HashMap<String, &str> = row
            .valores
            .iter()
            .map(|(k, v)| (normalizar_cabecalho(k), v.as_str()))
            .collect();
        let n = row.numero;

        let nome_cliente = self.obrigatorio(&campos, &["cliente", "nomecliente"], "Cliente", n)?;
        let numero_proposta = self.obrigatorio(&campos, &["proposta", "numeroproposta"], "Proposta", n)?;
        let numero_uc = self.obrigatorio(&campos, &["uc", "numerouc", "unidadeconsumidora"], "UC", n)?;
        let consultor = self.get_string(&campos, &["consultor"]).unwrap_or_default();

        let status = match self.get_string(&campos, &["status"]) {
            None => StatusProposta::Aguardando,
            Some(v) => StatusProposta::parse(&v).ok_or_else(|| ImportError::TypeConversionError {
                row: n,
                field: "Status".to_string(),
                message: format!("status desconhecido: {}", v),
            })?,
        };

        let mut linha = ProspecRecord::nova(nome_cliente, numero_proposta, numero_uc, consultor, 0.0);
        linha.status = status;
        linha.media = self.parse_f64(&campos, &["media", "consumomedio"], "Media", n)?.unwrap_or(0.0);
        linha.desconto_tarifa = self
            .parse_f64(&campos, &["descontotarifa"], "Desconto Tarifa", n)?
            .unwrap_or(0.0);
        linha.desconto_bandeira = self
            .parse_f64(&campos, &["descontobandeira"], "Desconto Bandeira", n)?
            .unwrap_or(0.0);
        linha.telefone = self.get_string(&campos, &["telefone"]);
        linha.apelido = self.get_string(&campos, &["apelido"]);
        linha.distribuidora = self.get_string(&campos, &["distribuidora"]);
        linha.observacoes = self.get_string(&campos, &["observacoes", "obs"]);
        Ok(linha)
    }

    fn get_string(&self, campos: &HashMap<String, &str>, aliases: &[&str]) -> Option<String> {
        aliases
            .iter()
            .filter_map(|a| campos.get(*a))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn obrigatorio(
        &self,
        campos: &HashMap<String, &str>,
        aliases: &[&str],
        nome: &str,
        row: usize,
    ) -> ImportResult<String> {
        self.get_string(campos, aliases).ok_or_else(|| ImportError::CampoObrigatorio {
            row,
            field: nome.to_string(),
        })
    }

    fn parse_f64(
        &self,
        campos: &HashMap<String, &str>,
        aliases: &[&str],
        nome: &str,
        row: usize,
    ) -> ImportResult<Option<f64>> {
        match self.get_string(campos, aliases) {
            None => Ok(None),
            Some(valor) => match parse_decimal(&valor) {
                Some(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
                _ => Err(ImportError::TypeConversionError {
                    row,
                    field: nome.to_string(),
                    message: format!("número inválido: {}", valor),
                }),
            },
        }
    }
}

// ==========================================
// Aupus Operações - Importação de linhas de proposta
// ==========================================
// Fluxo: arquivo → linhas brutas → ProspecRecord (por linha) →
// StorageService::add_prospec_lote (uma transação)
// ==========================================

use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{RawRow, UniversalFileParser};
use crate::storage::StorageService;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinhaRejeitada {
    pub linha: usize,
    pub motivo: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub total: usize,
    pub importados: usize,
    pub duplicados: usize,
    pub rejeitados: usize,
    pub erros: Vec<LinhaRejeitada>,
}

pub struct ProspecImporter {
    storage: Arc<StorageService>,
    parser: UniversalFileParser,
    mapper: FieldMapper,
}

impl ProspecImporter {
    pub fn new(storage: Arc<StorageService>) -> Self {
        Self {
            storage,
            parser: UniversalFileParser,
            mapper: FieldMapper,
        }
    }

    pub fn importar_arquivo<P: AsRef<Path>>(&self, caminho: P) -> ImportResult<ImportSummary> {
        let caminho = caminho.as_ref();
        info!(arquivo = %caminho.display(), "iniciando importação");
        let rows = self.parser.parse(caminho)?;
        self.importar_linhas(&rows)
    }

    /// Linhas inválidas são rejeitadas individualmente; as válidas entram em lote
    pub fn importar_linhas(&self, rows: &[RawRow]) -> ImportResult<ImportSummary> {
        let mut summary = ImportSummary {
            total: rows.len(),
            ..Default::default()
        };

        let mut validas = Vec::with_capacity(rows.len());
        for row in rows {
            match self.mapper.map_row(row) {
                Ok(linha) => validas.push(linha),
                Err(e) => {
                    warn!(linha = row.numero, erro = %e, "linha rejeitada");
                    summary.erros.push(LinhaRejeitada {
                        linha: row.numero,
                        motivo: e.to_string(),
                    });
                }
            }
        }
        summary.rejeitados = summary.erros.len();

        if !validas.is_empty() {
            let lote = self.storage.add_prospec_lote(validas)?;
            summary.importados = lote.adicionados;
            summary.duplicados = lote.duplicados;
        }

        info!(
            total = summary.total,
            importados = summary.importados,
            duplicados = summary.duplicados,
            rejeitados = summary.rejeitados,
            "importação concluída"
        );
        Ok(summary)
    }
}

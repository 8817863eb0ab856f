// ==========================================
// Aupus Operações - Sincronização prospec → controle
// ==========================================
// Regra: status Fechado ⇔ existe registro de controle para (proposta, UC)
// Funções puras; a persistência transacional fica no StorageService
// ==========================================

use crate::domain::{ChaveUc, ControleRecord, ProspecRecord, StatusProposta};
use std::collections::HashSet;

/// Resultado de uma sincronização
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub adicionados: usize,
    pub removidos: usize,
}

impl SyncOutcome {
    pub fn alterou(&self) -> bool {
        self.adicionados > 0 || self.removidos > 0
    }
}

/// Sincroniza o controle com o status de uma proposta inteira
///
/// # Regras
/// - Fechado: adiciona ao controle todas as linhas da proposta,
///   ignorando chaves (proposta, UC) já existentes
/// - Outro status: remove do controle as entradas da proposta
pub fn sincronizar_status_fechado(
    prospec: &[ProspecRecord],
    controle: &mut Vec<ControleRecord>,
    numero_proposta: &str,
    novo_status: StatusProposta,
) -> SyncOutcome {
    let linhas: Vec<&ProspecRecord> = prospec
        .iter()
        .filter(|l| l.numero_proposta == numero_proposta)
        .collect();
    sincronizar_linhas(&linhas, controle, novo_status)
}

/// Sincroniza apenas as linhas informadas (ex.: a linha editada)
pub fn sincronizar_linhas(
    linhas: &[&ProspecRecord],
    controle: &mut Vec<ControleRecord>,
    novo_status: StatusProposta,
) -> SyncOutcome {
    let mut outcome = SyncOutcome::default();

    if novo_status.is_fechado() {
        let mut existentes: HashSet<ChaveUc> = controle.iter().map(|c| c.chave()).collect();
        for linha in linhas {
            if existentes.insert(linha.chave()) {
                let mut registro = ControleRecord::from_prospec(linha);
                registro.linha.status = StatusProposta::Fechado;
                controle.push(registro);
                outcome.adicionados += 1;
            }
        }
    } else {
        let chaves: HashSet<ChaveUc> = linhas.iter().map(|l| l.chave()).collect();
        let antes = controle.len();
        controle.retain(|c| !chaves.contains(&c.chave()));
        outcome.removidos = antes - controle.len();
    }

    outcome
}

/// Remove do controle a entrada de uma chave; retorna true se havia
pub fn remover_chave(controle: &mut Vec<ControleRecord>, chave: &ChaveUc) -> bool {
    let antes = controle.len();
    controle.retain(|c| &c.chave() != chave);
    antes != controle.len()
}

/// Atualiza os dados da linha copiada no controle (mantendo UG atribuída)
pub fn propagar_alteracao(controle: &mut [ControleRecord], linha: &ProspecRecord) -> bool {
    let chave = linha.chave();
    match controle.iter_mut().find(|c| c.chave() == chave) {
        Some(registro) => {
            registro.linha = linha.clone();
            true
        }
        None => false,
    }
}

// ==========================================
// Aupus Operações - Serviço de persistência local
// ==========================================
// Coleções: aupus_prospec / aupus_controle / aupus_ugs
// Cada mutação regrava a coleção inteira (O(n)).
// Mutações que tocam mais de uma coleção rodam em uma única transação:
// não existe estado intermediário entre prospec e controle.
// ==========================================

use crate::config::ConfigManager;
use crate::domain::{ChaveUc, ControleRecord, ProspecPatch, ProspecRecord, StatusProposta, Ug, UgPatch};
use crate::engine::{status_sync, ug_aggregation};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::kv_store::{keys, KvSession, KvStore};
use std::collections::HashSet;
use std::sync::Arc;

/// Resultado de uma inclusão em lote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoteOutcome {
    pub adicionados: usize,
    pub duplicados: usize,
}

pub struct StorageService {
    kv: Arc<KvStore>,
    config: Arc<ConfigManager>,
}

impl StorageService {
    pub fn new(kv: Arc<KvStore>, config: Arc<ConfigManager>) -> Self {
        Self { kv, config }
    }

    // ==========================================
    // Prospec
    // ==========================================

    pub fn get_prospec(&self) -> RepositoryResult<Vec<ProspecRecord>> {
        self.kv.with_session(|s| s.read_collection(keys::PROSPEC))
    }

    /// Sobrescreve a coleção inteira (sem sincronização)
    pub fn save_prospec(&self, linhas: &[ProspecRecord]) -> RepositoryResult<()> {
        linhas.iter().try_for_each(validar_linha)?;
        self.kv.with_session(|s| s.write_collection(keys::PROSPEC, linhas))
    }

    /// Todas as linhas (UCs) de uma proposta
    pub fn get_proposta(&self, numero_proposta: &str) -> RepositoryResult<Vec<ProspecRecord>> {
        Ok(self
            .get_prospec()?
            .into_iter()
            .filter(|l| l.numero_proposta == numero_proposta)
            .collect())
    }

    /// Inclui uma linha; se já vier Fechada, o controle é sincronizado
    pub fn add_prospec(&self, linha: ProspecRecord) -> RepositoryResult<ProspecRecord> {
        validar_linha(&linha)?;
        let calibragem_pct = self.config.calibragem_global_pct()?;

        self.kv.transaction(|s| {
            let mut prospec: Vec<ProspecRecord> = s.read_collection(keys::PROSPEC)?;
            let chave = linha.chave();
            if prospec.iter().any(|l| l.chave() == chave) {
                return Err(RepositoryError::UniqueConstraintViolation(format!(
                    "UC já cadastrada na proposta: {}",
                    chave
                )));
            }

            prospec.push(linha.clone());
            s.write_collection(keys::PROSPEC, &prospec)?;

            if linha.status.is_fechado() {
                let mut controle: Vec<ControleRecord> = s.read_collection(keys::CONTROLE)?;
                let outcome = status_sync::sincronizar_linhas(&[&linha], &mut controle, linha.status);
                if outcome.alterou() {
                    s.write_collection(keys::CONTROLE, &controle)?;
                    recalcular_ugs(s, &controle, calibragem_pct)?;
                }
            }

            tracing::info!(
                id = %linha.id,
                proposta = %linha.numero_proposta,
                uc = %linha.numero_uc,
                "linha de proposta incluída"
            );
            Ok(linha)
        })
    }

    /// Inclui várias linhas em uma transação, ignorando chaves repetidas
    pub fn add_prospec_lote(&self, linhas: Vec<ProspecRecord>) -> RepositoryResult<LoteOutcome> {
        for linha in &linhas {
            validar_linha(linha)?;
        }
        let calibragem_pct = self.config.calibragem_global_pct()?;

        self.kv.transaction(|s| {
            let mut prospec: Vec<ProspecRecord> = s.read_collection(keys::PROSPEC)?;
            let mut existentes: HashSet<ChaveUc> = prospec.iter().map(|l| l.chave()).collect();
            let mut outcome = LoteOutcome::default();
            let mut fechadas: Vec<ProspecRecord> = Vec::new();

            for linha in linhas {
                if !existentes.insert(linha.chave()) {
                    outcome.duplicados += 1;
                    continue;
                }
                if linha.status.is_fechado() {
                    fechadas.push(linha.clone());
                }
                prospec.push(linha);
                outcome.adicionados += 1;
            }

            s.write_collection(keys::PROSPEC, &prospec)?;

            if !fechadas.is_empty() {
                let mut controle: Vec<ControleRecord> = s.read_collection(keys::CONTROLE)?;
                let refs: Vec<&ProspecRecord> = fechadas.iter().collect();
                status_sync::sincronizar_linhas(&refs, &mut controle, StatusProposta::Fechado);
                s.write_collection(keys::CONTROLE, &controle)?;
                recalcular_ugs(s, &controle, calibragem_pct)?;
            }

            tracing::info!(
                adicionados = outcome.adicionados,
                duplicados = outcome.duplicados,
                "lote de linhas incluído"
            );
            Ok(outcome)
        })
    }

    /// Altera uma linha
    ///
    /// Mudança de status vale para a proposta inteira (todas as UCs) e
    /// dispara sincronizar_status_fechado na mesma transação.
    pub fn update_prospec(&self, id: &str, patch: &ProspecPatch) -> RepositoryResult<ProspecRecord> {
        let calibragem_pct = self.config.calibragem_global_pct()?;

        self.kv.transaction(|s| {
            let mut prospec: Vec<ProspecRecord> = s.read_collection(keys::PROSPEC)?;
            let idx = prospec
                .iter()
                .position(|l| l.id == id)
                .ok_or_else(|| not_found("ProspecRecord", id))?;

            let status_anterior = prospec[idx].aplicar(patch);
            validar_linha(&prospec[idx])?;
            let atualizada = prospec[idx].clone();
            let mut controle: Vec<ControleRecord> = s.read_collection(keys::CONTROLE)?;

            let controle_alterado = match status_anterior {
                Some(anterior) => {
                    let numero = atualizada.numero_proposta.clone();
                    for linha in prospec.iter_mut().filter(|l| l.numero_proposta == numero) {
                        linha.status = atualizada.status;
                    }
                    let outcome = status_sync::sincronizar_status_fechado(
                        &prospec,
                        &mut controle,
                        &numero,
                        atualizada.status,
                    );
                    tracing::info!(
                        proposta = %numero,
                        de = %anterior,
                        para = %atualizada.status,
                        adicionados = outcome.adicionados,
                        removidos = outcome.removidos,
                        "status da proposta alterado"
                    );
                    outcome.alterou()
                }
                None => status_sync::propagar_alteracao(&mut controle, &atualizada),
            };

            s.write_collection(keys::PROSPEC, &prospec)?;
            if controle_alterado {
                s.write_collection(keys::CONTROLE, &controle)?;
                recalcular_ugs(s, &controle, calibragem_pct)?;
            }
            Ok(atualizada)
        })
    }

    /// Atalho: altera o status de uma proposta inteira
    pub fn set_status_proposta(
        &self,
        numero_proposta: &str,
        status: StatusProposta,
    ) -> RepositoryResult<Vec<ProspecRecord>> {
        let primeira = self
            .get_proposta(numero_proposta)?
            .into_iter()
            .next()
            .ok_or_else(|| not_found("Proposta", numero_proposta))?;
        self.update_prospec(&primeira.id, &ProspecPatch::status(status))?;
        self.get_proposta(numero_proposta)
    }

    /// Sincroniza o controle com o status informado para uma proposta
    pub fn sincronizar_status_fechado(
        &self,
        numero_proposta: &str,
        novo_status: StatusProposta,
    ) -> RepositoryResult<status_sync::SyncOutcome> {
        let calibragem_pct = self.config.calibragem_global_pct()?;

        self.kv.transaction(|s| {
            let prospec: Vec<ProspecRecord> = s.read_collection(keys::PROSPEC)?;
            let mut controle: Vec<ControleRecord> = s.read_collection(keys::CONTROLE)?;
            let outcome = status_sync::sincronizar_status_fechado(
                &prospec,
                &mut controle,
                numero_proposta,
                novo_status,
            );
            if outcome.alterou() {
                s.write_collection(keys::CONTROLE, &controle)?;
                recalcular_ugs(s, &controle, calibragem_pct)?;
            }
            Ok(outcome)
        })
    }

    /// Exclui uma linha e a entrada de controle correspondente
    pub fn remove_prospec(&self, id: &str) -> RepositoryResult<ProspecRecord> {
        let calibragem_pct = self.config.calibragem_global_pct()?;

        self.kv.transaction(|s| {
            let mut prospec: Vec<ProspecRecord> = s.read_collection(keys::PROSPEC)?;
            let idx = prospec
                .iter()
                .position(|l| l.id == id)
                .ok_or_else(|| not_found("ProspecRecord", id))?;
            let removida = prospec.remove(idx);
            s.write_collection(keys::PROSPEC, &prospec)?;

            let mut controle: Vec<ControleRecord> = s.read_collection(keys::CONTROLE)?;
            if status_sync::remover_chave(&mut controle, &removida.chave()) {
                s.write_collection(keys::CONTROLE, &controle)?;
                recalcular_ugs(s, &controle, calibragem_pct)?;
            }

            tracing::info!(id = %removida.id, chave = %removida.chave(), "linha de proposta excluída");
            Ok(removida)
        })
    }

    // ==========================================
    // Controle
    // ==========================================

    pub fn get_controle(&self) -> RepositoryResult<Vec<ControleRecord>> {
        self.kv.with_session(|s| s.read_collection(keys::CONTROLE))
    }

    /// Sobrescreve a coleção inteira (sem sincronização)
    pub fn save_controle(&self, registros: &[ControleRecord]) -> RepositoryResult<()> {
        registros.iter().try_for_each(|r| validar_linha(&r.linha))?;
        self.kv.with_session(|s| s.write_collection(keys::CONTROLE, registros))
    }

    /// Substitui um registro de controle (mesma chave)
    ///
    /// A UG informada passa pelas mesmas regras de atribuir_ug.
    pub fn update_controle(&self, registro: ControleRecord) -> RepositoryResult<ControleRecord> {
        validar_linha(&registro.linha)?;
        let calibragem_pct = self.config.calibragem_global_pct()?;
        let chave = registro.chave();
        let nome_usina = registro
            .ug
            .as_deref()
            .map(str::trim)
            .filter(|nome| !nome.is_empty())
            .map(str::to_string);

        self.kv.transaction(|s| {
            if let Some(nome) = &nome_usina {
                let ugs: Vec<Ug> = s.read_collection(keys::UGS)?;
                if !ugs.iter().any(|u| &u.nome_usina == nome) {
                    return Err(not_found("Ug", nome));
                }
            }

            let mut controle: Vec<ControleRecord> = s.read_collection(keys::CONTROLE)?;
            let atual = controle
                .iter_mut()
                .find(|c| c.chave() == chave)
                .ok_or_else(|| not_found("ControleRecord", &chave.to_string()))?;
            *atual = registro.clone();
            atual.atribuir_ug(nome_usina.clone());
            let salvo = atual.clone();

            s.write_collection(keys::CONTROLE, &controle)?;
            recalcular_ugs(s, &controle, calibragem_pct)?;
            Ok(salvo)
        })
    }

    /// Remove uma entrada de controle; a linha de origem volta a Aguardando
    pub fn remove_controle(&self, chave: &ChaveUc) -> RepositoryResult<()> {
        let calibragem_pct = self.config.calibragem_global_pct()?;

        self.kv.transaction(|s| {
            let mut controle: Vec<ControleRecord> = s.read_collection(keys::CONTROLE)?;
            if !status_sync::remover_chave(&mut controle, chave) {
                return Err(not_found("ControleRecord", &chave.to_string()));
            }
            s.write_collection(keys::CONTROLE, &controle)?;

            let mut prospec: Vec<ProspecRecord> = s.read_collection(keys::PROSPEC)?;
            if let Some(linha) = prospec.iter_mut().find(|l| &l.chave() == chave) {
                linha.status = StatusProposta::Aguardando;
                s.write_collection(keys::PROSPEC, &prospec)?;
            }

            recalcular_ugs(s, &controle, calibragem_pct)?;
            tracing::info!(chave = %chave, "entrada de controle removida");
            Ok(())
        })
    }

    /// Atribui (Some) ou desfaz (None) a UG de um registro de controle
    pub fn atribuir_ug(&self, chave: &ChaveUc, nome_usina: Option<&str>) -> RepositoryResult<Vec<Ug>> {
        let calibragem_pct = self.config.calibragem_global_pct()?;

        self.kv.transaction(|s| {
            let ugs: Vec<Ug> = s.read_collection(keys::UGS)?;
            if let Some(nome) = nome_usina {
                if !ugs.iter().any(|u| u.nome_usina == nome) {
                    return Err(not_found("Ug", nome));
                }
            }

            let mut controle: Vec<ControleRecord> = s.read_collection(keys::CONTROLE)?;
            let registro = controle
                .iter_mut()
                .find(|c| &c.chave() == chave)
                .ok_or_else(|| not_found("ControleRecord", &chave.to_string()))?;
            registro.atribuir_ug(nome_usina.map(str::to_string));
            s.write_collection(keys::CONTROLE, &controle)?;

            tracing::info!(chave = %chave, ug = ?nome_usina, "UG atribuída");
            recalcular_ugs(s, &controle, calibragem_pct)
        })
    }

    // ==========================================
    // UGs
    // ==========================================

    pub fn get_ugs(&self) -> RepositoryResult<Vec<Ug>> {
        self.kv.with_session(|s| s.read_collection(keys::UGS))
    }

    /// Sobrescreve a coleção inteira (sem recálculo)
    pub fn save_ugs(&self, ugs: &[Ug]) -> RepositoryResult<()> {
        ugs.iter().try_for_each(validar_ug)?;
        self.kv.with_session(|s| s.write_collection(keys::UGS, ugs))
    }

    pub fn add_ug(&self, ug: Ug) -> RepositoryResult<Ug> {
        validar_ug(&ug)?;
        let calibragem_pct = self.config.calibragem_global_pct()?;

        self.kv.transaction(|s| {
            let mut ugs: Vec<Ug> = s.read_collection(keys::UGS)?;
            if ugs.iter().any(|u| u.nome_usina == ug.nome_usina) {
                return Err(RepositoryError::UniqueConstraintViolation(format!(
                    "UG já cadastrada: {}",
                    ug.nome_usina
                )));
            }
            ugs.push(ug.clone());
            s.write_collection(keys::UGS, &ugs)?;

            let controle: Vec<ControleRecord> = s.read_collection(keys::CONTROLE)?;
            let ugs = recalcular_ugs(s, &controle, calibragem_pct)?;
            tracing::info!(nome = %ug.nome_usina, "UG cadastrada");
            ugs.into_iter()
                .find(|u| u.id == ug.id)
                .ok_or_else(|| RepositoryError::InternalError("UG recém-incluída não encontrada".to_string()))
        })
    }

    /// Altera uma UG; renomear atualiza as referências no controle
    pub fn update_ug(&self, id: &str, patch: &UgPatch) -> RepositoryResult<Ug> {
        let calibragem_pct = self.config.calibragem_global_pct()?;

        self.kv.transaction(|s| {
            let mut ugs: Vec<Ug> = s.read_collection(keys::UGS)?;
            if let Some(nome) = &patch.nome_usina {
                if ugs.iter().any(|u| &u.nome_usina == nome && u.id != id) {
                    return Err(RepositoryError::UniqueConstraintViolation(format!(
                        "UG já cadastrada: {}",
                        nome
                    )));
                }
            }

            let ug = ugs
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| not_found("Ug", id))?;
            let nome_anterior = ug.aplicar(patch);
            validar_ug(ug)?;
            let novo_nome = ug.nome_usina.clone();
            s.write_collection(keys::UGS, &ugs)?;

            let mut controle: Vec<ControleRecord> = s.read_collection(keys::CONTROLE)?;
            if let Some(anterior) = nome_anterior {
                for registro in controle.iter_mut().filter(|c| c.pertence_a(&anterior)) {
                    registro.atribuir_ug(Some(novo_nome.clone()));
                }
                s.write_collection(keys::CONTROLE, &controle)?;
                tracing::info!(de = %anterior, para = %novo_nome, "UG renomeada");
            }

            recalcular_ugs(s, &controle, calibragem_pct)?
                .into_iter()
                .find(|u| u.id == id)
                .ok_or_else(|| not_found("Ug", id))
        })
    }

    /// Exclui uma UG e desfaz as atribuições a ela
    pub fn remove_ug(&self, id: &str) -> RepositoryResult<Ug> {
        self.kv.transaction(|s| {
            let mut ugs: Vec<Ug> = s.read_collection(keys::UGS)?;
            let idx = ugs
                .iter()
                .position(|u| u.id == id)
                .ok_or_else(|| not_found("Ug", id))?;
            let removida = ugs.remove(idx);
            s.write_collection(keys::UGS, &ugs)?;

            let mut controle: Vec<ControleRecord> = s.read_collection(keys::CONTROLE)?;
            let mut liberados = 0;
            for registro in controle.iter_mut().filter(|c| c.pertence_a(&removida.nome_usina)) {
                registro.atribuir_ug(None);
                liberados += 1;
            }
            if liberados > 0 {
                s.write_collection(keys::CONTROLE, &controle)?;
            }

            tracing::info!(nome = %removida.nome_usina, liberados = liberados, "UG excluída");
            Ok(removida)
        })
    }

    /// Recalcula media/calibragem/ucsAtribuidas/calibrado de todas as UGs
    pub fn atualizar_medias_ugs(&self) -> RepositoryResult<Vec<Ug>> {
        let calibragem_pct = self.config.calibragem_global_pct()?;
        self.kv.transaction(|s| {
            let controle: Vec<ControleRecord> = s.read_collection(keys::CONTROLE)?;
            recalcular_ugs(s, &controle, calibragem_pct)
        })
    }

    /// Remove as três coleções
    pub fn limpar_tudo(&self) -> RepositoryResult<()> {
        self.kv.transaction(|s| {
            for key in [keys::PROSPEC, keys::CONTROLE, keys::UGS] {
                s.remove(key)?;
            }
            Ok(())
        })?;
        tracing::warn!("coleções locais apagadas");
        Ok(())
    }
}

// ==========================================
// Auxiliares
// ==========================================

fn recalcular_ugs(
    s: &KvSession<'_>,
    controle: &[ControleRecord],
    calibragem_pct: f64,
) -> RepositoryResult<Vec<Ug>> {
    let mut ugs: Vec<Ug> = s.read_collection(keys::UGS)?;
    ug_aggregation::atualizar_medias_ugs(&mut ugs, controle, calibragem_pct);
    s.write_collection(keys::UGS, &ugs)?;
    tracing::debug!(ugs = ugs.len(), controle = controle.len(), "médias das UGs recalculadas");
    Ok(ugs)
}

fn not_found(entity: &str, id: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity: entity.to_string(),
        id: id.to_string(),
    }
}

fn validar_linha(linha: &ProspecRecord) -> RepositoryResult<()> {
    let obrigatorios = [
        ("nomeCliente", &linha.nome_cliente),
        ("numeroProposta", &linha.numero_proposta),
        ("numeroUC", &linha.numero_uc),
    ];
    for (campo, valor) in obrigatorios {
        if valor.trim().is_empty() {
            return Err(RepositoryError::ValidationError(format!("campo obrigatório vazio: {}", campo)));
        }
    }
    let numericos = [
        ("media", linha.media),
        ("descontoTarifa", linha.desconto_tarifa),
        ("descontoBandeira", linha.desconto_bandeira),
    ];
    validar_numeros(&numericos)
}

/// Números persistidos precisam ser finitos e não negativos
fn validar_numeros(campos: &[(&str, f64)]) -> RepositoryResult<()> {
    for (campo, valor) in campos {
        if !valor.is_finite() {
            return Err(RepositoryError::ValidationError(format!("{} não é um número finito", campo)));
        }
        if *valor < 0.0 {
            return Err(RepositoryError::ValidationError(format!("{} não pode ser negativo", campo)));
        }
    }
    Ok(())
}

fn validar_ug(ug: &Ug) -> RepositoryResult<()> {
    if ug.nome_usina.trim().is_empty() {
        return Err(RepositoryError::ValidationError("nomeUsina vazio".to_string()));
    }
    validar_numeros(&[
        ("potenciaCA", ug.potencia_ca),
        ("potenciaCC", ug.potencia_cc),
        ("fatorCapacidade", ug.fator_capacidade),
    ])
}

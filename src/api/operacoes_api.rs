// ==========================================
// Aupus Operações - API de operações comerciais
// ==========================================
// Fachada sobre StorageService + DataContext + Notifier:
// listagens via cache, mutações invalidam as entidades afetadas,
// sucesso e erro viram notificações para o usuário
// ==========================================

use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::api::error::{ApiError, ApiResult};
use crate::cache::{page_of, DataContext, LoadOutcome, Page};
use crate::config::ConfigManager;
use crate::domain::{
    ChaveUc, ControleRecord, Entidade, Filtros, ProspecPatch, ProspecRecord, StatusProposta, Ug, UgPatch,
};
use crate::export::{self, ExportMeta, ResumoProposta};
use crate::i18n::t_with_args;
use crate::importer::{ImportSummary, ProspecImporter};
use crate::notify::{NivelNotificacao, Notifier};
use crate::storage::StorageService;

/// Formatos de exportação
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatoExportacao {
    Xlsx,
    Xml,
}

pub struct OperacoesApi {
    storage: Arc<StorageService>,
    config: Arc<ConfigManager>,
    contexto: Mutex<DataContext>,
    notifier: Arc<Notifier>,
}

impl OperacoesApi {
    pub fn new(
        storage: Arc<StorageService>,
        config: Arc<ConfigManager>,
        contexto: DataContext,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            storage,
            config,
            contexto: Mutex::new(contexto),
            notifier,
        }
    }

    // ==========================================
    // Listagens (cache)
    // ==========================================
    // O cache guarda a entidade inteira; os filtros valem só na leitura

    pub async fn listar_prospec(&self, filtros: &Filtros, page: Page, force: bool) -> ApiResult<Vec<ProspecRecord>> {
        let mut ctx = self.contexto.lock().await;
        self.reportar(ctx.load(Entidade::Prospec, &Filtros::default(), force).await)?;
        let filtradas: Vec<ProspecRecord> = ctx
            .prospec()
            .iter()
            .filter(|l| filtros.aceita_prospec(l))
            .cloned()
            .collect();
        Ok(page_of(&filtradas, page).to_vec())
    }

    pub async fn listar_controle(
        &self,
        filtros: &Filtros,
        page: Page,
        force: bool,
    ) -> ApiResult<Vec<ControleRecord>> {
        let mut ctx = self.contexto.lock().await;
        self.reportar(ctx.load(Entidade::Controle, &Filtros::default(), force).await)?;
        let filtrados: Vec<ControleRecord> = ctx
            .controle()
            .iter()
            .filter(|c| filtros.aceita_controle(c))
            .cloned()
            .collect();
        Ok(page_of(&filtrados, page).to_vec())
    }

    pub async fn listar_ugs(&self, filtros: &Filtros, force: bool) -> ApiResult<Vec<Ug>> {
        let mut ctx = self.contexto.lock().await;
        self.reportar(ctx.load(Entidade::Ugs, &Filtros::default(), force).await)?;
        Ok(ctx.ugs().iter().filter(|u| filtros.aceita_ug(u)).cloned().collect())
    }

    /// Carrega sem devolver os dados (pré-carga / CLI)
    pub async fn carregar(&self, entidade: Entidade, force: bool) -> ApiResult<LoadOutcome> {
        let mut ctx = self.contexto.lock().await;
        self.reportar(ctx.load(entidade, &Filtros::default(), force).await)
    }

    // ==========================================
    // Prospec
    // ==========================================

    pub async fn incluir_prospec(&self, linha: ProspecRecord) -> ApiResult<ProspecRecord> {
        if linha.nome_cliente.trim().is_empty() {
            return self.reportar(Err(ApiError::InvalidInput("nome do cliente é obrigatório".to_string())));
        }
        let fechada = linha.status.is_fechado();
        let salva = self.reportar(self.storage.add_prospec(linha).map_err(ApiError::from))?;

        if fechada {
            self.invalidar(&Entidade::TODAS).await;
        } else {
            self.invalidar(&[Entidade::Prospec]).await;
        }
        self.sucesso(
            "prospec.incluida",
            &[("proposta", salva.numero_proposta.as_str()), ("uc", salva.numero_uc.as_str())],
        );
        Ok(salva)
    }

    pub async fn alterar_prospec(&self, id: &str, patch: &ProspecPatch) -> ApiResult<ProspecRecord> {
        let atualizada = self.reportar(self.storage.update_prospec(id, patch).map_err(ApiError::from))?;
        self.invalidar(&Entidade::TODAS).await;
        Ok(atualizada)
    }

    /// Altera o status de todas as UCs de uma proposta
    pub async fn alterar_status(&self, numero_proposta: &str, status: StatusProposta) -> ApiResult<Vec<ProspecRecord>> {
        let linhas = self.reportar(
            self.storage
                .set_status_proposta(numero_proposta, status)
                .map_err(ApiError::from),
        )?;
        self.invalidar(&Entidade::TODAS).await;
        self.sucesso(
            "prospec.status_alterado",
            &[("proposta", numero_proposta), ("status", status.as_str())],
        );
        Ok(linhas)
    }

    pub async fn excluir_prospec(&self, id: &str) -> ApiResult<ProspecRecord> {
        let removida = self.reportar(self.storage.remove_prospec(id).map_err(ApiError::from))?;
        self.invalidar(&Entidade::TODAS).await;
        self.sucesso(
            "prospec.excluida",
            &[("proposta", removida.numero_proposta.as_str()), ("uc", removida.numero_uc.as_str())],
        );
        Ok(removida)
    }

    // ==========================================
    // Controle
    // ==========================================

    pub async fn atribuir_ug(&self, chave: &ChaveUc, nome_usina: Option<&str>) -> ApiResult<Vec<Ug>> {
        let ugs = self.reportar(self.storage.atribuir_ug(chave, nome_usina).map_err(ApiError::from))?;
        self.invalidar(&[Entidade::Controle, Entidade::Ugs]).await;
        match nome_usina {
            Some(ug) => self.sucesso("controle.ug_atribuida", &[("uc", chave.numero_uc.as_str()), ("ug", ug)]),
            None => self.sucesso("controle.ug_removida", &[("uc", chave.numero_uc.as_str())]),
        }
        Ok(ugs)
    }

    pub async fn remover_controle(&self, chave: &ChaveUc) -> ApiResult<()> {
        self.reportar(self.storage.remove_controle(chave).map_err(ApiError::from))?;
        self.invalidar(&Entidade::TODAS).await;
        Ok(())
    }

    // ==========================================
    // UGs
    // ==========================================

    pub async fn incluir_ug(&self, ug: Ug) -> ApiResult<Ug> {
        let salva = self.reportar(self.storage.add_ug(ug).map_err(ApiError::from))?;
        self.invalidar(&[Entidade::Ugs]).await;
        self.sucesso("ugs.cadastrada", &[("nome", salva.nome_usina.as_str())]);
        Ok(salva)
    }

    pub async fn alterar_ug(&self, id: &str, patch: &UgPatch) -> ApiResult<Ug> {
        let ug = self.reportar(self.storage.update_ug(id, patch).map_err(ApiError::from))?;
        self.invalidar(&[Entidade::Controle, Entidade::Ugs]).await;
        Ok(ug)
    }

    pub async fn excluir_ug(&self, id: &str) -> ApiResult<Ug> {
        let ug = self.reportar(self.storage.remove_ug(id).map_err(ApiError::from))?;
        self.invalidar(&[Entidade::Controle, Entidade::Ugs]).await;
        Ok(ug)
    }

    pub async fn recalcular_ugs(&self) -> ApiResult<Vec<Ug>> {
        let ugs = self.reportar(self.storage.atualizar_medias_ugs().map_err(ApiError::from))?;
        self.invalidar(&[Entidade::Ugs]).await;
        self.sucesso("ugs.recalculadas", &[("total", ugs.len().to_string().as_str())]);
        Ok(ugs)
    }

    // ==========================================
    // Importação / exportação
    // ==========================================

    pub async fn importar(&self, caminho: &Path) -> ApiResult<ImportSummary> {
        if !caminho.exists() {
            let msg = t_with_args("importacao.arquivo_nao_encontrado", &[("caminho", caminho.display().to_string().as_str())]);
            return self.reportar(Err(ApiError::InvalidInput(msg)));
        }
        let importer = ProspecImporter::new(self.storage.clone());
        let summary = self.reportar(importer.importar_arquivo(caminho).map_err(ApiError::from))?;
        self.invalidar(&Entidade::TODAS).await;

        let nivel = if summary.rejeitados > 0 {
            NivelNotificacao::Aviso
        } else {
            NivelNotificacao::Sucesso
        };
        let msg = t_with_args(
            "importacao.concluida",
            &[
                ("importados", summary.importados.to_string().as_str()),
                ("duplicados", summary.duplicados.to_string().as_str()),
                ("rejeitados", summary.rejeitados.to_string().as_str()),
            ],
        );
        self.notifier.notify(nivel, &msg);
        Ok(summary)
    }

    /// Exporta prospec (XLSX ou XML) com os filtros informados
    pub fn exportar_prospec(&self, formato: FormatoExportacao, filtros: &Filtros) -> ApiResult<Vec<u8>> {
        let linhas = self.reportar(self.storage.get_prospec().map_err(ApiError::from))?;
        let meta = self.meta()?;
        let resultado = match formato {
            FormatoExportacao::Xlsx => export::exportar_prospec_xlsx(&linhas, filtros, &meta),
            FormatoExportacao::Xml => export::exportar_prospec_xml(&linhas, filtros, &meta),
        };
        self.reportar(resultado.map_err(ApiError::from))
    }

    pub fn exportar_controle_xlsx(&self, filtros: &Filtros) -> ApiResult<Vec<u8>> {
        let registros = self.reportar(self.storage.get_controle().map_err(ApiError::from))?;
        let meta = self.meta()?;
        self.reportar(export::exportar_controle_xlsx(&registros, filtros, &meta).map_err(ApiError::from))
    }

    pub fn resumo_proposta(&self, numero_proposta: &str) -> ApiResult<ResumoProposta> {
        let (linhas, tarifa, comissao) = self.dados_proposta(numero_proposta)?;
        self.reportar(ResumoProposta::calcular(&linhas, tarifa, comissao).map_err(ApiError::from))
    }

    pub fn exportar_pdf_proposta(&self, numero_proposta: &str) -> ApiResult<Vec<u8>> {
        let (linhas, tarifa, comissao) = self.dados_proposta(numero_proposta)?;
        self.reportar(export::gerar_pdf_proposta(&linhas, tarifa, comissao).map_err(ApiError::from))
    }

    // ==========================================
    // Internos
    // ==========================================

    fn dados_proposta(&self, numero_proposta: &str) -> ApiResult<(Vec<ProspecRecord>, f64, f64)> {
        let linhas = self.reportar(self.storage.get_proposta(numero_proposta).map_err(ApiError::from))?;
        let tarifa = self.reportar(self.config.tarifa_estimada_kwh().map_err(ApiError::from))?;
        let comissao = self.reportar(self.config.comissao_padrao_pct().map_err(ApiError::from))?;
        Ok((linhas, tarifa, comissao))
    }

    fn meta(&self) -> ApiResult<ExportMeta> {
        let snapshot = self.reportar(self.config.snapshot().map_err(ApiError::from))?;
        Ok(ExportMeta::new(snapshot))
    }

    async fn invalidar(&self, entidades: &[Entidade]) {
        let mut ctx = self.contexto.lock().await;
        for entidade in entidades {
            ctx.invalidate(*entidade);
        }
    }

    fn sucesso(&self, chave: &str, args: &[(&str, &str)]) {
        self.notifier.notify(NivelNotificacao::Sucesso, &t_with_args(chave, args));
    }

    /// Erros viram notificação antes de subir
    fn reportar<T>(&self, resultado: ApiResult<T>) -> ApiResult<T> {
        if let Err(e) = &resultado {
            self.notifier.notify_error(e);
        }
        resultado
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheTtls, LocalDataSource};
    use crate::notify::NotificationSink;
    use crate::repository::KvStore;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct Coletor {
        entregues: StdMutex<Vec<(NivelNotificacao, String)>>,
    }

    impl NotificationSink for Coletor {
        fn deliver(&self, nivel: NivelNotificacao, mensagem: &str) {
            self.entregues.lock().unwrap().push((nivel, mensagem.to_string()));
        }
    }

    fn montar() -> (OperacoesApi, Arc<Coletor>) {
        let conn = Arc::new(std::sync::Mutex::new(crate::db::open_in_memory().unwrap()));
        let kv = Arc::new(KvStore::new(conn.clone()));
        let config = Arc::new(ConfigManager::from_connection(conn));
        let storage = Arc::new(StorageService::new(kv, config.clone()));
        let contexto = DataContext::new(Arc::new(LocalDataSource::new(storage.clone())), CacheTtls::default());
        let coletor = Arc::new(Coletor::default());
        let notifier = Arc::new(Notifier::new(coletor.clone(), Notifier::JANELA_PADRAO));
        (OperacoesApi::new(storage, config, contexto, notifier), coletor)
    }

    #[tokio::test]
    async fn test_listagem_filtrada_nao_reduz_o_cache() {
        let (api, _) = montar();
        api.incluir_prospec(ProspecRecord::nova("Padaria Sol", "2025/0001", "111", "Ana", 100.0))
            .await
            .unwrap();
        api.incluir_prospec(ProspecRecord::nova("Mercado Lua", "2025/0002", "222", "Bruno", 200.0))
            .await
            .unwrap();

        let filtros = Filtros {
            consultor: Some("Ana".to_string()),
            ..Default::default()
        };
        let da_ana = api.listar_prospec(&filtros, Page::default(), false).await.unwrap();
        assert_eq!(da_ana.len(), 1);

        // dentro do TTL, sem filtro: todas as linhas
        let todas = api.listar_prospec(&Filtros::default(), Page::default(), false).await.unwrap();
        assert_eq!(todas.len(), 2);
    }

    #[tokio::test]
    async fn test_inclusao_invalida_cache() {
        let (api, _) = montar();
        assert!(api.listar_prospec(&Filtros::default(), Page::default(), false).await.unwrap().is_empty());

        api.incluir_prospec(ProspecRecord::nova("Padaria Sol", "2025/0001", "111", "Ana", 300.0))
            .await
            .unwrap();

        let linhas = api.listar_prospec(&Filtros::default(), Page::default(), false).await.unwrap();
        assert_eq!(linhas.len(), 1);

        // cache cheio e dentro do TTL: só a invalidação faz a linha nova aparecer
        api.incluir_prospec(ProspecRecord::nova("Padaria Sol", "2025/0001", "112", "Ana", 200.0))
            .await
            .unwrap();
        let linhas = api.listar_prospec(&Filtros::default(), Page::default(), false).await.unwrap();
        assert_eq!(linhas.len(), 2);

        api.alterar_status("2025/0001", StatusProposta::Fechado).await.unwrap();
        let controle = api.listar_controle(&Filtros::default(), Page::default(), false).await.unwrap();
        assert_eq!(controle.len(), 2);
        let linhas = api.listar_prospec(&Filtros::default(), Page::default(), false).await.unwrap();
        assert_eq!(linhas[0].status, StatusProposta::Fechado);
    }

    #[tokio::test]
    async fn test_erro_gera_notificacao() {
        let (api, coletor) = montar();
        let err = api.excluir_prospec("nao-existe").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let entregues = coletor.entregues.lock().unwrap();
        assert_eq!(entregues.len(), 1);
        assert_eq!(entregues[0].0, NivelNotificacao::Erro);
    }

    #[tokio::test]
    async fn test_exportacoes() {
        let (api, _) = montar();
        api.incluir_prospec(ProspecRecord::nova("Padaria Sol", "2025/0001", "111", "Ana", 300.0))
            .await
            .unwrap();

        let xml = api.exportar_prospec(FormatoExportacao::Xml, &Filtros::default()).unwrap();
        assert!(String::from_utf8(xml).unwrap().contains("<numeroUC>111</numeroUC>"));

        let resumo = api.resumo_proposta("2025/0001").unwrap();
        assert_eq!(resumo.total_ucs, 1);

        let err = api.exportar_pdf_proposta("2099/9999").unwrap_err();
        assert!(matches!(err, ApiError::ExportError(_)));
    }
}

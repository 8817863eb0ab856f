// ==========================================
// Aupus Operações - Estado da aplicação
// ==========================================
// Monta todos os componentes sobre uma única conexão SQLite
// compartilhada (KvStore + ConfigManager)
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ApiError, ApiResult, OperacoesApi};
use crate::cache::{CacheTtls, DataContext, DataSource, LocalDataSource, RemoteDataSource};
use crate::client::{
    ApiClient, AuthService, ClientError, DocumentosApi, HttpTransport, ReqwestTransport, SessionMonitor, UsuariosApi,
};
use crate::config::{AppConfig, ConfigManager};
use crate::domain::Entidade;
use crate::notify::{Notifier, TracingSink};
use crate::repository::error::RepositoryError;
use crate::repository::KvStore;
use crate::storage::StorageService;

/// De onde o cache busca as listagens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FonteDados {
    #[default]
    Local,
    Remota,
}

pub struct AppState {
    pub config: AppConfig,
    pub kv: Arc<KvStore>,
    pub config_manager: Arc<ConfigManager>,
    pub storage: Arc<StorageService>,
    pub notifier: Arc<Notifier>,
    pub operacoes: Arc<OperacoesApi>,
    /// Ausente quando AUPUS_API_URL não está definido
    pub client: Option<Arc<ApiClient>>,
}

impl AppState {
    /// Estado com transporte reqwest e cache local
    pub fn new(config: AppConfig) -> ApiResult<Self> {
        Self::build(config, None, FonteDados::Local)
    }

    pub fn with_fonte(config: AppConfig, fonte: FonteDados) -> ApiResult<Self> {
        Self::build(config, None, fonte)
    }

    /// Estado com transporte HTTP injetado (testes)
    pub fn with_transport(config: AppConfig, transport: Arc<dyn HttpTransport>, fonte: FonteDados) -> ApiResult<Self> {
        Self::build(config, Some(transport), fonte)
    }

    fn build(config: AppConfig, transport: Option<Arc<dyn HttpTransport>>, fonte: FonteDados) -> ApiResult<Self> {
        tracing::info!(db_path = %config.db_path, api = ?config.api_base_url, "inicializando AppState");
        crate::i18n::set_locale(&config.locale);

        let conn = crate::db::open_sqlite_connection(&config.db_path).map_err(RepositoryError::from)?;
        let conn = Arc::new(Mutex::new(conn));

        let kv = Arc::new(KvStore::new(conn.clone()));
        let config_manager = Arc::new(ConfigManager::from_connection(conn));
        let storage = Arc::new(StorageService::new(kv.clone(), config_manager.clone()));

        let client = match (&config.api_base_url, transport) {
            (Some(url), Some(transport)) => Some(Arc::new(ApiClient::new(url.clone(), transport, kv.clone()))),
            (Some(url), None) => {
                let transport = ReqwestTransport::new(ReqwestTransport::DEFAULT_TIMEOUT)?;
                Some(Arc::new(ApiClient::new(url.clone(), Arc::new(transport), kv.clone())))
            }
            (None, _) => None,
        };

        let source: Arc<dyn DataSource> = match fonte {
            FonteDados::Local => Arc::new(LocalDataSource::new(storage.clone())),
            FonteDados::Remota => {
                let client = client.clone().ok_or(ClientError::MissingBaseUrl)?;
                Arc::new(RemoteDataSource::new(client))
            }
        };

        let ttls = CacheTtls {
            prospec: config_manager.cache_ttl(Entidade::Prospec)?,
            controle: config_manager.cache_ttl(Entidade::Controle)?,
            ugs: config_manager.cache_ttl(Entidade::Ugs)?,
        };
        let notifier = Arc::new(Notifier::new(
            Arc::new(TracingSink),
            config_manager.toast_dedup_window()?,
        ));

        let operacoes = Arc::new(OperacoesApi::new(
            storage.clone(),
            config_manager.clone(),
            DataContext::new(source, ttls),
            notifier.clone(),
        ));

        tracing::info!(fonte = ?fonte, remoto = client.is_some(), "AppState pronto");
        Ok(Self {
            config,
            kv,
            config_manager,
            storage,
            notifier,
            operacoes,
            client,
        })
    }

    pub fn client(&self) -> ApiResult<Arc<ApiClient>> {
        self.client
            .clone()
            .ok_or_else(|| ApiError::from(ClientError::MissingBaseUrl))
    }

    pub fn auth(&self) -> ApiResult<Arc<AuthService>> {
        Ok(Arc::new(AuthService::new(self.client()?, self.kv.clone())))
    }

    pub fn usuarios(&self) -> ApiResult<UsuariosApi> {
        Ok(UsuariosApi::new(self.client()?, self.kv.clone()))
    }

    pub fn documentos(&self) -> ApiResult<DocumentosApi> {
        Ok(DocumentosApi::new(self.client()?))
    }

    pub fn session_monitor(&self) -> ApiResult<SessionMonitor> {
        let max_erros = self.config_manager.session_max_erros()?;
        Ok(SessionMonitor::new(self.auth()?, max_erros))
    }
}

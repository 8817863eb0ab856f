// ==========================================
// Aupus Operações - Cache de dados (DataContext)
// ==========================================
// Política por entidade:
//   pula a busca se !force_reload, tempo desde a última busca bem-sucedida
//   < TTL e já existe pelo menos um registro carregado
// Sem LRU, sem limite de tamanho, sem invalidação por filtro:
// invalidar = apagar timestamp e dados da entidade inteira
// ==========================================

use crate::api::error::ApiResult;
use crate::cache::source::DataSource;
use crate::domain::{ControleRecord, Entidade, Filtros, ProspecRecord, Ug};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// TTL por entidade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub prospec: Duration,
    pub controle: Duration,
    pub ugs: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            prospec: Duration::from_secs(60),
            controle: Duration::from_secs(60),
            ugs: Duration::from_secs(120),
        }
    }
}

impl CacheTtls {
    pub fn get(&self, entidade: Entidade) -> Duration {
        match entidade {
            Entidade::Prospec => self.prospec,
            Entidade::Controle => self.controle,
            Entidade::Ugs => self.ugs,
        }
    }
}

/// Resultado de um load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Dados do cache; nenhuma busca feita
    Cache,
    /// Busca realizada (quantidade carregada)
    Buscado(usize),
}

/// Paginação para exibição
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize, // a partir de 1
    pub size: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self { number: 1, size: 50 }
    }
}

/// Fatia de uma página (vazia fora do intervalo)
pub fn page_of<T>(items: &[T], page: Page) -> &[T] {
    if page.size == 0 || page.number == 0 {
        return &[];
    }
    let start = (page.number - 1).saturating_mul(page.size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page.size).min(items.len());
    &items[start..end]
}

struct EntityState<T> {
    dados: Vec<T>,
    ultimo_fetch: Option<Instant>,
}

impl<T> Default for EntityState<T> {
    fn default() -> Self {
        Self {
            dados: Vec::new(),
            ultimo_fetch: None,
        }
    }
}

impl<T> EntityState<T> {
    fn fresco(&self, ttl: Duration) -> bool {
        !self.dados.is_empty()
            && self
                .ultimo_fetch
                .map(|t| t.elapsed() < ttl)
                .unwrap_or(false)
    }

    fn invalidar(&mut self) {
        self.dados.clear();
        self.ultimo_fetch = None;
    }

    /// Falha na busca mantém dados e timestamp anteriores
    async fn carregar<Fut>(&mut self, ttl: Duration, force_reload: bool, fetch: Fut) -> ApiResult<LoadOutcome>
    where
        Fut: Future<Output = ApiResult<Vec<T>>>,
    {
        if !force_reload && self.fresco(ttl) {
            return Ok(LoadOutcome::Cache);
        }
        let dados = fetch.await?;
        let n = dados.len();
        self.dados = dados;
        self.ultimo_fetch = Some(Instant::now());
        Ok(LoadOutcome::Buscado(n))
    }
}

pub struct DataContext {
    source: Arc<dyn DataSource>,
    ttls: CacheTtls,
    prospec: EntityState<ProspecRecord>,
    controle: EntityState<ControleRecord>,
    ugs: EntityState<Ug>,
}

impl DataContext {
    pub fn new(source: Arc<dyn DataSource>, ttls: CacheTtls) -> Self {
        Self {
            source,
            ttls,
            prospec: EntityState::default(),
            controle: EntityState::default(),
            ugs: EntityState::default(),
        }
    }

    /// Carrega uma entidade respeitando o TTL
    pub async fn load(
        &mut self,
        entidade: Entidade,
        filtros: &Filtros,
        force_reload: bool,
    ) -> ApiResult<LoadOutcome> {
        let ttl = self.ttls.get(entidade);
        let source = self.source.clone();
        let outcome = match entidade {
            Entidade::Prospec => {
                self.prospec
                    .carregar(ttl, force_reload, source.fetch_prospec(filtros))
                    .await
            }
            Entidade::Controle => {
                self.controle
                    .carregar(ttl, force_reload, source.fetch_controle(filtros))
                    .await
            }
            Entidade::Ugs => self.ugs.carregar(ttl, force_reload, source.fetch_ugs(filtros)).await,
        };

        match &outcome {
            Ok(LoadOutcome::Cache) => tracing::debug!(entidade = %entidade, "dados servidos do cache"),
            Ok(LoadOutcome::Buscado(n)) => tracing::debug!(entidade = %entidade, registros = n, "dados buscados"),
            Err(e) => tracing::warn!(entidade = %entidade, error = %e, "falha ao carregar dados"),
        }
        outcome
    }

    pub fn prospec(&self) -> &[ProspecRecord] {
        &self.prospec.dados
    }

    pub fn controle(&self) -> &[ControleRecord] {
        &self.controle.dados
    }

    pub fn ugs(&self) -> &[Ug] {
        &self.ugs.dados
    }

    pub fn invalidate(&mut self, entidade: Entidade) {
        match entidade {
            Entidade::Prospec => self.prospec.invalidar(),
            Entidade::Controle => self.controle.invalidar(),
            Entidade::Ugs => self.ugs.invalidar(),
        }
        tracing::debug!(entidade = %entidade, "cache invalidado");
    }

    pub fn invalidate_all(&mut self) {
        for entidade in Entidade::TODAS {
            self.invalidate(entidade);
        }
    }
}

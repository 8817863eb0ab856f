// ==========================================
// Aupus Operações - Fontes de dados do cache
// ==========================================
// LocalDataSource: StorageService (SQLite)
// RemoteDataSource: API REST (/propostas, /controle, /ugs)
// ==========================================

use crate::api::error::ApiResult;
use crate::client::ApiClient;
use crate::domain::{ControleRecord, Filtros, ProspecRecord, Ug};
use crate::storage::StorageService;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_prospec(&self, filtros: &Filtros) -> ApiResult<Vec<ProspecRecord>>;
    async fn fetch_controle(&self, filtros: &Filtros) -> ApiResult<Vec<ControleRecord>>;
    async fn fetch_ugs(&self, filtros: &Filtros) -> ApiResult<Vec<Ug>>;
}

// ==========================================
// LocalDataSource
// ==========================================
pub struct LocalDataSource {
    storage: Arc<StorageService>,
}

impl LocalDataSource {
    pub fn new(storage: Arc<StorageService>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl DataSource for LocalDataSource {
    async fn fetch_prospec(&self, filtros: &Filtros) -> ApiResult<Vec<ProspecRecord>> {
        let mut linhas = self.storage.get_prospec()?;
        linhas.retain(|l| filtros.aceita_prospec(l));
        Ok(linhas)
    }

    async fn fetch_controle(&self, filtros: &Filtros) -> ApiResult<Vec<ControleRecord>> {
        let mut registros = self.storage.get_controle()?;
        registros.retain(|c| filtros.aceita_controle(c));
        Ok(registros)
    }

    async fn fetch_ugs(&self, filtros: &Filtros) -> ApiResult<Vec<Ug>> {
        let mut ugs = self.storage.get_ugs()?;
        ugs.retain(|u| filtros.aceita_ug(u));
        Ok(ugs)
    }
}

// ==========================================
// RemoteDataSource
// ==========================================
pub struct RemoteDataSource {
    client: Arc<ApiClient>,
}

impl RemoteDataSource {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for RemoteDataSource {
    async fn fetch_prospec(&self, filtros: &Filtros) -> ApiResult<Vec<ProspecRecord>> {
        Ok(self.client.get_with_query("/propostas", &filtros.query_pairs()).await?)
    }

    async fn fetch_controle(&self, filtros: &Filtros) -> ApiResult<Vec<ControleRecord>> {
        Ok(self.client.get_with_query("/controle", &filtros.query_pairs()).await?)
    }

    async fn fetch_ugs(&self, filtros: &Filtros) -> ApiResult<Vec<Ug>> {
        Ok(self.client.get_with_query("/ugs", &filtros.query_pairs()).await?)
    }
}

// ==========================================
// Aupus Operações - Documentos de propostas
// ==========================================
// /documentos/propostas/{id}         ⇒ lista
// /documentos/propostas/{id}/{nome}  ⇒ download
// ==========================================

use crate::client::api_client::ApiClient;
use crate::client::error::ClientResult;
use crate::client::transport::HttpMethod;
use crate::client::usuarios::segmento;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentoInfo {
    pub nome: String,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub tamanho: Option<u64>,
}

pub struct DocumentosApi {
    client: Arc<ApiClient>,
}

impl DocumentosApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn listar(&self, proposta_id: &str) -> ClientResult<Vec<DocumentoInfo>> {
        self.client
            .get(&format!("/documentos/propostas/{}", segmento(proposta_id)?))
            .await
    }

    pub async fn baixar(&self, proposta_id: &str, nome: &str) -> ClientResult<Vec<u8>> {
        let endpoint = format!(
            "/documentos/propostas/{}/{}",
            segmento(proposta_id)?,
            segmento(nome)?
        );
        let bytes = self.client.request_bytes(HttpMethod::Get, &endpoint).await?;
        tracing::info!(proposta = proposta_id, nome = nome, bytes = bytes.len(), "documento baixado");
        Ok(bytes)
    }
}

// ==========================================
// Aupus Operações - Usuários (/usuarios)
// ==========================================
// A última listagem fica guardada na chave "usuarios"
// ==========================================

use crate::client::api_client::ApiClient;
use crate::client::error::{ClientError, ClientResult};
use crate::domain::{Usuario, UsuarioInput};
use crate::repository::kv_store::{keys, KvStore};
use std::sync::Arc;

pub struct UsuariosApi {
    client: Arc<ApiClient>,
    kv: Arc<KvStore>,
}

impl UsuariosApi {
    pub fn new(client: Arc<ApiClient>, kv: Arc<KvStore>) -> Self {
        Self { client, kv }
    }

    pub async fn list(&self) -> ClientResult<Vec<Usuario>> {
        let usuarios: Vec<Usuario> = self.client.get("/usuarios").await?;
        self.kv.set_json(keys::USUARIOS, &usuarios)?;
        Ok(usuarios)
    }

    /// Última listagem guardada
    pub fn cached(&self) -> ClientResult<Vec<Usuario>> {
        Ok(self.kv.get_json(keys::USUARIOS)?.unwrap_or_default())
    }

    pub async fn get(&self, id: &str) -> ClientResult<Usuario> {
        self.client.get(&format!("/usuarios/{}", segmento(id)?)).await
    }

    pub async fn create(&self, input: &UsuarioInput) -> ClientResult<Usuario> {
        validar(input)?;
        let usuario: Usuario = self.client.post("/usuarios", input).await?;
        tracing::info!(id = %usuario.id, email = %usuario.email, "usuário criado");
        Ok(usuario)
    }

    pub async fn update(&self, id: &str, input: &UsuarioInput) -> ClientResult<Usuario> {
        validar(input)?;
        self.client.put(&format!("/usuarios/{}", segmento(id)?), input).await
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        self.client.delete(&format!("/usuarios/{}", segmento(id)?)).await?;
        tracing::info!(id = id, "usuário excluído");
        Ok(())
    }
}

/// Segmento de caminho sem separadores
pub(crate) fn segmento(valor: &str) -> ClientResult<&str> {
    let valor = valor.trim();
    if valor.is_empty() || valor.contains('/') || valor.contains('?') || valor.contains('#') {
        return Err(ClientError::InvalidUrl(format!("segmento inválido: {:?}", valor)));
    }
    Ok(valor)
}

fn validar(input: &UsuarioInput) -> ClientResult<()> {
    if input.nome.trim().is_empty() || !input.email.contains('@') {
        return Err(ClientError::Http {
            status: 400,
            message: "nome e e-mail válidos são obrigatórios".to_string(),
        });
    }
    Ok(())
}

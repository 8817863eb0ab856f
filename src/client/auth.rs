// ==========================================
// Aupus Operações - Autenticação
// ==========================================
// Token em aupus_token, usuário logado em user
// ==========================================

use crate::client::api_client::ApiClient;
use crate::client::error::{ClientError, ClientResult};
use crate::client::transport::HttpMethod;
use crate::domain::{LoginResponse, SessionStatus, Usuario};
use crate::repository::kv_store::{keys, KvStore};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    token: String,
}

pub struct AuthService {
    client: Arc<ApiClient>,
    kv: Arc<KvStore>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>, kv: Arc<KvStore>) -> Self {
        Self { client, kv }
    }

    /// Autentica e guarda token + usuário
    pub async fn login(&self, email: &str, senha: &str) -> ClientResult<Usuario> {
        if email.trim().is_empty() || senha.is_empty() {
            return Err(ClientError::InvalidCredentials("e-mail e senha são obrigatórios".to_string()));
        }

        let resposta: LoginResponse = self
            .client
            .post("/auth/login", &json!({ "email": email.trim(), "senha": senha }))
            .await?;

        self.kv.transaction(|s| {
            s.set_raw(keys::TOKEN, &resposta.token)?;
            s.set_json(keys::USER, &resposta.user)
        })?;

        tracing::info!(usuario = %resposta.user.email, "login realizado");
        Ok(resposta.user)
    }

    /// Encerra a sessão; a limpeza local acontece mesmo se a API falhar
    pub async fn logout(&self) -> ClientResult<()> {
        if self.client.token()?.is_some() {
            if let Err(e) = self.client.request_value(HttpMethod::Post, "/auth/logout", None).await {
                tracing::warn!(error = %e, "falha ao notificar logout à API; limpando sessão local");
            }
        }
        self.kv.transaction(|s| {
            s.remove(keys::TOKEN)?;
            s.remove(keys::USER)?;
            Ok(())
        })?;
        tracing::info!("logout realizado");
        Ok(())
    }

    /// Renova o token
    pub async fn refresh(&self) -> ClientResult<()> {
        let resposta: RefreshResponse = self.client.request(HttpMethod::Post, "/auth/refresh", None).await?;
        self.client.set_token(&resposta.token)?;
        tracing::debug!("token renovado");
        Ok(())
    }

    pub async fn session_status(&self) -> ClientResult<SessionStatus> {
        self.client.get("/auth/session-status").await
    }

    pub async fn extend_session(&self) -> ClientResult<SessionStatus> {
        self.client.request(HttpMethod::Post, "/auth/extend-session", None).await
    }

    /// Usuário guardado localmente (None se ausente/corrompido)
    pub fn current_user(&self) -> ClientResult<Option<Usuario>> {
        Ok(self.kv.get_json(keys::USER)?)
    }

    pub fn is_authenticated(&self) -> ClientResult<bool> {
        Ok(self.client.token()?.is_some())
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }
}

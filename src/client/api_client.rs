// ==========================================
// Aupus Operações - Cliente da API REST
// ==========================================
// - Anexa "Authorization: Bearer <token>" lido de aupus_token
// - 401 é classificado por endpoint e corpo da resposta:
//     /auth/login                               ⇒ credenciais inválidas
//     /auth/session-status|refresh|extend-session
//       ou error_type = "session_check"         ⇒ falha de verificação
//     demais                                    ⇒ sessão expirada
// - Só a sessão expirada limpa token/usuário e emite o sinal de logout
// ==========================================

use crate::client::error::{ClientError, ClientResult, UnauthorizedKind};
use crate::client::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::config::AppConfig;
use crate::repository::kv_store::{keys, KvStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

const SESSION_CHECK_ENDPOINTS: [&str; 3] = ["/auth/session-status", "/auth/refresh", "/auth/extend-session"];

/// Sinal de logout forçado
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutEvent {
    pub motivo: String,
}

/// Classifica uma resposta 401
pub fn classify_unauthorized(endpoint: &str, body: &Value) -> UnauthorizedKind {
    if endpoint.contains("/auth/login") {
        return UnauthorizedKind::InvalidCredentials;
    }
    let session_check_body = body
        .get("error_type")
        .and_then(Value::as_str)
        .map(|t| t == "session_check")
        .unwrap_or(false);
    if session_check_body || SESSION_CHECK_ENDPOINTS.iter().any(|e| endpoint.contains(e)) {
        return UnauthorizedKind::SessionCheckFailed;
    }
    UnauthorizedKind::SessionExpired
}

/// Mensagem de erro do corpo (campos message/error/detail)
fn extract_message(body: &Value) -> Option<String> {
    match body {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(map) => ["message", "error", "detail"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    kv: Arc<KvStore>,
    logout_tx: broadcast::Sender<LogoutEvent>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn HttpTransport>, kv: Arc<KvStore>) -> Self {
        let (logout_tx, _) = broadcast::channel(16);
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            kv,
            logout_tx,
        }
    }

    /// Cliente com transporte reqwest a partir do ambiente
    pub fn from_config(config: &AppConfig, kv: Arc<KvStore>) -> ClientResult<Self> {
        let base_url = config.api_base_url.clone().ok_or(ClientError::MissingBaseUrl)?;
        let transport = ReqwestTransport::new(ReqwestTransport::DEFAULT_TIMEOUT)?;
        Ok(Self::new(base_url, Arc::new(transport), kv))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn subscribe_logout(&self) -> broadcast::Receiver<LogoutEvent> {
        self.logout_tx.subscribe()
    }

    // ===== Token =====

    pub fn token(&self) -> ClientResult<Option<String>> {
        Ok(self.kv.get_raw(keys::TOKEN)?.filter(|t| !t.is_empty()))
    }

    pub fn set_token(&self, token: &str) -> ClientResult<()> {
        self.kv.set_raw(keys::TOKEN, token)?;
        Ok(())
    }

    /// Limpa token e usuário e emite o sinal de logout
    pub fn force_logout(&self, motivo: &str) -> ClientResult<()> {
        self.kv.transaction(|s| {
            s.remove(keys::TOKEN)?;
            s.remove(keys::USER)?;
            Ok(())
        })?;
        tracing::warn!(motivo = motivo, "logout forçado");
        // sem assinantes não é erro
        let _ = self.logout_tx.send(LogoutEvent {
            motivo: motivo.to_string(),
        });
        Ok(())
    }

    // ===== Requisições =====

    /// Requisição JSON; resposta 2xx vazia ⇒ Value::Null
    pub async fn request_value(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<Value>,
    ) -> ClientResult<Value> {
        let url = self.url(endpoint)?;
        let response = self.execute(method, endpoint, url, body).await?;
        Ok(response.json_body())
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<Value>,
    ) -> ClientResult<T> {
        let value = self.request_value(method, endpoint, body).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode(format!("{}: {}", endpoint, e)))
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ClientResult<T> {
        self.request(HttpMethod::Get, endpoint, None).await
    }

    /// GET com parâmetros de consulta (codificados)
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let base = self.url(endpoint)?;
        let url = if query.is_empty() {
            base
        } else {
            reqwest::Url::parse_with_params(&base, query)
                .map_err(|e| ClientError::InvalidUrl(e.to_string()))?
                .to_string()
        };
        let response = self.execute(HttpMethod::Get, endpoint, url, None).await?;
        serde_json::from_value(response.json_body())
            .map_err(|e| ClientError::Decode(format!("{}: {}", endpoint, e)))
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        self.request(HttpMethod::Post, endpoint, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        self.request(HttpMethod::Put, endpoint, Some(body)).await
    }

    pub async fn delete(&self, endpoint: &str) -> ClientResult<()> {
        self.request_value(HttpMethod::Delete, endpoint, None).await?;
        Ok(())
    }

    /// Download binário (documentos)
    pub async fn request_bytes(&self, method: HttpMethod, endpoint: &str) -> ClientResult<Vec<u8>> {
        let url = self.url(endpoint)?;
        let response = self.execute(method, endpoint, url, None).await?;
        Ok(response.body)
    }

    // ===== Internos =====

    fn url(&self, endpoint: &str) -> ClientResult<String> {
        if self.base_url.is_empty() {
            return Err(ClientError::MissingBaseUrl);
        }
        if endpoint.starts_with('/') {
            Ok(format!("{}{}", self.base_url, endpoint))
        } else {
            Ok(format!("{}/{}", self.base_url, endpoint))
        }
    }

    async fn execute(
        &self,
        method: HttpMethod,
        endpoint: &str,
        url: String,
        body: Option<Value>,
    ) -> ClientResult<HttpResponse> {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = self.token()? {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        tracing::debug!(method = %method, endpoint = endpoint, "requisição à API");
        let response = self
            .transport
            .send(HttpRequest {
                method,
                url,
                headers,
                body,
            })
            .await?;

        if response.is_success() {
            return Ok(response);
        }
        Err(self.handle_error(endpoint, &response))
    }

    fn handle_error(&self, endpoint: &str, response: &HttpResponse) -> ClientError {
        let body = response.json_body();
        let message = extract_message(&body).unwrap_or_else(|| format!("HTTP {}", response.status));

        if response.status != 401 {
            tracing::warn!(endpoint = endpoint, status = response.status, message = %message, "erro da API");
            return ClientError::Http {
                status: response.status,
                message,
            };
        }

        match classify_unauthorized(endpoint, &body) {
            UnauthorizedKind::InvalidCredentials => ClientError::InvalidCredentials(message),
            UnauthorizedKind::SessionCheckFailed => {
                tracing::warn!(endpoint = endpoint, message = %message, "falha na verificação da sessão");
                ClientError::SessionCheckFailed(message)
            }
            UnauthorizedKind::SessionExpired => {
                if let Err(e) = self.force_logout("sessão expirada") {
                    tracing::error!(error = %e, "falha ao limpar sessão local");
                }
                ClientError::SessionExpired
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct FixedTransport {
        response: HttpResponse,
        seen: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl HttpTransport for FixedTransport {
        async fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
            self.seen.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    fn cliente_com(status: u16, body: &str) -> (ApiClient, Arc<FixedTransport>, Arc<KvStore>) {
        let conn = crate::db::open_in_memory().unwrap();
        let kv = Arc::new(KvStore::new(Arc::new(std::sync::Mutex::new(conn))));
        let transport = Arc::new(FixedTransport {
            response: HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            },
            seen: Mutex::new(Vec::new()),
        });
        let client = ApiClient::new("http://api.local/", transport.clone(), kv.clone());
        (client, transport, kv)
    }

    #[test]
    fn test_classify_unauthorized() {
        let nada = Value::Null;
        assert_eq!(classify_unauthorized("/auth/login", &nada), UnauthorizedKind::InvalidCredentials);
        assert_eq!(
            classify_unauthorized("/auth/session-status", &nada),
            UnauthorizedKind::SessionCheckFailed
        );
        assert_eq!(
            classify_unauthorized("/propostas", &json!({"error_type": "session_check"})),
            UnauthorizedKind::SessionCheckFailed
        );
        assert_eq!(classify_unauthorized("/propostas", &nada), UnauthorizedKind::SessionExpired);
    }

    #[test]
    fn test_extract_message() {
        assert_eq!(extract_message(&json!({"message": "x"})).as_deref(), Some("x"));
        assert_eq!(extract_message(&json!({"error": "y"})).as_deref(), Some("y"));
        assert_eq!(extract_message(&json!("z ")).as_deref(), Some("z"));
        assert_eq!(extract_message(&json!(42)), None);
    }

    #[tokio::test]
    async fn test_anexa_bearer_token() {
        let (client, transport, _kv) = cliente_com(200, r#"[]"#);
        client.set_token("abc123").unwrap();

        let itens: Vec<Value> = client.get("/ugs").await.unwrap();
        assert!(itens.is_empty());

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].url, "http://api.local/ugs");
        assert_eq!(seen[0].header("Authorization"), Some("Bearer abc123"));
    }

    #[tokio::test]
    async fn test_sessao_expirada_limpa_token_e_emite_logout() {
        let (client, _transport, kv) = cliente_com(401, r#"{"message":"Token expirado"}"#);
        client.set_token("abc123").unwrap();
        kv.set_json(keys::USER, &json!({"id": "1"})).unwrap();
        let mut logout = client.subscribe_logout();

        let err = client.get::<Value>("/propostas").await.unwrap_err();

        assert!(matches!(err, ClientError::SessionExpired));
        assert_eq!(client.token().unwrap(), None);
        assert_eq!(kv.get_raw(keys::USER).unwrap(), None);
        assert_eq!(logout.try_recv().unwrap().motivo, "sessão expirada");
    }

    #[tokio::test]
    async fn test_login_recusado_mantem_token() {
        let (client, _transport, _kv) = cliente_com(401, r#"{"message":"Senha incorreta"}"#);
        client.set_token("antigo").unwrap();
        let mut logout = client.subscribe_logout();

        let err = client
            .post::<Value, _>("/auth/login", &json!({"email": "a", "senha": "b"}))
            .await
            .unwrap_err();

        match err {
            ClientError::InvalidCredentials(msg) => assert_eq!(msg, "Senha incorreta"),
            other => panic!("esperado InvalidCredentials, obtido {:?}", other),
        }
        assert_eq!(client.token().unwrap().as_deref(), Some("antigo"));
        assert!(logout.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_outros_status_viram_http() {
        let (client, _transport, _kv) = cliente_com(422, r#"{"error":"UC inválida"}"#);
        let err = client.get::<Value>("/controle").await.unwrap_err();
        match err {
            ClientError::Http { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "UC inválida");
            }
            other => panic!("esperado Http, obtido {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_query_codificada() {
        let (client, transport, _kv) = cliente_com(200, "[]");
        let _: Vec<Value> = client
            .get_with_query("/propostas", &[("consultor", "Ana Paula".to_string())])
            .await
            .unwrap();
        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].url, "http://api.local/propostas?consultor=Ana+Paula");
    }
}

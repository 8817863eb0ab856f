// ==========================================
// Auxiliares de teste
// ==========================================
// Banco temporário, montagem dos serviços e transporte HTTP roteirizado
// ==========================================
#![allow(dead_code)]

use async_trait::async_trait;
use aupus_ops::app::{AppState, FonteDados};
use aupus_ops::client::{ClientError, ClientResult, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use aupus_ops::config::{AppConfig, ConfigManager};
use aupus_ops::domain::{ProspecRecord, StatusProposta};
use aupus_ops::repository::KvStore;
use aupus_ops::storage::StorageService;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

pub const API_URL: &str = "http://api.teste";

/// Cria um arquivo SQLite temporário (o NamedTempFile precisa ficar vivo)
pub fn create_test_db() -> (NamedTempFile, String) {
    let temp_file = NamedTempFile::new().expect("falha ao criar arquivo temporário");
    let db_path = temp_file.path().to_str().expect("caminho não UTF-8").to_string();
    (temp_file, db_path)
}

pub struct Servicos {
    pub kv: Arc<KvStore>,
    pub config: Arc<ConfigManager>,
    pub storage: Arc<StorageService>,
}

/// KvStore + ConfigManager + StorageService sobre a mesma conexão
pub fn build_servicos(db_path: &str) -> Servicos {
    let conn = aupus_ops::db::open_sqlite_connection(db_path).expect("falha ao abrir banco");
    let conn = Arc::new(Mutex::new(conn));
    let kv = Arc::new(KvStore::new(conn.clone()));
    let config = Arc::new(ConfigManager::from_connection(conn));
    let storage = Arc::new(StorageService::new(kv.clone(), config.clone()));
    Servicos { kv, config, storage }
}

pub fn test_config(db_path: &str, api: Option<&str>) -> AppConfig {
    AppConfig {
        api_base_url: api.map(str::to_string),
        db_path: db_path.to_string(),
        locale: "pt-BR".to_string(),
    }
}

/// AppState com API apontando para o transporte roteirizado
pub fn build_state_remoto(db_path: &str, transport: Arc<ScriptedTransport>) -> AppState {
    AppState::with_transport(test_config(db_path, Some(API_URL)), transport, FonteDados::Local)
        .expect("falha ao montar AppState")
}

pub fn linha(proposta: &str, uc: &str, media: f64) -> ProspecRecord {
    ProspecRecord::nova("Cliente Teste", proposta, uc, "Ana", media)
}

pub fn linha_fechada(proposta: &str, uc: &str, media: f64) -> ProspecRecord {
    let mut l = linha(proposta, uc, media);
    l.status = StatusProposta::Fechado;
    l
}

// ==========================================
// ScriptedTransport
// ==========================================

struct Rota {
    method: HttpMethod,
    path: String,
    resposta: ClientResult<HttpResponse>,
}

/// Respostas enfileiradas por (método, caminho); sem rota ⇒ 404
#[derive(Default)]
pub struct ScriptedTransport {
    rotas: Mutex<VecDeque<Rota>>,
    fixas: Mutex<Vec<(HttpMethod, String, HttpResponse)>>,
    pub requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Resposta usada uma única vez
    pub fn responder(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
        self.rotas.lock().unwrap().push_back(Rota {
            method,
            path: path.to_string(),
            resposta: Ok(json_response(status, &body)),
        });
    }

    /// Falha de rede usada uma única vez
    pub fn falhar(&self, method: HttpMethod, path: &str, erro: &str) {
        self.rotas.lock().unwrap().push_back(Rota {
            method,
            path: path.to_string(),
            resposta: Err(ClientError::Network(erro.to_string())),
        });
    }

    /// Resposta usada sempre que não houver uma resposta única na fila
    pub fn responder_sempre(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
        self.fixas
            .lock()
            .unwrap()
            .push((method, path.to_string(), json_response(status, &body)));
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn ultimo_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

fn caminho(url: &str) -> String {
    let sem_base = url.strip_prefix(API_URL).unwrap_or(url);
    sem_base.split('?').next().unwrap_or("").to_string()
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        let path = caminho(&request.url);
        let method = request.method;
        self.requests.lock().unwrap().push(request);

        {
            let mut rotas = self.rotas.lock().unwrap();
            if let Some(idx) = rotas.iter().position(|r| r.method == method && r.path == path) {
                if let Some(rota) = rotas.remove(idx) {
                    return rota.resposta;
                }
            }
        }

        let fixas = self.fixas.lock().unwrap();
        match fixas.iter().find(|(m, p, _)| *m == method && *p == path) {
            Some((_, _, resposta)) => Ok(resposta.clone()),
            None => Ok(json_response(404, &serde_json::json!({ "message": format!("sem rota: {}", path) }))),
        }
    }
}

pub fn json_response(status: u16, body: &Value) -> HttpResponse {
    let body = if body.is_null() {
        Vec::new()
    } else {
        serde_json::to_vec(body).expect("json")
    };
    HttpResponse { status, body }
}

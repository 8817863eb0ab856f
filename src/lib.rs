// ==========================================
// Aupus Operações - Biblioteca principal
// ==========================================
// Prospecção, controle de propostas fechadas, UGs,
// exportação e cliente da API REST
// Stack: Rust + SQLite (chave-valor) + reqwest
// ==========================================

// Inicializa a internacionalização
rust_i18n::i18n!("locales", fallback = "pt-BR");

// ==========================================
// Módulos
// ==========================================

// Domínio - registros e tipos
pub mod domain;

// Repositório - armazenamento chave-valor
pub mod repository;

// Regras puras (sincronização de status, agregação de UGs, cálculos)
pub mod engine;

// Persistência local das coleções
pub mod storage;

// Configuração (ambiente + config_kv)
pub mod config;

// Conexão SQLite e schema
pub mod db;

// Logs
pub mod logging;

// Internacionalização
pub mod i18n;

// Fachada usada pelo CLI
pub mod api;

// Montagem dos componentes
pub mod app;

// Cache de listagens
pub mod cache;

// Cliente da API REST
pub mod client;

// Exportação XLSX / XML / PDF
pub mod export;

// Importação CSV / XLSX
pub mod importer;

// Notificações ao usuário
pub mod notify;

// ==========================================
// Reexportações
// ==========================================

pub use api::{ApiError, ApiResult, OperacoesApi};
pub use app::AppState;
pub use config::AppConfig;
pub use domain::{ChaveUc, ControleRecord, Entidade, Filtros, ProspecRecord, StatusProposta, Ug};
pub use storage::StorageService;

// ==========================================
// Constantes
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "Aupus Operações";

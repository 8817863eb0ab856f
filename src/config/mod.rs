// ==========================================
// Aupus Operações - Configuração
// ==========================================
// - AppConfig: ambiente do processo
// - ConfigManager: parâmetros de negócio (tabela config_kv)
// ==========================================

pub mod app_config;
pub mod config_manager;

pub use app_config::{get_default_db_path, AppConfig};
pub use config_manager::{config_keys, ConfigManager};

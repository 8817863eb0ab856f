// ==========================================
// Aupus Operações - Configuração do processo
// ==========================================
// Variáveis de ambiente:
// - AUPUS_API_URL: URL base da API (ausente ⇒ recursos remotos desativados)
// - AUPUS_DB_PATH: arquivo SQLite (padrão: <data_dir>/aupus-ops/aupus.db)
// - AUPUS_LOCALE: pt-BR (padrão) | en
// ==========================================

use std::path::PathBuf;

pub const ENV_API_URL: &str = "AUPUS_API_URL";
pub const ENV_DB_PATH: &str = "AUPUS_DB_PATH";
pub const ENV_LOCALE: &str = "AUPUS_LOCALE";

pub const DEFAULT_LOCALE: &str = "pt-BR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: Option<String>,
    pub db_path: String,
    pub locale: String,
}

impl AppConfig {
    /// Lê do ambiente do processo
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Lê de uma função de consulta (testável sem alterar o ambiente)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base_url = lookup(ENV_API_URL)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let db_path = lookup(ENV_DB_PATH)
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(get_default_db_path);

        let locale = lookup(ENV_LOCALE)
            .filter(|l| l == "en" || l == "pt-BR")
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());

        Self {
            api_base_url,
            db_path,
            locale,
        }
    }
}

/// Caminho padrão do banco (cria o diretório se necessário)
pub fn get_default_db_path() -> String {
    let mut dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.push("aupus-ops");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(path = %dir.display(), error = %e, "não foi possível criar diretório de dados");
    }
    dir.push("aupus.db");
    dir.to_string_lossy().to_string()
}

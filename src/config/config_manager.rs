// ==========================================
// Aupus Operações - Gerenciador de configuração
// ==========================================
// Armazenamento: tabela config_kv (scope_id = 'global')
// Valor inválido ⇒ default + log de aviso
// ==========================================

use crate::domain::Entidade;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

// ==========================================
// Chaves de configuração e valores padrão
// ==========================================
pub mod config_keys {
    // Calibragem das UGs (%)
    pub const CALIBRAGEM_GLOBAL_PCT: &str = "calibragem_global_pct";

    // TTL do cache por entidade (s)
    pub const CACHE_TTL_PROSPEC_SECS: &str = "cache_ttl_prospec_secs";
    pub const CACHE_TTL_CONTROLE_SECS: &str = "cache_ttl_controle_secs";
    pub const CACHE_TTL_UGS_SECS: &str = "cache_ttl_ugs_secs";

    // Cálculos comerciais
    pub const TARIFA_ESTIMADA_KWH: &str = "tarifa_estimada_kwh";
    pub const COMISSAO_PADRAO_PCT: &str = "comissao_padrao_pct";

    // Sessão e notificações
    pub const SESSION_MAX_ERROS: &str = "session_max_erros";
    pub const SESSION_POLL_SECS: &str = "session_poll_secs";
    pub const TOAST_DEDUP_MS: &str = "toast_dedup_ms";

    pub const TODAS: [(&str, &str); 9] = [
        (CALIBRAGEM_GLOBAL_PCT, "0"),
        (CACHE_TTL_PROSPEC_SECS, "60"),
        (CACHE_TTL_CONTROLE_SECS, "60"),
        (CACHE_TTL_UGS_SECS, "120"),
        (TARIFA_ESTIMADA_KWH, "0.65"),
        (COMISSAO_PADRAO_PCT, "25"),
        (SESSION_MAX_ERROS, "5"),
        (SESSION_POLL_SECS, "60"),
        (TOAST_DEDUP_MS, "2000"),
    ];

    /// Valor padrão de uma chave conhecida
    pub fn default_for(key: &str) -> Option<&'static str> {
        TODAS.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// Abre o arquivo SQLite (schema garantido)
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// A partir de uma conexão já aberta
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Valor gravado (None se ausente)
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Grava (upsert) um valor
    pub fn set_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        if key.trim().is_empty() {
            return Err(RepositoryError::ValidationError("chave de configuração vazia".to_string()));
        }
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        tracing::info!(key = key, value = value, "configuração atualizada");
        Ok(())
    }

    /// Remove o valor gravado (volta ao padrão)
    pub fn reset_value(&self, key: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
        )?;
        Ok(affected > 0)
    }

    /// Lê e converte; valor inválido ⇒ padrão
    fn get_parsed<T: FromStr + Copy>(&self, key: &str, default: T) -> RepositoryResult<T> {
        let raw = match self.get_global_config_value(key)? {
            Some(raw) => raw,
            None => return Ok(default),
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, "valor de configuração inválido; usando padrão");
                Ok(default)
            }
        }
    }

    /// Configuração efetiva (gravada sobre os padrões)
    pub fn snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let mut map: BTreeMap<String, String> = config_keys::TODAS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        for row in rows {
            let (key, value) = row?;
            map.insert(key, value);
        }
        Ok(map)
    }

    // ===== Getters tipados =====

    pub fn calibragem_global_pct(&self) -> RepositoryResult<f64> {
        self.get_parsed(config_keys::CALIBRAGEM_GLOBAL_PCT, 0.0)
    }

    pub fn cache_ttl(&self, entidade: Entidade) -> RepositoryResult<Duration> {
        let (key, default) = match entidade {
            Entidade::Prospec => (config_keys::CACHE_TTL_PROSPEC_SECS, 60),
            Entidade::Controle => (config_keys::CACHE_TTL_CONTROLE_SECS, 60),
            Entidade::Ugs => (config_keys::CACHE_TTL_UGS_SECS, 120),
        };
        Ok(Duration::from_secs(self.get_parsed::<u64>(key, default)?))
    }

    pub fn tarifa_estimada_kwh(&self) -> RepositoryResult<f64> {
        self.get_parsed(config_keys::TARIFA_ESTIMADA_KWH, 0.65)
    }

    pub fn comissao_padrao_pct(&self) -> RepositoryResult<f64> {
        self.get_parsed(config_keys::COMISSAO_PADRAO_PCT, 25.0)
    }

    pub fn session_max_erros(&self) -> RepositoryResult<u32> {
        self.get_parsed(config_keys::SESSION_MAX_ERROS, 5)
    }

    pub fn session_poll_interval(&self) -> RepositoryResult<Duration> {
        Ok(Duration::from_secs(self.get_parsed::<u64>(config_keys::SESSION_POLL_SECS, 60)?))
    }

    pub fn toast_dedup_window(&self) -> RepositoryResult<Duration> {
        Ok(Duration::from_millis(self.get_parsed::<u64>(config_keys::TOAST_DEDUP_MS, 2_000)?))
    }
}

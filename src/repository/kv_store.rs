// ==========================================
// Aupus Operações - Armazenamento chave-valor
// ==========================================
// Equivalente ao localStorage: cada chave guarda um valor JSON inteiro,
// sobrescrito por completo a cada gravação.
// Diferença: gravações em mais de uma chave podem ser agrupadas em uma
// transação SQLite (KvStore::transaction).
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Chaves conhecidas
pub mod keys {
    pub const PROSPEC: &str = "aupus_prospec";
    pub const CONTROLE: &str = "aupus_controle";
    pub const UGS: &str = "aupus_ugs";
    pub const TOKEN: &str = "aupus_token";
    pub const USER: &str = "user";
    pub const USUARIOS: &str = "usuarios";
}

// ==========================================
// KvSession - operações sobre uma conexão (ou transação) aberta
// ==========================================
pub struct KvSession<'a> {
    conn: &'a Connection,
}

impl<'a> KvSession<'a> {
    pub fn get_raw(&self, key: &str) -> RepositoryResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_raw(&self, key: &str, value: &str) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a chave; retorna true se ela existia
    pub fn remove(&self, key: &str) -> RepositoryResult<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    /// Lê um valor JSON
    ///
    /// JSON corrompido é tratado como ausência de dados (com log de aviso)
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> RepositoryResult<Option<T>> {
        let raw = match self.get_raw(key)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key = key, error = %e, "JSON corrompido no armazenamento; tratando como vazio");
                Ok(None)
            }
        }
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> RepositoryResult<()> {
        let raw = serde_json::to_string(value).map_err(|e| RepositoryError::SerializationError {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.set_raw(key, &raw)
    }

    /// Lê uma coleção inteira (vazia se ausente ou corrompida)
    pub fn read_collection<T: DeserializeOwned>(&self, key: &str) -> RepositoryResult<Vec<T>> {
        Ok(self.get_json::<Vec<T>>(key)?.unwrap_or_default())
    }

    /// Sobrescreve a coleção inteira
    pub fn write_collection<T: Serialize>(&self, key: &str, items: &[T]) -> RepositoryResult<()> {
        self.set_json(key, items)
    }
}

// ==========================================
// KvStore
// ==========================================
pub struct KvStore {
    conn: Arc<Mutex<Connection>>,
}

impl KvStore {
    /// Cria a partir de uma conexão compartilhada (schema já garantido)
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Abre um arquivo SQLite próprio
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Executa operações sem transação
    pub fn with_session<R>(
        &self,
        f: impl FnOnce(&KvSession<'_>) -> RepositoryResult<R>,
    ) -> RepositoryResult<R> {
        let conn = self.get_conn()?;
        let session = KvSession { conn: &conn };
        f(&session)
    }

    /// Executa operações em uma única transação
    ///
    /// Erro retornado pelo closure ⇒ rollback (nenhuma chave é alterada)
    pub fn transaction<R>(
        &self,
        f: impl FnOnce(&KvSession<'_>) -> RepositoryResult<R>,
    ) -> RepositoryResult<R> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let result = {
            let session = KvSession { conn: &tx };
            f(&session)?
        };

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(result)
    }

    // ===== Atalhos =====

    pub fn get_raw(&self, key: &str) -> RepositoryResult<Option<String>> {
        self.with_session(|s| s.get_raw(key))
    }

    pub fn set_raw(&self, key: &str, value: &str) -> RepositoryResult<()> {
        self.with_session(|s| s.set_raw(key, value))
    }

    pub fn remove(&self, key: &str) -> RepositoryResult<bool> {
        self.with_session(|s| s.remove(key))
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> RepositoryResult<Option<T>> {
        self.with_session(|s| s.get_json(key))
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> RepositoryResult<()> {
        self.with_session(|s| s.set_json(key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> KvStore {
        let conn = crate::db::open_in_memory().unwrap();
        KvStore::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_set_get_remove() {
        let kv = store();
        assert_eq!(kv.get_raw(keys::TOKEN).unwrap(), None);

        kv.set_raw(keys::TOKEN, "abc").unwrap();
        kv.set_raw(keys::TOKEN, "def").unwrap();
        assert_eq!(kv.get_raw(keys::TOKEN).unwrap().as_deref(), Some("def"));

        assert!(kv.remove(keys::TOKEN).unwrap());
        assert!(!kv.remove(keys::TOKEN).unwrap());
    }

    #[test]
    fn test_json_corrompido_vira_vazio() {
        let kv = store();
        kv.set_raw(keys::PROSPEC, "{not json").unwrap();

        let lido: Option<Vec<String>> = kv.get_json(keys::PROSPEC).unwrap();
        assert!(lido.is_none());

        let colecao: Vec<String> = kv.with_session(|s| s.read_collection(keys::PROSPEC)).unwrap();
        assert!(colecao.is_empty());
    }

    #[test]
    fn test_transacao_com_erro_faz_rollback() {
        let kv = store();
        kv.set_json(keys::UGS, &vec!["a"]).unwrap();

        let result: RepositoryResult<()> = kv.transaction(|s| {
            s.set_json(keys::UGS, &vec!["b"])?;
            s.set_json(keys::CONTROLE, &vec!["c"])?;
            Err(RepositoryError::InternalError("falha simulada".to_string()))
        });

        assert!(result.is_err());
        let ugs: Vec<String> = kv.get_json(keys::UGS).unwrap().unwrap();
        assert_eq!(ugs, vec!["a".to_string()]);
        assert_eq!(kv.get_raw(keys::CONTROLE).unwrap(), None);
    }
}

// ==========================================
// Aupus Operações - Camada de repositório
// ==========================================
// Sem regra de negócio: apenas leitura/gravação de valores por chave
// ==========================================

pub mod error;
pub mod kv_store;

pub use error::{RepositoryError, RepositoryResult};
pub use kv_store::{keys, KvSession, KvStore};

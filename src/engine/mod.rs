// ==========================================
// Aupus Operações - Regras de negócio
// ==========================================
// Funções puras sobre as coleções; sem I/O
// ==========================================

pub mod calculo;
pub mod status_sync;
pub mod ug_aggregation;

pub use status_sync::{sincronizar_status_fechado, SyncOutcome};
pub use ug_aggregation::atualizar_medias_ugs;

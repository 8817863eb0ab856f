// ==========================================
// Aupus Operações - Persistência local
// ==========================================

pub mod storage_service;

pub use storage_service::{LoteOutcome, StorageService};

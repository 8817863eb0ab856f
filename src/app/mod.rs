// ==========================================
// Aupus Operações - Camada de aplicação
// ==========================================

pub mod state;

pub use state::{AppState, FonteDados};

// ==========================================
// Aupus Operações - Camada de API
// ==========================================
// Fachada usada pelo CLI; converte erros das camadas internas
// ==========================================

pub mod error;
pub mod operacoes_api;

pub use error::{ApiError, ApiResult};
pub use operacoes_api::{FormatoExportacao, OperacoesApi};

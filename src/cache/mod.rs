// ==========================================
// Aupus Operações - Cache de dados
// ==========================================

pub mod data_context;
pub mod source;

pub use data_context::{page_of, CacheTtls, DataContext, LoadOutcome, Page};
pub use source::{DataSource, LocalDataSource, RemoteDataSource};

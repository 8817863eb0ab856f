// ==========================================
// Aupus Operações - Importação
// ==========================================
// Linhas de proposta a partir de CSV ou XLSX
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod prospec_importer;

pub use error::{ImportError, ImportResult};
pub use field_mapper::{normalizar_cabecalho, parse_decimal, FieldMapper};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, UniversalFileParser};
pub use prospec_importer::{ImportSummary, LinhaRejeitada, ProspecImporter};

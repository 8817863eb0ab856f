// ==========================================
// Aupus Operações - Leitura de arquivos (CSV / XLSX)
// ==========================================
// Cada linha vira um mapa cabeçalho → valor (texto já aparado)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook, Data, Reader, Xlsx};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Linha bruta: número da linha no arquivo (cabeçalho = 1) + valores
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub numero: usize,
    pub valores: HashMap<String, String>,
}

pub trait FileParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}

fn verificar_arquivo(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn montar_linha(numero: usize, headers: &[String], valores: impl Iterator<Item = String>) -> Option<RawRow> {
    let mut map = HashMap::new();
    for (col, valor) in valores.enumerate() {
        if let Some(header) = headers.get(col) {
            if !header.is_empty() {
                map.insert(header.clone(), valor.trim().to_string());
            }
        }
    }
    // linha totalmente vazia
    if map.values().all(|v| v.is_empty()) {
        return None;
    }
    Some(RawRow { numero, valores: map })
}

// ==========================================
// CSV
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_records(&self, path: &Path) -> ImportResult<Vec<RawRow>> {
        verificar_arquivo(path)?;

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(detectar_delimitador(path)?)
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut records = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            if let Some(linha) = montar_linha(idx + 2, &headers, record.iter().map(str::to_string)) {
                records.push(linha);
            }
        }
        Ok(records)
    }
}

/// Planilhas exportadas em pt-BR costumam usar ';'
fn detectar_delimitador(path: &Path) -> ImportResult<u8> {
    let conteudo = std::fs::read_to_string(path)?;
    let primeira = conteudo.lines().next().unwrap_or("");
    if primeira.matches(';').count() > primeira.matches(',').count() {
        Ok(b';')
    } else {
        Ok(b',')
    }
}

// ==========================================
// Excel (primeira aba)
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_raw_records(&self, path: &Path) -> ImportResult<Vec<RawRow>> {
        verificar_arquivo(path)?;

        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let primeira_aba = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("planilha sem abas".to_string()))?;
        let range = workbook.worksheet_range(&primeira_aba)?;

        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("planilha sem cabeçalho".to_string()))?;
        let headers: Vec<String> = header_row.iter().map(|c| c.to_string().trim().to_string()).collect();

        let mut records = Vec::new();
        for (idx, data_row) in rows.enumerate() {
            if let Some(linha) = montar_linha(idx + 2, &headers, data_row.iter().map(celula_texto)) {
                records.push(linha);
            }
        }
        Ok(records)
    }
}

/// Números com vírgula decimal ("1,125"), para não serem lidos como milhar
fn celula_texto(celula: &Data) -> String {
    match celula {
        Data::Float(v) => v.to_string().replace('.', ","),
        outro => outro.to_string(),
    }
}

// ==========================================
// Seleção pela extensão do arquivo
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<RawRow>> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_to_raw_records(path),
            "xlsx" => ExcelParser.parse_to_raw_records(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

// ==========================================
// Aupus Operações - Exportação XLSX
// ==========================================
// Planilha "Dados" (uma linha por registro) + "Metadados"
// (data de geração, filtros, total, configuração)
// ==========================================

use crate::domain::{ControleRecord, ProspecRecord};
use crate::export::{descrever_filtros, filtrar_controle, filtrar_prospec, ExportFilters, ExportMeta, ExportResult};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::info;

pub const ABA_DADOS: &str = "Dados";
pub const ABA_METADADOS: &str = "Metadados";

const COLUNAS_PROSPEC: [&str; 9] = [
    "Cliente",
    "Proposta",
    "UC",
    "Consultor",
    "Status",
    "Media",
    "Desconto Tarifa",
    "Desconto Bandeira",
    "Data Cadastro",
];

pub fn exportar_prospec_xlsx(
    linhas: &[ProspecRecord],
    filtros: &ExportFilters,
    meta: &ExportMeta,
) -> ExportResult<Vec<u8>> {
    let filtradas = filtrar_prospec(linhas, filtros);
    let mut workbook = Workbook::new();
    let cabecalho = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(ABA_DADOS)?;
        escrever_cabecalho(sheet, &COLUNAS_PROSPEC, &cabecalho)?;
        for (i, linha) in filtradas.iter().enumerate() {
            escrever_linha_prospec(sheet, i as u32 + 1, linha)?;
        }
    }

    escrever_metadados(&mut workbook, filtros, meta, filtradas.len(), &cabecalho)?;
    let bytes = workbook.save_to_buffer()?;
    info!(linhas = filtradas.len(), bytes = bytes.len(), "prospec exportado (xlsx)");
    Ok(bytes)
}

pub fn exportar_controle_xlsx(
    registros: &[ControleRecord],
    filtros: &ExportFilters,
    meta: &ExportMeta,
) -> ExportResult<Vec<u8>> {
    let filtrados = filtrar_controle(registros, filtros);
    let mut workbook = Workbook::new();
    let cabecalho = Format::new().set_bold();

    let mut colunas: Vec<&str> = COLUNAS_PROSPEC.to_vec();
    colunas.push("UG");
    colunas.push("Calibrado");
    let col_ug = COLUNAS_PROSPEC.len() as u16;

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(ABA_DADOS)?;
        escrever_cabecalho(sheet, &colunas, &cabecalho)?;
        for (i, registro) in filtrados.iter().enumerate() {
            let row = i as u32 + 1;
            escrever_linha_prospec(sheet, row, &registro.linha)?;
            sheet.write_string(row, col_ug, registro.ug.as_deref().unwrap_or(""))?;
            sheet.write_string(row, col_ug + 1, if registro.calibrado { "Sim" } else { "Não" })?;
        }
    }

    escrever_metadados(&mut workbook, filtros, meta, filtrados.len(), &cabecalho)?;
    let bytes = workbook.save_to_buffer()?;
    info!(registros = filtrados.len(), bytes = bytes.len(), "controle exportado (xlsx)");
    Ok(bytes)
}

fn escrever_cabecalho(sheet: &mut Worksheet, colunas: &[&str], formato: &Format) -> ExportResult<()> {
    for (col, titulo) in colunas.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *titulo, formato)?;
    }
    Ok(())
}

fn escrever_linha_prospec(sheet: &mut Worksheet, row: u32, linha: &ProspecRecord) -> ExportResult<()> {
    sheet.write_string(row, 0, linha.nome_cliente.as_str())?;
    sheet.write_string(row, 1, linha.numero_proposta.as_str())?;
    sheet.write_string(row, 2, linha.numero_uc.as_str())?;
    sheet.write_string(row, 3, linha.consultor.as_str())?;
    sheet.write_string(row, 4, linha.status.as_str())?;
    sheet.write_number(row, 5, linha.media)?;
    sheet.write_number(row, 6, linha.desconto_tarifa)?;
    sheet.write_number(row, 7, linha.desconto_bandeira)?;
    sheet.write_string(row, 8, linha.data_cadastro.format("%Y-%m-%d").to_string())?;
    Ok(())
}

fn escrever_metadados(
    workbook: &mut Workbook,
    filtros: &ExportFilters,
    meta: &ExportMeta,
    total: usize,
    cabecalho: &Format,
) -> ExportResult<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(ABA_METADADOS)?;
    sheet.write_string_with_format(0, 0, "Campo", cabecalho)?;
    sheet.write_string_with_format(0, 1, "Valor", cabecalho)?;

    let mut pares: Vec<(String, String)> = vec![
        ("gerado_em".to_string(), meta.gerado_em.to_rfc3339()),
        ("total_registros".to_string(), total.to_string()),
    ];
    if let Some(usuario) = &meta.gerado_por {
        pares.push(("gerado_por".to_string(), usuario.clone()));
    }
    for (k, v) in descrever_filtros(filtros) {
        pares.push((format!("filtro.{}", k), v));
    }
    for (k, v) in &meta.config {
        pares.push((format!("config.{}", k), v.clone()));
    }

    for (i, (campo, valor)) in pares.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, campo.as_str())?;
        sheet.write_string(row, 1, valor.as_str())?;
    }
    Ok(())
}

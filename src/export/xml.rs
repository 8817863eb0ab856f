// ==========================================
// Aupus Operações - Exportação XML
// ==========================================

use crate::domain::ProspecRecord;
use crate::export::{filtrar_prospec, ExportFilters, ExportMeta, ExportResult};
use std::fmt::Write;
use tracing::info;

/// Escapa & < > " ' para texto e atributos XML
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn exportar_prospec_xml(
    linhas: &[ProspecRecord],
    filtros: &ExportFilters,
    meta: &ExportMeta,
) -> ExportResult<Vec<u8>> {
    let filtradas = filtrar_prospec(linhas, filtros);

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    // escrita em String não falha
    let _ = writeln!(
        xml,
        "<prospec geradoEm=\"{}\" total=\"{}\">",
        escape_xml(&meta.gerado_em.to_rfc3339()),
        filtradas.len()
    );
    for linha in &filtradas {
        let _ = writeln!(xml, "  <linha id=\"{}\">", escape_xml(&linha.id));
        campo(&mut xml, "nomeCliente", &linha.nome_cliente);
        campo(&mut xml, "numeroProposta", &linha.numero_proposta);
        campo(&mut xml, "numeroUC", &linha.numero_uc);
        campo(&mut xml, "consultor", &linha.consultor);
        campo(&mut xml, "status", linha.status.as_str());
        campo(&mut xml, "media", &linha.media.to_string());
        campo(&mut xml, "descontoTarifa", &linha.desconto_tarifa.to_string());
        campo(&mut xml, "descontoBandeira", &linha.desconto_bandeira.to_string());
        campo(&mut xml, "dataCadastro", &linha.data_cadastro.to_rfc3339());
        if let Some(distribuidora) = &linha.distribuidora {
            campo(&mut xml, "distribuidora", distribuidora);
        }
        xml.push_str("  </linha>\n");
    }
    xml.push_str("</prospec>\n");

    info!(linhas = filtradas.len(), "prospec exportado (xml)");
    Ok(xml.into_bytes())
}

fn campo(xml: &mut String, nome: &str, valor: &str) {
    let _ = writeln!(xml, "    <{nome}>{}</{nome}>", escape_xml(valor));
}

// ==========================================
// Aupus Operações - Resumo de proposta em PDF
// ==========================================
// Uma página A4: cliente, número, consultor, tabela de UCs,
// consumo total e economia estimada
// ==========================================

use crate::domain::ProspecRecord;
use crate::engine::calculo::{comissao, economia_estimada};
use crate::export::{ExportError, ExportResult};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use tracing::info;

const LARGURA_MM: f32 = 210.0;
const ALTURA_MM: f32 = 297.0;
const MARGEM_MM: f32 = 20.0;
const LINHA_MM: f32 = 7.0;

/// Totais da proposta (também mostrados no CLI)
#[derive(Debug, Clone, PartialEq)]
pub struct ResumoProposta {
    pub numero_proposta: String,
    pub nome_cliente: String,
    pub consultor: String,
    pub total_ucs: usize,
    pub consumo_total: f64,
    pub economia_mensal: f64,
    pub comissao: f64,
}

impl ResumoProposta {
    pub fn calcular(linhas: &[ProspecRecord], tarifa_kwh: f64, comissao_pct: f64) -> ExportResult<Self> {
        let primeira = linhas
            .first()
            .ok_or_else(|| ExportError::EmptyInput("proposta sem linhas".to_string()))?;

        let consumo_total = linhas.iter().map(|l| l.media).sum();
        let economia_mensal = linhas
            .iter()
            .map(|l| economia_estimada(l.media, l.desconto_tarifa, tarifa_kwh))
            .sum();

        Ok(Self {
            numero_proposta: primeira.numero_proposta.clone(),
            nome_cliente: primeira.nome_cliente.clone(),
            consultor: primeira.consultor.clone(),
            total_ucs: linhas.len(),
            consumo_total,
            economia_mensal,
            comissao: comissao(economia_mensal, comissao_pct),
        })
    }
}

/// Gera o PDF de uma proposta (todas as linhas com o mesmo numeroProposta)
pub fn gerar_pdf_proposta(linhas: &[ProspecRecord], tarifa_kwh: f64, comissao_pct: f64) -> ExportResult<Vec<u8>> {
    let resumo = ResumoProposta::calcular(linhas, tarifa_kwh, comissao_pct)?;

    let titulo = format!("Proposta {}", resumo.numero_proposta);
    let (doc, page, layer) = PdfDocument::new(&titulo, Mm(LARGURA_MM), Mm(ALTURA_MM), "Resumo");
    let fonte = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let negrito = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let mut camada = doc.get_page(page).get_layer(layer);

    let mut y = ALTURA_MM - MARGEM_MM;
    camada.use_text(titulo.as_str(), 16.0, Mm(MARGEM_MM), Mm(y), &negrito);
    y -= LINHA_MM * 2.0;

    for texto in [
        format!("Cliente: {}", resumo.nome_cliente),
        format!("Consultor: {}", resumo.consultor),
        format!("Unidades consumidoras: {}", resumo.total_ucs),
    ] {
        camada.use_text(texto, 11.0, Mm(MARGEM_MM), Mm(y), &fonte);
        y -= LINHA_MM;
    }

    y -= LINHA_MM;
    escrever_colunas(&camada, &negrito, y, ["UC", "Media (kWh)", "Desc. tarifa %", "Desc. bandeira %", "Status"]);
    y -= LINHA_MM;

    for linha in linhas {
        if y < MARGEM_MM + LINHA_MM * 4.0 {
            let (nova_pagina, nova_camada) = doc.add_page(Mm(LARGURA_MM), Mm(ALTURA_MM), "Continuação");
            camada = doc.get_page(nova_pagina).get_layer(nova_camada);
            y = ALTURA_MM - MARGEM_MM;
        }
        escrever_colunas(
            &camada,
            &fonte,
            y,
            [
                linha.numero_uc.clone(),
                format!("{:.2}", linha.media),
                format!("{:.2}", linha.desconto_tarifa),
                format!("{:.2}", linha.desconto_bandeira),
                linha.status.as_str().to_string(),
            ],
        );
        y -= LINHA_MM;
    }

    y -= LINHA_MM;
    camada.use_text(
        format!("Consumo total: {:.2} kWh/mês", resumo.consumo_total),
        11.0,
        Mm(MARGEM_MM),
        Mm(y),
        &negrito,
    );
    y -= LINHA_MM;
    camada.use_text(
        format!("Economia estimada: R$ {:.2}/mês", resumo.economia_mensal),
        11.0,
        Mm(MARGEM_MM),
        Mm(y),
        &negrito,
    );

    let bytes = doc.save_to_bytes()?;
    info!(
        proposta = %resumo.numero_proposta,
        ucs = resumo.total_ucs,
        bytes = bytes.len(),
        "pdf da proposta gerado"
    );
    Ok(bytes)
}

fn escrever_colunas<S: Into<String>>(camada: &PdfLayerReference, fonte: &IndirectFontRef, y: f32, colunas: [S; 5]) {
    let largura = (LARGURA_MM - 2.0 * MARGEM_MM) / 5.0;
    for (i, texto) in colunas.into_iter().enumerate() {
        camada.use_text(texto, 10.0, Mm(MARGEM_MM + largura * i as f32), Mm(y), fonte);
    }
}

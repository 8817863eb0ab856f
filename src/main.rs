// ==========================================
// Aupus Operações - Entrada do CLI
// ==========================================

mod cli;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use aupus_ops::api::FormatoExportacao;
use aupus_ops::app::{AppState, FonteDados};
use aupus_ops::cache::Page;
use aupus_ops::client::MonitorOutcome;
use aupus_ops::config::AppConfig;
use aupus_ops::domain::{ChaveUc, ControleRecord, ProspecRecord, Ug};
use aupus_ops::i18n::{t, t_with_args};
use aupus_ops::logging;

use cli::{Comando, ControleCmd, EntidadeExport, ExportCmd, Opts, PaginaArgs, ProspecCmd, UgsCmd};

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Opts::parse();

    if opts.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    let config = AppConfig::from_env();
    tracing::info!(versao = aupus_ops::VERSION, db = %config.db_path, "{}", aupus_ops::APP_NAME);

    let fonte = if opts.remoto { FonteDados::Remota } else { FonteDados::Local };
    let state = AppState::with_fonte(config, fonte).context("falha ao inicializar")?;

    executar(&state, opts.comando).await
}

async fn executar(state: &AppState, comando: Comando) -> Result<()> {
    let api = &state.operacoes;
    match comando {
        // ===== Prospec =====
        Comando::Prospec(ProspecCmd::List { filtros, pagina }) => {
            let linhas = api
                .listar_prospec(&filtros.filtros(), page(&pagina), pagina.recarregar)
                .await?;
            if pagina.json {
                println!("{}", serde_json::to_string_pretty(&linhas)?);
            } else {
                imprimir_prospec(&linhas);
            }
        }
        Comando::Prospec(ProspecCmd::Add {
            cliente,
            proposta,
            uc,
            consultor,
            media,
            desconto_tarifa,
            desconto_bandeira,
            status,
        }) => {
            let mut linha = ProspecRecord::nova(cliente, proposta, uc, consultor, media);
            linha.desconto_tarifa = desconto_tarifa;
            linha.desconto_bandeira = desconto_bandeira;
            linha.status = status;
            let salva = api.incluir_prospec(linha).await?;
            println!("{}", salva.id);
        }
        Comando::Prospec(ProspecCmd::Status { proposta, status }) => {
            let linhas = api.alterar_status(&proposta, status).await?;
            imprimir_prospec(&linhas);
        }
        Comando::Prospec(ProspecCmd::Resumo { proposta }) => {
            let resumo = api.resumo_proposta(&proposta)?;
            println!("{}", t_with_args("cli.cabecalho_resumo", &[("proposta", proposta.as_str())]));
            println!("  {} / {}", resumo.nome_cliente, resumo.consultor);
            println!("  UCs: {}", resumo.total_ucs);
            println!("  kWh/mês: {:.2}", resumo.consumo_total);
            println!("  R$/mês: {:.2}", resumo.economia_mensal);
            println!("  R$ comissão: {:.2}", resumo.comissao);
        }
        Comando::Prospec(ProspecCmd::Remove { id }) => {
            api.excluir_prospec(&id).await?;
        }

        // ===== Controle =====
        Comando::Controle(ControleCmd::List { filtros, pagina }) => {
            let registros = api
                .listar_controle(&filtros.filtros(), page(&pagina), pagina.recarregar)
                .await?;
            if pagina.json {
                println!("{}", serde_json::to_string_pretty(&registros)?);
            } else {
                imprimir_controle(&registros);
            }
        }
        Comando::Controle(ControleCmd::Atribuir { proposta, uc, ug }) => {
            let ugs = api.atribuir_ug(&ChaveUc::new(proposta, uc), ug.as_deref()).await?;
            imprimir_ugs(&ugs);
        }
        Comando::Controle(ControleCmd::Remove { proposta, uc }) => {
            api.remover_controle(&ChaveUc::new(proposta, uc)).await?;
        }

        // ===== UGs =====
        Comando::Ugs(UgsCmd::List { recarregar, json }) => {
            let ugs = api.listar_ugs(&Default::default(), recarregar).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&ugs)?);
            } else {
                imprimir_ugs(&ugs);
            }
        }
        Comando::Ugs(UgsCmd::Add {
            nome,
            potencia_ca,
            potencia_cc,
            fator,
        }) => {
            let ug = api.incluir_ug(Ug::nova(nome, potencia_ca, potencia_cc, fator)).await?;
            println!("{}", ug.id);
        }
        Comando::Ugs(UgsCmd::Remove { id }) => {
            api.excluir_ug(&id).await?;
        }
        Comando::Ugs(UgsCmd::Recalcular) => {
            let ugs = api.recalcular_ugs().await?;
            imprimir_ugs(&ugs);
        }

        // ===== Importação / exportação =====
        Comando::Import { arquivo } => {
            let summary = api.importar(&arquivo).await?;
            println!(
                "{}",
                t_with_args(
                    "importacao.concluida",
                    &[
                        ("importados", summary.importados.to_string().as_str()),
                        ("duplicados", summary.duplicados.to_string().as_str()),
                        ("rejeitados", summary.rejeitados.to_string().as_str()),
                    ],
                )
            );
            if !summary.erros.is_empty() {
                println!("{}", t("cli.linhas_rejeitadas"));
                for erro in &summary.erros {
                    println!("  {}: {}", erro.linha, erro.motivo);
                }
            }
        }
        Comando::Export(cmd) => {
            let (bytes, saida) = match cmd {
                ExportCmd::Xlsx {
                    entidade: EntidadeExport::Controle,
                    saida,
                    filtros,
                } => (api.exportar_controle_xlsx(&filtros.filtros())?, saida),
                ExportCmd::Xlsx {
                    entidade: EntidadeExport::Prospec,
                    saida,
                    filtros,
                } => (api.exportar_prospec(FormatoExportacao::Xlsx, &filtros.filtros())?, saida),
                ExportCmd::Xml { saida, filtros } => {
                    (api.exportar_prospec(FormatoExportacao::Xml, &filtros.filtros())?, saida)
                }
                ExportCmd::Pdf { proposta, saida } => (api.exportar_pdf_proposta(&proposta)?, saida),
            };
            std::fs::write(&saida, bytes).with_context(|| format!("falha ao gravar {}", saida.display()))?;
            println!(
                "{}",
                t_with_args("exportacao.concluida", &[("caminho", saida.display().to_string().as_str())])
            );
        }

        // ===== Sessão =====
        Comando::Login { email, senha } => {
            let usuario = state.auth()?.login(&email, &senha).await.map_err(aupus_ops::ApiError::from)?;
            println!("{}", t_with_args("sessao.login", &[("nome", usuario.nome.as_str())]));
        }
        Comando::Logout => {
            state.auth()?.logout().await.map_err(aupus_ops::ApiError::from)?;
            println!("{}", t("sessao.logout"));
        }
        Comando::SessionWatch { intervalo } => {
            let intervalo = match intervalo {
                Some(secs) => Duration::from_secs(secs.max(1)),
                None => state.config_manager.session_poll_interval()?,
            };
            let monitor = state.session_monitor()?;
            let mut logout_rx = state.client()?.subscribe_logout();
            println!("{}", t("cli.sessao_ativa"));

            let motivo = tokio::select! {
                outcome = monitor.run(intervalo) => match outcome {
                    MonitorOutcome::LogoutForcado => "erros consecutivos".to_string(),
                    outro => format!("{:?}", outro),
                },
                evento = logout_rx.recv() => match evento {
                    Ok(e) => e.motivo,
                    Err(e) => e.to_string(),
                },
            };
            println!("{}", t_with_args("cli.sessao_encerrada", &[("motivo", motivo.as_str())]));
        }
    }
    Ok(())
}

fn page(args: &PaginaArgs) -> Page {
    Page {
        number: args.pagina,
        size: args.tamanho,
    }
}

fn imprimir_prospec(linhas: &[ProspecRecord]) {
    if linhas.is_empty() {
        println!("{}", t("comum.nenhum_registro"));
        return;
    }
    println!("{}", t("cli.cabecalho_prospec"));
    for l in linhas {
        println!(
            "{} | {} | {} | {} | {} | {:.2} | {}",
            l.numero_proposta, l.numero_uc, l.nome_cliente, l.consultor, l.status, l.media, l.id
        );
    }
}

fn imprimir_controle(registros: &[ControleRecord]) {
    if registros.is_empty() {
        println!("{}", t("comum.nenhum_registro"));
        return;
    }
    println!("{}", t("cli.cabecalho_controle"));
    for r in registros {
        println!(
            "{} | {} | {} | {:.2} | {} | {}",
            r.linha.numero_proposta,
            r.linha.numero_uc,
            r.linha.nome_cliente,
            r.linha.media,
            r.ug.as_deref().unwrap_or("-"),
            if r.calibrado { "sim" } else { "não" }
        );
    }
}

fn imprimir_ugs(ugs: &[Ug]) {
    if ugs.is_empty() {
        println!("{}", t("comum.nenhum_registro"));
        return;
    }
    println!("{}", t("cli.cabecalho_ugs"));
    for u in ugs {
        println!(
            "{} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} | {} | {:.2}",
            u.nome_usina,
            u.potencia_ca,
            u.potencia_cc,
            u.capacidade,
            u.media,
            u.calibragem,
            u.ucs_atribuidas,
            u.saldo()
        );
    }
}

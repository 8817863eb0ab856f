// ==========================================
// Aupus Operações - Argumentos de linha de comando
// ==========================================

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use aupus_ops::domain::{Filtros, StatusProposta};

#[derive(Parser, Debug)]
#[command(name = "aupus-ops", version, about = "Aupus - operações comerciais")]
pub(crate) struct Opts {
    /// Listagens buscadas na API remota (exige AUPUS_API_URL)
    #[arg(long, global = true)]
    pub(crate) remoto: bool,

    /// Logs em JSON
    #[arg(long = "json-logs", global = true)]
    pub(crate) json_logs: bool,

    #[command(subcommand)]
    pub(crate) comando: Comando,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Comando {
    /// Linhas de proposta
    #[command(subcommand)]
    Prospec(ProspecCmd),

    /// Propostas fechadas e atribuição de UG
    #[command(subcommand)]
    Controle(ControleCmd),

    /// Unidades geradoras
    #[command(subcommand)]
    Ugs(UgsCmd),

    /// Importa linhas de proposta de um CSV/XLSX
    Import {
        arquivo: PathBuf,
    },

    /// Exporta dados
    #[command(subcommand)]
    Export(ExportCmd),

    /// Autentica na API
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "AUPUS_SENHA", hide_env_values = true)]
        senha: String,
    },

    /// Encerra a sessão
    Logout,

    /// Monitora a sessão até expirar
    SessionWatch {
        /// Intervalo entre verificações (segundos); padrão: session_poll_secs
        #[arg(long, value_name = "SECS")]
        intervalo: Option<u64>,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct FiltrosArgs {
    #[arg(long, value_parser = parse_status)]
    pub(crate) status: Option<StatusProposta>,
    #[arg(long)]
    pub(crate) consultor: Option<String>,
    #[arg(long)]
    pub(crate) ug: Option<String>,
    /// Busca em cliente/proposta/UC
    #[arg(long)]
    pub(crate) busca: Option<String>,
}

impl FiltrosArgs {
    pub(crate) fn filtros(&self) -> Filtros {
        Filtros {
            status: self.status,
            consultor: self.consultor.clone(),
            ug: self.ug.clone(),
            texto: self.busca.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct PaginaArgs {
    #[arg(long, default_value_t = 1)]
    pub(crate) pagina: usize,
    #[arg(long, default_value_t = 50)]
    pub(crate) tamanho: usize,
    /// Ignora o cache
    #[arg(long)]
    pub(crate) recarregar: bool,
    /// Saída em JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ProspecCmd {
    List {
        #[command(flatten)]
        filtros: FiltrosArgs,
        #[command(flatten)]
        pagina: PaginaArgs,
    },
    Add {
        #[arg(long)]
        cliente: String,
        #[arg(long)]
        proposta: String,
        #[arg(long)]
        uc: String,
        #[arg(long, default_value = "")]
        consultor: String,
        #[arg(long, default_value_t = 0.0)]
        media: f64,
        #[arg(long = "desconto-tarifa", default_value_t = 0.0)]
        desconto_tarifa: f64,
        #[arg(long = "desconto-bandeira", default_value_t = 0.0)]
        desconto_bandeira: f64,
        #[arg(long, value_parser = parse_status, default_value = "Aguardando")]
        status: StatusProposta,
    },
    /// Altera o status de todas as UCs da proposta
    Status {
        proposta: String,
        #[arg(value_parser = parse_status)]
        status: StatusProposta,
    },
    /// Mostra consumo total, economia estimada e comissão
    Resumo {
        proposta: String,
    },
    Remove {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum ControleCmd {
    List {
        #[command(flatten)]
        filtros: FiltrosArgs,
        #[command(flatten)]
        pagina: PaginaArgs,
    },
    /// Atribui a UG (sem --ug, desfaz a atribuição)
    Atribuir {
        proposta: String,
        uc: String,
        #[arg(long)]
        ug: Option<String>,
    },
    Remove {
        proposta: String,
        uc: String,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum UgsCmd {
    List {
        #[arg(long)]
        recarregar: bool,
        #[arg(long)]
        json: bool,
    },
    Add {
        #[arg(long)]
        nome: String,
        #[arg(long = "potencia-ca")]
        potencia_ca: f64,
        #[arg(long = "potencia-cc")]
        potencia_cc: f64,
        /// Fração (ex.: 0.19)
        #[arg(long)]
        fator: f64,
    },
    Remove {
        id: String,
    },
    /// Recalcula médias, calibragem e UCs atribuídas
    Recalcular,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EntidadeExport {
    Prospec,
    Controle,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ExportCmd {
    Xlsx {
        #[arg(long, value_enum, default_value_t = EntidadeExport::Controle)]
        entidade: EntidadeExport,
        #[arg(long, value_name = "FILE")]
        saida: PathBuf,
        #[command(flatten)]
        filtros: FiltrosArgs,
    },
    Xml {
        #[arg(long, value_name = "FILE")]
        saida: PathBuf,
        #[command(flatten)]
        filtros: FiltrosArgs,
    },
    Pdf {
        proposta: String,
        #[arg(long, value_name = "FILE")]
        saida: PathBuf,
    },
}

fn parse_status(s: &str) -> Result<StatusProposta, String> {
    StatusProposta::parse(s).ok_or_else(|| format!("status inválido: {} (Aguardando | Fechado)", s))
}

// ==========================================
// Aupus Operações - Notificações ao usuário
// ==========================================
// Equivalente aos toasts: a mesma mensagem (nível + texto) não é
// entregue de novo dentro da janela de deduplicação (padrão 2 s)
// ==========================================

use crate::api::error::ApiError;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NivelNotificacao {
    Sucesso,
    Info,
    Aviso,
    Erro,
}

impl fmt::Display for NivelNotificacao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NivelNotificacao::Sucesso => "sucesso",
            NivelNotificacao::Info => "info",
            NivelNotificacao::Aviso => "aviso",
            NivelNotificacao::Erro => "erro",
        };
        write!(f, "{}", s)
    }
}

/// Destino das notificações entregues
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, nivel: NivelNotificacao, mensagem: &str);
}

/// Destino padrão: log
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn deliver(&self, nivel: NivelNotificacao, mensagem: &str) {
        match nivel {
            NivelNotificacao::Erro => tracing::error!(notificacao = %nivel, "{}", mensagem),
            NivelNotificacao::Aviso => tracing::warn!(notificacao = %nivel, "{}", mensagem),
            _ => tracing::info!(notificacao = %nivel, "{}", mensagem),
        }
    }
}

pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    janela: Duration,
    recentes: Mutex<HashMap<(NivelNotificacao, String), Instant>>,
}

impl Notifier {
    pub const JANELA_PADRAO: Duration = Duration::from_millis(2_000);

    pub fn new(sink: Arc<dyn NotificationSink>, janela: Duration) -> Self {
        Self {
            sink,
            janela,
            recentes: Mutex::new(HashMap::new()),
        }
    }

    /// Entrega a notificação; false se suprimida por duplicidade
    pub fn notify(&self, nivel: NivelNotificacao, mensagem: &str) -> bool {
        self.notify_at(nivel, mensagem, Instant::now())
    }

    pub fn notify_at(&self, nivel: NivelNotificacao, mensagem: &str, agora: Instant) -> bool {
        {
            let mut recentes = match self.recentes.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            // descarta entradas vencidas
            recentes.retain(|_, quando| agora.saturating_duration_since(*quando) < self.janela);

            let chave = (nivel, mensagem.to_string());
            if recentes.contains_key(&chave) {
                tracing::debug!(mensagem = mensagem, "notificação duplicada suprimida");
                return false;
            }
            recentes.insert(chave, agora);
        }
        self.sink.deliver(nivel, mensagem);
        true
    }

    /// Notifica um erro com a mensagem traduzida
    pub fn notify_error(&self, err: &ApiError) -> bool {
        let mensagem = crate::i18n::t_with_args(err.message_key(), &[("detalhe", err.to_string().as_str())]);
        self.notify(NivelNotificacao::Erro, &mensagem)
    }
}

// ==========================================
// Aupus Operações - Monitor de sessão
// ==========================================
// Consulta /auth/session-status periodicamente.
// Erros consecutivos são contados; ao atingir o limite (padrão 5)
// o logout é forçado. Qualquer sucesso zera o contador.
// Sem backoff: o intervalo é fixo.
// ==========================================

use crate::client::auth::AuthService;
use crate::client::error::ClientError;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Resultado de uma verificação
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    Ativa,
    /// Sessão encerrada (API informou inativa ou 401 de sessão expirada)
    Expirada,
    /// Erro contabilizado (n consecutivos)
    Erro(u32),
    /// Limite de erros atingido; logout forçado
    LogoutForcado,
}

impl MonitorOutcome {
    pub fn encerra(&self) -> bool {
        matches!(self, MonitorOutcome::Expirada | MonitorOutcome::LogoutForcado)
    }
}

pub struct SessionMonitor {
    auth: Arc<AuthService>,
    max_erros: u32,
    erros: AtomicU32,
}

impl SessionMonitor {
    pub fn new(auth: Arc<AuthService>, max_erros: u32) -> Self {
        Self {
            auth,
            max_erros: max_erros.max(1),
            erros: AtomicU32::new(0),
        }
    }

    pub fn erros_consecutivos(&self) -> u32 {
        self.erros.load(Ordering::SeqCst)
    }

    /// Uma verificação
    pub async fn check_once(&self) -> MonitorOutcome {
        match self.auth.session_status().await {
            Ok(status) if status.active => {
                self.erros.store(0, Ordering::SeqCst);
                MonitorOutcome::Ativa
            }
            Ok(_) => {
                self.erros.store(0, Ordering::SeqCst);
                if let Err(e) = self.auth.client().force_logout("sessão inativa") {
                    tracing::error!(error = %e, "falha ao limpar sessão local");
                }
                MonitorOutcome::Expirada
            }
            Err(ClientError::SessionExpired) => MonitorOutcome::Expirada,
            Err(e) => {
                let n = self.erros.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::warn!(erros = n, max = self.max_erros, error = %e, "falha ao verificar sessão");
                if n >= self.max_erros {
                    self.erros.store(0, Ordering::SeqCst);
                    if let Err(e) = self.auth.client().force_logout("erros consecutivos na verificação de sessão") {
                        tracing::error!(error = %e, "falha ao limpar sessão local");
                    }
                    MonitorOutcome::LogoutForcado
                } else {
                    MonitorOutcome::Erro(n)
                }
            }
        }
    }

    /// Verifica a cada `intervalo` até a sessão encerrar
    pub async fn run(&self, intervalo: Duration) -> MonitorOutcome {
        let mut ticker = tokio::time::interval(intervalo);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let outcome = self.check_once().await;
            if outcome.encerra() {
                tracing::info!(outcome = ?outcome, "monitor de sessão encerrado");
                return outcome;
            }
        }
    }
}

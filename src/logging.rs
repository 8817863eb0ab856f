// ==========================================
// Aupus Operações - Inicialização de logs
// ==========================================
// tracing + tracing-subscriber; nível via RUST_LOG
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// Inicializa os logs
///
/// # Variáveis de ambiente
/// - RUST_LOG: filtro de nível (padrão: info)
///   ex.: RUST_LOG=debug ou RUST_LOG=aupus_ops=trace
///
/// # Exemplo
/// ```no_run
/// use aupus_ops::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// Logs em JSON (uma linha por evento)
pub fn init_json() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().json().with_env_filter(filter).with_current_span(false).init();
}

/// Logs para testes (nível debug, saída capturada pelo harness)
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

// ==========================================
// Aupus Operações - Internacionalização
// ==========================================
// rust-i18n; pt-BR (padrão) e en
// O macro rust_i18n::i18n! é inicializado em lib.rs
// ==========================================

/// Idioma atual
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// Define o idioma ("pt-BR" ou "en")
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// Traduz uma chave
///
/// # Exemplo
/// ```no_run
/// use aupus_ops::i18n::t;
/// let msg = t("comum.sucesso");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// Traduz uma chave substituindo %{nome} pelos argumentos
///
/// # Exemplo
/// ```no_run
/// use aupus_ops::i18n::t_with_args;
/// let msg = t_with_args("importacao.arquivo_nao_encontrado", &[("caminho", "/tmp/p.csv")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

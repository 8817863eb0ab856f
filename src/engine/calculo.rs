// ==========================================
// Aupus Operações - Cálculos comerciais
// ==========================================
// Tarifa estimada e comissão padrão vêm do ConfigManager
// (tarifa_estimada_kwh, comissao_padrao_pct)
// ==========================================

/// Horas consideradas em um mês para a capacidade de geração
pub const HORAS_MES: f64 = 720.0;

/// Capacidade mensal da UG (kWh) = 720 × potência CC × fator de capacidade
pub fn capacidade_ug(potencia_cc: f64, fator_capacidade: f64) -> f64 {
    HORAS_MES * potencia_cc * fator_capacidade
}

/// Calibragem = média ajustada pelo percentual global
pub fn calibragem(media: f64, calibragem_global_pct: f64) -> f64 {
    media * (1.0 + calibragem_global_pct / 100.0)
}

/// Economia mensal estimada (R$) de uma UC
pub fn economia_estimada(media_kwh: f64, desconto_pct: f64, tarifa_kwh: f64) -> f64 {
    media_kwh * tarifa_kwh * desconto_pct / 100.0
}

/// Comissão (R$) sobre a economia
pub fn comissao(economia: f64, comissao_pct: f64) -> f64 {
    economia * comissao_pct / 100.0
}

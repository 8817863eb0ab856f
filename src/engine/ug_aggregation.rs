// ==========================================
// Aupus Operações - Agregação das UGs
// ==========================================
// media/calibragem/ucsAtribuidas de cada UG são função pura do
// controle filtrado por ug == nomeUsina. O(U×C).
// ==========================================

use crate::domain::{ControleRecord, Ug};
use crate::engine::calculo;

/// Recalcula os campos derivados de todas as UGs
pub fn atualizar_medias_ugs(ugs: &mut [Ug], controle: &[ControleRecord], calibragem_global_pct: f64) {
    for ug in ugs.iter_mut() {
        let atribuidos: Vec<&ControleRecord> = controle
            .iter()
            .filter(|c| c.pertence_a(&ug.nome_usina))
            .collect();

        ug.media = atribuidos.iter().map(|c| c.linha.media).sum();
        ug.ucs_atribuidas = atribuidos.len();
        ug.calibrado = !atribuidos.is_empty();
        ug.calibragem = calculo::calibragem(ug.media, calibragem_global_pct);
        ug.capacidade = calculo::capacidade_ug(ug.potencia_cc, ug.fator_capacidade);
    }
}

// ==========================================
// StorageService - invariantes entre coleções
// ==========================================
// prospec ⇔ controle, agregação das UGs, ida e volta das coleções
// ==========================================

mod test_helpers;

use aupus_ops::domain::{ChaveUc, ControleRecord, ProspecPatch, StatusProposta, Ug, UgPatch};
use aupus_ops::repository::{keys, KvStore, RepositoryError};
use aupus_ops::storage::StorageService;
use std::collections::HashSet;
use test_helpers::{build_servicos, create_test_db, linha, linha_fechada};

/// Fechado ⇔ existe registro de controle com a mesma (proposta, UC)
fn assert_fechado_sse_controle(storage: &StorageService) {
    let prospec = storage.get_prospec().unwrap();
    let chaves_controle: HashSet<ChaveUc> = storage.get_controle().unwrap().iter().map(|c| c.chave()).collect();

    for l in &prospec {
        assert_eq!(
            l.status.is_fechado(),
            chaves_controle.contains(&l.chave()),
            "linha {} com status {} inconsistente com o controle",
            l.chave(),
            l.status
        );
    }
    let chaves_prospec: HashSet<ChaveUc> = prospec.iter().map(|l| l.chave()).collect();
    for chave in &chaves_controle {
        assert!(chaves_prospec.contains(chave), "controle órfão: {}", chave);
    }
}

#[test]
fn test_fechado_sse_controle_apos_sequencia_de_transicoes() {
    let (_tmp, db_path) = create_test_db();
    let s = build_servicos(&db_path);

    let propostas = ["2025/0001", "2025/0002", "2025/0003"];
    for (i, p) in propostas.iter().enumerate() {
        for uc in 0..=i {
            s.storage.add_prospec(linha(p, &format!("{}{}", i, uc), 100.0)).unwrap();
        }
    }

    // sequência determinística de transições (LCG)
    let mut semente: u64 = 42;
    for _ in 0..40 {
        semente = semente.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let proposta = propostas[(semente >> 33) as usize % propostas.len()];
        let status = if (semente >> 17) % 2 == 0 {
            StatusProposta::Fechado
        } else {
            StatusProposta::Aguardando
        };

        match (semente >> 40) % 3 {
            0 => {
                s.storage.set_status_proposta(proposta, status).unwrap();
            }
            1 => {
                let id = s.storage.get_proposta(proposta).unwrap()[0].id.clone();
                s.storage.update_prospec(&id, &ProspecPatch::status(status)).unwrap();
            }
            _ => {
                // sincronização explícita acompanhada do status nas linhas
                s.storage.set_status_proposta(proposta, status).unwrap();
                s.storage.sincronizar_status_fechado(proposta, status).unwrap();
            }
        }
        assert_fechado_sse_controle(&s.storage);
    }
}

#[test]
fn test_exclusoes_mantem_invariante() {
    let (_tmp, db_path) = create_test_db();
    let s = build_servicos(&db_path);

    let a = s.storage.add_prospec(linha_fechada("2025/0010", "1", 10.0)).unwrap();
    s.storage.add_prospec(linha_fechada("2025/0010", "2", 20.0)).unwrap();
    assert_eq!(s.storage.get_controle().unwrap().len(), 2);

    s.storage.remove_prospec(&a.id).unwrap();
    assert_fechado_sse_controle(&s.storage);

    s.storage.remove_controle(&ChaveUc::new("2025/0010", "2")).unwrap();
    assert_fechado_sse_controle(&s.storage);
    assert_eq!(
        s.storage.get_proposta("2025/0010").unwrap()[0].status,
        StatusProposta::Aguardando
    );
}

#[test]
fn test_media_da_ug_e_soma_do_controle() {
    let (_tmp, db_path) = create_test_db();
    let s = build_servicos(&db_path);

    s.storage.add_ug(Ug::nova("Usina Norte", 100.0, 120.0, 0.19)).unwrap();
    s.storage.add_ug(Ug::nova("Usina Sul", 80.0, 90.0, 0.2)).unwrap();

    let medias = [150.0, 250.0, 75.5, 400.0];
    for (i, media) in medias.iter().enumerate() {
        s.storage
            .add_prospec(linha_fechada("2025/0100", &i.to_string(), *media))
            .unwrap();
    }
    s.storage.atribuir_ug(&ChaveUc::new("2025/0100", "0"), Some("Usina Norte")).unwrap();
    s.storage.atribuir_ug(&ChaveUc::new("2025/0100", "1"), Some("Usina Norte")).unwrap();
    s.storage.atribuir_ug(&ChaveUc::new("2025/0100", "2"), Some("Usina Sul")).unwrap();
    // reatribuição e remoção
    s.storage.atribuir_ug(&ChaveUc::new("2025/0100", "3"), Some("Usina Sul")).unwrap();
    s.storage.atribuir_ug(&ChaveUc::new("2025/0100", "3"), None).unwrap();

    let ugs = s.storage.atualizar_medias_ugs().unwrap();
    let controle = s.storage.get_controle().unwrap();
    for ug in &ugs {
        let esperado: f64 = controle
            .iter()
            .filter(|c| c.ug.as_deref() == Some(ug.nome_usina.as_str()))
            .map(|c| c.linha.media)
            .sum();
        assert!((ug.media - esperado).abs() < 1e-9, "UG {}: {} != {}", ug.nome_usina, ug.media, esperado);
    }

    let norte = ugs.iter().find(|u| u.nome_usina == "Usina Norte").unwrap();
    assert_eq!(norte.ucs_atribuidas, 2);
    assert!((norte.media - 400.0).abs() < 1e-9);
}

#[test]
fn test_calibragem_global() {
    let (_tmp, db_path) = create_test_db();
    let s = build_servicos(&db_path);
    s.config.set_value("calibragem_global_pct", "10").unwrap();

    s.storage.add_ug(Ug::nova("B", 100.0, 100.0, 0.2)).unwrap();
    s.storage.add_prospec(linha_fechada("2025/0200", "1", 500.0)).unwrap();
    let ugs = s.storage.atribuir_ug(&ChaveUc::new("2025/0200", "1"), Some("B")).unwrap();

    let b = &ugs[0];
    assert!((b.calibragem - 550.0).abs() < 1e-9);
    assert!((b.capacidade - 14_400.0).abs() < 1e-9);
}

#[test]
fn test_ida_e_volta_das_tres_colecoes() {
    let (_tmp, db_path) = create_test_db();
    let s = build_servicos(&db_path);

    let mut l1 = linha("2025/0300", "1", 123.5);
    l1.telefone = Some("(11) 99999-0000".to_string());
    l1.desconto_tarifa = 15.0;
    let l2 = linha_fechada("2025/0301", "2", 80.0);
    let prospec = vec![l1, l2.clone()];
    s.storage.save_prospec(&prospec).unwrap();
    assert_eq!(s.storage.get_prospec().unwrap(), prospec);

    let mut c = ControleRecord::from_prospec(&l2);
    c.atribuir_ug(Some("UG X".to_string()));
    let controle = vec![c];
    s.storage.save_controle(&controle).unwrap();
    assert_eq!(s.storage.get_controle().unwrap(), controle);

    let ugs = vec![Ug::nova("UG X", 50.0, 60.0, 0.25), Ug::nova("UG Y", 10.0, 12.0, 0.2)];
    s.storage.save_ugs(&ugs).unwrap();
    assert_eq!(s.storage.get_ugs().unwrap(), ugs);
}

#[test]
fn test_dados_persistem_entre_conexoes() {
    let (_tmp, db_path) = create_test_db();
    {
        let s = build_servicos(&db_path);
        s.storage.add_prospec(linha_fechada("2025/0400", "9", 42.0)).unwrap();
    }
    let s = build_servicos(&db_path);
    assert_eq!(s.storage.get_prospec().unwrap().len(), 1);
    assert_eq!(s.storage.get_controle().unwrap().len(), 1);
}

#[test]
fn test_json_corrompido_vira_colecao_vazia() {
    let (_tmp, db_path) = create_test_db();
    let s = build_servicos(&db_path);
    s.kv.set_raw(keys::PROSPEC, "{não é json").unwrap();

    assert!(s.storage.get_prospec().unwrap().is_empty());
    // a coleção volta a ser gravável
    s.storage.add_prospec(linha("2025/0500", "1", 1.0)).unwrap();
    assert_eq!(s.storage.get_prospec().unwrap().len(), 1);
}

#[test]
fn test_cenario_proposta_2025_0001_uc_111() {
    let (_tmp, db_path) = create_test_db();
    let s = build_servicos(&db_path);

    let l = s.storage.add_prospec(linha("2025/0001", "111", 300.0)).unwrap();
    assert!(s.storage.get_controle().unwrap().is_empty());

    s.storage.update_prospec(&l.id, &ProspecPatch::status(StatusProposta::Fechado)).unwrap();
    let controle = s.storage.get_controle().unwrap();
    assert_eq!(controle.len(), 1);
    assert_eq!(controle[0].linha.numero_uc, "111");
    assert_eq!(controle.iter().filter(|c| c.linha.numero_uc == "111").count(), 1);

    s.storage.update_prospec(&l.id, &ProspecPatch::status(StatusProposta::Aguardando)).unwrap();
    assert!(!s.storage.get_controle().unwrap().iter().any(|c| c.linha.numero_uc == "111"));
}

#[test]
fn test_cenario_ugs_a_e_b() {
    let (_tmp, db_path) = create_test_db();
    let s = build_servicos(&db_path);

    let ugs = vec![Ug::nova("A", 100.0, 100.0, 0.2), Ug::nova("B", 100.0, 100.0, 0.2)];
    s.storage.save_ugs(&ugs).unwrap();

    let mut registro = ControleRecord::from_prospec(&linha_fechada("2025/0002", "222", 500.0));
    registro.atribuir_ug(Some("B".to_string()));
    s.storage.save_controle(&[registro]).unwrap();

    let ugs = s.storage.atualizar_medias_ugs().unwrap();
    let a = ugs.iter().find(|u| u.nome_usina == "A").unwrap();
    let b = ugs.iter().find(|u| u.nome_usina == "B").unwrap();
    assert!(!a.calibrado);
    assert!(b.calibrado);
    assert_eq!(b.media, 500.0);
    assert_eq!(a.media, 0.0);
}

#[test]
fn test_renomear_e_excluir_ug() {
    let (_tmp, db_path) = create_test_db();
    let s = build_servicos(&db_path);

    let ug = s.storage.add_ug(Ug::nova("Antiga", 10.0, 10.0, 0.2)).unwrap();
    s.storage.add_prospec(linha_fechada("2025/0600", "1", 90.0)).unwrap();
    s.storage.atribuir_ug(&ChaveUc::new("2025/0600", "1"), Some("Antiga")).unwrap();

    let patch = UgPatch {
        nome_usina: Some("Nova".to_string()),
        ..Default::default()
    };
    let renomeada = s.storage.update_ug(&ug.id, &patch).unwrap();
    assert_eq!(renomeada.media, 90.0);
    assert_eq!(s.storage.get_controle().unwrap()[0].ug.as_deref(), Some("Nova"));

    s.storage.remove_ug(&ug.id).unwrap();
    let controle = s.storage.get_controle().unwrap();
    assert_eq!(controle[0].ug, None);
    assert!(!controle[0].calibrado);
}

#[test]
fn test_kv_store_compartilhado() {
    let (_tmp, db_path) = create_test_db();
    let kv = KvStore::open(&db_path).unwrap();
    kv.set_raw("qualquer", "valor").unwrap();
    let s = build_servicos(&db_path);
    assert_eq!(s.kv.get_raw("qualquer").unwrap().as_deref(), Some("valor"));
}

#[test]
fn test_numero_nao_finito_nao_apaga_colecao() {
    let (_tmp, db_path) = create_test_db();
    let s = build_servicos(&db_path);
    let l1 = s.storage.add_prospec(linha("2025/0600", "1", 100.0)).unwrap();
    s.storage.add_prospec(linha("2025/0600", "2", 200.0)).unwrap();

    let err = s.storage.add_prospec(linha("2025/0601", "3", f64::NAN)).unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError(_)));

    let mut infinita = linha("2025/0601", "4", 10.0);
    infinita.desconto_tarifa = f64::INFINITY;
    assert!(s.storage.add_prospec_lote(vec![infinita]).is_err());

    let patch = ProspecPatch {
        media: Some(f64::NEG_INFINITY),
        ..Default::default()
    };
    assert!(s.storage.update_prospec(&l1.id, &patch).is_err());
    assert!(s.storage.save_prospec(&[linha("2025/0602", "5", f64::NAN)]).is_err());

    let prospec = s.storage.get_prospec().unwrap();
    assert_eq!(prospec.len(), 2);
    assert!(prospec.iter().all(|l| l.media.is_finite() && l.desconto_tarifa.is_finite()));
}

#[test]
fn test_ug_com_numero_nao_finito_rejeitada() {
    let (_tmp, db_path) = create_test_db();
    let s = build_servicos(&db_path);
    let a = s.storage.add_ug(Ug::nova("A", 100.0, 100.0, 0.2)).unwrap();

    assert!(s.storage.add_ug(Ug::nova("B", f64::NAN, 100.0, 0.2)).is_err());
    let patch = UgPatch {
        fator_capacidade: Some(f64::INFINITY),
        ..Default::default()
    };
    assert!(s.storage.update_ug(&a.id, &patch).is_err());

    let ugs = s.storage.get_ugs().unwrap();
    assert_eq!(ugs.len(), 1);
    assert!((ugs[0].fator_capacidade - 0.2).abs() < 1e-9);
}

#[test]
fn test_update_controle_valida_ug() {
    let (_tmp, db_path) = create_test_db();
    let s = build_servicos(&db_path);
    s.storage.add_ug(Ug::nova("A", 100.0, 100.0, 0.2)).unwrap();
    s.storage.add_prospec(linha_fechada("2025/0700", "1", 300.0)).unwrap();
    let original = s.storage.get_controle().unwrap().remove(0);

    // nome em branco desfaz a atribuição
    let mut em_branco = original.clone();
    em_branco.ug = Some("   ".to_string());
    em_branco.calibrado = true;
    let salvo = s.storage.update_controle(em_branco).unwrap();
    assert_eq!(salvo.ug, None);
    assert!(!salvo.calibrado);

    // UG inexistente é recusada
    let mut inexistente = original.clone();
    inexistente.ug = Some("Z".to_string());
    let err = s.storage.update_controle(inexistente).unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));

    let mut valido = original;
    valido.ug = Some(" A ".to_string());
    let salvo = s.storage.update_controle(valido).unwrap();
    assert_eq!(salvo.ug.as_deref(), Some("A"));
    assert!(salvo.calibrado);
    let a = s.storage.get_ugs().unwrap().remove(0);
    assert_eq!(a.ucs_atribuidas, 1);
}

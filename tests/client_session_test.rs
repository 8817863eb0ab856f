// ==========================================
// Cliente remoto - autenticação, 401 e monitor de sessão
// ==========================================

mod test_helpers;

use aupus_ops::api::ApiError;
use aupus_ops::client::{ClientError, HttpMethod, MonitorOutcome};
use aupus_ops::domain::{Usuario, UsuarioInput};
use aupus_ops::repository::keys;
use serde_json::json;
use std::time::Duration;
use test_helpers::{build_state_remoto, create_test_db, ScriptedTransport};

fn usuario_json() -> serde_json::Value {
    json!({ "id": "u1", "nome": "Ana Souza", "email": "ana@aupus.example", "perfil": "consultor" })
}

#[tokio::test]
async fn test_login_guarda_token_e_usuario() {
    let (_tmp, db_path) = create_test_db();
    let transport = ScriptedTransport::new();
    transport.responder(HttpMethod::Post, "/auth/login", 200, json!({ "token": "abc", "user": usuario_json() }));
    let state = build_state_remoto(&db_path, transport.clone());

    let auth = state.auth().unwrap();
    let usuario = auth.login("ana@aupus.example", "segredo").await.unwrap();
    assert_eq!(usuario.nome, "Ana Souza");
    assert_eq!(state.kv.get_raw(keys::TOKEN).unwrap().as_deref(), Some("abc"));
    assert_eq!(auth.current_user().unwrap(), Some(usuario));

    // requisições seguintes levam o token
    transport.responder(HttpMethod::Get, "/usuarios", 200, json!([usuario_json()]));
    state.usuarios().unwrap().list().await.unwrap();
    let req = transport.ultimo_request().unwrap();
    assert_eq!(req.header("Authorization"), Some("Bearer abc"));
}

#[tokio::test]
async fn test_401_no_login_e_credencial_invalida() {
    let (_tmp, db_path) = create_test_db();
    let transport = ScriptedTransport::new();
    transport.responder(HttpMethod::Post, "/auth/login", 401, json!({ "message": "senha incorreta" }));
    let state = build_state_remoto(&db_path, transport);
    state.kv.set_raw(keys::TOKEN, "antigo").unwrap();

    let mut logout_rx = state.client().unwrap().subscribe_logout();
    let err = state.auth().unwrap().login("ana@aupus.example", "errada").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidCredentials(ref m) if m == "senha incorreta"));

    // sem logout forçado
    assert_eq!(state.kv.get_raw(keys::TOKEN).unwrap().as_deref(), Some("antigo"));
    assert!(logout_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_401_na_verificacao_de_sessao_mantem_token() {
    let (_tmp, db_path) = create_test_db();
    let transport = ScriptedTransport::new();
    transport.responder(HttpMethod::Get, "/auth/session-status", 401, json!({ "message": "verificação" }));
    transport.responder(
        HttpMethod::Get,
        "/usuarios",
        401,
        json!({ "error_type": "session_check", "message": "verificação" }),
    );
    let state = build_state_remoto(&db_path, transport);
    state.kv.set_raw(keys::TOKEN, "abc").unwrap();

    let err = state.auth().unwrap().session_status().await.unwrap_err();
    assert!(matches!(err, ClientError::SessionCheckFailed(_)));

    let err = state.usuarios().unwrap().list().await.unwrap_err();
    assert!(matches!(err, ClientError::SessionCheckFailed(_)));
    assert_eq!(state.kv.get_raw(keys::TOKEN).unwrap().as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_401_comum_expira_sessao() {
    let (_tmp, db_path) = create_test_db();
    let transport = ScriptedTransport::new();
    transport.responder(HttpMethod::Get, "/usuarios", 401, json!({ "message": "token expirado" }));
    let state = build_state_remoto(&db_path, transport);
    state.kv.set_raw(keys::TOKEN, "abc").unwrap();
    state
        .kv
        .set_json(
            keys::USER,
            &Usuario {
                id: "u1".to_string(),
                nome: "Ana".to_string(),
                email: "ana@aupus.example".to_string(),
                perfil: String::new(),
                ativo: true,
            },
        )
        .unwrap();

    let mut logout_rx = state.client().unwrap().subscribe_logout();
    let err = state.usuarios().unwrap().list().await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired));
    assert!(matches!(ApiError::from(err), ApiError::SessionExpired));

    assert_eq!(state.kv.get_raw(keys::TOKEN).unwrap(), None);
    assert_eq!(state.kv.get_raw(keys::USER).unwrap(), None);
    let evento = logout_rx.try_recv().unwrap();
    assert_eq!(evento.motivo, "sessão expirada");
}

#[tokio::test]
async fn test_erro_http_com_mensagem() {
    let (_tmp, db_path) = create_test_db();
    let transport = ScriptedTransport::new();
    transport.responder(HttpMethod::Post, "/usuarios", 422, json!({ "error": "e-mail já cadastrado" }));
    let state = build_state_remoto(&db_path, transport);

    let input = UsuarioInput {
        nome: "Bruno".to_string(),
        email: "bruno@aupus.example".to_string(),
        perfil: "consultor".to_string(),
        senha: Some("123456".to_string()),
    };
    let err = state.usuarios().unwrap().create(&input).await.unwrap_err();
    match err {
        ClientError::Http { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "e-mail já cadastrado");
        }
        outro => panic!("esperado Http, obtido {:?}", outro),
    }
}

#[tokio::test]
async fn test_usuarios_listagem_guardada() {
    let (_tmp, db_path) = create_test_db();
    let transport = ScriptedTransport::new();
    transport.responder(HttpMethod::Get, "/usuarios", 200, json!([usuario_json()]));
    transport.responder(HttpMethod::Delete, "/usuarios/u1", 204, serde_json::Value::Null);
    let state = build_state_remoto(&db_path, transport.clone());
    let api = state.usuarios().unwrap();

    assert!(api.cached().unwrap().is_empty());
    let lista = api.list().await.unwrap();
    assert_eq!(api.cached().unwrap(), lista);

    api.delete("u1").await.unwrap();
    assert_eq!(transport.ultimo_request().unwrap().method, HttpMethod::Delete);
    assert!(api.delete("u1/../x").await.is_err());
}

#[tokio::test]
async fn test_download_de_documento() {
    let (_tmp, db_path) = create_test_db();
    let transport = ScriptedTransport::new();
    transport.responder(
        HttpMethod::Get,
        "/documentos/propostas/p1",
        200,
        json!([{ "nome": "conta.pdf", "tipo": "application/pdf", "tamanho": 4 }]),
    );
    transport.responder(HttpMethod::Get, "/documentos/propostas/p1/conta.pdf", 200, json!("%PDF"));
    let state = build_state_remoto(&db_path, transport);
    let docs = state.documentos().unwrap();

    let lista = docs.listar("p1").await.unwrap();
    assert_eq!(lista[0].nome, "conta.pdf");
    let bytes = docs.baixar("p1", "conta.pdf").await.unwrap();
    assert_eq!(bytes, b"\"%PDF\"".to_vec());
}

#[tokio::test]
async fn test_monitor_forca_logout_apos_cinco_erros() {
    let (_tmp, db_path) = create_test_db();
    let transport = ScriptedTransport::new();
    for _ in 0..5 {
        transport.falhar(HttpMethod::Get, "/auth/session-status", "conexão recusada");
    }
    let state = build_state_remoto(&db_path, transport);
    state.kv.set_raw(keys::TOKEN, "abc").unwrap();
    let monitor = state.session_monitor().unwrap();
    let mut logout_rx = state.client().unwrap().subscribe_logout();

    for n in 1..=4 {
        assert_eq!(monitor.check_once().await, MonitorOutcome::Erro(n));
        assert_eq!(state.kv.get_raw(keys::TOKEN).unwrap().as_deref(), Some("abc"));
    }
    assert_eq!(monitor.check_once().await, MonitorOutcome::LogoutForcado);
    assert_eq!(state.kv.get_raw(keys::TOKEN).unwrap(), None);
    assert!(logout_rx.try_recv().is_ok());
}

#[tokio::test]
async fn test_monitor_sucesso_zera_contador() {
    let (_tmp, db_path) = create_test_db();
    let transport = ScriptedTransport::new();
    for _ in 0..4 {
        transport.falhar(HttpMethod::Get, "/auth/session-status", "timeout");
    }
    transport.responder(HttpMethod::Get, "/auth/session-status", 200, json!({ "active": true, "expiresIn": 600 }));
    transport.falhar(HttpMethod::Get, "/auth/session-status", "timeout");
    let state = build_state_remoto(&db_path, transport);
    state.kv.set_raw(keys::TOKEN, "abc").unwrap();
    let monitor = state.session_monitor().unwrap();

    for _ in 0..4 {
        monitor.check_once().await;
    }
    assert_eq!(monitor.erros_consecutivos(), 4);
    assert_eq!(monitor.check_once().await, MonitorOutcome::Ativa);
    assert_eq!(monitor.erros_consecutivos(), 0);
    assert_eq!(monitor.check_once().await, MonitorOutcome::Erro(1));
    assert_eq!(state.kv.get_raw(keys::TOKEN).unwrap().as_deref(), Some("abc"));
}

#[tokio::test(start_paused = true)]
async fn test_monitor_run_encerra_quando_sessao_inativa() {
    let (_tmp, db_path) = create_test_db();
    let transport = ScriptedTransport::new();
    transport.responder(HttpMethod::Get, "/auth/session-status", 200, json!({ "active": true }));
    transport.responder(HttpMethod::Get, "/auth/session-status", 200, json!({ "active": false }));
    let state = build_state_remoto(&db_path, transport.clone());
    state.kv.set_raw(keys::TOKEN, "abc").unwrap();
    let monitor = state.session_monitor().unwrap();

    let outcome = monitor.run(Duration::from_secs(60)).await;
    assert_eq!(outcome, MonitorOutcome::Expirada);
    assert_eq!(transport.total_requests(), 2);
    assert_eq!(state.kv.get_raw(keys::TOKEN).unwrap(), None);
}

#[tokio::test]
async fn test_logout_limpa_mesmo_com_api_fora() {
    let (_tmp, db_path) = create_test_db();
    let transport = ScriptedTransport::new();
    transport.falhar(HttpMethod::Post, "/auth/logout", "conexão recusada");
    let state = build_state_remoto(&db_path, transport);
    state.kv.set_raw(keys::TOKEN, "abc").unwrap();

    let auth = state.auth().unwrap();
    auth.logout().await.unwrap();
    assert!(!auth.is_authenticated().unwrap());
}

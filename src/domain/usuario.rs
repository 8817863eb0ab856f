// ==========================================
// Aupus Operações - Usuários
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usuario {
    pub id: String,
    pub nome: String,
    pub email: String,
    #[serde(default)]
    pub perfil: String,
    #[serde(default = "default_ativo")]
    pub ativo: bool,
}

fn default_ativo() -> bool {
    true
}

/// Dados para cadastro/edição de usuário
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsuarioInput {
    pub nome: String,
    pub email: String,
    pub perfil: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub senha: Option<String>,
}

/// Resposta de /auth/login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: Usuario,
}

/// Resposta de /auth/session-status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub expires_in: Option<i64>, // segundos
}

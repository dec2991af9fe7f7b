//! Corpos de requisição e resposta da API do CRM.

use serde::{Deserialize, Serialize};

/// Corpo de `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub senha: String,
}

/// Resposta de `POST /login`. `token` só vem preenchido quando `success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Item de `GET /usuarios`: a API devolve nomes soltos ou objetos com `nome`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserEntry {
    Name(String),
    Record {
        nome: String,
        #[serde(default)]
        email: Option<String>,
    },
}

impl UserEntry {
    pub fn name(&self) -> &str {
        match self {
            UserEntry::Name(nome) | UserEntry::Record { nome, .. } => nome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_uses_senha() {
        let req = LoginRequest {
            email: "ana@nrecupera.com.br".into(),
            senha: "123".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["senha"], "123");
    }

    #[test]
    fn failed_login_has_no_token() {
        let resp: LoginResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!resp.success);
        assert!(resp.token.is_none());
    }

    #[test]
    fn users_accept_both_shapes() {
        let users: Vec<UserEntry> =
            serde_json::from_str(r#"["Ana", {"nome": "Bruno", "email": "b@x.com"}]"#).unwrap();
        let names: Vec<&str> = users.iter().map(UserEntry::name).collect();
        assert_eq!(names, vec!["Ana", "Bruno"]);
    }
}
